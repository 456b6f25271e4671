pub mod engine;
pub mod feed;
pub mod model;
pub mod money;
pub mod store;

pub use engine::{CartEngine, CartError, ItemAdded};
pub use feed::{PriceFeed, SpotQuotes};
pub use model::{LineItem, Metal};
pub use money::Money;
pub use store::{CartStore, JsonFileStore, MemoryStore};
