//! Core domain types for the cart engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A metal the catalog trades in. The set is closed: engine preconditions on
/// "known metal" are enforced by this type rather than by runtime checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Silver,
    Platinum,
    Palladium,
}

impl Metal {
    pub const ALL: [Metal; 4] = [Metal::Gold, Metal::Silver, Metal::Platinum, Metal::Palladium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metal::Gold => "gold",
            Metal::Silver => "silver",
            Metal::Platinum => "platinum",
            Metal::Palladium => "palladium",
        }
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a metal symbol from text.
#[derive(Debug, Error)]
#[error("unrecognized metal '{0}'")]
pub struct ParseMetalError(pub String);

impl FromStr for Metal {
    type Err = ParseMetalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gold" => Ok(Metal::Gold),
            "silver" => Ok(Metal::Silver),
            "platinum" => Ok(Metal::Platinum),
            "palladium" => Ok(Metal::Palladium),
            other => Err(ParseMetalError(other.to_string())),
        }
    }
}

/// One entry in the cart, keyed by `(metal, weight_grams)`.
///
/// Serializes to the persisted snapshot form
/// `{metal, weightGrams, quantity, pricePerGramAtAddTime}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub metal: Metal,
    /// Bar weight in grams. Always positive; the catalog set (5/10/50/100)
    /// is not enforced here.
    pub weight_grams: u32,
    /// Always >= 1; an entry that would drop to zero is removed instead.
    pub quantity: u32,
    /// USD per gram captured when the item was first added. Reference only:
    /// live totals never read it.
    pub price_per_gram_at_add_time: f64,
}

impl LineItem {
    /// Composite key, unique within a cart.
    pub fn key(&self) -> (Metal, u32) {
        (self.metal, self.weight_grams)
    }
}
