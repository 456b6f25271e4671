//! Live metals price feed.
//!
//! A [`PriceFeed`] is an immutable snapshot: per-metal USD spot quotes plus
//! the selected display currency and its FX multiplier. The cart engine reads
//! whatever snapshot it is handed at call time and never caches one.
//!
//! [`FeedRefresher`] republishes fresh snapshots through a `watch` channel on
//! a fixed interval. A failed fetch degrades to offline sample quotes with a
//! logged warning; it never takes the feed down.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time;
use tokio_stream::{StreamExt, wrappers::IntervalStream};
use tracing::{debug, warn};

use crate::model::Metal;

/// Grams per troy ounce. Spot quotes are per troy ounce; cart prices are per
/// gram. The 31.1035 precision is part of the display contract.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1035;

/// Fallback USD to INR rate used when no live FX quote is available.
pub const FALLBACK_INR_FX: f64 = 83.0;

/// USD spot quotes per troy ounce. `None` means the quote is currently
/// unknown, which downstream pricing renders as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpotQuotes {
    pub gold: Option<f64>,
    pub silver: Option<f64>,
    pub platinum: Option<f64>,
    pub palladium: Option<f64>,
}

impl SpotQuotes {
    pub fn get(&self, metal: Metal) -> Option<f64> {
        match metal {
            Metal::Gold => self.gold,
            Metal::Silver => self.silver,
            Metal::Platinum => self.platinum,
            Metal::Palladium => self.palladium,
        }
    }

    /// Sample quotes served when no live source is reachable.
    pub fn offline_sample() -> Self {
        Self {
            gold: Some(2300.0),
            silver: Some(29.0),
            platinum: Some(950.0),
            palladium: Some(1050.0),
        }
    }
}

/// One snapshot of the feed: spot quotes plus the display currency.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFeed {
    pub spot: SpotQuotes,
    /// ISO currency code the multiplier converts into.
    pub currency: String,
    /// USD to display-currency multiplier; 1.0 for USD itself.
    pub fx: f64,
}

impl PriceFeed {
    pub fn new(spot: SpotQuotes, currency: impl Into<String>, fx: f64) -> Self {
        Self {
            spot,
            currency: currency.into(),
            fx,
        }
    }

    pub fn usd(spot: SpotQuotes) -> Self {
        Self::new(spot, "USD", 1.0)
    }

    /// Empty snapshot: every quote unknown, native USD.
    pub fn empty() -> Self {
        Self::usd(SpotQuotes::default())
    }

    /// USD per gram for a metal. Unknown spot derives as zero; this is the
    /// feed's "unknown price renders as zero" policy, not an error.
    pub fn price_per_gram_usd(&self, metal: Metal) -> f64 {
        self.spot.get(metal).unwrap_or(0.0) / GRAMS_PER_TROY_OUNCE
    }

    /// Per-gram price in the display currency.
    pub fn display_price_per_gram(&self, metal: Metal) -> f64 {
        self.price_per_gram_usd(metal) * self.fx
    }
}

/// Error fetching spot quotes from a source.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("quote source unavailable: {0}")]
    Unavailable(String),
}

/// A source of spot quotes. The production fetch layer (HTTP, its own
/// timeout and retry policy) lives behind this seam.
pub trait QuoteSource {
    fn fetch(&self) -> impl Future<Output = Result<SpotQuotes, FeedError>> + Send;
}

/// Source that always serves the offline sample quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleQuotes;

impl QuoteSource for SampleQuotes {
    async fn fetch(&self) -> Result<SpotQuotes, FeedError> {
        Ok(SpotQuotes::offline_sample())
    }
}

/// Periodically fetches quotes and publishes updated feed snapshots.
///
/// Receivers see a fully formed [`PriceFeed`]; the refresher only replaces
/// the spot quotes and leaves the currency selection alone.
pub struct FeedRefresher<S> {
    source: S,
    tx: watch::Sender<PriceFeed>,
}

impl<S: QuoteSource> FeedRefresher<S> {
    pub fn new(source: S, tx: watch::Sender<PriceFeed>) -> Self {
        Self { source, tx }
    }

    /// Fetch once and publish. A fetch failure publishes the offline sample
    /// quotes instead of leaving receivers on a stale snapshot.
    pub async fn tick(&self) {
        let spot = match self.source.fetch().await {
            Ok(spot) => {
                debug!("spot quotes refreshed");
                spot
            }
            Err(e) => {
                warn!(error = %e, "quote fetch failed, serving offline sample quotes");
                SpotQuotes::offline_sample()
            }
        };
        self.tx.send_modify(|feed| feed.spot = spot);
    }

    /// Refresh on a fixed interval until every receiver is gone.
    pub async fn run(self, period: Duration) {
        let mut ticks = IntervalStream::new(time::interval(period));
        while ticks.next().await.is_some() {
            if self.tx.is_closed() {
                break;
            }
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_per_gram_divides_by_troy_ounce() {
        let feed = PriceFeed::usd(SpotQuotes {
            gold: Some(2300.0),
            ..SpotQuotes::default()
        });
        assert_eq!(feed.price_per_gram_usd(Metal::Gold), 2300.0 / 31.1035);
    }

    #[test]
    fn unknown_spot_derives_as_zero() {
        let feed = PriceFeed::empty();
        for metal in Metal::ALL {
            assert_eq!(feed.price_per_gram_usd(metal), 0.0);
            assert_eq!(feed.display_price_per_gram(metal), 0.0);
        }
    }

    #[test]
    fn display_price_applies_fx_multiplier() {
        let feed = PriceFeed::new(
            SpotQuotes {
                gold: Some(2300.0),
                ..SpotQuotes::default()
            },
            "INR",
            FALLBACK_INR_FX,
        );
        assert_eq!(
            feed.display_price_per_gram(Metal::Gold),
            2300.0 / 31.1035 * 83.0
        );
    }

    #[test]
    fn usd_feed_has_unit_multiplier() {
        let feed = PriceFeed::usd(SpotQuotes::offline_sample());
        assert_eq!(feed.currency, "USD");
        assert_eq!(feed.fx, 1.0);
        assert_eq!(
            feed.display_price_per_gram(Metal::Silver),
            feed.price_per_gram_usd(Metal::Silver)
        );
    }

    struct FailingSource;

    impl QuoteSource for FailingSource {
        async fn fetch(&self) -> Result<SpotQuotes, FeedError> {
            Err(FeedError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn tick_publishes_fetched_quotes() {
        let (tx, rx) = watch::channel(PriceFeed::empty());
        let refresher = FeedRefresher::new(SampleQuotes, tx);

        refresher.tick().await;

        assert_eq!(rx.borrow().spot, SpotQuotes::offline_sample());
        assert_eq!(rx.borrow().currency, "USD");
    }

    #[tokio::test]
    async fn tick_falls_back_to_sample_on_fetch_error() {
        let (tx, rx) = watch::channel(PriceFeed::empty());
        let refresher = FeedRefresher::new(FailingSource, tx);

        refresher.tick().await;

        assert_eq!(rx.borrow().spot, SpotQuotes::offline_sample());
    }

    #[tokio::test]
    async fn tick_preserves_currency_selection() {
        let (tx, rx) = watch::channel(PriceFeed::new(
            SpotQuotes::default(),
            "INR",
            FALLBACK_INR_FX,
        ));
        let refresher = FeedRefresher::new(SampleQuotes, tx);

        refresher.tick().await;

        assert_eq!(rx.borrow().currency, "INR");
        assert_eq!(rx.borrow().fx, FALLBACK_INR_FX);
    }

    #[tokio::test]
    async fn run_stops_when_receivers_drop() {
        let (tx, rx) = watch::channel(PriceFeed::empty());
        drop(rx);

        // Returns on the first tick once the channel is closed.
        FeedRefresher::new(SampleQuotes, tx)
            .run(Duration::from_millis(1))
            .await;
    }
}
