pub mod client;
pub mod parser;
pub mod rates;

pub use client::{FeedClient, HttpTransport, Transport};
pub use parser::{FeedParser, ParsedFeed};
pub use rates::{RateClient, RateTable};

use chrono::NaiveDate;
use tourlens_common::{FeedConfig, RateConfig, TourlensError};

/// Download the published ticket sheet, refresh exchange rates, and parse
/// everything into resolved event snapshots.
///
/// A failed rate refresh degrades to the static table (recorded as a quality
/// note on the result); only a failed feed download is an error.
pub async fn load_feed(
    feed: &FeedConfig,
    rates: &RateConfig,
    as_of: NaiveDate,
) -> Result<ParsedFeed, TourlensError> {
    let csv_text = FeedClient::new(feed.clone()).download().await?;

    let rate_client = RateClient::new(rates.clone());
    let (table, degraded) = rate_client.load().await;

    let mut parsed = FeedParser::new(table).parse(&csv_text, as_of)?;
    if let Some(note) = degraded {
        parsed.notes.push(note);
    }
    Ok(parsed)
}
