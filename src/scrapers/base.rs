use crate::errors::Result;
use crate::models::suspension::Market;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

/// How a data source handles the requested date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSupport {
    /// Accepts begin/end dates in one request
    Native,
    /// Accepts a single day per request; the service expands the window
    /// and calls once per calendar day
    DayByDay,
    /// Accepts a single day and the window must not span days
    SingleDayOnly,
}

/// Base trait for suspension data scrapers
#[async_trait]
pub trait SuspensionScraper {
    /// Get the source code this scraper is for
    fn source_code(&self) -> &'static str;

    /// Market the fetched records belong to
    fn market(&self) -> Market;

    /// How this source handles date windows
    fn range_support(&self) -> RangeSupport;

    /// Fetch raw suspension rows for the given date window.
    /// Rows keep the provider's own field names; mapping onto the
    /// canonical schema happens in the normalizer.
    async fn fetch_range(&self, date_begin: &NaiveDate, date_end: &NaiveDate)
        -> Result<Vec<Value>>;
}
