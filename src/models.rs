use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Fixed-width fetch timestamp, e.g. `Mon Jan 02 2006 3:4:5 UTC`.
const FETCH_TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day] [year] [hour repr:12 padding:none]:[minute padding:none]:[second padding:none] UTC"
);

/// Metadata kept for one downloaded page, keyed by its URL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub site: String,
    #[serde(rename = "num_links")]
    pub link_count: u64,
    #[serde(rename = "images")]
    pub image_count: u64,
    pub last_fetch: String,
}

impl PageRecord {

    pub fn new(site: impl Into<String>, link_count: u64, image_count: u64, last_fetch: String) -> Self {
        Self {
            site: site.into(),
            link_count,
            image_count,
            last_fetch,
        }
    }
}

/// Renders `at` in the store's timestamp format, converted to UTC first.
pub fn fetch_timestamp(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(FETCH_TIME_FORMAT)
        // the description only holds components every OffsetDateTime has
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn now_timestamp() -> String {
    fetch_timestamp(OffsetDateTime::now_utc())
}
