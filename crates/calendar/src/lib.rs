pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod formatter;
pub mod grouping;
pub mod messages;
pub mod selector;
pub mod service;
pub mod text_scan;

pub use cache::ResponseCache;
pub use config::{CalendarConfig, CACHE_KEY};
pub use error::ScrapeError;
pub use extractor::{ActivityExtractor, ActivityRecord, ExtractionPolicy, PolicyExtractor};
pub use fetcher::{HtmlFetcher, PageSource, StaticPage};
pub use formatter::{Rendered, ResponseFormatter};
pub use grouping::{filter_year, group_by_period, PeriodGroups, NO_PERIOD};
pub use selector::SelectorExtractor;
pub use service::{CalendarReply, CalendarService, ResponseSource};
pub use text_scan::TextScanExtractor;
