use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScrapeError};
use crate::selector::SelectorExtractor;
use crate::text_scan::TextScanExtractor;

/// One academic-calendar entry read off the activities page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityRecord {
    pub title: String,
    pub date_text: String,
    pub period: Option<String>,
}

impl ActivityRecord {
    /// Builds a record from raw text, or `None` when title or date is blank
    /// after trimming.
    pub fn new(title: &str, date_text: &str, period: Option<&str>) -> Option<Self> {
        let title = collapse_whitespace(title);
        let date_text = collapse_whitespace(date_text);
        if title.is_empty() || date_text.is_empty() {
            return None;
        }
        let period = period
            .map(collapse_whitespace)
            .filter(|p| !p.is_empty());
        Some(Self {
            title,
            date_text,
            period,
        })
    }
}

pub trait ActivityExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, html: &str) -> Vec<ActivityRecord>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractionPolicy {
    Selector,
    TextScan,
    /// Selector first; text scan only when the selector finds nothing.
    #[default]
    Fallback,
}

impl fmt::Display for ExtractionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionPolicy::Selector => "selector",
            ExtractionPolicy::TextScan => "text-scan",
            ExtractionPolicy::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

impl FromStr for ExtractionPolicy {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "selector" | "css" => Ok(ExtractionPolicy::Selector),
            "text-scan" | "text" | "textscan" => Ok(ExtractionPolicy::TextScan),
            "fallback" | "auto" => Ok(ExtractionPolicy::Fallback),
            other => Err(ScrapeError::Parse(format!(
                "unknown extraction policy '{other}'"
            ))),
        }
    }
}

/// Runs the strategies a policy selects. Output always comes from a single
/// strategy, never a merge of both.
pub struct PolicyExtractor {
    policy: ExtractionPolicy,
    selector: SelectorExtractor,
    text_scan: TextScanExtractor,
}

impl PolicyExtractor {
    pub fn new(policy: ExtractionPolicy) -> Result<Self> {
        Ok(Self {
            policy,
            selector: SelectorExtractor::default_markup()?,
            text_scan: TextScanExtractor::default(),
        })
    }
}

impl ActivityExtractor for PolicyExtractor {
    fn name(&self) -> &'static str {
        match self.policy {
            ExtractionPolicy::Selector => self.selector.name(),
            ExtractionPolicy::TextScan => self.text_scan.name(),
            ExtractionPolicy::Fallback => "fallback",
        }
    }

    fn extract(&self, html: &str) -> Vec<ActivityRecord> {
        match self.policy {
            ExtractionPolicy::Selector => self.selector.extract(html),
            ExtractionPolicy::TextScan => self.text_scan.extract(html),
            ExtractionPolicy::Fallback => {
                let records = self.selector.extract(html);
                if !records.is_empty() {
                    return records;
                }
                tracing::info!("selector found no activities, falling back to text scan");
                self.text_scan.extract(html)
            }
        }
    }
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}
