use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};
use crate::extractor::{collapse_whitespace, ActivityExtractor, ActivityRecord};

pub const CONTAINER_SELECTOR: &str = ".actividad";
pub const TITLE_SELECTOR: &str = ".titulo";
pub const DATE_SELECTOR: &str = ".fecha";
pub const PERIOD_SELECTOR: &str = ".periodo";

const DATE_JOIN: &str = " / ";

/// Reads activity blocks by class name: a container holding a title element,
/// one or more date elements and optional period elements.
pub struct SelectorExtractor {
    container: Selector,
    title: Selector,
    date: Selector,
    period: Selector,
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("invalid selector '{css}': {e}")))
}

impl SelectorExtractor {
    pub fn new(container: &str, title: &str, date: &str, period: &str) -> Result<Self> {
        Ok(Self {
            container: parse_selector(container)?,
            title: parse_selector(title)?,
            date: parse_selector(date)?,
            period: parse_selector(period)?,
        })
    }

    pub fn default_markup() -> Result<Self> {
        Self::new(CONTAINER_SELECTOR, TITLE_SELECTOR, DATE_SELECTOR, PERIOD_SELECTOR)
    }

    fn texts(&self, block: ElementRef<'_>, selector: &Selector) -> Vec<String> {
        block
            .select(selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect()
    }

    fn extract_block(&self, block: ElementRef<'_>, out: &mut Vec<ActivityRecord>) {
        let title = match block.select(&self.title).map(element_text).find(|t| !t.is_empty()) {
            Some(t) => t,
            None => return,
        };
        let dates = self.texts(block, &self.date);
        let periods = self.texts(block, &self.period);

        if periods.is_empty() {
            if let Some(record) = ActivityRecord::new(&title, &dates.join(DATE_JOIN), None) {
                out.push(record);
            }
            return;
        }

        for (i, date) in dates.iter().enumerate() {
            let period = periods.get(i).map(String::as_str);
            if let Some(record) = ActivityRecord::new(&title, date, period) {
                out.push(record);
            }
        }
    }
}

impl ActivityExtractor for SelectorExtractor {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn extract(&self, html: &str) -> Vec<ActivityRecord> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();

        for block in document.select(&self.container) {
            self.extract_block(block, &mut records);
        }

        tracing::debug!(count = records.len(), "selector extraction finished");
        records
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}
