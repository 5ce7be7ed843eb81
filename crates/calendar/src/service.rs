use chrono::Datelike;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::config::{CalendarConfig, CACHE_KEY};
use crate::error::{Result, ScrapeError};
use crate::extractor::{ActivityExtractor, PolicyExtractor};
use crate::fetcher::{HtmlFetcher, PageSource};
use crate::formatter::{Rendered, ResponseFormatter};
use crate::grouping::{filter_year, group_by_period};
use crate::messages;

/// Where a reply came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseSource {
    /// Fresh cache hit, no fetch.
    Cache,
    /// Fetched, formatted and cached.
    Fresh,
    /// Fetched, but nothing to show (not cached).
    Empty,
    /// Refresh failed, previous reply served with a disclaimer.
    Stale,
    /// Refresh failed and nothing was cached.
    Unavailable,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Fresh => "fresh",
            ResponseSource::Empty => "empty",
            ResponseSource::Stale => "stale",
            ResponseSource::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarReply {
    pub text: String,
    pub source: ResponseSource,
}

/// Fetch → extract → group/filter → format pipeline, fronted by the cache.
pub struct CalendarService {
    source: Arc<dyn PageSource>,
    extractor: Box<dyn ActivityExtractor>,
    formatter: ResponseFormatter,
    cache: Arc<ResponseCache>,
    ttl: Duration,
}

impl CalendarService {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: Box<dyn ActivityExtractor>,
        formatter: ResponseFormatter,
        cache: Arc<ResponseCache>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            extractor,
            formatter,
            cache,
            ttl,
        }
    }

    /// Service reading the live page as configured.
    pub fn from_config(cfg: &CalendarConfig, cache: Arc<ResponseCache>) -> Result<Self> {
        let fetcher = HtmlFetcher::from_config(cfg)?;
        Self::with_source(cfg, Arc::new(fetcher), cache)
    }

    pub fn with_source(
        cfg: &CalendarConfig,
        source: Arc<dyn PageSource>,
        cache: Arc<ResponseCache>,
    ) -> Result<Self> {
        Ok(Self::new(
            source,
            Box::new(PolicyExtractor::new(cfg.extraction)?),
            ResponseFormatter::new(cfg.modality.clone()),
            cache,
            cfg.cache_ttl,
        ))
    }

    /// Reply for the current calendar year.
    pub async fn respond(&self) -> CalendarReply {
        self.respond_for_year(chrono::Local::now().year()).await
    }

    /// Always yields non-empty text: fresh cache, then a refresh, then the
    /// stale cached reply, then a fixed apology.
    pub async fn respond_for_year(&self, year: i32) -> CalendarReply {
        if let Some(text) = self.cache.get_fresh(CACHE_KEY) {
            tracing::info!(key = CACHE_KEY, "serving activities from cache");
            return CalendarReply {
                text,
                source: ResponseSource::Cache,
            };
        }

        match self.refresh(year).await {
            Ok(Rendered::Text(text)) => {
                self.cache.set(CACHE_KEY, text.clone(), self.ttl);
                tracing::info!(key = CACHE_KEY, ttl_secs = self.ttl.as_secs(), "cached fresh activities");
                CalendarReply {
                    text,
                    source: ResponseSource::Fresh,
                }
            }
            Ok(Rendered::NoDatesThisYear(text)) => {
                tracing::info!(year, "no activities for the current year");
                CalendarReply {
                    text,
                    source: ResponseSource::Empty,
                }
            }
            Err(ScrapeError::NoDataFound) => {
                tracing::warn!(source = %self.source.describe(), "page held no activities");
                CalendarReply {
                    text: messages::NO_DATES_FOUND.to_string(),
                    source: ResponseSource::Empty,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to refresh activities");
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> CalendarReply {
        match self.cache.get_fallback(CACHE_KEY) {
            Some(previous) => {
                let age_secs = self.cache.age(CACHE_KEY).map(|a| a.as_secs()).unwrap_or_default();
                tracing::warn!(age_secs, "serving stale activities");
                CalendarReply {
                    text: messages::stale(&previous),
                    source: ResponseSource::Stale,
                }
            }
            None => CalendarReply {
                text: messages::UNAVAILABLE.to_string(),
                source: ResponseSource::Unavailable,
            },
        }
    }

    /// One uncached pass through the pipeline.
    pub async fn refresh(&self, year: i32) -> Result<Rendered> {
        let html = self.source.fetch().await?;
        let records = self.extractor.extract(&html);
        tracing::info!(
            strategy = self.extractor.name(),
            count = records.len(),
            "extracted activities"
        );
        if records.is_empty() {
            return Err(ScrapeError::NoDataFound);
        }

        let grouped = group_by_period(records);
        let current = filter_year(&grouped, year);
        tracing::debug!(
            periods = grouped.len(),
            kept = current.record_count(),
            year,
            "filtered activities"
        );
        Ok(self.formatter.render(&current, year))
    }
}
