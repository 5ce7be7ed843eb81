use std::env;
use std::time::Duration;

use crate::extractor::ExtractionPolicy;

pub const DEFAULT_URL: &str = "https://www.uniquindio.edu.co/actividades-por-subcategoria/4/consulta/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
pub const DEFAULT_MODALITY: &str = "presencial";
pub const CACHE_KEY: &str = "fechas_uniquindio";

pub const MIN_TIMEOUT_SECS: u64 = 10;
pub const MAX_TIMEOUT_SECS: u64 = 15;
const DEFAULT_TIMEOUT_SECS: u64 = 12;
const DEFAULT_TTL_SECS: u64 = 60 * 60 * 12;

#[derive(Clone, Debug)]
pub struct CalendarConfig {
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub cache_ttl: Duration,
    pub modality: String,
    pub extraction: ExtractionPolicy,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            modality: DEFAULT_MODALITY.to_string(),
            extraction: ExtractionPolicy::default(),
        }
    }
}

impl CalendarConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout_secs = env::var("FECHAS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let cache_ttl = env::var("FECHAS_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let extraction = match env::var("FECHAS_EXTRACTION") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "ignoring FECHAS_EXTRACTION");
                defaults.extraction
            }),
            Err(_) => defaults.extraction,
        };

        Self {
            url: env::var("FECHAS_URL").unwrap_or(defaults.url),
            timeout: clamp_timeout(timeout_secs),
            user_agent: env::var("FECHAS_USER_AGENT").unwrap_or(defaults.user_agent),
            cache_ttl,
            modality: env::var("FECHAS_MODALITY").unwrap_or(defaults.modality),
            extraction,
        }
    }
}

/// Outbound fetch timeout is kept within 10..=15 seconds.
pub fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
}
