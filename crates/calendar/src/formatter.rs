use std::fmt::Write;

use crate::config::DEFAULT_MODALITY;
use crate::extractor::ActivityRecord;
use crate::grouping::PeriodGroups;
use crate::messages;

/// Outcome of rendering. Only `Text` is worth caching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    NoDatesThisYear(String),
}

impl Rendered {
    pub fn as_str(&self) -> &str {
        match self {
            Rendered::Text(s) | Rendered::NoDatesThisYear(s) => s,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResponseFormatter {
    modality: String,
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MODALITY)
    }
}

impl ResponseFormatter {
    pub fn new(modality: impl Into<String>) -> Self {
        Self {
            modality: modality.into(),
        }
    }

    fn header(&self, year: i32) -> String {
        format!("📅 Fechas académicas {year} (modalidad {}):", self.modality)
    }

    /// Renders already year-filtered groups. A lone `N/A` group is rendered
    /// flat, without a period heading.
    pub fn render(&self, groups: &PeriodGroups, year: i32) -> Rendered {
        if groups.record_count() == 0 {
            return Rendered::NoDatesThisYear(messages::no_dates_for_year(year));
        }
        if groups.is_unperiodized() {
            let records: Vec<ActivityRecord> = groups
                .iter()
                .flat_map(|(_, records)| records.iter().cloned())
                .collect();
            return Rendered::Text(self.render_flat(&records, year));
        }

        let mut out = self.header(year);
        out.push('\n');
        for (label, records) in groups.iter() {
            let _ = writeln!(out, "\n🗓️ Periodo {label}:");
            for record in records {
                let _ = writeln!(out, "• {}: {}", record.title, record.date_text);
            }
        }

        Rendered::Text(out.trim_end().to_string())
    }

    pub fn render_flat(&self, records: &[ActivityRecord], year: i32) -> String {
        if records.is_empty() {
            return messages::no_dates_for_year(year);
        }
        let mut out = self.header(year);
        for record in records {
            let _ = write!(out, "\n• {}: {}", record.title, record.date_text);
        }
        out.trim_end().to_string()
    }
}
