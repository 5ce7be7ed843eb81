use crate::extractor::ActivityRecord;

/// Label for records that carry no academic period.
pub const NO_PERIOD: &str = "N/A";

/// Records grouped by period label. Groups keep the order in which their
/// label first appeared; records keep extraction order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeriodGroups {
    groups: Vec<(String, Vec<ActivityRecord>)>,
}

impl PeriodGroups {
    pub fn push(&mut self, label: &str, record: ActivityRecord) {
        match self.groups.iter_mut().find(|(l, _)| l == label) {
            Some((_, records)) => records.push(record),
            None => self.groups.push((label.to_string(), vec![record])),
        }
    }

    pub fn get(&self, label: &str) -> Option<&[ActivityRecord]> {
        self.groups
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, records)| records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ActivityRecord])> {
        self.groups
            .iter()
            .map(|(label, records)| (label.as_str(), records.as_slice()))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.groups.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|(_, r)| r.len()).sum()
    }

    /// True when every record sits in the `N/A` group.
    pub fn is_unperiodized(&self) -> bool {
        self.groups.len() == 1 && self.groups[0].0 == NO_PERIOD
    }
}

pub fn group_by_period(records: Vec<ActivityRecord>) -> PeriodGroups {
    let mut groups = PeriodGroups::default();
    for record in records {
        let label = record.period.clone().unwrap_or_else(|| NO_PERIOD.to_string());
        groups.push(&label, record);
    }
    groups
}

/// Keeps what belongs to `year`. A group whose label names the year is kept
/// whole; any other group keeps only records whose date names the year, and
/// is dropped when none do.
pub fn filter_year(groups: &PeriodGroups, year: i32) -> PeriodGroups {
    let needle = year.to_string();
    let mut kept = PeriodGroups::default();

    for (label, records) in groups.iter() {
        let label_matches = label.contains(&needle);
        for record in records {
            if label_matches || record.date_text.contains(&needle) {
                kept.push(label, record.clone());
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, date: &str, period: Option<&str>) -> ActivityRecord {
        ActivityRecord::new(title, date, period).unwrap()
    }

    #[test]
    fn groups_by_period_in_first_seen_order() {
        let groups = group_by_period(vec![
            rec("Inicio de clases", "3 de febrero de 2025", Some("2025-1")),
            rec("Ceremonia de grados", "20 de junio de 2025", None),
            rec("Inicio de clases", "4 de agosto de 2025", Some("2025-2")),
            rec("Exámenes finales", "2 de junio de 2025", Some("2025-1")),
        ]);

        assert_eq!(groups.labels(), vec!["2025-1", NO_PERIOD, "2025-2"]);
        let first = groups.get("2025-1").unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].title, "Inicio de clases");
        assert_eq!(first[1].title, "Exámenes finales");
        assert_eq!(groups.record_count(), 4);
        assert!(!groups.is_unperiodized());
    }

    #[test]
    fn records_without_period_fall_under_na() {
        let groups = group_by_period(vec![rec("Grados", "20 de junio de 2025", None)]);
        assert!(groups.is_unperiodized());
        assert_eq!(groups.get(NO_PERIOD).unwrap().len(), 1);
    }

    #[test]
    fn filter_keeps_only_current_year_records() {
        let groups = group_by_period(vec![
            rec("Matrículas", "10 de enero de 2025", None),
            rec("Matrículas", "12 de enero de 2024", None),
            rec("Inicio de clases", "5 de febrero de 2024", Some("2024-1")),
        ]);

        let filtered = filter_year(&groups, 2025);
        assert_eq!(filtered.labels(), vec![NO_PERIOD]);
        let records = filtered.get(NO_PERIOD).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_text, "10 de enero de 2025");
    }

    #[test]
    fn period_label_with_year_keeps_whole_group() {
        let groups = group_by_period(vec![
            rec("Inducción", "Semana 1", Some("2025-1")),
            rec("Vacaciones", "15 de diciembre", Some("2025-1")),
        ]);
        let filtered = filter_year(&groups, 2025);
        assert_eq!(filtered.record_count(), 2);
        assert!(filter_year(&groups, 2026).is_empty());
    }
}
