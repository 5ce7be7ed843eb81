pub const DEFAULT_INTENT_KEYWORD: &str = "fecha";

/// Matches intents by case-insensitive substring, so `Fechas-Academicas`,
/// `consultar_fecha` and `FECHAS` all reach the calendar.
#[derive(Clone, Debug)]
pub struct IntentMatcher {
    keyword: String,
}

impl Default for IntentMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_INTENT_KEYWORD)
    }
}

impl IntentMatcher {
    pub fn new(keyword: &str) -> Self {
        let keyword = keyword.trim().to_lowercase();
        let keyword = if keyword.is_empty() {
            DEFAULT_INTENT_KEYWORD.to_string()
        } else {
            keyword
        };
        Self { keyword }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn matches(&self, intent: &str) -> bool {
        intent.to_lowercase().contains(&self.keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_ignores_case() {
        let m = IntentMatcher::default();
        assert!(m.matches("Fechas-Academicas"));
        assert!(m.matches("consultar_FECHA"));
        assert!(!m.matches("Saludo"));
        assert!(!m.matches("Desconocido"));
    }

    #[test]
    fn blank_keyword_falls_back_to_default() {
        assert_eq!(IntentMatcher::new("   ").keyword(), DEFAULT_INTENT_KEYWORD);
        assert_eq!(IntentMatcher::new(" Calendario ").keyword(), "calendario");
    }
}
