use regex::Regex;
use scraper::{node::Node, Html};
use std::sync::LazyLock;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::extractor::{collapse_whitespace, has_digit, ActivityExtractor, ActivityRecord};

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template", "svg"];

/// Phrasing elements whose text joins the surrounding line.
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "cite", "code", "em", "i", "mark", "small", "span", "strong", "sub", "sup",
    "time", "u",
];

/// Site furniture matched against the whole (folded) line.
const FURNITURE_EXACT: &[&str] = &[
    "es", "en", "english", "espanol", "idioma", "buscar", "search", "menu", "inicio", "cerrar",
    "ir", "enviar",
];

/// Site furniture matched anywhere in the (folded) line.
const FURNITURE_PHRASES: &[&str] = &[
    "saltar al contenido",
    "ir al contenido",
    "accesibilidad",
    "alto contraste",
    "aumentar texto",
    "disminuir texto",
    "aumentar letra",
    "disminuir letra",
    "tamano de letra",
    "escala de grises",
    "que estas buscando",
    "escribe tu busqueda",
    "buscar en el sitio",
    "campus virtual",
    "correo institucional",
    "portal estudiantil",
    "portal docente",
    "portal de egresados",
    "iniciar sesion",
    "telefono",
    "pbx",
    "linea gratuita",
    "linea de atencion",
    "contactenos",
    "contacto",
    "whatsapp",
    "atencion al ciudadano",
    "notificaciones judiciales",
    "todos los derechos reservados",
    "politica de privacidad",
    "politica de tratamiento",
    "mapa del sitio",
];

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+\d{1,3}\s?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}$").expect("valid phone pattern")
});

/// Reads activities from the page's visible text when no stable markup
/// exists. A digit-free line longer than five characters opens an activity;
/// the digit-bearing lines after it are consumed as (date, period) pairs.
pub struct TextScanExtractor {
    min_title_chars: usize,
}

impl Default for TextScanExtractor {
    fn default() -> Self {
        Self { min_title_chars: 5 }
    }
}

impl TextScanExtractor {
    pub fn is_furniture(&self, line: &str) -> bool {
        let folded = fold(line);
        if FURNITURE_EXACT.contains(&folded.as_str()) {
            return true;
        }
        if FURNITURE_PHRASES.iter().any(|p| folded.contains(p)) {
            return true;
        }
        if !line.contains(' ') && line.contains('@') {
            return true;
        }
        PHONE.is_match(line)
    }

    /// Visible text in document order, one trimmed line per entry, with site
    /// furniture removed. Text inside inline markup stays on its block's line.
    pub fn visible_lines(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut lines = Vec::new();
        let mut block = None;
        let mut buffer = String::new();

        for node in document.root_element().descendants() {
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if hidden {
                continue;
            }
            let text = match node.value() {
                Node::Text(text) => &**text,
                Node::Element(el) if el.name() == "br" => "\n",
                _ => continue,
            };

            let owner = node
                .ancestors()
                .find(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|el| !INLINE_ELEMENTS.contains(&el.name()))
                })
                .map(|a| a.id());
            if owner != block {
                self.flush(&mut buffer, &mut lines);
                block = owner;
            }
            buffer.push_str(text);
        }
        self.flush(&mut buffer, &mut lines);

        lines
    }

    fn flush(&self, buffer: &mut String, lines: &mut Vec<String>) {
        for raw in buffer.lines() {
            let line = collapse_whitespace(raw);
            if line.is_empty() || self.is_furniture(&line) {
                continue;
            }
            lines.push(line);
        }
        buffer.clear();
    }

    fn is_title(&self, line: &str) -> bool {
        !has_digit(line) && line.chars().count() > self.min_title_chars
    }

    pub fn scan_lines(&self, lines: &[String]) -> Vec<ActivityRecord> {
        let mut records = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if !self.is_title(&lines[i]) {
                i += 1;
                continue;
            }
            let title = &lines[i];
            let mut j = i + 1;
            while j < lines.len() && has_digit(&lines[j]) {
                let date = &lines[j];
                let period = lines.get(j + 1).filter(|next| has_digit(next));
                j += if period.is_some() { 2 } else { 1 };
                if let Some(record) = ActivityRecord::new(title, date, period.map(String::as_str)) {
                    records.push(record);
                }
            }
            i = j;
        }

        records
    }
}

impl ActivityExtractor for TextScanExtractor {
    fn name(&self) -> &'static str {
        "text-scan"
    }

    fn extract(&self, html: &str) -> Vec<ActivityRecord> {
        let lines = self.visible_lines(html);
        let records = self.scan_lines(&lines);
        tracing::debug!(lines = lines.len(), count = records.len(), "text scan finished");
        records
    }
}

/// Lowercase, accent-free, single-spaced form used for furniture matching.
pub fn fold(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("  Línea   Gratuita "), "linea gratuita");
        assert_eq!(fold("Teléfono"), "telefono");
    }

    #[test]
    fn furniture_lines_are_recognised() {
        let ex = TextScanExtractor::default();
        assert!(ex.is_furniture("Saltar al contenido principal"));
        assert!(ex.is_furniture("English"));
        assert!(ex.is_furniture("Campus Virtual"));
        assert!(ex.is_furniture("PBX: (606) 735 9300"));
        assert!(ex.is_furniture("(606) 735 9300"));
        assert!(ex.is_furniture("contactenos@uniquindio.edu.co"));
        assert!(!ex.is_furniture("Curso de español para extranjeros"));
        assert!(!ex.is_furniture("15 de enero de 2025"));
        assert!(!ex.is_furniture("2025-1"));
    }

    #[test]
    fn scan_pairs_dates_with_periods() {
        let ex = TextScanExtractor::default();
        let records = ex.scan_lines(&lines(&[
            "Inicio de clases",
            "3 de febrero de 2025",
            "2025-1",
            "4 de agosto de 2025",
            "2025-2",
            "Ceremonia de grados",
            "20 de junio de 2025",
        ]));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "Inicio de clases");
        assert_eq!(records[0].period.as_deref(), Some("2025-1"));
        assert_eq!(records[1].date_text, "4 de agosto de 2025");
        assert_eq!(records[1].period.as_deref(), Some("2025-2"));
        assert_eq!(records[2].title, "Ceremonia de grados");
        assert_eq!(records[2].period, None);
    }

    #[test]
    fn short_or_dateless_titles_produce_nothing() {
        let ex = TextScanExtractor::default();
        let records = ex.scan_lines(&lines(&[
            "Notas",
            "12 de mayo de 2025",
            "Calendario académico",
            "Otra sección sin fechas",
        ]));
        assert!(records.is_empty());
    }

    #[test]
    fn visible_lines_skip_scripts_and_furniture() {
        let html = r#"
            <html>
              <head><title>Actividades por subcategoría</title></head>
              <body>
                <nav>Saltar al contenido</nav>
                <div>Buscar</div>
                <script>var year = 2025;</script>
                <section>
                  <h2>Matrículas académicas</h2>
                  <p>27 al 31 de enero de 2025</p>
                  <p>2025-1</p>
                </section>
                <footer>Teléfono: 606 735 9300</footer>
              </body>
            </html>
        "#;
        let ex = TextScanExtractor::default();
        assert_eq!(
            ex.visible_lines(html),
            vec!["Matrículas académicas", "27 al 31 de enero de 2025", "2025-1"]
        );

        let records = ex.extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Matrículas académicas");
        assert_eq!(records[0].date_text, "27 al 31 de enero de 2025");
        assert_eq!(records[0].period.as_deref(), Some("2025-1"));
    }

    #[test]
    fn inline_markup_stays_on_one_line() {
        let html = r#"
            <ul>
              <li><strong>Inicio de clases</strong> pregrado</li>
              <li>3 de <b>febrero</b> de <span>2025</span><br>2025-1</li>
            </ul>
        "#;
        let ex = TextScanExtractor::default();
        assert_eq!(
            ex.visible_lines(html),
            vec!["Inicio de clases pregrado", "3 de febrero de 2025", "2025-1"]
        );

        let records = ex.extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Inicio de clases pregrado");
        assert_eq!(records[0].date_text, "3 de febrero de 2025");
        assert_eq!(records[0].period.as_deref(), Some("2025-1"));
    }
}
