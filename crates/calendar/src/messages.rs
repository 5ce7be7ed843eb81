//! User-facing replies. The bot answers in Spanish.

pub const STALE_DISCLAIMER: &str = "⚠️ No se pudo actualizar, mostrando la información anterior:";
pub const UNAVAILABLE: &str =
    "Lo siento, no pude acceder a las fechas académicas de la Universidad del Quindío.";
pub const NO_DATES_FOUND: &str =
    "⚠️ No se encontraron fechas en el sitio de la Universidad del Quindío.";
pub const INTENT_NOT_RECOGNIZED: &str =
    "No encontré información sobre esa intención (intent no reconocido).";
pub const WEBHOOK_ACTIVE: &str = "✅ Webhook del Chatbot Universidad del Quindío está activo.";

pub fn no_dates_for_year(year: i32) -> String {
    format!("⚠️ No se encontraron fechas académicas para el año {year}.")
}

pub fn stale(previous: &str) -> String {
    format!("{STALE_DISCLAIMER}\n{previous}")
}
pub const INTERNAL_ERROR: &str = "Ocurrió un error interno en el servidor del webhook.";
