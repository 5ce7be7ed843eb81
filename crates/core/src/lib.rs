use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PROJECT_NAME: &str = "fechas-uniquindio";
pub const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Intent name used when the request carries none.
pub const UNKNOWN_INTENT: &str = "Desconocido";

#[derive(Debug, Serialize)]
pub struct HealthStatus<'a> {
    pub status: &'a str,
    pub service: &'a str,
    pub version: &'a str,
}

pub fn health_status(service: &'static str) -> HealthStatus<'static> {
    HealthStatus {
        status: "ok",
        service,
        version: PROJECT_VERSION,
    }
}

#[derive(Debug, Serialize)]
pub struct VersionResponse<'a> {
    pub service: &'a str,
    pub project: &'a str,
    pub version: &'a str,
}

/// Inbound Dialogflow fulfillment request. Only the fields the webhook
/// reads are modelled; everything else is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub query_result: Option<QueryResult>,
    #[serde(default)]
    pub original_detect_intent_request: Option<OriginalRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub query_text: Option<String>,
    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OriginalRequest {
    #[serde(default)]
    pub source: Option<String>,
}

impl WebhookRequest {
    /// Lenient parse: anything that is not a valid request body is treated
    /// as a request without an intent.
    pub fn from_slice(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    pub fn intent_name(&self) -> &str {
        self.query_result
            .as_ref()
            .and_then(|q| q.intent.as_ref())
            .and_then(|i| i.display_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_INTENT)
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query_result.as_ref()?.query_text.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.original_detect_intent_request
            .as_ref()?
            .source
            .as_deref()
    }
}

/// Outbound fulfillment. `fulfillmentMessages` repeats the text for channel
/// renderers that ignore `fulfillmentText`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_text: String,
    pub fulfillment_messages: Vec<FulfillmentMessage>,
}

#[derive(Debug, Serialize)]
pub struct FulfillmentMessage {
    pub text: MessageText,
}

#[derive(Debug, Serialize)]
pub struct MessageText {
    pub text: Vec<String>,
}

impl WebhookResponse {
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            fulfillment_messages: vec![FulfillmentMessage {
                text: MessageText {
                    text: vec![text.clone()],
                },
            }],
            fulfillment_text: text,
        }
    }
}

/// Body of `GET /fechas`.
#[derive(Debug, Serialize)]
pub struct FechasResponse {
    pub mensaje: String,
    pub source: String,
    pub checked_at: String,
}

pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}
