use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use fechas_calendar::{messages, CalendarConfig, CalendarReply, CalendarService, ResponseCache};
use fechas_core::{
    health_status, new_request_id, FechasResponse, HealthStatus, VersionResponse,
    WebhookRequest, WebhookResponse, PROJECT_NAME, PROJECT_VERSION,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use std::{env, net::SocketAddr};
use tokio::net::TcpListener;
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod intent;

use intent::{IntentMatcher, DEFAULT_INTENT_KEYWORD};

const SERVICE_NAME: &str = "fechas-webhook";

/// Upper bound on a buffered webhook body. Anything larger is answered as an
/// unrecognized intent.
const MAX_WEBHOOK_BODY: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub calendar: Arc<CalendarService>,
    pub intents: IntentMatcher,
    pub metrics: Option<PrometheusHandle>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = AppConfig::from_env();
    let metrics = init_metrics();

    // Lives for the whole process; nothing is persisted.
    let cache = Arc::new(ResponseCache::new());
    let calendar = CalendarService::from_config(&cfg.calendar, cache)
        .context("failed to build calendar service")?;

    tracing::info!(
        url = %cfg.calendar.url,
        timeout_secs = cfg.calendar.timeout.as_secs(),
        ttl_secs = cfg.calendar.cache_ttl.as_secs(),
        extraction = %cfg.calendar.extraction,
        intent_keyword = %cfg.intent_keyword,
        "calendar configured"
    );

    let state = AppState {
        intents: IntentMatcher::new(&cfg.intent_keyword),
        calendar: Arc::new(calendar),
        metrics,
    };

    let app = build_router(state);
    let addr: SocketAddr = cfg
        .bind_addr()
        .parse()
        .with_context(|| format!("HOST/PORT must form a socket address, got {}", cfg.bind_addr()))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}. Hint: set PORT=3001"))?;

    tracing::info!(
        %addr,
        service = SERVICE_NAME,
        project = PROJECT_NAME,
        env = %cfg.run_env,
        "listening"
    );

    axum::serve(listener, app)
        .await
        .context("server error while serving requests")
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/v1/version", get(version))
        .route("/metrics", get(metrics_handler))
        .route("/fechas", get(fechas))
        .route("/webhook", post(webhook))
        .with_state(state)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_metrics() -> Option<PrometheusHandle> {
    match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "failed to install Prometheus recorder");
            None
        }
    }
}

async fn index() -> &'static str {
    messages::WEBHOOK_ACTIVE
}

async fn health() -> Json<HealthStatus<'static>> {
    Json(health_status(SERVICE_NAME))
}

async fn version() -> Json<VersionResponse<'static>> {
    Json(VersionResponse {
        service: SERVICE_NAME,
        project: PROJECT_NAME,
        version: PROJECT_VERSION,
    })
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::OK,
            "# Metrics endpoint\n# Prometheus recorder not installed\n".to_string(),
        ),
    }
}

/// Runs the calendar pipeline on its own task so a panic inside it turns
/// into a reply instead of a dropped connection.
async fn calendar_reply(state: &AppState) -> CalendarReply {
    let calendar = state.calendar.clone();
    let reply = match tokio::spawn(async move { calendar.respond().await }).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "calendar task failed");
            CalendarReply {
                text: messages::INTERNAL_ERROR.to_string(),
                source: fechas_calendar::ResponseSource::Unavailable,
            }
        }
    };
    counter!("calendar_responses_total", "source" => reply.source.as_str()).increment(1);
    reply
}

/// Dialogflow fulfillment. Always answers 200 with a fulfillment text; the
/// body is parsed leniently so malformed requests get the "not recognized"
/// reply rather than a rejection.
async fn webhook(State(state): State<AppState>, body: Body) -> Json<WebhookResponse> {
    let start = Instant::now();
    let req = match to_bytes(body, MAX_WEBHOOK_BODY).await {
        Ok(bytes) => WebhookRequest::from_slice(&bytes),
        Err(e) => {
            tracing::warn!(error = %e, limit = MAX_WEBHOOK_BODY, "webhook body unreadable");
            WebhookRequest::default()
        }
    };
    let intent = req.intent_name().to_string();

    let span = tracing::info_span!(
        "webhook",
        request_id = %new_request_id(),
        intent = %intent,
        session = req.session.as_deref().unwrap_or(""),
        source = req.source().unwrap_or("unknown"),
    );

    async move {
        tracing::info!(query = req.query_text().unwrap_or(""), "intent received");

        let text = if state.intents.matches(&intent) {
            counter!("webhook_requests_total", "intent" => "matched").increment(1);
            let reply = calendar_reply(&state).await;
            tracing::info!(source = %reply.source, chars = reply.text.len(), "sending fulfillment");
            reply.text
        } else {
            counter!("webhook_requests_total", "intent" => "unmatched").increment(1);
            tracing::info!(keyword = state.intents.keyword(), "intent not recognized");
            messages::INTENT_NOT_RECOGNIZED.to_string()
        };

        histogram!("webhook_latency_seconds").record(start.elapsed().as_secs_f64());
        Json(WebhookResponse::text(text))
    }
    .instrument(span)
    .await
}

/// Plain HTTP view of the same reply, without intent matching.
async fn fechas(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let reply = calendar_reply(&state).await;
    let response = FechasResponse {
        mensaje: reply.text,
        source: reply.source.to_string(),
        checked_at: Utc::now().to_rfc3339(),
    };
    format_response(&headers, &response)
}

fn format_response<T: Serialize>(headers: &HeaderMap, response: &T) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json");

    if accept.contains("yaml") {
        let yaml = serde_yaml::to_string(response).unwrap_or_default();
        ([(header::CONTENT_TYPE, "application/x-yaml")], yaml).into_response()
    } else {
        let json = serde_json::to_string_pretty(response).unwrap_or_default();
        ([(header::CONTENT_TYPE, "application/json")], json).into_response()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub run_env: String,
    pub intent_keyword: String,
    pub calendar: CalendarConfig,
}

impl AppConfig {
    fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            run_env: env::var("RUN_ENV").unwrap_or_else(|_| "local".to_string()),
            intent_keyword: env::var("INTENT_KEYWORD")
                .unwrap_or_else(|_| DEFAULT_INTENT_KEYWORD.to_string()),
            calendar: CalendarConfig::from_env(),
        }
    }

    fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use chrono::Datelike;
    use fechas_calendar::{HtmlFetcher, StaticPage, CACHE_KEY};
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_with(calendar: CalendarService) -> AppState {
        AppState {
            calendar: Arc::new(calendar),
            intents: IntentMatcher::default(),
            metrics: None,
        }
    }

    fn static_state(html: &str) -> AppState {
        let cfg = CalendarConfig::default();
        let calendar = CalendarService::with_source(
            &cfg,
            Arc::new(StaticPage::new(html)),
            Arc::new(ResponseCache::new()),
        )
        .unwrap();
        state_with(calendar)
    }

    async fn unreachable_state(cache: Arc<ResponseCache>) -> AppState {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let cfg = CalendarConfig {
            url: format!("http://{addr}/consulta/"),
            ..CalendarConfig::default()
        };
        let fetcher = HtmlFetcher::from_config(&cfg).unwrap();
        state_with(CalendarService::with_source(&cfg, Arc::new(fetcher), cache).unwrap())
    }

    fn current_year_page() -> String {
        let year = chrono::Local::now().year();
        format!(
            r#"
            <div class="actividad">
              <span class="titulo">Inicio de clases</span>
              <span class="fecha">3 de febrero de {year}</span>
            </div>
            <div class="actividad">
              <span class="titulo">Ceremonia de grados</span>
              <span class="fecha">20 de junio de {year}</span>
            </div>
            "#
        )
    }

    fn webhook_request(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn intent_body(name: &str) -> String {
        serde_json::json!({
            "queryResult": {
                "queryText": "¿cuándo empiezan las clases?",
                "intent": { "displayName": name }
            },
            "originalDetectIntentRequest": { "source": "telegram" }
        })
        .to_string()
    }

    async fn fulfillment(res: Response) -> String {
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["fulfillmentMessages"][0]["text"]["text"][0], json["fulfillmentText"]);
        let text = json["fulfillmentText"].as_str().unwrap().to_string();
        assert!(!text.is_empty());
        text
    }

    #[tokio::test]
    async fn index_reports_alive() {
        let app = build_router(static_state(""));
        let res = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], messages::WEBHOOK_ACTIVE.as_bytes());
    }

    #[tokio::test]
    async fn health_ok() {
        let app = build_router(static_state(""));
        let res = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_intent_is_not_recognized() {
        let app = build_router(static_state(&current_year_page()));
        let res = app.oneshot(webhook_request(intent_body("Saludo"))).await.unwrap();
        assert_eq!(fulfillment(res).await, messages::INTENT_NOT_RECOGNIZED);
    }

    #[tokio::test]
    async fn malformed_body_still_answers() {
        let app = build_router(static_state(&current_year_page()));
        let res = app.oneshot(webhook_request("{not json")).await.unwrap();
        assert_eq!(fulfillment(res).await, messages::INTENT_NOT_RECOGNIZED);
    }

    #[tokio::test]
    async fn oversized_body_still_answers() {
        let app = build_router(static_state(&current_year_page()));
        let mut body = intent_body("Fechas");
        body.push_str(&" ".repeat(3 * 1024 * 1024));
        let res = app.oneshot(webhook_request(body)).await.unwrap();
        assert!(fulfillment(res).await.contains("Inicio de clases"));
    }

    #[tokio::test]
    async fn body_past_the_limit_is_not_recognized() {
        let app = build_router(static_state(&current_year_page()));
        let mut body = intent_body("Fechas");
        body.push_str(&" ".repeat(MAX_WEBHOOK_BODY));
        let res = app.oneshot(webhook_request(body)).await.unwrap();
        assert_eq!(fulfillment(res).await, messages::INTENT_NOT_RECOGNIZED);
    }

    #[tokio::test]
    async fn date_intent_returns_activities() {
        let app = build_router(static_state(&current_year_page()));
        let res = app
            .oneshot(webhook_request(intent_body("Fechas-Academicas")))
            .await
            .unwrap();
        let text = fulfillment(res).await;
        assert!(text.contains("Inicio de clases"));
        assert!(text.contains("Ceremonia de grados"));
    }

    #[tokio::test]
    async fn unreachable_site_still_answers_200() {
        let state = unreachable_state(Arc::new(ResponseCache::new())).await;
        let app = build_router(state);
        let res = app
            .oneshot(webhook_request(intent_body("consultar_fecha")))
            .await
            .unwrap();
        assert_eq!(fulfillment(res).await, messages::UNAVAILABLE);
    }

    #[tokio::test]
    async fn unreachable_site_serves_previous_reply() {
        let cache = Arc::new(ResponseCache::new());
        cache.set(CACHE_KEY, "📅 Fechas anteriores", Duration::ZERO);
        let app = build_router(unreachable_state(cache).await);
        let res = app
            .oneshot(webhook_request(intent_body("FECHAS")))
            .await
            .unwrap();
        let text = fulfillment(res).await;
        assert!(text.starts_with(messages::STALE_DISCLAIMER));
        assert!(text.contains("📅 Fechas anteriores"));
    }

    #[tokio::test]
    async fn fechas_endpoint_returns_mensaje() {
        let app = build_router(static_state(&current_year_page()));
        let res = app
            .oneshot(Request::builder().uri("/fechas").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["mensaje"].as_str().unwrap().contains("Inicio de clases"));
        assert_eq!(json["source"], "fresh");
    }

    #[tokio::test]
    async fn fechas_endpoint_speaks_yaml() {
        let app = build_router(static_state("<p>sin actividades</p>"));
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/fechas")
                    .header("accept", "application/x-yaml")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/x-yaml");
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("source: empty"));
    }
}
