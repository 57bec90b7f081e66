use crate::alert::AlertRecord;
use crate::notifier::{Notifier, NotifyReport, Skipped};
use crate::sender::SmsSender;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    Create,
    Update,
    Delete,
}

/// DocumentEvent is delivered by the hosting platform for each change to a
/// document of the store. Only `create` events of the alerts collection are acted upon.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEvent {
    pub event_type: EventType,
    /// Path of the changed document, like `alerts/{alertId}`.
    pub document: String,
    /// Snapshot of the document after the change, if it exists.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handled {
    pub alert_id: String,
    #[serde(flatten)]
    pub report: NotifyReport,
}

struct App<S> {
    notifier: Arc<Notifier<S>>,
    collection: String,
}

/// Build the router through which the hosting platform delivers document events.
pub fn build_router<S: SmsSender>(
    notifier: Arc<Notifier<S>>,
    collection: impl Into<String>,
) -> axum::Router {
    let app = Arc::new(App {
        notifier,
        collection: collection.into(),
    });

    axum::Router::new()
        .route("/v1/events", axum::routing::post(handle_event::<S>))
        .with_state(app)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Match `document` against `{collection}/{alertId}`, returning the alert ID.
/// Fully-qualified resource names (`projects/.../documents/alerts/{alertId}`)
/// are matched on their part following `/documents/`.
pub fn match_document<'d>(collection: &str, document: &'d str) -> Option<&'d str> {
    const DOCUMENTS: &str = "/documents/";

    let relative = match document.rfind(DOCUMENTS) {
        Some(ind) => &document[ind + DOCUMENTS.len()..],
        None => document,
    };
    let alert_id = relative.strip_prefix(collection)?.strip_prefix('/')?;

    if alert_id.is_empty() || alert_id.contains('/') {
        None
    } else {
        Some(alert_id)
    }
}

#[tracing::instrument(skip_all, fields(alert_id))]
async fn handle_event<S: SmsSender>(
    State(app): State<Arc<App<S>>>,
    Json(event): Json<DocumentEvent>,
) -> Response {
    let DocumentEvent {
        event_type,
        document,
        value,
    } = event;

    if event_type != EventType::Create {
        tracing::debug!(?event_type, %document, "ignoring non-create event");
        return StatusCode::NO_CONTENT.into_response();
    }
    let Some(alert_id) = match_document(&app.collection, &document) else {
        tracing::debug!(%document, collection = %app.collection, "ignoring event of another collection");
        return StatusCode::NO_CONTENT.into_response();
    };
    tracing::Span::current().record("alert_id", alert_id);

    let report = match value.map(serde_json::from_value::<AlertRecord>) {
        None => app.notifier.notify(None).await,
        Some(Ok(record)) => app.notifier.notify(Some(&record)).await,
        Some(Err(error)) => {
            tracing::warn!(%error, "failed to decode alert record, skipping");
            NotifyReport::skipped(Skipped::MalformedRecord)
        }
    };

    Json(Handled {
        alert_id: alert_id.to_string(),
        report,
    })
    .into_response()
}
