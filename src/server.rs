use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use crate::surface::{MapSnapshot, SharedMapState};
use crate::types::{SessionEvent, TrackableId};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub map: SharedMapState,
    pub events: mpsc::Sender<SessionEvent>,
}

type ApiError = (StatusCode, Json<Value>);

fn session_gone() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "tracking session is not running" })),
    )
}

// ---------- Handlers ----------

pub(crate) async fn get_state(State(state): State<AppState>) -> Json<MapSnapshot> {
    Json(state.map.snapshot())
}

/// The auto-center control: each click flips it.
pub(crate) async fn toggle_center(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let (tx, rx) = oneshot::channel();
    state
        .events
        .send(SessionEvent::ToggleCenter(Some(tx)))
        .await
        .map_err(|_| session_gone())?;
    let enabled = rx.await.map_err(|_| session_gone())?;

    Ok(Json(json!({ "auto_center": if enabled { "ON" } else { "OFF" } })))
}

#[derive(Deserialize, Debug)]
pub(crate) struct PrimaryRequest {
    id: Option<TrackableId>,
}

pub(crate) async fn select_primary(
    State(state): State<AppState>,
    Json(req): Json<PrimaryRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .events
        .send(SessionEvent::SelectPrimary(req.id))
        .await
        .map_err(|_| session_gone())?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/center/toggle", post(toggle_center))
        .route("/center/primary", post(select_primary))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::CountingHistory;
    use crate::session::{Session, SessionOptions};
    use crate::types::{TrackBatch, TrackPoint};

    fn spawn_session() -> (AppState, tokio::task::JoinHandle<Session<SharedMapState, CountingHistory>>) {
        let map = SharedMapState::new();
        let (tx, rx) = mpsc::channel(16);
        let session = Session::new(map.clone(), CountingHistory::default(), SessionOptions::default());
        let handle = tokio::spawn(session.run(rx));
        (AppState { map, events: tx }, handle)
    }

    #[tokio::test]
    async fn toggle_round_trips_through_session() {
        let (state, handle) = spawn_session();

        let Json(body) = toggle_center(State(state.clone())).await.unwrap();
        assert_eq!(body["auto_center"], "ON");
        assert_eq!(state.map.snapshot().auto_center, "ON");

        let Json(body) = toggle_center(State(state.clone())).await.unwrap();
        assert_eq!(body["auto_center"], "OFF");

        drop(state);
        let session = handle.await.unwrap();
        assert!(!session.view().is_enabled());
    }

    #[tokio::test]
    async fn primary_selection_reaches_session() {
        let (state, handle) = spawn_session();
        let req = PrimaryRequest { id: Some("edge2".into()) };
        let status = select_primary(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        state
            .events
            .send(SessionEvent::Points(TrackBatch::new("edge2", vec![TrackPoint::new(1, 3.0, 4.0)])))
            .await
            .unwrap();
        let AppState { map, events } = state;
        drop(events);
        let session = handle.await.unwrap();

        assert_eq!(session.view().primary(), Some("edge2"));
        let Json(snap) = get_state(State(AppState { map, events: mpsc::channel(1).0 })).await;
        assert_eq!(snap.trackables["edge2"].path.len(), 1);
    }

    #[tokio::test]
    async fn stopped_session_is_unavailable() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let state = AppState { map: SharedMapState::new(), events: tx };

        let (status, _) = toggle_center(State(state)).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
