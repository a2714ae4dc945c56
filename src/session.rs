//! Per-connection tracking state and the handlers transports feed into.
//!
//! All mutation goes through one [`Session`], driven either directly or by
//! [`Session::run`] draining a channel, so registry access is serialized
//! without locks.

use tokio::sync::mpsc;

use crate::config::TrackerConfig;
use crate::reducer::{self, BatchOutcome, DEFAULT_GAP_THRESHOLD};
use crate::registry::Registry;
use crate::surface::MapSurface;
use crate::trackable::Trackable;
use crate::types::{ConnectionStatus, SessionEvent, TrackBatch, TrackableId};
use crate::view::ViewCenterPolicy;

/// Bulk-fetch collaborator asked to resend one trackable's whole history.
pub trait HistorySource {
    fn request_full_history(&mut self, id: &str);
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub gap_threshold: i64,
    pub auto_center: bool,
    pub predict: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            auto_center: false,
            predict: false,
        }
    }
}

impl From<&TrackerConfig> for SessionOptions {
    fn from(cfg: &TrackerConfig) -> Self {
        Self {
            gap_threshold: cfg.gap_threshold,
            auto_center: cfg.auto_center,
            predict: cfg.predict,
        }
    }
}

pub struct Session<S, H> {
    registry: Registry,
    view: ViewCenterPolicy,
    surface: S,
    history: H,
    gap_threshold: i64,
    // first point of a connection always centers the map
    has_centered: bool,
}

impl<S: MapSurface, H: HistorySource> Session<S, H> {
    pub fn new(mut surface: S, history: H, opts: SessionOptions) -> Self {
        let view = ViewCenterPolicy::new(opts.auto_center);
        surface.show_auto_center(view.label());
        Self {
            registry: Registry::new(opts.predict),
            view,
            surface,
            history,
            gap_threshold: opts.gap_threshold,
            has_centered: false,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn view(&self) -> &ViewCenterPolicy {
        &self.view
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn trackable(&self, id: &str) -> Option<&Trackable> {
        self.registry.get(id)
    }

    /// Everything is resent on a new connection, so start from nothing.
    pub fn on_connect(&mut self) {
        tracing::info!("connected to live stream");
        self.surface.set_status(ConnectionStatus::Connected);

        let ids: Vec<TrackableId> = self.registry.ids().map(str::to_owned).collect();
        for id in &ids {
            self.surface.clear(id);
        }
        self.registry.clear_all();
        self.has_centered = false;
    }

    pub fn on_disconnect(&mut self) {
        tracing::info!("disconnected from live stream");
        self.surface.set_status(ConnectionStatus::Disconnected);
    }

    pub fn on_full_history(&mut self, batches: Vec<TrackBatch>) {
        tracing::debug!(trackables = batches.len(), "loading initial points");
        for batch in batches {
            self.on_history(batch);
        }
    }

    pub fn on_history(&mut self, batch: TrackBatch) {
        let track = self.registry.get_or_create(&batch.id);
        let appended = reducer::apply_history(track, &batch.points);
        tracing::debug!(id = %batch.id, appended, "history loaded");

        self.redraw(&batch.id);
        if appended > 0 {
            self.after_receipt(&batch.id);
        }
    }

    pub fn on_points(&mut self, batch: TrackBatch) -> BatchOutcome {
        let track = self.registry.get_or_create(&batch.id);
        let outcome = reducer::apply_batch(track, &batch.points, self.gap_threshold);

        if outcome.reload {
            self.surface.clear(&batch.id);
            self.history.request_full_history(&batch.id);
            return outcome;
        }
        if outcome.appended > 0 {
            self.redraw(&batch.id);
            self.after_receipt(&batch.id);
        }
        outcome
    }

    pub fn toggle_center(&mut self) -> bool {
        let enabled = self.view.toggle();
        tracing::info!(auto_center = self.view.label(), "auto center toggled");
        self.surface.show_auto_center(self.view.label());
        enabled
    }

    pub fn select_primary(&mut self, id: Option<TrackableId>) {
        tracing::info!(primary = ?id, "auto center target selected");
        self.view.select_primary(id);
    }

    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected => self.on_connect(),
            SessionEvent::Disconnected => self.on_disconnect(),
            SessionEvent::FullHistory(batches) => self.on_full_history(batches),
            SessionEvent::History(batch) => self.on_history(batch),
            SessionEvent::Points(batch) => {
                self.on_points(batch);
            }
            SessionEvent::ToggleCenter(reply) => {
                let enabled = self.toggle_center();
                if let Some(tx) = reply {
                    let _ = tx.send(enabled);
                }
            }
            SessionEvent::SelectPrimary(id) => self.select_primary(id),
        }
    }

    /// Single writer loop; returns once every sender is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<SessionEvent>) -> Self {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }
        tracing::debug!("session event channel closed");
        self
    }

    fn redraw(&mut self, id: &str) {
        if let Some(track) = self.registry.get(id) {
            self.surface.draw_path(id, track.path());
            if track.predicts() {
                self.surface.draw_prediction(id, track.predicted_path());
            }
        }
    }

    fn after_receipt(&mut self, id: &str) {
        let Some(last) = self.registry.get(id).and_then(Trackable::last) else {
            return;
        };
        if !self.has_centered || self.view.should_center(id) {
            self.surface.set_center(last);
            self.has_centered = true;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{LatLon, TrackPoint};

    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub paths: std::collections::HashMap<String, Vec<LatLon>>,
        pub predictions: std::collections::HashMap<String, Option<Vec<LatLon>>>,
        pub cleared: Vec<String>,
        pub centers: Vec<LatLon>,
        pub status: Option<ConnectionStatus>,
        pub label: &'static str,
    }

    impl MapSurface for RecordingSurface {
        fn draw_path(&mut self, id: &str, path: &[LatLon]) {
            self.paths.insert(id.to_string(), path.to_vec());
        }
        fn draw_prediction(&mut self, id: &str, predicted: Option<&[LatLon]>) {
            self.predictions.insert(id.to_string(), predicted.map(<[LatLon]>::to_vec));
        }
        fn clear(&mut self, id: &str) {
            self.paths.remove(id);
            self.predictions.remove(id);
            self.cleared.push(id.to_string());
        }
        fn set_center(&mut self, center: LatLon) {
            self.centers.push(center);
        }
        fn set_status(&mut self, status: ConnectionStatus) {
            self.status = Some(status);
        }
        fn show_auto_center(&mut self, label: &'static str) {
            self.label = label;
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct CountingHistory {
        pub requests: Vec<String>,
    }

    impl HistorySource for CountingHistory {
        fn request_full_history(&mut self, id: &str) {
            self.requests.push(id.to_string());
        }
    }

    fn batch(id: &str, indices: &[i64]) -> TrackBatch {
        TrackBatch::new(
            id,
            indices.iter().map(|&i| TrackPoint::new(i, i as f64, i as f64)).collect(),
        )
    }

    fn session(opts: SessionOptions) -> Session<RecordingSurface, CountingHistory> {
        Session::new(RecordingSurface::default(), CountingHistory::default(), opts)
    }

    #[test]
    fn gap_triggers_exactly_one_refetch() {
        let mut s = session(SessionOptions { predict: true, ..Default::default() });
        s.on_history(batch("satcom", &[1, 2, 3, 4]));

        let out = s.on_points(batch("satcom", &[9, 10]));
        assert!(out.reload);
        assert_eq!(s.history().requests, vec!["satcom".to_string()]);

        let t = s.trackable("satcom").unwrap();
        assert!(t.path().is_empty());
        assert!(t.predicted_path().is_none());
        assert!(!s.surface().paths.contains_key("satcom"));
        assert_eq!(s.surface().cleared, vec!["satcom".to_string()]);
    }

    #[test]
    fn refetch_response_restores_path() {
        let mut s = session(SessionOptions::default());
        s.on_history(batch("aprs", &[1, 2, 3, 4]));
        s.on_points(batch("aprs", &[9]));

        s.handle(SessionEvent::History(batch("aprs", &(1..=9).collect::<Vec<_>>())));
        assert_eq!(s.trackable("aprs").unwrap().path().len(), 9);
        assert_eq!(s.surface().paths["aprs"].len(), 9);

        s.on_points(batch("aprs", &[8, 9, 10]));
        assert_eq!(s.trackable("aprs").unwrap().last_index(), Some(10));
    }

    #[test]
    fn first_point_centers_even_when_disabled() {
        let mut s = session(SessionOptions::default());
        s.on_points(batch("a", &[1]));
        s.on_points(batch("a", &[2]));

        assert_eq!(s.surface().centers, vec![LatLon::new(1.0, 1.0)]);
        assert_eq!(s.surface().label, "OFF");
    }

    #[test]
    fn enabled_policy_follows_primary_only() {
        let mut s = session(SessionOptions { auto_center: true, ..Default::default() });
        assert_eq!(s.surface().label, "ON");
        s.select_primary(Some("b".into()));

        s.on_points(batch("a", &[1])); // first point of the session
        s.on_points(batch("a", &[2]));
        s.on_points(batch("b", &[5]));
        s.on_points(batch("b", &[5])); // redelivery, no recenter

        assert_eq!(
            s.surface().centers,
            vec![LatLon::new(1.0, 1.0), LatLon::new(5.0, 5.0)]
        );
    }

    #[test]
    fn toggle_reports_state() {
        let mut s = session(SessionOptions::default());
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        s.handle(SessionEvent::ToggleCenter(Some(tx)));

        assert_eq!(rx.try_recv(), Ok(true));
        assert!(s.view().is_enabled());
        assert_eq!(s.surface().label, "ON");
    }

    #[test]
    fn reconnect_discards_everything() {
        let mut s = session(SessionOptions::default());
        s.handle(SessionEvent::Connected);
        s.handle(SessionEvent::FullHistory(vec![batch("a", &[1, 2]), batch("b", &[1])]));
        assert_eq!(s.registry().len(), 2);

        s.handle(SessionEvent::Disconnected);
        assert_eq!(s.surface().status, Some(ConnectionStatus::Disconnected));
        assert_eq!(s.registry().len(), 2);

        s.handle(SessionEvent::Connected);
        assert!(s.registry().is_empty());
        assert_eq!(s.surface().status, Some(ConnectionStatus::Connected));
        let mut cleared = s.surface().cleared.clone();
        cleared.sort();
        assert_eq!(cleared, vec!["a".to_string(), "b".to_string()]);
    }
}
