use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Correlation id tying points together (IMEI, callsign, feed name...).
pub type TrackableId = String;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One position report from a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Sequence position in the source feed. Push feeds may leave it out;
    /// such points are numbered on arrival.
    pub index: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    // metadata, carried but not used for path bookkeeping
    pub time: Option<String>,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
}

impl TrackPoint {
    pub fn new(index: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            index: Some(index),
            latitude,
            longitude,
            time: None,
            altitude: None,
            speed: None,
        }
    }

    pub fn unindexed(latitude: f64, longitude: f64) -> Self {
        Self {
            index: None,
            ..Self::new(0, latitude, longitude)
        }
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

/// Points for a single trackable, in feed order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackBatch {
    pub id: TrackableId,
    pub points: Vec<TrackPoint>,
}

impl TrackBatch {
    pub fn new(id: impl Into<TrackableId>, points: Vec<TrackPoint>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Canonical event shape every transport normalizes into before it reaches
/// the session.
#[derive(Debug)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    /// Complete resend for every trackable (push `points` event).
    FullHistory(Vec<TrackBatch>),
    /// Complete history for one trackable (initial fetch or refetch).
    History(TrackBatch),
    /// Incremental points (heartbeat window or push `point` event).
    Points(TrackBatch),
    /// Auto-center control click; replies with the new state.
    ToggleCenter(Option<oneshot::Sender<bool>>),
    SelectPrimary(Option<TrackableId>),
}
