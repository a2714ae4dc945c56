//! The map widget as seen from the session: line geometries in, viewport
//! commands out. [`SharedMapState`] keeps the latest geometry for the HTTP
//! front end to hand to a browser map.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::geo;
use crate::types::{ConnectionStatus, LatLon, TrackableId};

pub trait MapSurface {
    fn draw_path(&mut self, id: &str, path: &[LatLon]);
    fn draw_prediction(&mut self, id: &str, predicted: Option<&[LatLon]>);
    /// Remove both polylines of a trackable.
    fn clear(&mut self, id: &str);
    fn set_center(&mut self, center: LatLon);
    fn set_status(&mut self, status: ConnectionStatus);
    fn show_auto_center(&mut self, _label: &'static str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineStyle {
    pub stroke_color: Option<&'static str>,
    pub stroke_opacity: f32,
    pub stroke_weight: u8,
    pub dashed: bool,
}

impl LineStyle {
    /// Colour is left to the renderer.
    pub const PATH: LineStyle = LineStyle {
        stroke_color: None,
        stroke_opacity: 1.0,
        stroke_weight: 4,
        dashed: false,
    };

    pub const PREDICTION: LineStyle = LineStyle {
        stroke_color: Some("#0000DD"),
        stroke_opacity: 1.0,
        stroke_weight: 3,
        dashed: true,
    };
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackSnapshot {
    pub path: Vec<LatLon>,
    pub predicted: Option<Vec<LatLon>>,
    pub distance_nmi: f64,
    pub style: LineStyle,
    pub predict_style: LineStyle,
}

impl Default for TrackSnapshot {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            predicted: None,
            distance_nmi: 0.0,
            style: LineStyle::PATH,
            predict_style: LineStyle::PREDICTION,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MapSnapshot {
    pub status: ConnectionStatus,
    pub center: Option<LatLon>,
    pub auto_center: &'static str,
    pub trackables: BTreeMap<TrackableId, TrackSnapshot>,
}

impl Default for MapSnapshot {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            center: None,
            auto_center: "OFF",
            trackables: BTreeMap::new(),
        }
    }
}

/// Map state shared between the session task (sole writer) and readers.
#[derive(Debug, Clone, Default)]
pub struct SharedMapState {
    inner: Arc<RwLock<MapSnapshot>>,
}

impl SharedMapState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.inner.read().clone()
    }
}

impl MapSurface for SharedMapState {
    fn draw_path(&mut self, id: &str, path: &[LatLon]) {
        let mut map = self.inner.write();
        let track = map.trackables.entry(id.to_string()).or_default();
        track.path = path.to_vec();
        track.distance_nmi = geo::path_length_nmi(path);
    }

    fn draw_prediction(&mut self, id: &str, predicted: Option<&[LatLon]>) {
        let mut map = self.inner.write();
        map.trackables.entry(id.to_string()).or_default().predicted = predicted.map(<[LatLon]>::to_vec);
    }

    fn clear(&mut self, id: &str) {
        self.inner.write().trackables.remove(id);
    }

    fn set_center(&mut self, center: LatLon) {
        self.inner.write().center = Some(center);
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.inner.write().status = status;
    }

    fn show_auto_center(&mut self, label: &'static str) {
        self.inner.write().auto_center = label;
    }
}
