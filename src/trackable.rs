use crate::geo;
use crate::types::{LatLon, TrackableId};

/// Path-drawing state for one tracked object.
#[derive(Debug, Clone)]
pub struct Trackable {
    id: TrackableId,
    path: Vec<LatLon>,
    predict: bool,
    // [last, extrapolated], present once two points are known
    predicted_path: Option<Vec<LatLon>>,
    last_index: Option<i64>,
    last: Option<LatLon>,
}

impl Trackable {
    pub fn new(id: impl Into<TrackableId>, predict: bool) -> Self {
        Self {
            id: id.into(),
            path: Vec::new(),
            predict,
            predicted_path: None,
            last_index: None,
            last: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &[LatLon] {
        &self.path
    }

    pub fn predicted_path(&self) -> Option<&[LatLon]> {
        self.predicted_path.as_deref()
    }

    pub fn predicts(&self) -> bool {
        self.predict
    }

    pub fn last_index(&self) -> Option<i64> {
        self.last_index
    }

    pub fn last(&self) -> Option<LatLon> {
        self.last
    }

    /// Index an unnumbered point receives when it arrives.
    pub fn next_index(&self) -> i64 {
        self.last_index.map_or(1, |i| i.saturating_add(1))
    }

    pub fn append(&mut self, index: i64, position: LatLon) {
        self.path.push(position);
        self.last_index = Some(index);
        self.last = Some(position);
        self.update_prediction();
    }

    /// Drops both polylines. The last index is kept so later heartbeats
    /// still see the gap until a full history replaces the path.
    pub fn clear_paths(&mut self) {
        self.path.clear();
        self.predicted_path = None;
    }

    /// Forgets everything; used before a full history is applied.
    pub fn reset(&mut self) {
        self.clear_paths();
        self.last_index = None;
        self.last = None;
    }

    fn update_prediction(&mut self) {
        if !self.predict {
            return;
        }
        self.predicted_path = match self.path.as_slice() {
            [.., prev, last] => Some(vec![*last, geo::extrapolate(*prev, *last)]),
            _ => None,
        };
    }
}
