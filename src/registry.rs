use std::collections::HashMap;

use crate::trackable::Trackable;
use crate::types::TrackableId;

/// Every trackable seen during the current transport session.
#[derive(Debug, Default)]
pub struct Registry {
    trackables: HashMap<TrackableId, Trackable>,
    predict: bool,
}

impl Registry {
    /// `predict` is applied to every trackable the registry creates.
    pub fn new(predict: bool) -> Self {
        Self {
            trackables: HashMap::new(),
            predict,
        }
    }

    pub fn get_or_create(&mut self, id: &str) -> &mut Trackable {
        let predict = self.predict;
        self.trackables.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!(id = %id, "new trackable");
            Trackable::new(id, predict)
        })
    }

    pub fn get(&self, id: &str) -> Option<&Trackable> {
        self.trackables.get(id)
    }

    pub fn clear_all(&mut self) {
        self.trackables.clear();
    }

    pub fn len(&self) -> usize {
        self.trackables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackables.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.trackables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trackable> {
        self.trackables.values()
    }
}
