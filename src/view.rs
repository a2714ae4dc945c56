use crate::types::TrackableId;

/// Auto-center toggle plus the trackable it follows.
#[derive(Debug, Clone, Default)]
pub struct ViewCenterPolicy {
    enabled: bool,
    // None follows whichever trackable updated last
    primary: Option<TrackableId>,
}

impl ViewCenterPolicy {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            primary: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    pub fn label(&self) -> &'static str {
        if self.enabled {
            "ON"
        } else {
            "OFF"
        }
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn select_primary(&mut self, id: Option<TrackableId>) {
        self.primary = id;
    }

    pub fn should_center(&self, id: &str) -> bool {
        self.enabled && self.primary.as_deref().map_or(true, |p| p == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_label() {
        let mut v = ViewCenterPolicy::new(false);
        assert_eq!(v.label(), "OFF");
        assert!(v.toggle());
        assert_eq!(v.label(), "ON");
        assert!(!v.toggle());
        assert_eq!(v.label(), "OFF");
    }

    #[test]
    fn primary_restricts_centering() {
        let mut v = ViewCenterPolicy::new(true);
        assert!(v.should_center("satcom"));
        assert!(v.should_center("aprs"));

        v.select_primary(Some("aprs".into()));
        assert!(!v.should_center("satcom"));
        assert!(v.should_center("aprs"));

        v.toggle();
        assert!(!v.should_center("aprs"));
    }
}
