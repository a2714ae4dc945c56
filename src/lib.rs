//! Live position tracks (high-altitude balloons and the like) kept for
//! display on a map.
//!
//! Points arrive from [`feed`], either by XML polling or over a websocket,
//! and are turned into [`SessionEvent`]s. A single [`Session`] applies them:
//! the [`reducer`] decides per batch whether points append, are ignored as
//! already seen, or force a full reload. Results are drawn onto a
//! [`MapSurface`]; [`SharedMapState`] is the one the [`server`] hands to a
//! browser map.

pub mod config;
pub mod error;
pub mod feed;
pub mod geo;
pub mod reducer;
pub mod registry;
pub mod server;
pub mod session;
pub mod surface;
pub mod trackable;
pub mod types;
pub mod view;

pub use config::{FeedMode, TrackerConfig};
pub use error::{Result, TrackerError};
pub use reducer::BatchOutcome;
pub use registry::Registry;
pub use session::{HistorySource, Session, SessionOptions};
pub use surface::{MapSurface, SharedMapState};
pub use trackable::Trackable;
pub use types::{ConnectionStatus, LatLon, SessionEvent, TrackBatch, TrackPoint, TrackableId};
pub use view::ViewCenterPolicy;
