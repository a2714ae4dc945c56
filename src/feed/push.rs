//! Push transport: a websocket delivering named events.
//!
//! Each text frame is `{"event": <name>, "data": <payload>}`, where `data`
//! may also arrive as a JSON-encoded string. Payloads come either as a list
//! of `{id, points}` or as a map of id to points; both normalize into
//! [`TrackBatch`]es here so nothing downstream sees the difference.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{Result, TrackerError};
use crate::session::HistorySource;
use crate::types::{SessionEvent, TrackBatch, TrackPoint};

#[derive(Deserialize, Debug)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize, Debug)]
struct WirePoint {
    #[serde(default, alias = "pointIndex")]
    index: Option<i64>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    time: Option<Value>,
    #[serde(default)]
    altitude: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
}

impl From<WirePoint> for TrackPoint {
    fn from(p: WirePoint) -> Self {
        let time = match p.time {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        TrackPoint {
            index: p.index,
            latitude: p.latitude,
            longitude: p.longitude,
            time,
            altitude: p.altitude,
            speed: p.speed,
        }
    }
}

#[derive(Deserialize, Debug)]
struct WireTrack {
    id: String,
    #[serde(default)]
    points: Vec<WirePoint>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TrackPayload {
    Many(Vec<WireTrack>),
    One(WireTrack),
    Keyed(BTreeMap<String, Vec<WirePoint>>),
}

impl TrackPayload {
    fn into_batches(self) -> Vec<TrackBatch> {
        let convert = |points: Vec<WirePoint>| -> Vec<TrackPoint> {
            points.into_iter().map(TrackPoint::from).collect()
        };
        match self {
            TrackPayload::Many(tracks) => tracks
                .into_iter()
                .map(|t| TrackBatch::new(t.id, convert(t.points)))
                .collect(),
            TrackPayload::One(t) => vec![TrackBatch::new(t.id, convert(t.points))],
            TrackPayload::Keyed(map) => map
                .into_iter()
                .map(|(id, points)| TrackBatch::new(id, convert(points)))
                .collect(),
        }
    }
}

fn decode_payload(data: Value) -> Result<Vec<TrackBatch>> {
    let data = match data {
        Value::String(s) => serde_json::from_str(&s)?,
        other => other,
    };
    let payload: TrackPayload = serde_json::from_value(data)?;
    Ok(payload.into_batches())
}

/// Normalize one text frame into session events. Unknown event names
/// decode to nothing, as do `connect`/`disconnect` frames: the socket's own
/// open and close drive those.
pub fn decode_message(text: &str) -> Result<Vec<SessionEvent>> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let events = match envelope.event.as_str() {
        name @ ("connect" | "disconnect") => {
            tracing::debug!(event = %name, "lifecycle frame, socket state already reported");
            Vec::new()
        }
        "points" => vec![SessionEvent::FullHistory(decode_payload(envelope.data)?)],
        "point" => decode_payload(envelope.data)?
            .into_iter()
            .map(SessionEvent::Points)
            .collect(),
        other => {
            tracing::debug!(event = %other, "ignoring unknown event");
            Vec::new()
        }
    };
    Ok(events)
}

/// The push server resends everything on connect, so a refetch is a
/// reconnect.
#[derive(Debug, Clone, Default)]
pub struct ResyncHandle {
    notify: Arc<Notify>,
}

impl HistorySource for ResyncHandle {
    fn request_full_history(&mut self, id: &str) {
        tracing::info!(id = %id, "requesting resend from push server");
        self.notify.notify_one();
    }
}

pub struct PushClient {
    url: String,
    reconnect_delay: Duration,
    events: mpsc::Sender<SessionEvent>,
    resync: ResyncHandle,
}

impl PushClient {
    pub fn new(
        url: impl Into<String>,
        reconnect_delay: Duration,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
            events,
            resync: ResyncHandle::default(),
        }
    }

    pub fn resync_handle(&self) -> ResyncHandle {
        self.resync.clone()
    }

    /// Connects, forwards events, and reconnects after any drop. Returns
    /// only once the session stops listening.
    pub async fn run(self) -> Result<()> {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    self.send(SessionEvent::Connected).await?;
                    let (_, mut read) = ws.split();
                    self.pump(&mut read).await?;
                    self.send(SessionEvent::Disconnected).await?;
                }
                Err(e) => tracing::warn!(url = %self.url, error = %e, "connect failed"),
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn pump<R>(&self, read: &mut R) -> Result<()>
    where
        R: futures_util::Stream<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => match decode_message(&text) {
                        Ok(events) => {
                            for event in events {
                                self.send(event).await?;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "dropping malformed payload"),
                    },
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "websocket error");
                        return Ok(());
                    }
                },
                _ = self.resync.notify.notified() => {
                    tracing::info!("reconnecting for a full resend");
                    return Ok(());
                }
            }
        }
    }

    async fn send(&self, event: SessionEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| TrackerError::ChannelClosed)
    }
}
