//! Polling transport: one full-history fetch per trackable, then a short
//! heartbeat window on a fixed interval.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::xml;
use crate::error::{Result, TrackerError};
use crate::session::HistorySource;
use crate::types::{SessionEvent, TrackBatch, TrackPoint, TrackableId};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PollTarget {
    pub id: TrackableId,
    pub all_points_url: String,
    pub heartbeat_url: String,
}

pub struct XmlFeedClient {
    client: Client,
    element: String,
}

impl XmlFeedClient {
    pub fn new(element: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            element: element.into(),
        })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<TrackPoint>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        xml::parse_points(&body, &self.element)
    }
}

/// Refetch requests from the session, served by the poller.
#[derive(Debug, Clone)]
pub struct FetchQueue {
    tx: mpsc::UnboundedSender<TrackableId>,
}

pub fn fetch_queue() -> (FetchQueue, mpsc::UnboundedReceiver<TrackableId>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FetchQueue { tx }, rx)
}

impl HistorySource for FetchQueue {
    fn request_full_history(&mut self, id: &str) {
        if self.tx.send(id.to_string()).is_err() {
            tracing::warn!(id = %id, "poller gone, refetch dropped");
        }
    }
}

pub struct Poller {
    client: XmlFeedClient,
    targets: Vec<PollTarget>,
    interval: Duration,
    events: mpsc::Sender<SessionEvent>,
}

impl Poller {
    pub fn new(
        client: XmlFeedClient,
        targets: Vec<PollTarget>,
        interval: Duration,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            client,
            targets,
            interval,
            events,
        }
    }

    /// Runs until the session stops listening.
    pub async fn run(self, mut refetch: mpsc::UnboundedReceiver<TrackableId>) -> Result<()> {
        self.send(SessionEvent::Connected).await?;
        for target in &self.targets {
            self.load_history(target).await?;
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick is immediate

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for target in &self.targets {
                        self.heartbeat(target).await?;
                    }
                }
                Some(id) = refetch.recv() => {
                    // collapse repeated requests for the same trackable
                    let mut pending = BTreeSet::from([id]);
                    while let Ok(more) = refetch.try_recv() {
                        pending.insert(more);
                    }
                    for id in pending {
                        match self.targets.iter().find(|t| t.id == id) {
                            Some(target) => self.load_history(target).await?,
                            None => tracing::warn!(id = %id, "refetch for unknown target"),
                        }
                    }
                }
            }
        }
    }

    async fn load_history(&self, target: &PollTarget) -> Result<()> {
        tracing::debug!(id = %target.id, "loading all points");
        match self.client.fetch(&target.all_points_url).await {
            Ok(points) => {
                self.send(SessionEvent::History(TrackBatch::new(target.id.clone(), points)))
                    .await
            }
            Err(e) => {
                tracing::warn!(id = %target.id, error = %e, "full history fetch failed");
                Ok(())
            }
        }
    }

    async fn heartbeat(&self, target: &PollTarget) -> Result<()> {
        match self.client.fetch(&target.heartbeat_url).await {
            Ok(points) if points.is_empty() => Ok(()),
            Ok(points) => {
                self.send(SessionEvent::Points(TrackBatch::new(target.id.clone(), points)))
                    .await
            }
            Err(e) => {
                tracing::warn!(id = %target.id, error = %e, "heartbeat fetch failed");
                Ok(())
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
