use std::future::IntoFuture;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use live_tracker::config::{self, FeedMode, TrackerConfig};
use live_tracker::feed::{fetch_queue, Poller, PushClient, XmlFeedClient};
use live_tracker::server::{self, AppState};
use live_tracker::{HistorySource, Session, SessionOptions, SharedMapState, TrackerError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg_path = config::resolve_config_path();
    let cfg = TrackerConfig::load(&cfg_path)
        .with_context(|| format!("failed to load config at {}", cfg_path.display()))?;
    tracing::info!(mode = ?cfg.mode, targets = cfg.targets.len(), "loaded config");

    // The HTTP front end is the only rendering surface; without it there is
    // nothing to draw on.
    if cfg.bind_addr.trim().is_empty() {
        return Err(TrackerError::MissingSurface("bind_addr is empty".into()).into());
    }

    let map = SharedMapState::new();
    let (tx, rx) = mpsc::channel(256);
    let opts = SessionOptions::from(&cfg);

    let (session_task, feed_task) = match cfg.mode {
        FeedMode::Poll => {
            let (queue, refetch) = fetch_queue();
            let client = XmlFeedClient::new(cfg.point_element.clone())?;
            let poller = Poller::new(client, cfg.targets.clone(), cfg.poll_interval(), tx.clone());
            (
                spawn_session(map.clone(), queue, opts, rx),
                tokio::spawn(poller.run(refetch)),
            )
        }
        FeedMode::Push => {
            let push = PushClient::new(cfg.push_url.clone(), cfg.reconnect_delay(), tx.clone());
            (
                spawn_session(map.clone(), push.resync_handle(), opts, rx),
                tokio::spawn(push.run()),
            )
        }
    };

    let app = server::router(AppState { map, events: tx });
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!("listening on http://{}", cfg.bind_addr);

    tokio::select! {
        res = axum::serve(listener, app).into_future() => res?,
        res = feed_task => match res? {
            Ok(()) => tracing::info!("feed finished"),
            Err(e) => tracing::warn!(error = %e, "feed stopped"),
        },
    }

    session_task.abort();
    Ok(())
}

fn spawn_session<H>(
    map: SharedMapState,
    history: H,
    opts: SessionOptions,
    rx: mpsc::Receiver<live_tracker::SessionEvent>,
) -> tokio::task::JoinHandle<()>
where
    H: HistorySource + Send + 'static,
{
    tokio::spawn(async move {
        Session::new(map, history, opts).run(rx).await;
    })
}
