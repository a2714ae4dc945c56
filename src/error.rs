use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("session channel closed")]
    ChannelClosed,

    #[error("no map surface to render on: {0}")]
    MissingSurface(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
