//! Transports that feed the session: XML polling and websocket push.

pub mod poll;
pub mod push;
pub mod xml;

pub use poll::{fetch_queue, FetchQueue, PollTarget, Poller, XmlFeedClient};
pub use push::{decode_message, PushClient, ResyncHandle};
