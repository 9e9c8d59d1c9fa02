//! WebSocket transport using `tokio-tungstenite`.
//!
//! # Example
//!
//! ```ignore
//! use draftwire_client::transport::{Connector, WsConnector};
//!
//! let connector = WsConnector::new("ws://127.0.0.1:8000/lexer/api/ws/document");
//! let transport = connector.connect().await?;
//! ```

use std::future::ready;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::{Connector, Transport, TransportError};
use crate::handler::BoxFuture;

/// Connects to a fixed WebSocket URL.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Get the endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    fn connect(&self) -> BoxFuture<'static, std::result::Result<Transport, TransportError>> {
        let url = self.url.clone();
        Box::pin(async move {
            let (ws, _response) = connect_async(url.as_str()).await?;
            tracing::debug!("WebSocket handshake completed with {}", url);

            let (sink, stream) = ws.split();

            let outbound = sink.with(|text: String| {
                ready(Ok::<Message, TransportError>(Message::text(text)))
            });

            let inbound = stream.filter_map(|message| {
                ready(match message {
                    Ok(Message::Text(text)) => Some(Ok(Bytes::copy_from_slice(text.as_bytes()))),
                    Ok(Message::Binary(data)) => Some(Ok(data)),
                    Ok(Message::Close(frame)) => {
                        tracing::debug!("Received close frame: {:?}", frame);
                        None
                    }
                    // Ping/pong are answered by tungstenite itself.
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::from(e))),
                })
            });

            Ok(Transport {
                outbound: Box::pin(outbound),
                inbound: Box::pin(inbound),
            })
        })
    }
}
