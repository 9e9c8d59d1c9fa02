//! Client builder and request entry point.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the endpoint,
//! timeout, transport and observers. The [`DocumentClient`] owns one
//! connection and runs one logical request at a time on it:
//! 1. Wait for the request slot (earlier requests finish first)
//! 2. Connect if needed
//! 3. Install callbacks and send the request
//! 4. Dispatch events until the request settles
//!
//! # Example
//!
//! ```ignore
//! use draftwire_client::{Callbacks, DocumentClient, GenerateRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DocumentClient::builder()
//!         .base_url("ws://127.0.0.1:8000")
//!         .build();
//!
//!     let callbacks = Callbacks::new()
//!         .on_chunk(|chunk| print!("{chunk}"))
//!         .on_draft_content(|html| async move { println!("\n{html}") });
//!
//!     let resolution = client
//!         .generate(GenerateRequest::create("doc-1", "Draft an NDA"), callbacks)
//!         .await?;
//!     if let Some(question) = resolution.interrupt {
//!         println!("backend needs: {question}");
//!     }
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::Result;
use crate::handler::Callbacks;
use crate::observer::{ConnectionObserver, ObserverId};
use crate::protocol::{DocumentMode, GenerateRequest};
use crate::session::{Resolution, Session};
use crate::transport::{Connector, WsConnector};

/// Builder for configuring and creating a [`DocumentClient`].
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
    observers: Vec<Arc<dyn ConnectionObserver>>,
}

impl ClientBuilder {
    /// Create a builder with [`ClientConfig::default`].
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            connector: None,
            observers: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Full WebSocket URL of the document endpoint.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Backend base URL; the document path is appended.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.config.url = ClientConfig::from_base_url(base_url).url;
        self
    }

    /// Set the connect timeout.
    ///
    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Use a custom transport instead of a WebSocket to the configured URL.
    pub fn connector<C: Connector>(mut self, connector: C) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Register a long-lived connection observer.
    pub fn observer(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the client. Nothing connects until the first request or `connect()`.
    pub fn build(self) -> DocumentClient {
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WsConnector::new(self.config.url.clone())));
        let connection = ConnectionManager::new(connector, self.config.connect_timeout);
        for observer in self.observers {
            connection.observe(observer);
        }
        DocumentClient {
            connection,
            request_slot: Arc::new(Mutex::new(())),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the document generation socket.
///
/// Cheap to clone; clones share the connection and the request slot.
#[derive(Clone)]
pub struct DocumentClient {
    connection: ConnectionManager,
    /// Held for the whole life of a request.
    request_slot: Arc<Mutex<()>>,
}

impl DocumentClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client for an explicit endpoint URL with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        ClientBuilder::new().url(url).build()
    }

    /// Open the connection now instead of on the first request.
    pub async fn connect(&self) -> Result<()> {
        self.connection.connect().await
    }

    /// Close the connection. Idempotent.
    ///
    /// An in-flight request fails with
    /// [`DraftwireError::Disconnected`](crate::DraftwireError::Disconnected).
    pub async fn disconnect(&self) {
        self.connection.disconnect().await
    }

    /// Run one logical request to its resolution.
    ///
    /// Waits for any earlier request on this client to resolve first.
    pub async fn generate(
        &self,
        request: GenerateRequest,
        callbacks: Callbacks,
    ) -> Result<Resolution> {
        let _slot = self.request_slot.lock().await;
        Session::new(&self.connection)
            .run(&request, callbacks)
            .await
    }

    /// [`generate`](Self::generate) with the request given by parts.
    pub async fn generate_document(
        &self,
        document_id: impl Into<String>,
        mode: DocumentMode,
        message: impl Into<String>,
        callbacks: Callbacks,
    ) -> Result<Resolution> {
        let request = GenerateRequest {
            document_id: document_id.into(),
            mode,
            message: message.into(),
        };
        self.generate(request, callbacks).await
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// True if the connection is open.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_open().await
    }

    /// Register a long-lived connection observer.
    pub fn observe(&self, observer: Arc<dyn ConnectionObserver>) -> ObserverId {
        self.connection.observe(observer)
    }

    /// Remove a long-lived connection observer.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.connection.unobserve(id)
    }

    /// The underlying connection.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }
}
