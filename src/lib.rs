//! # draftwire-client
//!
//! Rust client for a streaming document-generation backend.
//!
//! The client keeps one persistent WebSocket to the backend, sends a
//! "generate document" request, and demultiplexes the event stream that comes
//! back (text chunks, streaming transitions, draft checkpoints, progress
//! updates, missing-information interrupts) to caller-supplied callbacks.
//! Each request resolves exactly once.
//!
//! ## Architecture
//!
//! - **Protocol** (`protocol`, `codec`): JSON request envelope and inbound
//!   frame classification
//! - **Connection** (`connection`, `transport`, `observer`): connect with
//!   timeout and single-flight de-duplication, read loop, teardown
//! - **Session** (`session`, `client`): one logical request from send to
//!   resolution
//!
//! ## Example
//!
//! ```ignore
//! use draftwire_client::{Callbacks, DocumentClient, DocumentMode};
//!
//! #[tokio::main]
//! async fn main() -> draftwire_client::Result<()> {
//!     let client = DocumentClient::builder().base_url("ws://127.0.0.1:8000").build();
//!
//!     let resolution = client
//!         .generate_document(
//!             "doc-1",
//!             DocumentMode::Create,
//!             "Draft an NDA",
//!             Callbacks::new().on_chunk(|chunk| print!("{chunk}")),
//!         )
//!         .await?;
//!
//!     println!("\n{:?}", resolution.outcome);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod observer;
pub mod protocol;
pub mod session;
pub mod transport;

mod client;

pub use client::{ClientBuilder, DocumentClient};
pub use config::ClientConfig;
pub use connection::ConnectionState;
pub use error::{ConnectError, DraftwireError, Result};
pub use handler::Callbacks;
pub use observer::{ConnectionObserver, ObserverId};
pub use protocol::{DocumentMode, Event, GenerateRequest};
pub use session::{Outcome, Resolution};
