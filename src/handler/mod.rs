//! Handler module - per-request callbacks and event dispatch.
//!
//! Provides:
//! - [`Callbacks`] - the caller's handler set for one logical request
//! - [`CallbackRegistry`] - maps event kinds to handlers
//!
//! # Example
//!
//! ```
//! use draftwire_client::handler::{CallbackRegistry, Callbacks};
//!
//! let callbacks = Callbacks::new()
//!     .on_chunk(|chunk| print!("{chunk}"))
//!     .on_interrupt(|missing| async move {
//!         eprintln!("backend needs: {missing}");
//!     });
//!
//! let mut registry = CallbackRegistry::new();
//! registry.install(&callbacks);
//! ```

mod callbacks;
mod registry;

pub use callbacks::{AsyncTextCallback, Callbacks, SignalCallback, TextCallback};
pub use registry::{BoxFuture, CallbackRegistry, Handler};
