//! Codec module - serialization/deserialization for frame payloads.
//!
//! - [`JsonCodec`] - JSON using `serde_json`, the wire format of the document backend
//!
//! Codecs are marker structs with static methods rather than trait objects.
//! The event-level classification of inbound frames lives in
//! [`protocol`](crate::protocol); this module only moves bytes to and from
//! serde types.
//!
//! # Example
//!
//! ```
//! use draftwire_client::codec::JsonCodec;
//!
//! let encoded = JsonCodec::encode(&"hello").unwrap();
//! let decoded: String = JsonCodec::decode(encoded.as_bytes()).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

mod json;

pub use json::JsonCodec;
