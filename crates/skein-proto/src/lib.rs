//! Skein wire protocol types.
//!
//! This crate defines the request/reply surface between a program under test
//! and a remote scheduler: one payload type per wire method, an envelope
//! carrying the session id and the typed body, and the error code taxonomy.
//! The transport that carries these messages is out of scope; any
//! request/reply channel that can move serde-serializable values works.
//!
//! Identifiers (sessions, operations, resources) are 128-bit opaque values
//! and travel in their canonical textual form: 32 lowercase hex digits. The
//! all-zero identifier is the "no operation" sentinel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod ids;
pub mod message;
pub mod payloads;

pub use error::ErrorCode;
pub use ids::{format_id, parse_id, IdParseError, NO_OPERATION_ID};
pub use message::{Reply, ReplyBody, Request, RequestBody};
