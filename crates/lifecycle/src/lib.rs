//! # KB Lifecycle
//!
//! Stateless resource-lifecycle core for the knowledge-base ingestion
//! simulator.
//!
//! ## Pipeline
//!
//! ```text
//! upload(path)
//!     │
//!     ├──> Path Normalizer
//!     │      └─> canonical resource path
//!     │
//!     ├──> Salt Deriver (seed, kb_id, path)
//!     │      └─> 64-bit deterministic salt
//!     │
//!     └──> Token Codec
//!            └─> opaque base64url token (the only cross-request state)
//!
//! status(token, now)
//!     │
//!     ├──> Token Codec (decode + validate)
//!     │
//!     └──> Status Oracle (elapsed, salt, failure_rate)
//!            └─> pending | parsed | indexed | error
//! ```
//!
//! Every operation is a pure function of its arguments. Nothing is stored
//! between calls, so the crate is safe under arbitrary concurrent use.
//!
//! ## Example
//!
//! ```
//! use kb_lifecycle::{compute_status, decode_resource_token, encode_resource_token};
//!
//! let token = encode_resource_token("kb-1", "./docs/Guide.MD", 1_700_000_000_000, 0)?;
//! let payload = decode_resource_token(&token)?;
//! assert_eq!(payload.rp, "docs/Guide.md");
//!
//! let status = compute_status(payload.ca_ms, payload.ca_ms + 1_500, payload.salt, 0.0)?;
//! assert!(status.is_terminal());
//! # Ok::<(), kb_lifecycle::LifecycleError>(())
//! ```

mod error;
mod path;
mod salt;
mod status;
mod token;

pub use error::{LifecycleError, Result};
pub use path::{extension, normalize_resource_path};
pub use salt::{derive_salt, salt_to_unit};
pub use status::{compute_status, LifecycleStatus, PARSED_MS, PENDING_MS};
pub use token::{decode_resource_token, encode_resource_token, TokenPayload, TOKEN_VERSION};
