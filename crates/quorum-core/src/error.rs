//! Error types for `quorum-core`.
//!
//! Only load-time contract violations are surfaced as errors. Every engine
//! operation on an already-built timeline is total.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event id must not be empty")]
  EmptyEventId,

  #[error("duplicate event id: {0}")]
  DuplicateEventId(String),

  #[error("event {id} ends beyond the representable timeline")]
  TimestampOverflow { id: String },

  #[error("unknown playback speed: {0:?}")]
  UnknownSpeed(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
