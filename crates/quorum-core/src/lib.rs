//! Core types and replay engine for Quorum session recordings.
//!
//! A recorded session is an immutable, time-ordered list of events. This crate
//! scrubs a play-head over that list, groups decision lifecycles into tracks,
//! and runs heuristic passes that surface behavioural anomalies. It never
//! mutates the recording and performs no I/O.

pub mod analysis;
pub mod error;
pub mod event;
pub mod insight;
pub mod playback;
pub mod timeline;
pub mod track;
pub mod visual;

pub use error::{Error, Result};
