//! Request middleware.
//!
//! Purpose: attach a per-request trace identifier to logs, responses and
//! error payloads.

pub mod trace;

pub use trace::Trace;
