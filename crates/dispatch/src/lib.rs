//! Compose normalization, deduplication, resolution, and formatting into
//! one dispatch path per inbound payload.
//!
//! Per-request flow: raw payload → normalize → (dedup check for message
//! events) → resolve → handler invocation → format → reply. Rejected
//! duplicates, unknown routing keys, and broken handler loads are outcomes,
//! not crashes: each still produces a well-formed response envelope.
//!
//! Messaging payloads answer inside the platform's response-time budget
//! with a lightweight acknowledgment; the handler's real result is
//! delivered later through the [`FollowUp`] collaborator.

pub mod dispatcher;
pub mod error;
pub mod follow_up;
pub mod format;

pub use {
    dispatcher::{Dispatcher, MessagingDispatch, Outcome},
    error::{Error, Result},
    follow_up::{DiscardFollowUp, FollowUp},
};
