/// Crate-wide result type for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Hard rejections surfaced to the external caller. Everything else the
/// dispatcher recovers into a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Messaging payload carried no channel, so no route is identifiable.
    /// Malformed by contract; the external dispatcher should reject it
    /// rather than have us guess a default.
    #[error("no channel specified")]
    MissingChannel,

    /// None of `event`, `command`, or `action` was present.
    #[error("no command, event, or action specified")]
    UnrecognizedPayload,
}
