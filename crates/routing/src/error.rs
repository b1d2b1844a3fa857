/// Crate-wide result type for handler resolution.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed resolution errors. `Clone` so cached negative outcomes can be
/// handed out on every repeat lookup.
///
/// The two variants are deliberately distinct: operators need to tell
/// "missing feature" (nothing registered) from "broken feature" (a
/// registration whose factory fails).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The routing key has no registered handler at all.
    #[error("no handler registered for \"{key}\"")]
    NotFound { key: String },

    /// A registration exists but its factory failed to produce a handler.
    #[error("handler for \"{key}\" failed to load: {message}")]
    LoadFailed { key: String, message: String },
}

impl Error {
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    #[must_use]
    pub fn load_failed(key: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::LoadFailed {
            key: key.into(),
            message: source.to_string(),
        }
    }
}
