use std::error::Error;

/// Failure while producing or filtering a token stream.
///
/// Upstream failures pass through unchanged; the replay variants indicate a
/// broken internal invariant rather than a user error, and are never retried.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TokenStreamError {
    #[error("token source error: {0}")]
    Source(Box<dyn Error + Send + Sync + 'static>),

    #[error("broken chain of filter contexts while draining replayed tokens")]
    BrokenReplayChain,

    #[error("expected buffered path tokens to replay, but none were queued")]
    MissingBufferedTokens,

    #[error("overriding the current name is not supported while filtering")]
    NameOverrideUnsupported,
}

impl TokenStreamError {
    /// Wrap an upstream producer's failure.
    pub fn source(error: impl Error + Send + Sync + 'static) -> Self {
        TokenStreamError::Source(Box::new(error))
    }
}
