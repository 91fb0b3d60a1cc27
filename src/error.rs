//! Error types for the quotedoc library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`QuoteDocError`] — **Fatal**: the document cannot be produced at all
//!   (unknown quote id, rendering session failure, bad configuration).
//!   Returned as `Err(QuoteDocError)` from [`crate::generate::generate`].
//!
//! * [`AssetError`] — **Non-fatal**: a single remote image could not be
//!   fetched or transcoded. The pipeline substitutes the original URL and
//!   keeps going; the error is only ever visible in logs. A broken photo
//!   must never abort document generation.
//!
//! Only two shapes escape to the HTTP boundary: "not found" (404) and
//! "generation failed" (500). Everything image-level is absorbed.

use thiserror::Error;

/// All fatal errors returned by the quotedoc library.
///
/// Per-image failures use [`AssetError`] and are absorbed inside
/// [`crate::pipeline::assets`] rather than propagated here.
#[derive(Debug, Error)]
pub enum QuoteDocError {
    /// The quote identifier does not resolve in the store.
    #[error("quote not found: '{id}'")]
    NotFound { id: String },

    /// The store itself failed (I/O, malformed record). The orchestrator
    /// surfaces this to callers as [`QuoteDocError::NotFound`].
    #[error("quote store error for '{id}': {detail}")]
    StoreFailed { id: String, detail: String },

    /// The markup loaded but the document never settled for pagination.
    #[error("rendering incomplete: {detail}")]
    RenderIncomplete { detail: String },

    /// The rendering session failed. `phase` records how far the engine got.
    #[error("rendering failed during {phase}: {detail}")]
    RenderFailure { phase: RenderPhase, detail: String },

    /// The overall render deadline elapsed. Fatal, unlike enrichment
    /// deadlines which merely degrade image quality.
    #[error("rendering timed out after {secs}s")]
    RenderTimeout { secs: u64 },

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single remote image.
///
/// Logged as a warning by [`crate::pipeline::assets::process`]; the asset
/// falls back to its source URL so the document always has something
/// renderable.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// HTTP fetch failed (transport error or non-2xx status).
    #[error("fetch failed for '{url}': {detail}")]
    Fetch { url: String, detail: String },

    /// Fetch exceeded the per-image timeout.
    #[error("fetch timed out for '{url}' after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// Bytes arrived but could not be decoded or re-encoded.
    #[error("transcode failed for '{url}': {detail}")]
    Transcode { url: String, detail: String },
}

/// How far the rendering engine got before failing.
///
/// The engine is a one-way state machine; `Failed` is reachable from any
/// non-terminal state and the phase at that moment is carried in
/// [`QuoteDocError::RenderFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    SessionAcquired,
    ContentLoaded,
    Settled,
    Paginated,
    ArtifactEmitted,
}

impl std::fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RenderPhase::Idle => "session acquisition",
            RenderPhase::SessionAcquired => "content load",
            RenderPhase::ContentLoaded => "settlement",
            RenderPhase::Settled => "pagination",
            RenderPhase::Paginated => "artifact emission",
            RenderPhase::ArtifactEmitted => "teardown",
        };
        f.write_str(s)
    }
}
