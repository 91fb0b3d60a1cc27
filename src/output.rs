//! Pipeline output: the rendered artifact and its run statistics.

use serde::{Deserialize, Serialize};

/// Number of identifier characters used in filenames and footers.
pub const SHORT_REF_LEN: usize = 8;

/// The finished document. Created once per request, returned once, never
/// cached — its lifecycle is exactly one request.
#[derive(Debug, Clone)]
pub struct RenderArtifact {
    /// The paginated PDF bytes.
    pub bytes: Vec<u8>,
    /// Download filename, `quote_<shortId>.pdf`.
    pub filename: String,
    /// Timings and degradation counters for this run.
    pub stats: RenderStats,
}

/// Statistics about one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderStats {
    /// Distinct image URLs referenced by the quote.
    pub image_count: usize,
    /// Images that fell back to their source URL (fetch/transcode failure
    /// or enrichment deadline).
    pub degraded_images: usize,
    pub enrich_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Size of the emitted PDF in bytes.
    pub pdf_bytes: usize,
}

/// Short form of a quote identifier for filenames and running footers.
///
/// A fixed-length prefix keeps filenames stable and readable; identifiers
/// shorter than the prefix are used whole.
pub fn short_ref(id: &str) -> String {
    id.chars().take(SHORT_REF_LEN).collect()
}

/// Download filename for a quote identifier.
pub fn artifact_filename(id: &str) -> String {
    format!("quote_{}.pdf", short_ref(id))
}
