//! Pipeline stages for quote-document generation.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. a different rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! quote ──▶ assets ──▶ model ──▶ map ──▶ template ──▶ engine
//! (store)   (fetch+    (pure     (route  (HTML)       (headless
//!           transcode) build)    raster)               pagination)
//! ```
//!
//! 1. [`assets`]   — fetch every referenced image with bounded fan-out and
//!    transcode it to an inline data URI; failures degrade, never abort
//! 2. [`model`]    — build the render-agnostic document model; pure, no I/O
//! 3. [`route`]    — derive the waypoint sequence with coordinate fallbacks
//! 4. [`map`]      — pre-render the route to a static raster (tile stitch +
//!    polyline) so the markup stays free of runtime script
//! 5. [`template`] — serialise the model into one self-contained HTML page
//! 6. [`engine`]   — drive a scoped headless session that paginates the
//!    markup into the final PDF; runs in `spawn_blocking` because the CDP
//!    client is not async-safe

pub mod assets;
pub mod engine;
pub mod map;
pub mod model;
pub mod route;
pub mod template;
