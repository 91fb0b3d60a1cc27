//! # quotedoc
//!
//! Renders travel quotes into paginated PDF documents.
//!
//! A quote is a structured record — itinerary days, destinations with
//! photos, a route, pricing — held in a document store. This crate turns
//! one of those records into a client-ready PDF through a fixed pipeline:
//!
//! ```text
//!  quote id
//!     │
//!     ▼
//!  ┌───────┐   ┌─────────┐   ┌────────┐   ┌─────┐   ┌────────┐   ┌────────┐
//!  │ store │──▶│ assets  │──▶│ model  │──▶│ map │──▶│template│──▶│ engine │──▶ PDF
//!  └───────┘   └─────────┘   └────────┘   └─────┘   └────────┘   └────────┘
//!               fetch and     pure data    static    HTML +       headless
//!               transcode     transform    raster    print CSS    Chromium
//! ```
//!
//! Image work degrades instead of failing: a photo that cannot be fetched
//! or decoded falls back to its source URL and the document still renders.
//! Rendering itself is all-or-nothing — there is no partial PDF.
//!
//! ## Quick start
//!
//! ```no_run
//! use quotedoc::{generate, JsonDirStore, RenderConfig};
//!
//! # async fn run() -> Result<(), quotedoc::QuoteDocError> {
//! let store = JsonDirStore::new("./quotes");
//! let config = RenderConfig::builder().concurrency(4).build()?;
//! let artifact = generate(&store, "q-2026-0042", &config).await?;
//! std::fs::write(&artifact.filename, &artifact.bytes)
//!     .map_err(|e| quotedoc::QuoteDocError::Internal(e.to_string()))?;
//! # Ok(())
//! # }
//! ```
//!
//! The `cli` feature (on by default) builds the `quotedoc` binary, which
//! wraps the same pipeline behind `render` and `serve` subcommands.

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod quote;
pub mod server;
pub mod store;

pub use config::{RenderConfig, RenderConfigBuilder, DEFAULT_ROUTE_COORDINATE};
pub use error::{AssetError, QuoteDocError, RenderPhase};
pub use generate::generate;
pub use output::{artifact_filename, short_ref, RenderArtifact, RenderStats};
pub use pipeline::assets::ImageAsset;
pub use pipeline::engine::{ChromiumEngine, RenderEngine};
pub use pipeline::model::DocumentModel;
pub use pipeline::route::{RouteSpec, Waypoint};
pub use pipeline::template::MarkupDocument;
pub use quote::{
    Accommodation, ClientInfo, DayMetrics, Destination, GeoPoint, ItineraryDay, Pricing,
    QuoteRecord, TourInfo,
};
pub use server::{router, serve, AppState};
pub use store::{JsonDirStore, MemoryStore, QuoteStore};
