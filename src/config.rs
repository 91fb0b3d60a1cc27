//! Configuration for document generation.
//!
//! All pipeline behaviour is controlled through [`RenderConfig`], built via
//! its [`RenderConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across requests and to diff two runs to
//! understand why their outputs differ.

use crate::error::QuoteDocError;
use crate::pipeline::engine::RenderEngine;
use crate::quote::GeoPoint;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Fallback coordinate used wherever the quote omits one: absent day
/// coordinates and unset tour start/end points all resolve here.
///
/// The value is Kathmandu, the operator's home base; it only affects
/// quotes with incomplete geography, where any stable point is equally
/// arbitrary and a well-known one is easiest to spot in output.
pub const DEFAULT_ROUTE_COORDINATE: GeoPoint = GeoPoint {
    lat: 27.7172,
    lng: 85.3240,
};

/// Configuration for one or more document-generation requests.
///
/// Built via [`RenderConfig::builder()`] or [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use quotedoc::RenderConfig;
///
/// let config = RenderConfig::builder()
///     .image_max_width(600)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Maximum width of an embedded image in pixels. Default: 800.
    ///
    /// Photos come from CMS uploads at arbitrary resolution; 800 px spans a
    /// full A4 column at print density while keeping each inline data URI
    /// around 50–100 KB. Images are never upscaled.
    pub image_max_width: u32,

    /// JPEG quality for transcoded images, 1–100. Default: 70.
    pub image_jpeg_quality: u8,

    /// Per-image fetch timeout in seconds. Default: 15.
    pub fetch_timeout_secs: u64,

    /// Number of concurrent image fetch+transcode tasks. Default: 8.
    ///
    /// Image enrichment is network-bound; fanning out cuts wall-clock time
    /// roughly linearly until the cap. The cap bounds outbound connections
    /// and the memory held by simultaneously buffered images.
    pub concurrency: usize,

    /// Overall deadline for the image-enrichment stage in seconds. Default: 60.
    ///
    /// On elapse the in-flight fetches are abandoned and their assets fall
    /// back to the original URLs — the same degrade policy as an individual
    /// fetch failure. The request itself never fails here.
    pub enrich_deadline_secs: u64,

    /// Overall rendering deadline in seconds. Default: 90.
    ///
    /// Unlike the enrichment deadline this one is fatal: on elapse the
    /// request fails with `RenderTimeout` and the session is released.
    pub render_timeout_secs: u64,

    /// How long the engine waits for the loaded document to settle before
    /// pagination, in seconds. Default: 20. Elapse is `RenderIncomplete`.
    pub settle_timeout_secs: u64,

    /// Route-map raster viewport in pixels. Default: 640 × 400.
    pub map_width: u32,
    pub map_height: u32,

    /// Maximum slippy-map zoom level for the route raster. Default: 12.
    pub map_max_zoom: u8,

    /// Tile URL template with `{z}`/`{x}`/`{y}` placeholders.
    /// Default: the public OpenStreetMap tile server.
    pub tile_url_template: String,

    /// Coordinate substituted wherever the quote has none.
    /// Default: [`DEFAULT_ROUTE_COORDINATE`].
    pub route_fallback: GeoPoint,

    /// Explicit browser executable for the rendering session. When `None`,
    /// a system Chrome/Chromium is located automatically.
    pub browser_path: Option<PathBuf>,

    /// Pre-built rendering engine. Takes precedence over launching a
    /// Chromium session; used by embedders and tests.
    pub engine: Option<Arc<dyn RenderEngine>>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_max_width: 800,
            image_jpeg_quality: 70,
            fetch_timeout_secs: 15,
            concurrency: 8,
            enrich_deadline_secs: 60,
            render_timeout_secs: 90,
            settle_timeout_secs: 20,
            map_width: 640,
            map_height: 400,
            map_max_zoom: 12,
            tile_url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            route_fallback: DEFAULT_ROUTE_COORDINATE,
            browser_path: None,
            engine: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("image_max_width", &self.image_max_width)
            .field("image_jpeg_quality", &self.image_jpeg_quality)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("enrich_deadline_secs", &self.enrich_deadline_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("settle_timeout_secs", &self.settle_timeout_secs)
            .field("map_width", &self.map_width)
            .field("map_height", &self.map_height)
            .field("map_max_zoom", &self.map_max_zoom)
            .field("tile_url_template", &self.tile_url_template)
            .field("route_fallback", &self.route_fallback)
            .field("browser_path", &self.browser_path)
            .field("engine", &self.engine.as_ref().map(|_| "<dyn RenderEngine>"))
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn image_max_width(mut self, px: u32) -> Self {
        self.config.image_max_width = px.max(100);
        self
    }

    pub fn image_jpeg_quality(mut self, q: u8) -> Self {
        self.config.image_jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn enrich_deadline_secs(mut self, secs: u64) -> Self {
        self.config.enrich_deadline_secs = secs;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    pub fn settle_timeout_secs(mut self, secs: u64) -> Self {
        self.config.settle_timeout_secs = secs.max(1);
        self
    }

    pub fn map_viewport(mut self, width: u32, height: u32) -> Self {
        self.config.map_width = width.max(64);
        self.config.map_height = height.max(64);
        self
    }

    pub fn map_max_zoom(mut self, zoom: u8) -> Self {
        self.config.map_max_zoom = zoom.clamp(1, 19);
        self
    }

    pub fn tile_url_template(mut self, template: impl Into<String>) -> Self {
        self.config.tile_url_template = template.into();
        self
    }

    pub fn route_fallback(mut self, point: GeoPoint) -> Self {
        self.config.route_fallback = point;
        self
    }

    pub fn browser_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_path = Some(path.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn RenderEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, QuoteDocError> {
        let c = &self.config;
        if c.image_jpeg_quality == 0 || c.image_jpeg_quality > 100 {
            return Err(QuoteDocError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.image_jpeg_quality
            )));
        }
        if c.concurrency == 0 {
            return Err(QuoteDocError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if !c.tile_url_template.contains("{z}")
            || !c.tile_url_template.contains("{x}")
            || !c.tile_url_template.contains("{y}")
        {
            return Err(QuoteDocError::InvalidConfig(format!(
                "tile URL template must contain {{z}}/{{x}}/{{y}}, got '{}'",
                c.tile_url_template
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = RenderConfig::builder().build().expect("defaults build");
        assert_eq!(c.image_max_width, 800);
        assert_eq!(c.image_jpeg_quality, 70);
        assert_eq!(c.route_fallback, DEFAULT_ROUTE_COORDINATE);
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let c = RenderConfig::builder()
            .image_max_width(10)
            .image_jpeg_quality(200)
            .concurrency(0)
            .build()
            .expect("clamped values build");
        assert_eq!(c.image_max_width, 100);
        assert_eq!(c.image_jpeg_quality, 100);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn rejects_tile_template_without_placeholders() {
        let err = RenderConfig::builder()
            .tile_url_template("https://tiles.example.com/static.png")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("tile URL template"));
    }
}
