//! Static route-map rasterisation.
//!
//! The source material for the route section is the [`RouteSpec`] built in
//! [`crate::pipeline::route`]. Rather than executing a tile-map script
//! inside the rendering session, the map is pre-rendered here: slippy
//! tiles are fetched, stitched into a viewport, the route polyline and
//! endpoint markers are drawn on top, and the result is embedded as a
//! plain PNG data URI. The rendering engine then never runs script.
//!
//! Failure policy matches image enrichment: any problem degrades to `None`
//! with a warning, and the template falls back to a textual waypoint list.

use crate::config::RenderConfig;
use crate::pipeline::route::RouteSpec;
use crate::quote::GeoPoint;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::stream::{self, StreamExt};
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use tracing::{debug, warn};

const TILE_SIZE: u32 = 256;
/// Pixels of breathing room around the route bounds when fitting zoom.
const FIT_PADDING: f64 = 48.0;
/// Concurrent tile fetches per map. Tile servers throttle aggressively;
/// four is within the public OSM usage policy.
const TILE_CONCURRENCY: usize = 4;

const ROUTE_COLOR: Rgba<u8> = Rgba([217, 48, 37, 255]);
const MARKER_COLOR: Rgba<u8> = Rgba([26, 115, 232, 255]);
const BACKGROUND: Rgba<u8> = Rgba([225, 228, 232, 255]);

/// Render the route to a PNG data URI, or `None` on any failure.
pub async fn render_route_map(
    client: &reqwest::Client,
    route: &RouteSpec,
    config: &RenderConfig,
) -> Option<String> {
    let line = route.polyline();
    let zoom = fit_zoom(&line, config.map_width, config.map_height, config.map_max_zoom);
    let view = Viewport::centered(&line, zoom, config.map_width, config.map_height);

    let mut canvas = RgbaImage::from_pixel(config.map_width, config.map_height, BACKGROUND);

    let fetched = stitch_tiles(client, &mut canvas, &view, &config.tile_url_template).await;
    if fetched == 0 {
        warn!("route map degraded: no tiles could be fetched at zoom {zoom}");
        return None;
    }

    draw_polyline(&mut canvas, &view, &line);
    for (i, p) in line.iter().enumerate() {
        let endpoint = i == 0 || i == line.len() - 1;
        let (px, py) = view.to_pixel(*p);
        draw_disc(
            &mut canvas,
            px,
            py,
            if endpoint { 6 } else { 4 },
            MARKER_COLOR,
        );
    }

    let mut buf = Vec::new();
    if let Err(e) = image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
    {
        warn!("route map degraded: png encode failed: {e}");
        return None;
    }
    debug!("route map rasterised: zoom {zoom}, {fetched} tiles, {} bytes", buf.len());
    Some(format!("data:image/png;base64,{}", STANDARD.encode(&buf)))
}

/// Web-Mercator projection to global pixel coordinates at `zoom`.
pub fn project(p: GeoPoint, zoom: u8) -> (f64, f64) {
    let scale = (u64::from(TILE_SIZE) << zoom) as f64;
    let x = (p.lng + 180.0) / 360.0 * scale;
    let lat = p.lat.clamp(-85.0511, 85.0511).to_radians();
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * scale;
    (x, y)
}

/// Largest zoom at which the padded route bounds fit the viewport.
pub fn fit_zoom(points: &[GeoPoint], width: u32, height: u32, max_zoom: u8) -> u8 {
    for zoom in (1..=max_zoom).rev() {
        let (min_x, min_y, max_x, max_y) = pixel_bounds(points, zoom);
        if max_x - min_x + 2.0 * FIT_PADDING <= f64::from(width)
            && max_y - min_y + 2.0 * FIT_PADDING <= f64::from(height)
        {
            return zoom;
        }
    }
    1
}

fn pixel_bounds(points: &[GeoPoint], zoom: u8) -> (f64, f64, f64, f64) {
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for p in points {
        let (x, y) = project(*p, zoom);
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    (min_x, min_y, max_x, max_y)
}

/// A viewport into global pixel space at a fixed zoom.
struct Viewport {
    zoom: u8,
    /// Global pixel coordinate of the viewport's top-left corner.
    left: f64,
    top: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    fn centered(points: &[GeoPoint], zoom: u8, width: u32, height: u32) -> Self {
        let (min_x, min_y, max_x, max_y) = pixel_bounds(points, zoom);
        let cx = (min_x + max_x) / 2.0;
        let cy = (min_y + max_y) / 2.0;
        Self {
            zoom,
            left: cx - f64::from(width) / 2.0,
            top: cy - f64::from(height) / 2.0,
            width,
            height,
        }
    }

    fn to_pixel(&self, p: GeoPoint) -> (i64, i64) {
        let (x, y) = project(p, self.zoom);
        ((x - self.left).round() as i64, (y - self.top).round() as i64)
    }

    /// Tile index ranges covering the viewport, clamped to the tile grid.
    fn tile_range(&self) -> (i64, i64, i64, i64) {
        let max_tile = (1i64 << self.zoom) - 1;
        let clamp = |v: i64| v.clamp(0, max_tile);
        let tx0 = clamp((self.left / f64::from(TILE_SIZE)).floor() as i64);
        let ty0 = clamp((self.top / f64::from(TILE_SIZE)).floor() as i64);
        let tx1 = clamp(((self.left + f64::from(self.width)) / f64::from(TILE_SIZE)).floor() as i64);
        let ty1 = clamp(((self.top + f64::from(self.height)) / f64::from(TILE_SIZE)).floor() as i64);
        (tx0, ty0, tx1, ty1)
    }
}

/// Fetch and composite every tile intersecting the viewport; returns the
/// number of tiles successfully placed. Individual tile failures leave a
/// background-coloured gap.
async fn stitch_tiles(
    client: &reqwest::Client,
    canvas: &mut RgbaImage,
    view: &Viewport,
    template: &str,
) -> usize {
    let (tx0, ty0, tx1, ty1) = view.tile_range();
    let mut coords = Vec::new();
    for ty in ty0..=ty1 {
        for tx in tx0..=tx1 {
            coords.push((tx, ty));
        }
    }

    let tiles: Vec<((i64, i64), Option<RgbaImage>)> = stream::iter(coords.into_iter().map(|(tx, ty)| {
        let client = client.clone();
        let url = template
            .replace("{z}", &view.zoom.to_string())
            .replace("{x}", &tx.to_string())
            .replace("{y}", &ty.to_string());
        async move { ((tx, ty), fetch_tile(&client, &url).await) }
    }))
    .buffer_unordered(TILE_CONCURRENCY)
    .collect()
    .await;

    let mut placed = 0;
    for ((tx, ty), tile) in tiles {
        let Some(tile) = tile else { continue };
        let ox = tx * i64::from(TILE_SIZE) - view.left.round() as i64;
        let oy = ty * i64::from(TILE_SIZE) - view.top.round() as i64;
        image::imageops::overlay(canvas, &tile, ox, oy);
        placed += 1;
    }
    placed
}

async fn fetch_tile(client: &reqwest::Client, url: &str) -> Option<RgbaImage> {
    let response = match client
        .get(url)
        // The public OSM tile policy requires an identifying agent.
        .header(reqwest::header::USER_AGENT, "quotedoc/0.1")
        .send()
        .await
    {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            debug!("tile fetch '{}' returned HTTP {}", url, r.status());
            return None;
        }
        Err(e) => {
            debug!("tile fetch '{}' failed: {e}", url);
            return None;
        }
    };
    let bytes = response.bytes().await.ok()?;
    Some(image::load_from_memory(&bytes).ok()?.to_rgba8())
}

/// Plot a line by sampling along each segment; at tile-map scales this is
/// indistinguishable from a proper stroke and needs no extra dependency.
fn draw_polyline(canvas: &mut RgbaImage, view: &Viewport, line: &[GeoPoint]) {
    for pair in line.windows(2) {
        let (x0, y0) = view.to_pixel(pair[0]);
        let (x1, y1) = view.to_pixel(pair[1]);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            let x = x0 + ((x1 - x0) as f64 * t).round() as i64;
            let y = y0 + ((y1 - y0) as f64 * t).round() as i64;
            draw_disc(canvas, x, y, 1, ROUTE_COLOR);
        }
    }
}

fn draw_disc(canvas: &mut RgbaImage, cx: i64, cy: i64, radius: i64, color: Rgba<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let x = cx + dx;
            let y = cy + dy;
            if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_equator_meridian_is_center() {
        let (x, y) = project(GeoPoint { lat: 0.0, lng: 0.0 }, 1);
        // Zoom 1 world is 512 px; the origin sits at its center.
        assert!((x - 256.0).abs() < 1e-6);
        assert!((y - 256.0).abs() < 1e-6);
    }

    #[test]
    fn project_is_monotonic() {
        let a = project(GeoPoint { lat: 10.0, lng: 10.0 }, 5);
        let b = project(GeoPoint { lat: 20.0, lng: 20.0 }, 5);
        assert!(b.0 > a.0, "longitude grows east");
        assert!(b.1 < a.1, "pixel y shrinks north");
    }

    #[test]
    fn fit_zoom_shrinks_for_wide_routes() {
        let tight = vec![
            GeoPoint { lat: 27.70, lng: 85.30 },
            GeoPoint { lat: 27.72, lng: 85.33 },
        ];
        let wide = vec![
            GeoPoint { lat: 27.0, lng: 85.0 },
            GeoPoint { lat: 30.0, lng: 88.0 },
        ];
        let z_tight = fit_zoom(&tight, 640, 400, 12);
        let z_wide = fit_zoom(&wide, 640, 400, 12);
        assert!(z_tight > z_wide);
        assert!(z_wide >= 1);
    }

    #[test]
    fn fit_zoom_single_point_uses_max() {
        let point = vec![GeoPoint { lat: 27.7, lng: 85.3 }];
        assert_eq!(fit_zoom(&point, 640, 400, 12), 12);
    }

    #[test]
    fn viewport_pixel_mapping_centers_route() {
        let line = vec![
            GeoPoint { lat: 27.6, lng: 85.2 },
            GeoPoint { lat: 27.8, lng: 85.4 },
        ];
        let view = Viewport::centered(&line, 10, 640, 400);
        let (x0, y0) = view.to_pixel(line[0]);
        let (x1, y1) = view.to_pixel(line[1]);
        // Bounds midpoint lands on the viewport midpoint.
        assert_eq!((x0 + x1) / 2, 320);
        assert_eq!((y0 + y1) / 2, 200);
    }

    #[test]
    fn tile_range_clamps_to_grid() {
        let line = vec![GeoPoint { lat: 85.0, lng: -179.9 }];
        let view = Viewport::centered(&line, 1, 640, 400);
        let (tx0, ty0, tx1, ty1) = view.tile_range();
        assert!(tx0 >= 0 && ty0 >= 0);
        assert!(tx1 <= 1 && ty1 <= 1);
    }

    #[test]
    fn draw_disc_stays_in_bounds() {
        let mut canvas = RgbaImage::from_pixel(10, 10, BACKGROUND);
        draw_disc(&mut canvas, 0, 0, 3, ROUTE_COLOR);
        draw_disc(&mut canvas, 20, 20, 3, ROUTE_COLOR);
        assert_eq!(*canvas.get_pixel(0, 0), ROUTE_COLOR);
    }

    #[tokio::test]
    async fn render_degrades_when_tiles_unreachable() {
        let config = RenderConfig::builder()
            .tile_url_template("http://127.0.0.1:1/{z}/{x}/{y}.png")
            .build()
            .unwrap();
        let route = crate::pipeline::route::build_route(
            &[],
            None,
            None,
            "S",
            "E",
            crate::config::DEFAULT_ROUTE_COORDINATE,
        );
        let client = reqwest::Client::new();
        assert!(render_route_map(&client, &route, &config).await.is_none());
    }
}
