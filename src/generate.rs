//! Pipeline orchestration: quote id in, PDF artifact out.
//!
//! The stages run strictly in order — fetch, enrich, model, map, markup,
//! render — because each consumes the previous stage's output. Only the
//! enrichment stage fans out internally; see [`crate::pipeline::assets`].

use crate::config::RenderConfig;
use crate::error::QuoteDocError;
use crate::output::{artifact_filename, RenderArtifact, RenderStats};
use crate::pipeline::engine::{ChromiumEngine, RenderEngine};
use crate::pipeline::{assets, map, model, template};
use crate::quote::QuoteRecord;
use crate::store::QuoteStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Headroom granted on top of the render deadline before the orchestrator
/// abandons an engine. [`ChromiumEngine`] enforces the deadline itself and
/// releases its session before returning; this slack keeps the backstop
/// from pre-empting that teardown.
const RENDER_BACKSTOP_GRACE: Duration = Duration::from_secs(2);

/// Generate the quote document for `quote_id`.
///
/// A missing quote is reported as [`QuoteDocError::NotFound`] before any
/// network or rendering work starts. Rendering is bounded by
/// `config.render_timeout_secs`; unlike image enrichment, an elapsed
/// render deadline is fatal — there is no partial PDF to degrade to.
pub async fn generate(
    store: &dyn QuoteStore,
    quote_id: &str,
    config: &RenderConfig,
) -> Result<RenderArtifact, QuoteDocError> {
    let started = Instant::now();

    let quote = match store.fetch(quote_id).await {
        Ok(Some(quote)) => quote,
        Ok(None) => return Err(QuoteDocError::NotFound { id: quote_id.to_string() }),
        Err(e) => {
            // A broken store is indistinguishable from a missing quote to
            // the caller; the detail stays in the log.
            warn!("store lookup for {quote_id} failed: {e}");
            return Err(QuoteDocError::NotFound { id: quote_id.to_string() });
        }
    };
    info!(
        "generating document for quote {} ({} days)",
        quote.id,
        quote.days.len()
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()
        .map_err(|e| QuoteDocError::Internal(format!("http client: {e}")))?;

    let urls = collect_image_urls(&quote);
    let enrich_started = Instant::now();
    let enriched = assets::enrich(&client, &urls, config).await;
    let degraded = enriched.values().filter(|a| a.is_degraded()).count();
    let enrich_duration = enrich_started.elapsed();
    info!(
        "enriched {} images ({} degraded) in {}ms",
        urls.len(),
        degraded,
        enrich_duration.as_millis()
    );

    let document = model::build(&quote, &enriched, config);
    let raster = map::render_route_map(&client, &document.route, config).await;
    let markup = template::render(&document, raster.as_deref());

    let engine = resolve_engine(config);
    let render_started = Instant::now();
    let render = engine.render(&markup);
    // The backstop only fires for engines that fail to bound themselves.
    let backstop = Duration::from_secs(config.render_timeout_secs) + RENDER_BACKSTOP_GRACE;
    let bytes = tokio::time::timeout(backstop, render)
        .await
        .map_err(|_| QuoteDocError::RenderTimeout { secs: config.render_timeout_secs })??;
    let render_duration = render_started.elapsed();

    let total_duration = started.elapsed();
    info!(
        "quote {} rendered: {} bytes in {}ms (render {}ms)",
        quote.id,
        bytes.len(),
        total_duration.as_millis(),
        render_duration.as_millis()
    );

    let stats = RenderStats {
        image_count: urls.len(),
        degraded_images: degraded,
        enrich_duration_ms: enrich_duration.as_millis() as u64,
        render_duration_ms: render_duration.as_millis() as u64,
        total_duration_ms: total_duration.as_millis() as u64,
        pdf_bytes: bytes.len(),
    };
    Ok(RenderArtifact {
        filename: artifact_filename(&quote.id),
        bytes,
        stats,
    })
}

/// Every image URL the document can reference, deduplicated in
/// first-seen order. A URL used by several days is fetched once.
pub fn collect_image_urls(quote: &QuoteRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut push = |url: &String| {
        if !url.is_empty() && seen.insert(url.clone()) {
            urls.push(url.clone());
        }
    };

    if let Some(cover) = &quote.tour.cover_image {
        push(cover);
    }
    for day in &quote.days {
        if let Some(dest) = &day.destination {
            dest.images.iter().for_each(&mut push);
        }
        if let Some(acc) = &day.accommodation {
            acc.images.iter().for_each(&mut push);
        }
    }
    urls
}

fn resolve_engine(config: &RenderConfig) -> Arc<dyn RenderEngine> {
    match &config.engine {
        Some(engine) => Arc::clone(engine),
        None => Arc::new(ChromiumEngine::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{Accommodation, Destination, ItineraryDay, TourInfo};

    fn day(dest_images: &[&str], acc_images: &[&str]) -> ItineraryDay {
        ItineraryDay {
            destination: Some(Destination {
                name: "Somewhere".into(),
                images: dest_images.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }),
            accommodation: Some(Accommodation {
                name: "Lodge".into(),
                images: acc_images.iter().map(|s| s.to_string()).collect(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn collects_in_first_seen_order_without_duplicates() {
        let quote = QuoteRecord {
            tour: TourInfo {
                cover_image: Some("https://img.test/cover.jpg".into()),
                ..Default::default()
            },
            days: vec![
                day(&["https://img.test/a.jpg", "https://img.test/b.jpg"], &[
                    "https://img.test/lodge.jpg",
                ]),
                // shares the lodge photo with day one
                day(&["https://img.test/c.jpg"], &["https://img.test/lodge.jpg"]),
            ],
            ..Default::default()
        };
        let urls = collect_image_urls(&quote);
        assert_eq!(
            urls,
            vec![
                "https://img.test/cover.jpg",
                "https://img.test/a.jpg",
                "https://img.test/b.jpg",
                "https://img.test/lodge.jpg",
                "https://img.test/c.jpg",
            ]
        );
    }

    #[test]
    fn skips_empty_urls() {
        let quote = QuoteRecord {
            days: vec![day(&[""], &[])],
            ..Default::default()
        };
        assert!(collect_image_urls(&quote).is_empty());
    }
}
