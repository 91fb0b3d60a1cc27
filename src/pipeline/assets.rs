//! Image enrichment: remote URL → bounded, inline-embeddable asset.
//!
//! Every photo referenced by a quote is fetched and transcoded to a capped
//! width and fixed JPEG quality, then wrapped in a base64 data URI so the
//! final markup needs no network access. The contract is deliberately
//! total: [`process`] never fails. Any fetch or transcode problem degrades
//! to the original URL with a warning — a broken photo must never abort
//! document generation.

use crate::config::RenderConfig;
use crate::error::AssetError;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, warn};

/// A remote image in embeddable form.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    /// The URL the quote referenced.
    pub source_url: String,
    /// Either a `data:image/jpeg;base64,…` URI or, on failure, the
    /// unchanged source URL. Never empty.
    pub embeddable: String,
}

impl ImageAsset {
    /// Fallback asset: the document renders the original URL directly.
    pub fn degraded(url: &str) -> Self {
        Self {
            source_url: url.to_string(),
            embeddable: url.to_string(),
        }
    }

    /// True when transcoding failed and the source URL is used as-is.
    pub fn is_degraded(&self) -> bool {
        self.embeddable == self.source_url
    }
}

/// Fetch and transcode one image. Total: always returns an asset.
pub async fn process(client: &reqwest::Client, url: &str, config: &RenderConfig) -> ImageAsset {
    match fetch_and_transcode(client, url, config).await {
        Ok(embeddable) => {
            debug!("embedded image '{}' ({} bytes inline)", url, embeddable.len());
            ImageAsset {
                source_url: url.to_string(),
                embeddable,
            }
        }
        Err(e) => {
            warn!("image degraded: {e}");
            ImageAsset::degraded(url)
        }
    }
}

/// Enrich a set of distinct URLs with bounded fan-out.
///
/// Each image is an independent fetch+transcode task; up to
/// `config.concurrency` run at once and the full set is awaited before the
/// document model is built. The whole stage is bounded by
/// `config.enrich_deadline_secs`: on elapse the still-in-flight tasks are
/// abandoned and their entries fall back to the source URL, while assets
/// that already finished are kept — the same degrade policy as a single
/// failed fetch, applied only to what the deadline actually cut off.
pub async fn enrich(
    client: &reqwest::Client,
    urls: &[String],
    config: &RenderConfig,
) -> HashMap<String, ImageAsset> {
    let deadline = Duration::from_secs(config.enrich_deadline_secs);

    // Each task owns its URL so the futures carry no borrow of `urls`.
    let mut pending = stream::iter(urls.iter().cloned().map(|url| {
        let client = client.clone();
        async move {
            let asset = process(&client, &url, config).await;
            (url, asset)
        }
    }))
    .buffer_unordered(config.concurrency);

    // Collect incrementally while racing the deadline: assets that finish
    // before elapse are kept, only the still-in-flight ones degrade.
    let mut assets = HashMap::with_capacity(urls.len());
    let elapse = tokio::time::sleep(deadline);
    tokio::pin!(elapse);
    loop {
        tokio::select! {
            item = pending.next() => match item {
                Some((url, asset)) => {
                    assets.insert(url, asset);
                }
                None => break,
            },
            _ = &mut elapse => {
                warn!(
                    "image enrichment deadline ({}s) elapsed with {} of {} images done; \
                     the rest fall back to source URLs",
                    config.enrich_deadline_secs,
                    assets.len(),
                    urls.len()
                );
                break;
            }
        }
    }

    for url in urls {
        assets
            .entry(url.clone())
            .or_insert_with(|| ImageAsset::degraded(url));
    }
    assets
}

async fn fetch_and_transcode(
    client: &reqwest::Client,
    url: &str,
    config: &RenderConfig,
) -> Result<String, AssetError> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AssetError::Timeout {
                url: url.to_string(),
                secs: config.fetch_timeout_secs,
            }
        } else {
            AssetError::Fetch {
                url: url.to_string(),
                detail: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AssetError::Fetch {
            url: url.to_string(),
            detail: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| AssetError::Fetch {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    transcode(&bytes, config).map_err(|detail| AssetError::Transcode {
        url: url.to_string(),
        detail,
    })
}

/// Decode arbitrary image bytes, bound the width, re-encode as JPEG, and
/// wrap in a data URI. Unusual aspect ratios and bit depths are accepted;
/// only undecodable bytes are rejected.
pub fn transcode(bytes: &[u8], config: &RenderConfig) -> Result<String, String> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let img = bound_width(img, config.image_max_width);

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        Cursor::new(&mut buf),
        config.image_jpeg_quality,
    );
    rgb.write_with_encoder(encoder).map_err(|e| e.to_string())?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&buf)))
}

/// Shrink to at most `max_width` pixels wide, preserving aspect ratio.
/// Images already narrower are left untouched — upscaling only adds bytes.
fn bound_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    if img.width() <= max_width {
        return img;
    }
    let height = ((img.height() as u64 * max_width as u64) / img.width() as u64).max(1) as u32;
    img.resize_exact(max_width, height, image::imageops::FilterType::Triangle)
}
