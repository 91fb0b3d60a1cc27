//! Document model construction: quote + enriched assets → render-agnostic
//! model.
//!
//! A pure transformation — no I/O, no clock, no randomness. Given the same
//! quote and the same asset map the output is byte-identical. Every field
//! has a defined fallback, so construction always fully succeeds: the
//! degraded states (missing dates, unmapped images, absent coordinates)
//! are data, not errors.

use crate::config::RenderConfig;
use crate::output::short_ref;
use crate::pipeline::assets::ImageAsset;
use crate::pipeline::route::{self, RouteSpec};
use crate::quote::{DayMetrics, Pricing, QuoteRecord};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// The fully-resolved, render-agnostic structure representing everything
/// the final artifact will contain. Built once per request; immutable.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    pub cover: CoverSection,
    /// 1:1 with the quote's itinerary days, in original order.
    pub days: Vec<DaySection>,
    pub route: RouteSpec,
    pub costs: CostBreakdown,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub payment_terms: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CoverSection {
    pub title: String,
    pub client_name: String,
    /// Short form of the quote identifier, reused by the running footer.
    pub quote_ref: String,
    pub day_count: usize,
    /// Inclusive day span between the start and end dates; 0 when either
    /// is missing or malformed (a defined degraded state, not an error).
    pub total_days: i64,
    pub starting_day: Option<String>,
    pub ending_day: Option<String>,
    /// Plain-text trip summary, markup stripped.
    pub summary: String,
    pub start_place: Option<String>,
    pub end_place: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DaySection {
    /// 1-indexed day number.
    pub number: usize,
    pub title: String,
    /// Rich-text body, embedded as markup by the template.
    pub description_html: String,
    pub destination_name: Option<String>,
    pub destination_images: Vec<String>,
    pub accommodation_name: Option<String>,
    pub accommodation_images: Vec<String>,
    pub meals: Vec<String>,
    pub activities: Vec<String>,
    pub metrics: Option<DayMetrics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostBreakdown {
    pub adults: u32,
    pub adult_price: f64,
    pub adult_total: f64,
    pub children: u32,
    pub child_price: f64,
    pub child_total: f64,
    pub subtotal: f64,
}

impl CostBreakdown {
    fn from_pricing(p: &Pricing) -> Self {
        let adult_total = f64::from(p.adults) * p.adult_price;
        let child_total = f64::from(p.children) * p.child_price;
        Self {
            adults: p.adults,
            adult_price: p.adult_price,
            adult_total,
            children: p.children,
            child_price: p.child_price,
            child_total,
            subtotal: adult_total + child_total,
        }
    }
}

/// Build the document model, substituting enriched image assets.
///
/// Image references with no entry in `assets` are left as the original
/// URL — the document must always have something renderable.
pub fn build(
    quote: &QuoteRecord,
    assets: &HashMap<String, ImageAsset>,
    config: &RenderConfig,
) -> DocumentModel {
    let embed = |url: &String| -> String {
        assets
            .get(url)
            .map(|a| a.embeddable.clone())
            .unwrap_or_else(|| url.clone())
    };

    let days = quote
        .days
        .iter()
        .enumerate()
        .map(|(i, day)| DaySection {
            number: i + 1,
            title: day.title.clone(),
            description_html: day.description.clone(),
            destination_name: day.destination.as_ref().map(|d| d.name.clone()),
            destination_images: day
                .destination
                .as_ref()
                .map(|d| d.images.iter().map(embed).collect())
                .unwrap_or_default(),
            accommodation_name: day.accommodation.as_ref().map(|a| a.name.clone()),
            accommodation_images: day
                .accommodation
                .as_ref()
                .map(|a| a.images.iter().map(embed).collect())
                .unwrap_or_default(),
            meals: day.meal_plan.clone(),
            activities: day.activities.clone(),
            metrics: day.metrics.clone(),
        })
        .collect();

    let route = route::build_route(
        &quote.days,
        quote.tour.start_coordinates,
        quote.tour.end_coordinates,
        quote.tour.start_place.as_deref().unwrap_or("Start"),
        quote.tour.end_place.as_deref().unwrap_or("End"),
        config.route_fallback,
    );

    let cover = CoverSection {
        title: quote.tour.title.clone(),
        client_name: quote.client.name.clone(),
        quote_ref: short_ref(&quote.id),
        day_count: quote.days.len(),
        total_days: total_days(
            quote.client.starting_day.as_deref(),
            quote.client.ending_day.as_deref(),
        ),
        starting_day: quote.client.starting_day.clone(),
        ending_day: quote.client.ending_day.clone(),
        summary: strip_markup(&quote.tour.description),
        start_place: quote.tour.start_place.clone(),
        end_place: quote.tour.end_place.clone(),
        cover_image: quote.tour.cover_image.as_ref().map(embed),
    };

    DocumentModel {
        cover,
        days,
        route,
        costs: CostBreakdown::from_pricing(&quote.pricing),
        inclusions: quote.inclusions.clone(),
        exclusions: quote.exclusions.clone(),
        payment_terms: quote.payment_terms.clone(),
    }
}

/// Inclusive day count between two ISO dates; 0 when either is missing,
/// malformed, or the end precedes the start.
pub fn total_days(start: Option<&str>, end: Option<&str>) -> i64 {
    let parse = |s: Option<&str>| s.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
    match (parse(start), parse(end)) {
        (Some(a), Some(b)) if b >= a => (b - a).num_days() + 1,
        _ => 0,
    }
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Strip markup from rich text so it can be reused as a plain-text
/// fragment. Tags are removed, the common entities decoded, and runs of
/// whitespace collapsed.
pub fn strip_markup(text: &str) -> String {
    let no_tags = TAG_RE.replace_all(text, " ");
    let decoded = no_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WS_RE.replace_all(decoded.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{
        Accommodation, ClientInfo, Destination, GeoPoint, ItineraryDay, TourInfo,
    };

    fn quote_with_days(n: usize) -> QuoteRecord {
        QuoteRecord {
            id: "66a1b2c3d4e5f607".into(),
            client: ClientInfo {
                name: "Ada Lovelace".into(),
                starting_day: Some("2026-10-01".into()),
                ending_day: Some("2026-10-05".into()),
            },
            tour: TourInfo {
                title: "Annapurna Circuit".into(),
                description: "<p>High <b>mountain</b>&nbsp;trail</p>".into(),
                cover_image: Some("https://img/cover.jpg".into()),
                start_place: Some("Kathmandu".into()),
                end_place: Some("Pokhara".into()),
                start_coordinates: None,
                end_coordinates: None,
            },
            days: (0..n)
                .map(|i| ItineraryDay {
                    title: format!("Day {}", i + 1),
                    description: format!("<p>walk {}</p>", i + 1),
                    destination: Some(Destination {
                        name: format!("Camp {}", i + 1),
                        coordinates: Some(GeoPoint {
                            lat: 28.0 + i as f64,
                            lng: 84.0,
                        }),
                        images: vec![format!("https://img/dest{}.jpg", i + 1)],
                    }),
                    accommodation: Some(Accommodation {
                        name: format!("Lodge {}", i + 1),
                        images: vec![format!("https://img/lodge{}.jpg", i + 1)],
                    }),
                    meal_plan: vec!["breakfast".into()],
                    activities: Vec::new(),
                    metrics: None,
                })
                .collect(),
            pricing: Pricing {
                adults: 2,
                adult_price: 500.0,
                children: 1,
                child_price: 250.0,
            },
            payment_terms: Some("50% on booking".into()),
            inclusions: vec!["Guide".into()],
            exclusions: vec!["Flights".into()],
        }
    }

    #[test]
    fn sections_match_days_in_order() {
        let quote = quote_with_days(4);
        let model = build(&quote, &HashMap::new(), &RenderConfig::default());
        assert_eq!(model.days.len(), 4);
        for (i, day) in model.days.iter().enumerate() {
            assert_eq!(day.number, i + 1);
            assert_eq!(day.title, format!("Day {}", i + 1));
        }
        assert_eq!(model.route.waypoints.len(), 4);
    }

    #[test]
    fn cost_breakdown_scenario() {
        let quote = quote_with_days(1);
        let model = build(&quote, &HashMap::new(), &RenderConfig::default());
        assert_eq!(model.costs.adult_total, 1000.0);
        assert_eq!(model.costs.child_total, 250.0);
        assert_eq!(model.costs.subtotal, 1250.0);
    }

    #[test]
    fn costs_default_to_zero() {
        let mut quote = quote_with_days(1);
        quote.pricing = Pricing::default();
        let model = build(&quote, &HashMap::new(), &RenderConfig::default());
        assert_eq!(model.costs.subtotal, 0.0);
    }

    #[test]
    fn image_substitution_uses_assets_and_falls_back() {
        let quote = quote_with_days(2);
        let mut assets = HashMap::new();
        assets.insert(
            "https://img/dest1.jpg".to_string(),
            ImageAsset {
                source_url: "https://img/dest1.jpg".into(),
                embeddable: "data:image/jpeg;base64,AAAA".into(),
            },
        );
        let model = build(&quote, &assets, &RenderConfig::default());
        assert_eq!(
            model.days[0].destination_images[0],
            "data:image/jpeg;base64,AAAA"
        );
        // Unmapped references stay as the original URL.
        assert_eq!(model.days[1].destination_images[0], "https://img/dest2.jpg");
        assert_eq!(
            model.cover.cover_image.as_deref(),
            Some("https://img/cover.jpg")
        );
    }

    #[test]
    fn total_days_is_inclusive() {
        assert_eq!(total_days(Some("2026-10-01"), Some("2026-10-05")), 5);
        assert_eq!(total_days(Some("2026-10-01"), Some("2026-10-01")), 1);
    }

    #[test]
    fn total_days_defaults_to_zero() {
        assert_eq!(total_days(None, Some("2026-10-05")), 0);
        assert_eq!(total_days(Some("2026-10-01"), None), 0);
        assert_eq!(total_days(Some("not-a-date"), Some("2026-10-05")), 0);
        // End before start is the same degraded state.
        assert_eq!(total_days(Some("2026-10-05"), Some("2026-10-01")), 0);
    }

    #[test]
    fn summary_strips_markup() {
        let quote = quote_with_days(1);
        let model = build(&quote, &HashMap::new(), &RenderConfig::default());
        assert_eq!(model.cover.summary, "High mountain trail");
    }

    #[test]
    fn strip_markup_decodes_entities_and_collapses_whitespace() {
        assert_eq!(
            strip_markup("<p>Tea&nbsp;&amp;  biscuits</p>\n<br/>done"),
            "Tea & biscuits done"
        );
        assert_eq!(strip_markup(""), "");
        assert_eq!(strip_markup("plain"), "plain");
    }

    #[test]
    fn deterministic_given_identical_inputs() {
        let quote = quote_with_days(3);
        let assets = HashMap::new();
        let config = RenderConfig::default();
        let a = build(&quote, &assets, &config);
        let b = build(&quote, &assets, &config);
        assert_eq!(a.cover.quote_ref, b.cover.quote_ref);
        assert_eq!(a.days.len(), b.days.len());
        assert_eq!(a.costs, b.costs);
        assert_eq!(a.route.polyline(), b.route.polyline());
    }
}
