//! The quote record: the structured booking data the pipeline consumes.
//!
//! Owned by an external document store; read-only here. The wire format
//! uses camelCase field names and treats every optional field as absent
//! rather than null, so deserialisation defaults aggressively. Nothing in
//! this module is mutated after construction — the whole pipeline is a
//! read-only transform over one `QuoteRecord`.

use serde::{Deserialize, Serialize};

/// A client-specific trip proposal: itinerary, pricing, and contact data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub id: String,
    pub client: ClientInfo,
    pub tour: TourInfo,
    #[serde(default)]
    pub days: Vec<ItineraryDay>,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

/// Client name plus the trip's start/end dates as ISO `YYYY-MM-DD` strings.
///
/// A malformed date is treated exactly like an absent one downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub starting_day: Option<String>,
    #[serde(default)]
    pub ending_day: Option<String>,
}

/// Tour-level information shared by all days of the itinerary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourInfo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub start_place: Option<String>,
    #[serde(default)]
    pub end_place: Option<String>,
    #[serde(default)]
    pub start_coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub end_coordinates: Option<GeoPoint>,
}

/// One day's plan within the quote.
///
/// `description` is rich text produced by an editor; it is embedded as
/// markup in the day section and stripped to plain text anywhere it is
/// reused outside markup. An empty meal/activity list and an absent field
/// mean the same thing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub destination: Option<Destination>,
    #[serde(default)]
    pub accommodation: Option<Accommodation>,
    #[serde(default)]
    pub meal_plan: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub metrics: Option<DayMetrics>,
}

/// Where a day is spent. `coordinates` may be absent — every consumer
/// must substitute an explicit fallback, never skip the day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub name: String,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Where a day's night is spent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Optional numeric metrics for a day (trek duration, driving distance…).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayMetrics {
    #[serde(default)]
    pub duration_hours: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub max_altitude_m: Option<f64>,
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Pricing inputs. All counts and prices default to 0 when absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub adult_price: f64,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub child_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_record() {
        let json = r#"{
            "id": "q-2026-0042",
            "client": { "name": "Ada" },
            "tour": { "title": "Annapurna Circuit" }
        }"#;
        let q: QuoteRecord = serde_json::from_str(json).expect("minimal record parses");
        assert_eq!(q.id, "q-2026-0042");
        assert!(q.days.is_empty());
        assert_eq!(q.pricing.adults, 0);
        assert!(q.client.starting_day.is_none());
    }

    #[test]
    fn deserialize_camel_case_day() {
        let json = r#"{
            "title": "Day 1",
            "mealPlan": ["breakfast", "dinner"],
            "destination": {
                "name": "Pokhara",
                "coordinates": { "lat": 28.2, "lng": 83.9 },
                "images": ["https://img/pokhara.jpg"]
            },
            "metrics": { "maxAltitudeM": 822.0 }
        }"#;
        let d: ItineraryDay = serde_json::from_str(json).expect("day parses");
        assert_eq!(d.meal_plan.len(), 2);
        let dest = d.destination.expect("destination present");
        assert_eq!(dest.coordinates, Some(GeoPoint { lat: 28.2, lng: 83.9 }));
        assert_eq!(d.metrics.expect("metrics").max_altitude_m, Some(822.0));
    }
}
