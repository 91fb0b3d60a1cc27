//! Route derivation: itinerary days → ordered waypoints with fallbacks.
//!
//! One waypoint per day, in day order, no exceptions: downstream labelling
//! ("Day 3: Manang") and the map raster both index waypoints by itinerary
//! position, so a day without coordinates substitutes the start fallback
//! rather than being dropped.

use crate::quote::{GeoPoint, ItineraryDay};

/// A single geographic point on the route polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    pub label: String,
}

impl Waypoint {
    fn new(point: GeoPoint, label: impl Into<String>) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            label: label.into(),
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// The declarative route-map input: per-day waypoints plus explicit
/// start and end points.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    /// Exactly one waypoint per itinerary day, in itinerary order.
    pub waypoints: Vec<Waypoint>,
    pub start: Waypoint,
    pub end: Waypoint,
}

impl RouteSpec {
    /// The candidate polyline `[start] + waypoints + [end]`,
    /// always of length `days + 2`.
    pub fn polyline(&self) -> Vec<GeoPoint> {
        let mut line = Vec::with_capacity(self.waypoints.len() + 2);
        line.push(self.start.point());
        line.extend(self.waypoints.iter().map(Waypoint::point));
        line.push(self.end.point());
        line
    }
}

/// Build the route from the itinerary.
///
/// `start`/`end` are the quote's explicit starting/ending coordinates when
/// set, else the supplied fallbacks. A day whose destination has no
/// coordinates maps to the start point, preserving the 1:1 waypoint/day
/// correspondence.
pub fn build_route(
    days: &[ItineraryDay],
    start: Option<GeoPoint>,
    end: Option<GeoPoint>,
    start_label: &str,
    end_label: &str,
    fallback: GeoPoint,
) -> RouteSpec {
    let start = Waypoint::new(start.unwrap_or(fallback), start_label);
    let end = Waypoint::new(end.unwrap_or(fallback), end_label);

    let waypoints = days
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let (point, name) = match &day.destination {
                Some(dest) => (
                    dest.coordinates.unwrap_or(start.point()),
                    dest.name.as_str(),
                ),
                None => (start.point(), day.title.as_str()),
            };
            Waypoint::new(point, format!("Day {}: {}", i + 1, name))
        })
        .collect();

    RouteSpec {
        waypoints,
        start,
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ROUTE_COORDINATE;
    use crate::quote::Destination;

    fn day_at(name: &str, coords: Option<GeoPoint>) -> ItineraryDay {
        ItineraryDay {
            title: format!("To {name}"),
            description: String::new(),
            destination: Some(Destination {
                name: name.to_string(),
                coordinates: coords,
                images: Vec::new(),
            }),
            accommodation: None,
            meal_plan: Vec::new(),
            activities: Vec::new(),
            metrics: None,
        }
    }

    #[test]
    fn one_waypoint_per_day_in_order() {
        let days = vec![
            day_at("Pokhara", Some(GeoPoint { lat: 28.2, lng: 83.9 })),
            day_at("Manang", Some(GeoPoint { lat: 28.7, lng: 84.0 })),
            day_at("Jomsom", Some(GeoPoint { lat: 28.8, lng: 83.7 })),
        ];
        let route = build_route(&days, None, None, "Start", "End", DEFAULT_ROUTE_COORDINATE);
        assert_eq!(route.waypoints.len(), days.len());
        assert_eq!(route.waypoints[0].label, "Day 1: Pokhara");
        assert_eq!(route.waypoints[2].label, "Day 3: Jomsom");
        assert_eq!(route.waypoints[1].lat, 28.7);
    }

    #[test]
    fn missing_day_coordinates_substitute_start() {
        let start = GeoPoint { lat: 27.0, lng: 85.0 };
        let days = vec![
            day_at("Pokhara", Some(GeoPoint { lat: 28.2, lng: 83.9 })),
            day_at("Unknown", None),
        ];
        let route = build_route(&days, Some(start), None, "S", "E", DEFAULT_ROUTE_COORDINATE);
        assert_eq!(route.waypoints.len(), 2);
        assert_eq!(route.waypoints[1].point(), start);
    }

    #[test]
    fn day_without_destination_still_yields_a_waypoint() {
        let mut day = day_at("x", None);
        day.destination = None;
        day.title = "Rest day".into();
        let route = build_route(
            &[day],
            None,
            None,
            "S",
            "E",
            DEFAULT_ROUTE_COORDINATE,
        );
        assert_eq!(route.waypoints.len(), 1);
        assert_eq!(route.waypoints[0].point(), DEFAULT_ROUTE_COORDINATE);
        assert_eq!(route.waypoints[0].label, "Day 1: Rest day");
    }

    #[test]
    fn unset_endpoints_use_fallback() {
        let route = build_route(&[], None, None, "S", "E", DEFAULT_ROUTE_COORDINATE);
        assert_eq!(route.start.point(), DEFAULT_ROUTE_COORDINATE);
        assert_eq!(route.end.point(), DEFAULT_ROUTE_COORDINATE);
    }

    #[test]
    fn polyline_is_days_plus_two() {
        let days = vec![
            day_at("A", Some(GeoPoint { lat: 1.0, lng: 1.0 })),
            day_at("B", None),
            day_at("C", Some(GeoPoint { lat: 3.0, lng: 3.0 })),
        ];
        let route = build_route(&days, None, None, "S", "E", DEFAULT_ROUTE_COORDINATE);
        assert_eq!(route.polyline().len(), days.len() + 2);
    }
}
