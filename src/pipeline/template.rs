//! Markup rendering: document model → one self-contained HTML page.
//!
//! The output is static by construction: every image was embedded inline
//! by the asset and map stages, so the rendering session needs no network
//! and runs no script. Sections appear in reading order — cover, trip
//! summary, route map, one section per day, cost breakdown — and the cost
//! breakdown carries the id the engine uses as its settlement sentinel.
//!
//! All dynamic text passes through [`escape_html`]; day descriptions are
//! rich text from the quote editor and are embedded as markup on purpose.

use crate::pipeline::model::{DaySection, DocumentModel};
use std::fmt::Write as _;

/// Element id of the last section; the engine waits for it before
/// paginating.
pub const SETTLE_SENTINEL_ID: &str = "cost-breakdown";

/// A renderable markup document plus the footer line the engine overlays
/// on every page.
#[derive(Debug, Clone)]
pub struct MarkupDocument {
    pub html: String,
    pub title: String,
    /// `"<quote_ref> — <client name>"`, shown beside the page index.
    pub footer_center: String,
}

/// Serialise the model into markup. Pure; does no geographic rendering —
/// `map_raster` is the pre-rendered route image when available.
pub fn render(model: &DocumentModel, map_raster: Option<&str>) -> MarkupDocument {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = write!(html, "<title>{}</title>\n", escape_html(&model.cover.title));
    html.push_str("<style>\n");
    html.push_str(STYLES);
    html.push_str("</style>\n</head>\n<body>\n");

    render_cover(&mut html, model);
    render_summary(&mut html, model);
    render_route(&mut html, model, map_raster);
    for day in &model.days {
        render_day(&mut html, day);
    }
    render_costs(&mut html, model);

    html.push_str("</body>\n</html>\n");

    MarkupDocument {
        html,
        title: model.cover.title.clone(),
        footer_center: format!("{} — {}", model.cover.quote_ref, model.cover.client_name),
    }
}

fn render_cover(html: &mut String, model: &DocumentModel) {
    let c = &model.cover;
    html.push_str("<section id=\"cover\">\n");
    if let Some(img) = &c.cover_image {
        let _ = write!(html, "<img class=\"banner\" src=\"{}\" alt=\"\">\n", escape_attr(img));
    }
    let _ = write!(html, "<h1>{}</h1>\n", escape_html(&c.title));
    let _ = write!(
        html,
        "<p class=\"prepared-for\">Prepared for {}</p>\n",
        escape_html(&c.client_name)
    );
    let _ = write!(
        html,
        "<p class=\"quote-ref\">Quote {}</p>\n",
        escape_html(&c.quote_ref)
    );
    let _ = write!(html, "<p class=\"day-count\">{} itinerary days", c.day_count);
    if c.total_days > 0 {
        let _ = write!(html, " · {} days total", c.total_days);
    }
    html.push_str("</p>\n");
    if let (Some(start), Some(end)) = (&c.starting_day, &c.ending_day) {
        let _ = write!(
            html,
            "<p class=\"dates\">{} to {}</p>\n",
            escape_html(start),
            escape_html(end)
        );
    }
    html.push_str("</section>\n");
}

fn render_summary(html: &mut String, model: &DocumentModel) {
    let c = &model.cover;
    html.push_str("<section id=\"trip-summary\">\n<h2>Trip Summary</h2>\n");
    if !c.summary.is_empty() {
        let _ = write!(html, "<p>{}</p>\n", escape_html(&c.summary));
    }
    if let Some(place) = &c.start_place {
        let _ = write!(html, "<p>Starts in <b>{}</b>", escape_html(place));
        if let Some(end) = &c.end_place {
            let _ = write!(html, ", ends in <b>{}</b>", escape_html(end));
        }
        html.push_str("</p>\n");
    }
    render_string_list(html, "Included", &model.inclusions);
    render_string_list(html, "Not included", &model.exclusions);
    html.push_str("</section>\n");
}

fn render_route(html: &mut String, model: &DocumentModel, map_raster: Option<&str>) {
    html.push_str("<section id=\"route-map\">\n<h2>Route</h2>\n");
    match map_raster {
        Some(raster) => {
            let _ = write!(
                html,
                "<img class=\"route\" src=\"{}\" alt=\"Route map\">\n",
                escape_attr(raster)
            );
        }
        // Degraded mode: the raster could not be produced; the waypoint
        // list still tells the client where the trip goes.
        None => {
            html.push_str("<ol class=\"waypoints\">\n");
            for wp in &model.route.waypoints {
                let _ = write!(html, "<li>{}</li>\n", escape_html(&wp.label));
            }
            html.push_str("</ol>\n");
        }
    }
    let _ = write!(
        html,
        "<p class=\"endpoints\">{} → {}</p>\n",
        escape_html(&model.route.start.label),
        escape_html(&model.route.end.label)
    );
    html.push_str("</section>\n");
}

fn render_day(html: &mut String, day: &DaySection) {
    let _ = write!(html, "<section class=\"day\" id=\"day-{}\">\n", day.number);
    let _ = write!(
        html,
        "<h2>Day {} — {}</h2>\n",
        day.number,
        escape_html(&day.title)
    );

    // Rich text straight from the quote editor; embedded as markup.
    if !day.description_html.is_empty() {
        let _ = write!(html, "<div class=\"description\">{}</div>\n", day.description_html);
    }

    if let Some(metrics) = &day.metrics {
        let mut parts = Vec::new();
        if let Some(h) = metrics.duration_hours {
            parts.push(format!("{h} h"));
        }
        if let Some(km) = metrics.distance_km {
            parts.push(format!("{km} km"));
        }
        if let Some(m) = metrics.max_altitude_m {
            parts.push(format!("max {m} m"));
        }
        if !parts.is_empty() {
            let _ = write!(html, "<p class=\"metrics\">{}</p>\n", escape_html(&parts.join(" · ")));
        }
    }

    render_string_list(html, "Meals", &day.meals);
    render_string_list(html, "Activities", &day.activities);

    if let Some(name) = &day.destination_name {
        let _ = write!(html, "<h3>{}</h3>\n", escape_html(name));
    }
    render_images(html, &day.destination_images);

    if let Some(name) = &day.accommodation_name {
        let _ = write!(html, "<h3>Overnight: {}</h3>\n", escape_html(name));
    }
    render_images(html, &day.accommodation_images);

    html.push_str("</section>\n");
}

fn render_costs(html: &mut String, model: &DocumentModel) {
    let costs = &model.costs;
    let _ = write!(html, "<section id=\"{SETTLE_SENTINEL_ID}\">\n<h2>Cost Breakdown</h2>\n");
    html.push_str("<table>\n<tr><th></th><th>Count</th><th>Price</th><th>Total</th></tr>\n");
    let _ = write!(
        html,
        "<tr><td>Adults</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
        costs.adults, costs.adult_price, costs.adult_total
    );
    let _ = write!(
        html,
        "<tr><td>Children</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
        costs.children, costs.child_price, costs.child_total
    );
    let _ = write!(
        html,
        "<tr class=\"subtotal\"><td colspan=\"3\">Subtotal</td><td>{:.2}</td></tr>\n",
        costs.subtotal
    );
    html.push_str("</table>\n");
    if let Some(terms) = &model.payment_terms {
        let _ = write!(html, "<p class=\"terms\">{}</p>\n", escape_html(terms));
    }
    html.push_str("</section>\n");
}

fn render_images(html: &mut String, images: &[String]) {
    if images.is_empty() {
        return;
    }
    html.push_str("<div class=\"photos\">\n");
    for src in images {
        let _ = write!(html, "<img src=\"{}\" alt=\"\">\n", escape_attr(src));
    }
    html.push_str("</div>\n");
}

fn render_string_list(html: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = write!(html, "<h4>{}</h4>\n<ul>\n", escape_html(heading));
    for item in items {
        let _ = write!(html, "<li>{}</li>\n", escape_html(item));
    }
    html.push_str("</ul>\n");
}

/// Escape text content for HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape attribute values. Same rules as text content; kept separate so
/// call sites read correctly.
fn escape_attr(s: &str) -> String {
    escape_html(s)
}

const STYLES: &str = r#"
* { box-sizing: border-box; }
body { font-family: Georgia, 'Times New Roman', serif; color: #222; margin: 0; }
section { padding: 24px 32px; page-break-inside: avoid; }
section.day, #cost-breakdown { page-break-before: always; }
#cover { text-align: center; padding-top: 96px; }
#cover h1 { font-size: 34px; margin: 16px 0 8px; }
#cover .banner { max-width: 100%; max-height: 320px; object-fit: cover; }
#cover .prepared-for { font-size: 18px; }
#cover .quote-ref, #cover .day-count, #cover .dates { color: #666; margin: 4px 0; }
h2 { border-bottom: 2px solid #1a73e8; padding-bottom: 4px; font-size: 22px; }
h3 { margin-bottom: 4px; }
h4 { margin: 10px 0 2px; color: #444; }
ul { margin: 4px 0; }
.metrics { color: #555; font-style: italic; }
.photos { display: flex; flex-wrap: wrap; gap: 8px; }
.photos img { max-width: 48%; max-height: 260px; object-fit: cover; }
.route { max-width: 100%; border: 1px solid #ccc; }
.endpoints { color: #555; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #bbb; padding: 6px 10px; text-align: right; }
th:first-child, td:first-child { text-align: left; }
tr.subtotal td { font-weight: bold; background: #f0f4ff; }
.terms { margin-top: 12px; color: #555; }
"#;
