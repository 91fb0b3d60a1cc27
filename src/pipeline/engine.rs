//! Headless rendering: markup → paginated PDF.
//!
//! ## Why spawn_blocking?
//!
//! `headless_chrome` drives Chromium over the DevTools protocol with a
//! blocking API. `tokio::task::spawn_blocking` moves the whole session
//! onto the blocking thread pool so the async workers never stall while a
//! page loads or prints.
//!
//! ## Session scope
//!
//! One session per render call, never shared or reused. The browser
//! process, its tab, and the temp file holding the markup are all owned by
//! the blocking closure; dropping them releases everything on every exit
//! path — success, error, or panic. The render deadline is enforced inside
//! the closure too: every phase runs against the remaining budget, so an
//! elapsed deadline tears the session down before the error propagates.
//! Failures are never retried here: retry policy, if any, belongs to the
//! orchestrator.

use crate::config::RenderConfig;
use crate::error::{QuoteDocError, RenderPhase};
use crate::pipeline::template::{MarkupDocument, SETTLE_SENTINEL_ID};
use async_trait::async_trait;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::io::Write as _;
use std::time::{Duration, Instant};
use tracing::debug;

/// A4 portrait in inches, the fixed physical page size.
const PAPER_WIDTH_IN: f64 = 8.27;
const PAPER_HEIGHT_IN: f64 = 11.69;
const MARGIN_IN: f64 = 0.4;
/// Extra bottom margin reserving room for the running footer.
const MARGIN_BOTTOM_IN: f64 = 0.6;

/// A scoped rendering backend. Implementations acquire an isolated
/// session per call and release it before returning.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn render(&self, doc: &MarkupDocument) -> Result<Vec<u8>, QuoteDocError>;
}

/// The production engine: a fresh headless Chromium session per call.
pub struct ChromiumEngine {
    browser_path: Option<std::path::PathBuf>,
    settle_timeout: Duration,
    render_timeout: Duration,
}

impl ChromiumEngine {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            browser_path: config.browser_path.clone(),
            settle_timeout: Duration::from_secs(config.settle_timeout_secs),
            render_timeout: Duration::from_secs(config.render_timeout_secs),
        }
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn render(&self, doc: &MarkupDocument) -> Result<Vec<u8>, QuoteDocError> {
        let html = doc.html.clone();
        let footer = footer_template(&doc.footer_center);
        let browser_path = self.browser_path.clone();
        let settle_timeout = self.settle_timeout;
        let render_timeout = self.render_timeout;

        tokio::task::spawn_blocking(move || {
            render_blocking(&html, &footer, browser_path, settle_timeout, render_timeout)
        })
        .await
        .map_err(|e| QuoteDocError::Internal(format!("render task panicked: {e}")))?
    }
}

/// Blocking implementation of the rendering state machine:
/// Idle → SessionAcquired → ContentLoaded → Settled → Paginated →
/// ArtifactEmitted, failing from whichever phase broke.
fn render_blocking(
    html: &str,
    footer: &str,
    browser_path: Option<std::path::PathBuf>,
    settle_timeout: Duration,
    render_timeout: Duration,
) -> Result<Vec<u8>, QuoteDocError> {
    let deadline = Instant::now() + render_timeout;
    let mut phase = RenderPhase::Idle;
    let fail = |phase: RenderPhase| {
        move |e: anyhow::Error| QuoteDocError::RenderFailure {
            phase,
            detail: format!("{e:#}"),
        }
    };

    // Chromium reads the markup from disk; the temp file lives until the
    // closure returns, on every path.
    let mut markup_file = tempfile::Builder::new()
        .suffix(".html")
        .tempfile()
        .map_err(|e| QuoteDocError::RenderFailure {
            phase,
            detail: format!("markup temp file: {e}"),
        })?;
    markup_file
        .write_all(html.as_bytes())
        .map_err(|e| QuoteDocError::RenderFailure {
            phase,
            detail: format!("markup temp file: {e}"),
        })?;
    let url = format!("file://{}", markup_file.path().display());

    let mut launch = LaunchOptions::default_builder();
    launch.headless(true).sandbox(false);
    if let Some(path) = browser_path {
        launch.path(Some(path));
    }
    let launch = launch.build().map_err(|e| QuoteDocError::RenderFailure {
        phase,
        detail: format!("launch options: {e}"),
    })?;

    let browser = Browser::new(launch).map_err(fail(phase))?;
    phase = RenderPhase::SessionAcquired;
    debug!("rendering session acquired");

    let tab = browser.new_tab().map_err(fail(phase))?;
    let budget =
        phase_budget(deadline, render_timeout).ok_or_else(|| timed_out(render_timeout))?;
    tab.set_default_timeout(budget);
    tab.navigate_to(&url).map_err(fail(phase))?;
    tab.wait_until_navigated().map_err(fail(phase))?;
    phase = RenderPhase::ContentLoaded;
    debug!("markup loaded");

    // Settlement: the final section must exist before pagination.
    // Premature pagination is a defined failure, not a shorter document.
    let sentinel = format!("#{SETTLE_SENTINEL_ID}");
    let budget = phase_budget(deadline, settle_timeout).ok_or_else(|| timed_out(render_timeout))?;
    tab.wait_for_element_with_custom_timeout(&sentinel, budget)
        .map_err(|e| QuoteDocError::RenderIncomplete {
            detail: format!("{phase} failed, {sentinel} missing: {e:#}"),
        })?;
    phase = RenderPhase::Settled;
    debug!("document settled");

    if phase_budget(deadline, render_timeout).is_none() {
        return Err(timed_out(render_timeout));
    }
    let pdf = tab
        .print_to_pdf(Some(pdf_options(footer)))
        .map_err(fail(phase))?;
    phase = RenderPhase::Paginated;

    if pdf.is_empty() {
        return Err(QuoteDocError::RenderFailure {
            phase,
            detail: "engine emitted an empty artifact".into(),
        });
    }
    debug!("artifact emitted: {} bytes", pdf.len());

    // Session release happens here on success and above on every error
    // path: `browser` and `markup_file` drop when the closure returns.
    Ok(pdf)
}

/// Time left until `deadline`, capped at `cap`; `None` once the deadline
/// has passed. Each blocking phase waits at most this long, so the render
/// deadline is honored inside the session rather than by abandoning it.
fn phase_budget(deadline: Instant, cap: Duration) -> Option<Duration> {
    let left = deadline.checked_duration_since(Instant::now())?;
    Some(left.min(cap))
}

fn timed_out(render_timeout: Duration) -> QuoteDocError {
    QuoteDocError::RenderTimeout {
        secs: render_timeout.as_secs(),
    }
}

fn pdf_options(footer: &str) -> PrintToPdfOptions {
    PrintToPdfOptions {
        display_header_footer: Some(true),
        // Header left empty by design: the cover banner should not repeat
        // on every page.
        header_template: Some("<span></span>".to_string()),
        footer_template: Some(footer.to_string()),
        print_background: Some(true),
        paper_width: Some(PAPER_WIDTH_IN),
        paper_height: Some(PAPER_HEIGHT_IN),
        margin_top: Some(MARGIN_IN),
        margin_bottom: Some(MARGIN_BOTTOM_IN),
        margin_left: Some(MARGIN_IN),
        margin_right: Some(MARGIN_IN),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

/// Chromium evaluates the footer template per page; `pageNumber` and
/// `totalPages` are the engine-provided counter spans.
fn footer_template(center: &str) -> String {
    format!(
        "<div style=\"font-size:9px; width:100%; text-align:center; color:#666;\">\
         {} · page <span class=\"pageNumber\"></span> of <span class=\"totalPages\"></span>\
         </div>",
        crate::pipeline::template::escape_html(center)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_template_contains_counters_and_reference() {
        let f = footer_template("66a1b2c3 — Ada");
        assert!(f.contains("pageNumber"));
        assert!(f.contains("totalPages"));
        assert!(f.contains("66a1b2c3"));
    }

    #[test]
    fn footer_template_escapes_markup() {
        let f = footer_template("<script>x</script>");
        assert!(!f.contains("<script>"));
    }

    #[test]
    fn phase_budget_caps_the_remaining_time() {
        let deadline = Instant::now() + Duration::from_secs(60);
        let budget = phase_budget(deadline, Duration::from_secs(5)).expect("time left");
        assert!(budget <= Duration::from_secs(5));
        assert!(budget > Duration::from_secs(4));
    }

    #[test]
    fn phase_budget_is_none_past_the_deadline() {
        let deadline = Instant::now() - Duration::from_millis(1);
        assert!(phase_budget(deadline, Duration::from_secs(5)).is_none());
    }

    #[test]
    fn elapsed_deadline_reports_the_configured_bound() {
        let err = timed_out(Duration::from_secs(90));
        assert!(matches!(err, QuoteDocError::RenderTimeout { secs: 90 }));
    }

    #[test]
    fn pdf_options_fix_page_geometry() {
        let opts = pdf_options("<span></span>");
        assert_eq!(opts.paper_width, Some(PAPER_WIDTH_IN));
        assert_eq!(opts.paper_height, Some(PAPER_HEIGHT_IN));
        assert_eq!(opts.display_header_footer, Some(true));
        // Empty header region by design.
        assert_eq!(opts.header_template.as_deref(), Some("<span></span>"));
    }
}
