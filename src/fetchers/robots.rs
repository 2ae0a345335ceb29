use crate::fetchers::fetcher::PageFetcher;
use crate::target::PageTarget;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static DISALLOW_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^disallow:").expect("static pattern"));

/// Outcome of the robots check for a target's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotsDecision {
    pub allowed: bool,
}

impl RobotsDecision {
    pub const ALLOWED: RobotsDecision = RobotsDecision { allowed: true };
}

/// Interprets a robots policy body.
///
/// Only a `Disallow: /` line blocks the origin. User-agent groups and path
/// prefixes are not considered.
pub fn parse_policy(body: &str) -> RobotsDecision {
    for line in body.lines().map(str::trim) {
        if !DISALLOW_LINE.is_match(line) {
            continue;
        }
        // Value is the text between the first and second colon
        let path = line.split(':').nth(1).unwrap_or_default().trim();
        if path == "/" {
            return RobotsDecision { allowed: false };
        }
    }
    RobotsDecision::ALLOWED
}

/// Fetches and interprets the robots policy for `target`.
///
/// Fails open: any fetch error, non-2xx status or empty body means allowed.
pub async fn check_robots(
    fetcher: &dyn PageFetcher,
    target: &PageTarget,
    timeout: Duration,
) -> RobotsDecision {
    let robots_url = target.robots_url();

    let page = match fetcher.fetch(&robots_url, timeout).await {
        Ok(page) => page,
        Err(e) => {
            ::log::debug!("robots fetch failed for {}, allowing: {}", robots_url, e);
            return RobotsDecision::ALLOWED;
        }
    };

    if !page.is_success() || page.body.trim().is_empty() {
        ::log::debug!(
            "no usable robots policy at {} (status {}), allowing",
            robots_url,
            page.status
        );
        return RobotsDecision::ALLOWED;
    }

    let decision = parse_policy(&page.body);
    ::log::info!("robots policy for {}: allowed={}", robots_url, decision.allowed);
    decision
}
