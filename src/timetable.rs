use log::{info, warn};
use scraper::{Html, Selector};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    cookies::SessionCookieJar,
    errors::{ExtractError, ScrapeError},
    scraping_context::ScrapingContext,
    text_manipulators::resolve_link,
};

/// Title of the schedule page's "printable version" link.
pub const PRINT_VERSION_TITLE: &str = "Версия для печати";

/// What the api answers when a class has nothing scheduled.
pub const NO_LESSONS_MESSAGE: &str = "На этой неделе у класса нет уроков";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimetableResult {
    /// Raw html of the print version page.
    Timetable(String),
    NoLessonsThisWeek,
}

impl Serialize for TimetableResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimetableResult::Timetable(html) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("timetable", html)?;
                map.end()
            }
            TimetableResult::NoLessonsThisWeek => serializer.serialize_str(NO_LESSONS_MESSAGE),
        }
    }
}

/// Locates the schedule page's print version link.
pub struct PrintLinkFinder {
    anchor_selector: Selector,
}

impl PrintLinkFinder {
    pub fn new() -> anyhow::Result<Self> {
        let anchor_selector =
            Selector::parse("a[title]").map_err(|e| anyhow::anyhow!("invalid anchor selector: {e}"))?;
        Ok(Self { anchor_selector })
    }

    /// `Ok(None)` when the page has no print link, which the portal does for
    /// weeks without lessons.
    pub fn find(&self, html: &str) -> Result<Option<String>, ExtractError> {
        let document = Html::parse_document(html);
        let Some(anchor) = document
            .select(&self.anchor_selector)
            .find(|a| a.value().attr("title") == Some(PRINT_VERSION_TITLE))
        else {
            return Ok(None);
        };
        anchor
            .value()
            .attr("href")
            .map(|href| Some(href.to_string()))
            .ok_or(ExtractError::PrintLinkWithoutHref)
    }
}

pub async fn fetch_timetable(
    ctx: &ScrapingContext,
    school_id: &str,
    group_id: &str,
    cookies: &SessionCookieJar,
) -> Result<TimetableResult, ScrapeError> {
    let schedule_url = ctx
        .scraping_config
        .get_schedule_url(school_id, group_id)
        .map_err(|e| ScrapeError::MalformedSession(e.to_string()))?;
    let schedule = ctx
        .request_client
        .fetch_url_body(&schedule_url, cookies)
        .await
        .inspect_err(|e| warn!(target: ctx.log_target(), "schedule request failed ({}): {e}", e.kind()))?;

    let href = match ctx.print_link_finder.find(&schedule) {
        Ok(Some(href)) => href,
        Ok(None) => {
            info!(target: ctx.log_target(), "no print version for group {group_id}, no lessons this week");
            return Ok(TimetableResult::NoLessonsThisWeek);
        }
        Err(e) => {
            warn!(target: ctx.log_target(), "schedule page has unexpected shape: {e}");
            return Err(e.into());
        }
    };
    let Some(print_url) = resolve_link(&schedule_url, &href) else {
        warn!(target: ctx.log_target(), "print version href is not a url: {href}");
        return Err(ExtractError::InvalidPrintLink(href).into());
    };

    let html = ctx
        .request_client
        .fetch_url_body(&print_url, cookies)
        .await
        .inspect_err(|e| warn!(target: ctx.log_target(), "print version request failed ({}): {e}", e.kind()))?;
    Ok(TimetableResult::Timetable(html))
}
