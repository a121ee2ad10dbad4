use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::{
    errors::ExtractError,
    session::PortalIds,
    text_manipulators::{extract_text, json_scalar_to_string},
};

/// Recovers the caller's identifiers from the state blob the feed page
/// assigns to `window.__USER__START__PAGE__INITIAL__STATE__`.
pub struct StateExtractor {
    body_selector: Selector,
    script_selector: Selector,
    // Captures the object body without its outer braces.
    initial_state_regex: Regex,
}

impl StateExtractor {
    pub fn new() -> anyhow::Result<Self> {
        let body_selector = Selector::parse("body.page-body")
            .map_err(|e| anyhow::anyhow!("invalid body selector: {e}"))?;
        let script_selector =
            Selector::parse("script").map_err(|e| anyhow::anyhow!("invalid script selector: {e}"))?;
        let initial_state_regex =
            Regex::new(r"window\.__USER__START__PAGE__INITIAL__STATE__ = \{(.*)\}")?;
        Ok(Self {
            body_selector,
            script_selector,
            initial_state_regex,
        })
    }

    /// Every inline script under the page body is searched, so reordering
    /// the page's scripts does not break extraction.
    pub fn extract(&self, html: &str) -> Result<PortalIds, ExtractError> {
        let document = Html::parse_document(html);
        let body = document
            .select(&self.body_selector)
            .next()
            .ok_or(ExtractError::NoBodyMarker)?;

        let fragment = body
            .select(&self.script_selector)
            .find_map(|script| {
                let text = extract_text(script);
                self.initial_state_regex
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            })
            .ok_or(ExtractError::NoScriptMatch)?;

        let state: Value = serde_json::from_str(&format!("{{{fragment}}}"))?;
        let analytics = state
            .get("analytics")
            .ok_or(ExtractError::MissingField("analytics"))?;

        Ok(PortalIds {
            person_id: analytics_field(analytics, "personId")?,
            school_id: analytics_field(analytics, "schoolId")?,
            group_id: analytics_field(analytics, "groupId")?,
        })
    }
}

fn analytics_field(analytics: &Value, name: &'static str) -> Result<String, ExtractError> {
    analytics
        .get(name)
        .and_then(json_scalar_to_string)
        .ok_or(ExtractError::MissingField(name))
}
