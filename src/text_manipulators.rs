use reqwest::Url;
use scraper::ElementRef;
use serde_json::Value;

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Renders a JSON string or number as a plain string. Other shapes yield `None`.
pub fn json_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolves an `href` found on `page_url`, absolute links pass through.
pub fn resolve_link(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if let Ok(absolute) = Url::parse(href) {
        return Some(absolute.to_string());
    }
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .ok()
        .map(|url| url.to_string())
}
