use std::{collections::BTreeMap, time::SystemTime};

use reqwest::{Response, cookie::Cookie, header::HeaderValue};
use serde::{Deserialize, Serialize};

use crate::errors::ScrapeError;

/// Server-set seed cookie that breaks authenticated requests if sent back.
pub const SESSION_SEED_COOKIE: &str = "dnevnik_sst";

/// Opaque cookie name -> value mapping harvested from the portal.
///
/// Persisted by the user store as a JSON object string, see
/// [`SessionCookieJar::to_json_string`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCookieJar {
    cookies: BTreeMap<String, String>,
}

impl SessionCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.cookies.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Merges every `Set-Cookie` of `response` into the jar, later values
    /// winning. Cookies the server expires are dropped.
    pub fn absorb(&mut self, response: &Response) {
        for cookie in response.cookies() {
            if is_expired(&cookie) {
                self.remove(cookie.name());
            } else {
                self.insert(cookie.name(), cookie.value());
            }
        }
    }

    /// Drops the session-seed cookie.
    pub fn sanitize(&mut self) {
        self.remove(SESSION_SEED_COOKIE);
    }

    /// `Cookie` request header value, `None` for an empty jar.
    pub fn header_value(&self) -> Result<Option<HeaderValue>, ScrapeError> {
        if self.cookies.is_empty() {
            return Ok(None);
        }
        let joined = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined)
            .map(Some)
            .map_err(|e| ScrapeError::MalformedSession(format!("cookie header: {e}")))
    }

    pub fn to_json_string(&self) -> String {
        // A map of strings always serializes.
        serde_json::to_string(&self.cookies).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScrapeError> {
        serde_json::from_str(raw)
            .map_err(|e| ScrapeError::MalformedSession(format!("cookies are not a json object: {e}")))
    }
}

// Max-Age wins over Expires when both are set.
fn is_expired(cookie: &Cookie) -> bool {
    match cookie.max_age() {
        Some(max_age) => max_age.is_zero(),
        None => cookie
            .expires()
            .is_some_and(|expires| expires <= SystemTime::now()),
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SessionCookieJar {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let cookies = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { cookies }
    }
}
