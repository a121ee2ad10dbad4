use serde::{Deserialize, Serialize};

use crate::{
    cookies::SessionCookieJar,
    errors::ScrapeError,
    session::{Credentials, PortalIds, SessionState},
};

// Request payload shared by every portal endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub id: Option<i64>,
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub cookies: Option<StoredCookies>,
}

/// Cookie jar as the user store hands it over: either the JSON object itself
/// or that object encoded as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredCookies {
    Object(SessionCookieJar),
    Encoded(String),
    Other(serde_json::Value),
}

impl StoredCookies {
    pub fn into_jar(self) -> Result<SessionCookieJar, ScrapeError> {
        match self {
            StoredCookies::Object(jar) => Ok(jar),
            StoredCookies::Encoded(raw) => SessionCookieJar::from_json_str(&raw),
            StoredCookies::Other(value) => Err(ScrapeError::MalformedSession(format!(
                "cookies must be a json object of strings, got {value}"
            ))),
        }
    }
}

impl UserData {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            login: self.login.clone(),
            password: self.password.clone(),
        }
    }

    /// The stored session, only if all four parts are present.
    pub fn session_state(&self) -> Result<SessionState, ScrapeError> {
        let person_id = required(&self.person_id, "person_id")?;
        let school_id = required(&self.school_id, "school_id")?;
        let group_id = required(&self.group_id, "group_id")?;
        let cookies = self
            .cookies
            .clone()
            .ok_or_else(|| ScrapeError::MalformedSession("missing cookies".to_string()))?
            .into_jar()?;
        Ok(SessionState::new(
            PortalIds {
                person_id,
                school_id,
                group_id,
            },
            cookies,
        ))
    }

    /// Replaces any previous session fields with `session`.
    pub fn with_session(self, session: SessionState) -> Self {
        Self {
            person_id: Some(session.person_id),
            school_id: Some(session.school_id),
            group_id: Some(session.group_id),
            cookies: Some(StoredCookies::Encoded(session.cookies.to_json_string())),
            ..self
        }
    }
}

fn required(field: &Option<String>, name: &str) -> Result<String, ScrapeError> {
    field
        .clone()
        .ok_or_else(|| ScrapeError::MalformedSession(format!("missing {name}")))
}

// Error envelope for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub kind: String,
}
