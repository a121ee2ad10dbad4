use serde::{Deserialize, Serialize};

use crate::cookies::SessionCookieJar;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Identifiers and cookies harvested by one successful login.
///
/// Only ever built whole: a new login replaces the previous state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub person_id: String,
    pub school_id: String,
    pub group_id: String,
    pub cookies: SessionCookieJar,
}

/// The three identifiers read from the embedded page state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalIds {
    pub person_id: String,
    pub school_id: String,
    pub group_id: String,
}

impl SessionState {
    pub fn new(ids: PortalIds, cookies: SessionCookieJar) -> Self {
        Self {
            person_id: ids.person_id,
            school_id: ids.school_id,
            group_id: ids.group_id,
            cookies,
        }
    }
}
