use async_trait::async_trait;

use crate::{
    auth, marks,
    errors::ScrapeError,
    marks::MarksResult,
    scraping_context::ScrapingContext,
    session::{Credentials, SessionState},
    timetable,
    timetable::TimetableResult,
};

/// The three operations the rest of the system needs from the school portal.
///
/// Implementations hold no per-user state, so calls for different users may
/// run concurrently.
#[async_trait]
pub trait SchoolPortal: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionState, ScrapeError>;
    async fn fetch_marks(&self, session: &SessionState) -> Result<MarksResult, ScrapeError>;
    async fn fetch_timetable(&self, session: &SessionState)
    -> Result<TimetableResult, ScrapeError>;
}

pub struct DnevnikScraper {
    ctx: ScrapingContext,
}

impl DnevnikScraper {
    pub fn new(ctx: ScrapingContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ScrapingContext {
        &self.ctx
    }
}

#[async_trait]
impl SchoolPortal for DnevnikScraper {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionState, ScrapeError> {
        auth::authenticate(&self.ctx, credentials).await
    }

    async fn fetch_marks(&self, session: &SessionState) -> Result<MarksResult, ScrapeError> {
        marks::fetch_marks(
            &self.ctx,
            &session.school_id,
            &session.person_id,
            &session.cookies,
        )
        .await
    }

    async fn fetch_timetable(
        &self,
        session: &SessionState,
    ) -> Result<TimetableResult, ScrapeError> {
        timetable::fetch_timetable(
            &self.ctx,
            &session.school_id,
            &session.group_id,
            &session.cookies,
        )
        .await
    }
}
