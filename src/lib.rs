mod auth;
mod marks;
mod requests;
mod state_extractor;
mod text_manipulators;
mod timetable;

pub mod config;
pub mod cookies;
pub mod errors;
pub mod portal;
pub mod protocol;
pub mod routes;
pub mod scraping_context;
pub mod session;

pub use config::{LoadFromEnv, ScrapingConfig, ServerConfig};
pub use cookies::SessionCookieJar;
pub use errors::{ExtractError, ScrapeError};
pub use marks::{MarksResult, SubjectMarks};
pub use portal::{DnevnikScraper, SchoolPortal};
pub use requests::RequestClient;
pub use scraping_context::ScrapingContext;
pub use session::{Credentials, PortalIds, SessionState};
pub use state_extractor::StateExtractor;
pub use timetable::{NO_LESSONS_MESSAGE, PrintLinkFinder, TimetableResult};
