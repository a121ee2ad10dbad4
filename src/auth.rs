use log::{debug, info, warn};

use crate::{
    cookies::SessionCookieJar,
    errors::ScrapeError,
    scraping_context::ScrapingContext,
    session::{Credentials, SessionState},
};

/// Logs into the portal and harvests a fresh [`SessionState`].
///
/// login POST -> cookie sanitize -> feed GET -> state extraction. Any failing
/// step ends the call, no partial state is returned.
pub async fn authenticate(
    ctx: &ScrapingContext,
    credentials: &Credentials,
) -> Result<SessionState, ScrapeError> {
    let config = &ctx.scraping_config;
    let form = [
        ("login", credentials.login.as_str()),
        ("password", credentials.password.as_str()),
    ];
    let login = ctx
        .request_client
        .post_form(&config.login_url, &form)
        .await
        .inspect_err(|e| warn!(target: ctx.log_target(), "login request failed ({}): {e}", e.kind()))?;

    let mut cookies = SessionCookieJar::new();
    cookies.absorb(&login);
    cookies.sanitize();
    debug!(
        target: ctx.log_target(),
        "login answered {}, kept {} cookies",
        login.status(),
        cookies.len()
    );

    let feed = ctx
        .request_client
        .fetch_url_response(&config.feed_url, &cookies)
        .await
        .inspect_err(|e| warn!(target: ctx.log_target(), "feed request failed ({}): {e}", e.kind()))?;
    let status = feed.status();
    if !status.is_success() {
        warn!(target: ctx.log_target(), "feed returned {status} after login (auth)");
        return Err(ScrapeError::Auth { status });
    }
    cookies.absorb(&feed);
    cookies.sanitize();

    let html = feed
        .text()
        .await
        .map_err(ScrapeError::from)
        .inspect_err(|e| warn!(target: ctx.log_target(), "reading feed body failed ({}): {e}", e.kind()))?;
    let ids = ctx.state_extractor.extract(&html).map_err(|e| {
        warn!(target: ctx.log_target(), "feed page has unexpected shape (structural): {e}");
        ScrapeError::from(e)
    })?;
    info!(target: ctx.log_target(), "authenticated person {}", ids.person_id);

    Ok(SessionState::new(ids, cookies))
}
