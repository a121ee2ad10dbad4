use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, LOCATION, SET_COOKIE},
    },
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use dnevnik_scraper::{
    Credentials, DnevnikScraper, ExtractError, SchoolPortal, ScrapeError, ScrapingConfig,
    ScrapingContext, SessionCookieJar, SessionState, TimetableResult,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const STATE_SCRIPT: &str = r#"window.__USER__START__PAGE__INITIAL__STATE__ = {"analytics":{"personId":"1000001","schoolId":"2000","groupId":"3000"}};"#;

// Knobs for the in-process portal.
#[derive(Clone)]
struct Upstream {
    feed_html: String,
    schedule_html: String,
    feed_delay: Duration,
    marks_delay: Duration,
    print_delay: Duration,
    marks_status: StatusCode,
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            feed_html: feed_page(STATE_SCRIPT),
            schedule_html: r#"<html><body><a title="Версия для печати" href="/v2/schedules/print?group=3000">print</a></body></html>"#.to_string(),
            feed_delay: Duration::ZERO,
            marks_delay: Duration::ZERO,
            print_delay: Duration::ZERO,
            marks_status: StatusCode::OK,
        }
    }
}

fn feed_page(state_script: &str) -> String {
    let filler = "<script>var noop = 1;</script>".repeat(11);
    format!("<html><body class=\"page-body\">{filler}<script>{state_script}</script></body></html>")
}

fn has_session_cookie(headers: &HeaderMap) -> bool {
    let cookie = headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    cookie.contains("session=y") && !cookie.contains("dnevnik_sst")
}

fn redirect_to_login() -> Response {
    let mut response = StatusCode::FOUND.into_response();
    response
        .headers_mut()
        .insert(LOCATION, HeaderValue::from_static("/login"));
    response
}

async fn login(Form(form): Form<HashMap<String, String>>) -> Response {
    let mut response = redirect_to_login();
    let headers = response.headers_mut();
    headers.append(SET_COOKIE, HeaderValue::from_static("dnevnik_sst=x; Path=/"));
    if form.get("login").map(String::as_str) == Some("ivanov")
        && form.get("password").map(String::as_str) == Some("secret")
    {
        headers.append(SET_COOKIE, HeaderValue::from_static("session=y; Path=/; HttpOnly"));
        headers.append(SET_COOKIE, HeaderValue::from_static("stale=old; Path=/"));
        headers.insert(LOCATION, HeaderValue::from_static("/userfeed"));
    }
    response
}

async fn userfeed(State(upstream): State<Arc<Upstream>>, headers: HeaderMap) -> Response {
    tokio::time::sleep(upstream.feed_delay).await;
    if !has_session_cookie(&headers) {
        return redirect_to_login();
    }
    let mut response = Html(upstream.feed_html.clone()).into_response();
    let headers = response.headers_mut();
    // The seed cookie comes back on every page.
    headers.append(SET_COOKIE, HeaderValue::from_static("dnevnik_sst=x2; Path=/"));
    headers.append(SET_COOKIE, HeaderValue::from_static("stale=; Max-Age=0; Path=/"));
    response
}

async fn marks(
    State(upstream): State<Arc<Upstream>>,
    Path((school, person)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    tokio::time::sleep(upstream.marks_delay).await;
    if !has_session_cookie(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if upstream.marks_status != StatusCode::OK {
        return upstream.marks_status.into_response();
    }
    assert_eq!((school.as_str(), person.as_str()), ("2000", "1000001"));
    Json(json!({
        "subjects": [
            {
                "name": "Math",
                "works": [{"marks": [{"value": "5"}]}, {"marks": [{"value": "4"}]}],
                "average": {"value": "4.5"}
            },
            {"name": "Art", "works": [{"marks": []}], "average": {"value": "0"}}
        ]
    }))
    .into_response()
}

async fn schedule(
    State(upstream): State<Arc<Upstream>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !has_session_cookie(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    assert_eq!(query.get("school").map(String::as_str), Some("2000"));
    assert_eq!(query.get("group").map(String::as_str), Some("3000"));
    Html(upstream.schedule_html.clone()).into_response()
}

async fn print_version(State(upstream): State<Arc<Upstream>>, headers: HeaderMap) -> Response {
    tokio::time::sleep(upstream.print_delay).await;
    if !has_session_cookie(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Html("<html><table><tr><td>Math</td></tr></table></html>").into_response()
}

async fn spawn_portal(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/login", post(login))
        .route("/userfeed", get(userfeed))
        .route("/api/v2/marks/school/{school}/person/{person}", get(marks))
        .route("/v2/schedules/view", get(schedule))
        .route("/v2/schedules/print", get(print_version))
        .with_state(Arc::new(upstream));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn scraper_for(upstream: Upstream, timeout: Duration) -> DnevnikScraper {
    let base_url = spawn_portal(upstream).await;
    let config = ScrapingConfig::for_base_url(&base_url).with_timeout(timeout);
    DnevnikScraper::new(ScrapingContext::from_config(config).unwrap())
}

fn credentials(password: &str) -> Credentials {
    Credentials {
        login: "ivanov".to_string(),
        password: password.to_string(),
    }
}

fn stored_session() -> SessionState {
    SessionState {
        person_id: "1000001".to_string(),
        school_id: "2000".to_string(),
        group_id: "3000".to_string(),
        cookies: [("session", "y")].into_iter().collect(),
    }
}

#[tokio::test]
async fn authenticate_harvests_ids_and_drops_seed_cookie() {
    let scraper = scraper_for(Upstream::default(), Duration::from_secs(5)).await;

    let session = scraper.authenticate(&credentials("secret")).await.unwrap();

    let expected: SessionCookieJar = [("session", "y")].into_iter().collect();
    assert_eq!(session.cookies, expected);
    assert_eq!(session.person_id, "1000001");
    assert_eq!(session.school_id, "2000");
    assert_eq!(session.group_id, "3000");
}

#[tokio::test]
async fn slow_feed_times_out_during_authenticate() {
    let upstream = Upstream {
        feed_delay: Duration::from_secs(3),
        ..Upstream::default()
    };
    let scraper = scraper_for(upstream, Duration::from_millis(200)).await;

    let err = scraper.authenticate(&credentials("secret")).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.kind(), "network");
}

#[tokio::test]
async fn rejected_credentials_are_an_auth_failure() {
    let scraper = scraper_for(Upstream::default(), Duration::from_secs(5)).await;

    let err = scraper.authenticate(&credentials("wrong")).await.unwrap_err();

    assert!(matches!(err, ScrapeError::Auth { status } if status == StatusCode::FOUND));
}

#[tokio::test]
async fn feed_without_state_is_a_structural_failure() {
    let upstream = Upstream {
        feed_html: feed_page("var somethingElse = {};"),
        ..Upstream::default()
    };
    let scraper = scraper_for(upstream, Duration::from_secs(5)).await;

    let err = scraper.authenticate(&credentials("secret")).await.unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Structural(ExtractError::NoScriptMatch)
    ));
}

#[tokio::test]
async fn marks_are_reshaped_per_subject() {
    let scraper = scraper_for(Upstream::default(), Duration::from_secs(5)).await;

    let marks = scraper.fetch_marks(&stored_session()).await.unwrap();

    let value: Value = serde_json::to_value(&marks).unwrap();
    assert_eq!(value, json!({"Math": [["5", "4"], "4.5"], "Art": [[]]}));
}

#[tokio::test]
async fn marks_error_status_is_a_network_failure() {
    let upstream = Upstream {
        marks_status: StatusCode::INTERNAL_SERVER_ERROR,
        ..Upstream::default()
    };
    let scraper = scraper_for(upstream, Duration::from_secs(5)).await;

    let err = scraper.fetch_marks(&stored_session()).await.unwrap_err();

    assert_eq!(err.kind(), "network");
    assert!(matches!(
        err,
        ScrapeError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
    ));
}

#[tokio::test]
async fn slow_upstream_times_out_as_network_failure() {
    let upstream = Upstream {
        marks_delay: Duration::from_secs(3),
        ..Upstream::default()
    };
    let scraper = scraper_for(upstream, Duration::from_millis(200)).await;

    let err = scraper.fetch_marks(&stored_session()).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.kind(), "network");
}

#[tokio::test]
async fn timetable_follows_print_link() {
    let scraper = scraper_for(Upstream::default(), Duration::from_secs(5)).await;

    let timetable = scraper.fetch_timetable(&stored_session()).await.unwrap();

    assert_eq!(
        timetable,
        TimetableResult::Timetable(
            "<html><table><tr><td>Math</td></tr></table></html>".to_string()
        )
    );
}

#[tokio::test]
async fn slow_print_page_times_out() {
    let upstream = Upstream {
        print_delay: Duration::from_secs(3),
        ..Upstream::default()
    };
    let scraper = scraper_for(upstream, Duration::from_millis(200)).await;

    let err = scraper.fetch_timetable(&stored_session()).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.kind(), "network");
}

#[tokio::test]
async fn timetable_without_print_link_means_no_lessons() {
    let upstream = Upstream {
        schedule_html: "<html><body><p>Нет уроков</p></body></html>".to_string(),
        ..Upstream::default()
    };
    let scraper = scraper_for(upstream, Duration::from_secs(5)).await;

    let timetable = scraper.fetch_timetable(&stored_session()).await.unwrap();

    assert_eq!(timetable, TimetableResult::NoLessonsThisWeek);
}

#[tokio::test]
async fn timetable_with_stale_cookies_is_a_network_failure() {
    let scraper = scraper_for(Upstream::default(), Duration::from_secs(5)).await;
    let mut session = stored_session();
    session.cookies = SessionCookieJar::new();

    let err = scraper.fetch_timetable(&session).await.unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Status { status, .. } if status == StatusCode::UNAUTHORIZED
    ));
}
