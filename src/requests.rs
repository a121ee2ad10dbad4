use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response, header::COOKIE, redirect};

use crate::{cookies::SessionCookieJar, errors::ScrapeError};

/// HTTP client shared by every portal call.
///
/// Holds no cookie store; each call carries its own jar, so concurrent
/// operations for different users never see each other's session.
pub struct RequestClient {
    client: Client,
}

impl RequestClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            // The login response itself carries the session cookies.
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<Response, ScrapeError> {
        let response = self.client.post(url).form(form).send().await?;
        Ok(response)
    }

    pub async fn fetch_url_response(
        &self,
        url: &str,
        cookies: &SessionCookieJar,
    ) -> Result<Response, ScrapeError> {
        let mut request = self.client.get(url);
        if let Some(header) = cookies.header_value()? {
            request = request.header(COOKIE, header);
        }
        let response = request.send().await?;
        Ok(response)
    }

    /// Body of a 2xx response, anything else is [`ScrapeError::Status`].
    pub async fn fetch_url_body(
        &self,
        url: &str,
        cookies: &SessionCookieJar,
    ) -> Result<String, ScrapeError> {
        let response = self.fetch_url_response(url, cookies).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = response.text().await?;
        Ok(body)
    }
}
