//! Cookie-carrying HTTP session used for one lookup.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER};
use url::Url;

use binday_core::ports::PortError;

use crate::form::Form;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_GB: &str = "en-GB,en;q=0.9";

/// A fetched page and the URL it was served from after redirects.
#[derive(Debug, Clone)]
pub(crate) struct Page {
    pub(crate) url: Url,
    pub(crate) body: String,
}

/// One browser-like session; cookies set by the council persist across postbacks.
pub(crate) struct Session {
    client: Client,
    base_url: Url,
}

impl Session {
    pub(crate) fn open(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, PortError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_GB));

        let client = Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) async fn get(&self, url: &Url) -> Result<Page, PortError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(url = %resp.url(), status = %resp.status(), "GET");
        read_page(resp).await
    }

    /// Post the form back to its action as if it were submitted from `from`.
    pub(crate) async fn submit(&self, from: &Page, form: &Form) -> Result<Page, PortError> {
        let origin = from.url.origin().ascii_serialization();
        let resp = self
            .client
            .post(form.action.clone())
            .header(REFERER, from.url.as_str())
            .header(ORIGIN, origin)
            .form(&form.fields)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(
            url = %resp.url(),
            status = %resp.status(),
            fields = form.fields.len(),
            "POST"
        );
        read_page(resp).await
    }
}

async fn read_page(resp: reqwest::Response) -> Result<Page, PortError> {
    let url = resp.url().clone();
    let body = resp.text().await?;
    Ok(Page { url, body })
}
