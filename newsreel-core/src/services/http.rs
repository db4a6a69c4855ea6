use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::foundation::error::{NewsreelError, NewsreelResult};

pub const DEFAULT_USER_AGENT: &str = concat!("newsreel/", env!("CARGO_PKG_VERSION"));

/// Settings shared by every blocking HTTP client the pipeline builds.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn build_client(&self) -> NewsreelResult<Client> {
        Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout())
            .gzip(true)
            .build()
            .map_err(|e| NewsreelError::validation(format!("build http client: {e}")))
    }
}

/// Send `GET url` and return the response if its status is a success.
pub(crate) fn get_ok(client: &Client, url: &str, what: &str) -> NewsreelResult<Response> {
    let resp = client
        .get(url)
        .send()
        .map_err(|e| NewsreelError::from_reqwest(what, &e))?;
    ensure_success(resp, what)
}

pub(crate) fn ensure_success(resp: Response, what: &str) -> NewsreelResult<Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(NewsreelError::from_status(what, status));
    }
    Ok(resp)
}

pub(crate) fn read_bytes(resp: Response, what: &str) -> NewsreelResult<Vec<u8>> {
    resp.bytes()
        .map(|b| b.to_vec())
        .map_err(|e| NewsreelError::from_reqwest(what, &e))
}
