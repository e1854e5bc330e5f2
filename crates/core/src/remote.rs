//! HTTP implementations of the submission and verdict capabilities.
//!
//! Both talk to a Veritas REST service (`POST /api/submissions`,
//! `GET /api/results?address=…`) rooted at a configurable base URL.

use crate::form::{SubmissionClient, SubmissionFailure, SubmissionOutcome, SubmissionPayload};
use crate::results::{ResultVerdict, VerdictSource};
use crate::{VeritasError, VeritasResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

/// Parses a base URL so that relative joins append to its path.
fn base_url(raw: &str) -> VeritasResult<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Submits reports over HTTP.
#[derive(Clone, Debug)]
pub struct HttpSubmissionClient {
    client: Client,
    endpoint: Url,
}

impl HttpSubmissionClient {
    /// # Errors
    ///
    /// Returns `VeritasError::InvalidUrl` if `base` is not an absolute URL.
    pub fn new(base: &str) -> VeritasResult<Self> {
        Ok(Self {
            client: Client::new(),
            endpoint: base_url(base)?.join("api/submissions")?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    async fn submit(&self, payload: &SubmissionPayload) -> VeritasResult<SubmissionOutcome> {
        tracing::debug!("POST {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(SubmissionOutcome::Accepted(response.json().await?));
        }
        let body = response.text().await?;
        refusal(status, &body)
    }
}

/// Reads a non-success response. Any status carrying an `{errorId, message}` body is a
/// refusal; anything else is a transport failure.
fn refusal(status: StatusCode, body: &str) -> VeritasResult<SubmissionOutcome> {
    match serde_json::from_str::<SubmissionFailure>(body) {
        Ok(failure) => Ok(SubmissionOutcome::Rejected(failure)),
        Err(e) => {
            tracing::debug!("{} response without failure body: {}", status, e);
            Err(VeritasError::HttpStatus(status.as_u16()))
        }
    }
}

/// Fetches verdicts over HTTP.
#[derive(Clone, Debug)]
pub struct HttpVerdictSource {
    client: Client,
    endpoint: Url,
}

impl HttpVerdictSource {
    /// # Errors
    ///
    /// Returns `VeritasError::InvalidUrl` if `base` is not an absolute URL.
    pub fn new(base: &str) -> VeritasResult<Self> {
        Ok(Self {
            client: Client::new(),
            endpoint: base_url(base)?.join("api/results")?,
        })
    }

    /// Request URL for one address.
    pub fn url_for(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("address", address);
        url
    }
}

#[async_trait]
impl VerdictSource for HttpVerdictSource {
    async fn fetch(&self, address: &str) -> VeritasResult<ResultVerdict> {
        let url = self.url_for(address);
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(VeritasError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}
