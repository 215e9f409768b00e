use std::io::Read;

use sheetsync_core::{
    config::Config,
    types::{RemoteRef, VersionToken},
};
use sheetsync_sync::store::{Payload, RemoteStore, StoreError, StoredObject};

use crate::api::{self, ContentSource, ContentsResponse, UpdateRequest, UpdateResponse};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
/// Contents API hard limit for blobs served through `download_url`.
const MAX_DOWNLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// [`RemoteStore`] backed by the GitHub Contents API.
///
/// Every request is bounded by the configured timeout; a timed-out request
/// surfaces as [`StoreError::Unavailable`].
#[derive(Clone)]
pub struct GitHubStore {
    agent: ureq::Agent,
    api_base: String,
    token: Option<String>,
    max_download_bytes: u64,
}

impl GitHubStore {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .user_agent(concat!("sheetsync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
            max_download_bytes: MAX_DOWNLOAD_BYTES,
        }
    }

    /// Lower (or raise) the size cap for `download_url` bodies.
    pub fn with_max_download_bytes(mut self, limit: u64) -> Self {
        self.max_download_bytes = limit;
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// `{api}/repos/{owner}/{repo}/contents/{path}` with each path segment escaped.
    pub fn contents_url(&self, remote: &RemoteRef) -> String {
        let path = remote
            .path
            .0
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/repos/{}/contents/{}", self.api_base, remote.repo, path)
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn api_request(&self, method: &str, url: &str) -> ureq::Request {
        self.authorize(self.agent.request(method, url))
            .set("Accept", ACCEPT)
            .set("X-GitHub-Api-Version", API_VERSION)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        tracing::debug!(%url, "downloading large file");
        let response = self
            .authorize(self.agent.get(url))
            .call()
            .map_err(|e| classify(e, api::read_status_error))?;
        read_capped(response.into_reader(), self.max_download_bytes)
    }
}

/// Read the whole body, refusing anything over `limit` bytes rather than
/// returning a truncated prefix.
fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>, StoreError> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| StoreError::Unavailable(format!("reading download body: {e}")))?;
    if bytes.len() as u64 > limit {
        return Err(StoreError::Invalid(format!(
            "download exceeds the {limit} byte limit"
        )));
    }
    Ok(bytes)
}

impl std::fmt::Debug for GitHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubStore")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RemoteStore for GitHubStore {
    fn get(&self, remote: &RemoteRef) -> Result<StoredObject, StoreError> {
        let url = self.contents_url(remote);
        tracing::debug!(%url, branch = %remote.branch, "GET contents");
        let response = self
            .api_request("GET", &url)
            .query("ref", &remote.branch.0)
            .call()
            .map_err(|e| classify(e, api::read_status_error))?;
        let meta: ContentsResponse = response
            .into_json()
            .map_err(|e| StoreError::Invalid(format!("contents response: {e}")))?;

        let payload = match meta.source()? {
            ContentSource::Inline(payload) => payload,
            ContentSource::Download(url) => Payload::Raw(self.download(&url)?),
        };
        Ok(StoredObject {
            payload,
            version: meta.version(),
        })
    }

    fn put(
        &self,
        remote: &RemoteRef,
        content: &str,
        expected: &VersionToken,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        let url = self.contents_url(remote);
        tracing::debug!(%url, branch = %remote.branch, expected = %expected, "PUT contents");
        let response = self
            .api_request("PUT", &url)
            .send_json(UpdateRequest::new(remote, content, expected, message))
            .map_err(|e| classify(e, api::write_status_error))?;
        let updated: UpdateResponse = response
            .into_json()
            .map_err(|e| StoreError::Invalid(format!("update response: {e}")))?;
        Ok(VersionToken(updated.content.sha))
    }
}

fn classify(err: ureq::Error, on_status: fn(u16, &str) -> StoreError) -> StoreError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            on_status(status, &body)
        }
        ureq::Error::Transport(transport) => StoreError::Unavailable(transport.to_string()),
    }
}
