//! Wire types and status mapping for the contents API.

use serde::{Deserialize, Serialize};

use sheetsync_core::types::{RemoteRef, VersionToken};
use sheetsync_sync::store::{Payload, StoreError};

/// `GET /repos/{repo}/contents/{path}` response for a single file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Where the bytes of a [`ContentsResponse`] live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Inline(Payload),
    /// Files over 1 MB come back without inline content.
    Download(String),
}

impl ContentsResponse {
    pub fn version(&self) -> VersionToken {
        VersionToken(self.sha.clone())
    }

    /// Prefer inline base64; fall back to `download_url` only when the API
    /// left the content out.
    pub fn source(&self) -> Result<ContentSource, StoreError> {
        if let Some(kind) = self.kind.as_deref() {
            if kind != "file" {
                return Err(StoreError::Invalid(format!("path is a {kind}, not a file")));
            }
        }
        let inline = self.content.as_deref().filter(|c| !c.trim().is_empty());
        match (self.encoding.as_deref(), inline) {
            (Some("base64"), Some(content)) => {
                Ok(ContentSource::Inline(Payload::Base64(content.to_owned())))
            }
            (Some(other), Some(_)) if other != "base64" => Err(StoreError::Invalid(format!(
                "unsupported content encoding '{other}'"
            ))),
            _ if self.size == 0 => Ok(ContentSource::Inline(Payload::Raw(Vec::new()))),
            _ => match self.download_url.as_deref() {
                Some(url) if !url.is_empty() => Ok(ContentSource::Download(url.to_owned())),
                _ => Err(StoreError::Invalid(
                    "response has neither inline content nor a download_url".to_owned(),
                )),
            },
        }
    }
}

/// `PUT /repos/{repo}/contents/{path}` request body.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRequest<'a> {
    pub message: &'a str,
    pub content: &'a str,
    pub sha: &'a str,
    pub branch: &'a str,
}

impl<'a> UpdateRequest<'a> {
    pub fn new(
        remote: &'a RemoteRef,
        content: &'a str,
        expected: &'a VersionToken,
        message: &'a str,
    ) -> Self {
        Self {
            message,
            content,
            sha: &expected.0,
            branch: &remote.branch.0,
        }
    }
}

/// `PUT` response; only the new blob SHA matters.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    pub content: UpdatedContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatedContent {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// The `message` field of a GitHub error body, or the raw body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_owned())
}

/// Map a non-2xx status on a read.
pub fn read_status_error(status: u16, body: &str) -> StoreError {
    let message = error_message(body);
    match status {
        404 => StoreError::NotFound,
        401 | 403 => StoreError::Denied { status, message },
        _ => StoreError::Unavailable(format!("status {status}: {message}")),
    }
}

/// Map a non-2xx status on a conditional write.
///
/// GitHub answers a stale `sha` with 409, and with 422 when the `sha` field
/// is missing or malformed for an existing file.
pub fn write_status_error(status: u16, body: &str) -> StoreError {
    let message = error_message(body);
    match status {
        409 => StoreError::Conflict(message),
        422 if message.to_ascii_lowercase().contains("sha") => StoreError::Conflict(message),
        404 => StoreError::NotFound,
        401 | 403 => StoreError::Denied { status, message },
        500..=599 => StoreError::Unavailable(format!("status {status}: {message}")),
        _ => StoreError::Invalid(format!("status {status}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(json: &str) -> ContentsResponse {
        serde_json::from_str(json).expect("parse")
    }

    #[test]
    fn inline_base64_with_line_breaks() {
        let resp = parse(
            r#"{"type":"file","sha":"abc","size":2,"encoding":"base64","content":"djE=\n","download_url":"https://raw/x"}"#,
        );
        assert_eq!(resp.version(), VersionToken::from("abc"));
        assert_eq!(
            resp.source().unwrap(),
            ContentSource::Inline(Payload::Base64("djE=\n".to_owned()))
        );
    }

    #[test]
    fn large_file_falls_back_to_download_url() {
        let resp = parse(
            r#"{"type":"file","sha":"abc","size":5000000,"encoding":"none","content":"","download_url":"https://raw/x"}"#,
        );
        assert_eq!(
            resp.source().unwrap(),
            ContentSource::Download("https://raw/x".to_owned())
        );
    }

    #[test]
    fn empty_file_needs_no_download() {
        let resp =
            parse(r#"{"type":"file","sha":"e69de29","size":0,"encoding":"base64","content":""}"#);
        assert_eq!(resp.source().unwrap(), ContentSource::Inline(Payload::Raw(Vec::new())));
    }

    #[test]
    fn directory_is_invalid() {
        let resp = parse(r#"{"type":"dir","sha":"abc","size":0}"#);
        assert!(matches!(resp.source(), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn update_request_serializes_expected_fields() {
        let remote = RemoteRef::new("acme/dash", "data/x.xlsx", "reports");
        let token = VersionToken::from("abc");
        let body =
            serde_json::to_value(UpdateRequest::new(&remote, "djI=", &token, "msg")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "message": "msg",
                "content": "djI=",
                "sha": "abc",
                "branch": "reports",
            })
        );
    }

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(
            error_message(r#"{"message":"Bad credentials","documentation_url":"x"}"#),
            "Bad credentials"
        );
        assert_eq!(error_message("  gateway timeout "), "gateway timeout");
    }

    #[rstest]
    #[case(404, "Not Found", StoreError::NotFound)]
    #[case(
        401,
        "Bad credentials",
        StoreError::Denied { status: 401, message: "Bad credentials".into() }
    )]
    #[case(403, "rate limited", StoreError::Denied { status: 403, message: "rate limited".into() })]
    #[case(502, "bad gateway", StoreError::Unavailable("status 502: bad gateway".into()))]
    fn read_statuses(#[case] status: u16, #[case] message: &str, #[case] expected: StoreError) {
        let body = format!(r#"{{"message":"{message}"}}"#);
        assert_eq!(read_status_error(status, &body), expected);
    }

    #[rstest]
    #[case(409, "is at 1234 but expected abcd")]
    #[case(422, "Invalid request.\n\n\"sha\" wasn't supplied.")]
    fn stale_sha_is_conflict(#[case] status: u16, #[case] message: &str) {
        let body = serde_json::json!({ "message": message }).to_string();
        assert!(matches!(write_status_error(status, &body), StoreError::Conflict(_)));
    }

    #[rstest]
    #[case(403, "Resource not accessible by integration")]
    #[case(422, "content is not valid Base64")]
    #[case(404, "Not Found")]
    #[case(500, "boom")]
    fn other_write_failures_are_not_conflicts(#[case] status: u16, #[case] message: &str) {
        let body = serde_json::json!({ "message": message }).to_string();
        assert!(!matches!(write_status_error(status, &body), StoreError::Conflict(_)));
    }
}
