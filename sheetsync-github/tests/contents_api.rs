//! GitHubStore against a canned HTTP responder on localhost.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sheetsync_core::{
    config::Config,
    types::{RemoteRef, VersionToken},
};
use sheetsync_github::GitHubStore;
use sheetsync_sync::{
    transport, FileCache, ManualClock, RemoteStore, StoreError, SyncError, Synchronizer,
    WriteAuthorization,
};

struct Canned {
    status: u16,
    body: Vec<u8>,
    silent: bool,
}

impl Canned {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
            silent: false,
        }
    }

    fn raw(body: &[u8]) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
            silent: false,
        }
    }

    /// Accept the request and never answer.
    fn silent() -> Self {
        Self {
            status: 0,
            body: Vec::new(),
            silent: true,
        }
    }
}

/// Serve one canned response per connection; returns the base URL and the
/// captured raw requests.
fn serve(build: impl FnOnce(&str) -> Vec<Canned>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    let responses = build(&base);
    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for canned in responses {
            let (mut stream, _) = listener.accept().expect("accept");
            requests.push(read_request(&mut stream));
            if canned.silent {
                thread::sleep(Duration::from_secs(3));
                continue;
            }
            let head = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                canned.status,
                canned.body.len()
            );
            stream.write_all(head.as_bytes()).expect("write head");
            stream.write_all(&canned.body).expect("write body");
            stream.flush().expect("flush");
        }
        requests
    });
    (base, handle)
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().expect("clone"));
    let mut request = String::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).expect("read line") == 0 || line == "\r\n" {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().expect("content-length");
        }
        request.push_str(&line);
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("read body");
    request.push_str(&String::from_utf8_lossy(&body));
    request
}

fn store_at(base: &str) -> GitHubStore {
    store_with_timeout(base, 5)
}

fn store_with_timeout(base: &str, timeout_secs: u64) -> GitHubStore {
    GitHubStore::new(&Config {
        api_base: base.to_owned(),
        token: Some("ghp_test".to_owned()),
        timeout_secs,
        ..Config::default()
    })
}

fn manual_sync(store: GitHubStore) -> Synchronizer<GitHubStore> {
    let cache = Arc::new(FileCache::new(
        Duration::from_secs(300),
        Arc::new(ManualClock::default()),
    ));
    Synchronizer::new(store, cache)
}

fn inline_v1() -> Canned {
    Canned::json(
        200,
        serde_json::json!({
            "type": "file", "sha": "blob-a", "size": 2,
            "encoding": "base64", "content": "djE=",
        }),
    )
}

fn kontrak() -> RemoteRef {
    RemoteRef::new("acme/dash", "data/data_kontrak_new.xlsx", "main")
}

#[test]
fn get_decodes_inline_content_and_sends_auth_and_ref() {
    let (base, server) = serve(|_| {
        vec![Canned::json(
            200,
            serde_json::json!({
                "type": "file", "sha": "blob-a", "size": 2,
                "encoding": "base64", "content": "djE=\n",
            }),
        )]
    });

    let object = store_at(&base).get(&kontrak()).expect("get");
    assert_eq!(object.version, VersionToken::from("blob-a"));
    assert_eq!(transport::decode(&object.payload).unwrap(), b"v1");

    let requests = server.join().unwrap();
    assert!(requests[0]
        .starts_with("GET /repos/acme/dash/contents/data/data_kontrak_new.xlsx?ref=main "));
    assert!(requests[0].to_ascii_lowercase().contains("authorization: bearer ghp_test"));
}

#[test]
fn get_follows_download_url_for_large_files() {
    let (base, server) = serve(|base| {
        vec![
            Canned::json(
                200,
                serde_json::json!({
                    "type": "file", "sha": "blob-big", "size": 2_000_000,
                    "encoding": "none", "content": "",
                    "download_url": format!("{base}/raw/data_kontrak_new.xlsx"),
                }),
            ),
            Canned::raw(b"PK\x03\x04big"),
        ]
    });

    let object = store_at(&base).get(&kontrak()).expect("get");
    assert_eq!(transport::decode(&object.payload).unwrap(), b"PK\x03\x04big");
    assert_eq!(object.version, VersionToken::from("blob-big"));

    let requests = server.join().unwrap();
    assert!(requests[1].starts_with("GET /raw/data_kontrak_new.xlsx "));
}

#[test]
fn get_404_is_not_found() {
    let (base, server) =
        serve(|_| vec![Canned::json(404, serde_json::json!({"message": "Not Found"}))]);
    assert_eq!(store_at(&base).get(&kontrak()).unwrap_err(), StoreError::NotFound);
    server.join().unwrap();
}

#[test]
fn put_sends_sha_branch_and_base64() {
    let (base, server) = serve(|_| {
        vec![Canned::json(
            201,
            serde_json::json!({"content": {"sha": "blob-b"}, "commit": {"sha": "c0ffee"}}),
        )]
    });

    let version = store_at(&base)
        .put(&kontrak(), &transport::encode(b"v2"), &VersionToken::from("blob-a"), "Update x")
        .expect("put");
    assert_eq!(version, VersionToken::from("blob-b"));

    let requests = server.join().unwrap();
    let request = &requests[0];
    assert!(request.starts_with("PUT /repos/acme/dash/contents/data/data_kontrak_new.xlsx "));
    assert!(request.contains(r#""sha":"blob-a""#));
    assert!(request.contains(r#""branch":"main""#));
    assert!(request.contains(r#""content":"djI=""#));
}

#[test]
fn synchronizer_over_http_maps_stale_sha_to_conflict() {
    let (base, server) = serve(|_| {
        vec![
            Canned::json(
                200,
                serde_json::json!({
                    "type": "file", "sha": "blob-a", "size": 2,
                    "encoding": "base64", "content": "djE=",
                }),
            ),
            Canned::json(409, serde_json::json!({"message": "is at blob-z but expected blob-a"})),
        ]
    });

    let sync = manual_sync(store_at(&base));
    let file = sync.fetch(&kontrak()).expect("fetch");
    let err = sync
        .publish(&kontrak(), b"v2", &file.version, WriteAuthorization::Confirmed)
        .unwrap_err();
    assert!(matches!(err, SyncError::Conflict { .. }), "got: {err}");
    server.join().unwrap();
}

#[test]
fn unreachable_api_is_unavailable() {
    // Bind and drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .expect("port")
        .port();
    let err = store_at(&format!("http://127.0.0.1:{port}"))
        .get(&kontrak())
        .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)), "got: {err}");
}

fn oversized_download(base: &str) -> Vec<Canned> {
    vec![
        Canned::json(
            200,
            serde_json::json!({
                "type": "file", "sha": "blob-big", "size": 16,
                "encoding": "none", "content": "",
                "download_url": format!("{base}/raw/data_kontrak_new.xlsx"),
            }),
        ),
        Canned::raw(b"PK\x03\x04-twelve-more"),
    ]
}

#[test]
fn download_over_the_cap_is_refused_not_truncated() {
    let (base, server) = serve(oversized_download);

    let err = store_at(&base)
        .with_max_download_bytes(8)
        .get(&kontrak())
        .unwrap_err();
    assert!(
        matches!(err, StoreError::Invalid(ref m) if m.contains("8 byte limit")),
        "got: {err}"
    );
    server.join().unwrap();
}

#[test]
fn oversized_download_leaves_cache_empty() {
    let (base, server) = serve(oversized_download);

    let sync = manual_sync(store_at(&base).with_max_download_bytes(8));
    let err = sync.fetch(&kontrak()).unwrap_err();
    assert!(matches!(err, SyncError::RemoteUnavailable { .. }), "got: {err}");
    assert!(sync.cache().peek(&kontrak()).is_none());
    server.join().unwrap();
}

#[test]
fn silent_server_times_out_as_unavailable_without_caching() {
    let (base, server) = serve(|_| vec![Canned::silent()]);

    let sync = manual_sync(store_with_timeout(&base, 1));
    let err = sync.fetch(&kontrak()).unwrap_err();
    assert!(matches!(err, SyncError::RemoteUnavailable { .. }), "got: {err}");
    assert!(err.is_retryable());
    assert!(sync.cache().peek(&kontrak()).is_none());
    server.join().unwrap();
}

#[test]
fn timed_out_refresh_keeps_previous_cache_entry() {
    let (base, server) = serve(|_| vec![inline_v1(), Canned::silent()]);

    let sync = manual_sync(store_with_timeout(&base, 1));
    let first = sync.fetch(&kontrak()).expect("fetch");
    let err = sync.refresh(&kontrak()).unwrap_err();
    assert!(matches!(err, SyncError::RemoteUnavailable { .. }), "got: {err}");

    let cached = sync.cache().peek(&kontrak()).expect("entry kept");
    assert_eq!(cached.file.version, first.version);
    assert_eq!(cached.file.hash, first.hash);
    server.join().unwrap();
}
