//! End-to-end scenarios against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then sends every kind of request
//! through the default ureq transport. The server echoes what it received, so
//! assertions run on the wire-level request rather than on builder state.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::OnceLock;

use fluent_rest::{get, post, put, ApiError};
use mock_server::{EchoReply, ReceivedPart};
use serde::Serialize;

/// Start the mock server once for the whole test binary.
fn server() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();
    *ADDR.get_or_init(|| {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    })
}

fn base_url() -> String {
    format!("http://{}", server())
}

#[derive(Serialize)]
struct Content {
    #[serde(rename = "Name")]
    name: String,
}

#[test]
fn simple_json_post() {
    let content = Content {
        name: "name".to_string(),
    };
    let reply: EchoReply = post(base_url())
        .path("/echo")
        .json_struct(&content)
        .unmarshal()
        .unwrap();
    assert_eq!(reply.method, "POST");
    assert_eq!(reply.body, r#"{"Name":"name"}"#);
    assert_eq!(reply.headers["content-type"], "application/json");
}

#[test]
fn raw_execute_returns_live_response() {
    let mut response = post(base_url())
        .path("/echo")
        .json(br#"{"Name":"name"}"#.to_vec())
        .execute()
        .unwrap();
    assert_eq!(response.status, 200);
    let reply: EchoReply = serde_json::from_reader(&mut response.body).unwrap();
    assert_eq!(reply.body, r#"{"Name":"name"}"#);
}

#[test]
fn simple_url_encoded_put() {
    let reply: EchoReply = put(base_url())
        .path("/echo")
        .form_field("key", "value")
        .unmarshal()
        .unwrap();
    assert_eq!(reply.method, "PUT");
    assert_eq!(reply.body, "key=value");
    assert_eq!(
        reply.headers["content-type"],
        "application/x-www-form-urlencoded"
    );
}

#[test]
fn multi_url_encoded_post() {
    let reply: EchoReply = post(base_url())
        .path("/echo")
        .form_field("key", "value")
        .form_field_list("key2", ["value2", "value3"])
        .unmarshal()
        .unwrap();
    assert_eq!(reply.body, "key=value&key2=value2&key2=value3");
}

#[test]
fn path_query_headers_and_auth() {
    let reply: EchoReply = get(base_url())
        .path("/echo")
        .path_fmt(format_args!("/users/{}", "takahiro"))
        .path_fmt(format_args!("/blog/{}", 1))
        .url_param("key", "value")
        .url_param("key2", "value2")
        .header("X-Request-Id", "abc")
        .basic_auth("user", "pass")
        .unmarshal()
        .unwrap();
    assert_eq!(reply.method, "GET");
    assert_eq!(reply.path, "/echo/users/takahiro/blog/1");
    assert_eq!(reply.query.as_deref(), Some("key=value&key2=value2"));
    assert_eq!(reply.headers["x-request-id"], "abc");
    assert_eq!(reply.headers["authorization"], "Basic dXNlcjpwYXNz");
    assert!(!reply.headers.contains_key("content-type"));
}

#[test]
fn custom_content_type_overrides_computed_one() {
    let reply: EchoReply = post(base_url())
        .path("/echo")
        .json_string("{}")
        .header("Content-Type", "application/vnd.custom+json")
        .unmarshal()
        .unwrap();
    assert_eq!(reply.headers["content-type"], "application/vnd.custom+json");
    assert_eq!(reply.body, "{}");
}

#[test]
fn simple_multipart_value_post() {
    let parts: Vec<ReceivedPart> = post(base_url())
        .path("/multipart")
        .multipart_data("key", Cursor::new("(1,2,34,55,666)"), false)
        .unmarshal()
        .unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name.as_deref(), Some("key"));
    assert_eq!(parts[0].file_name, None);
    assert_eq!(parts[0].data, "(1,2,34,55,666)");
}

#[test]
fn forced_multipart_value_post() {
    let parts: Vec<ReceivedPart> = post(base_url())
        .path("/multipart")
        .multipart_data("key", Cursor::new("(1,2,34,55,666)"), true)
        .unmarshal()
        .unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name.as_deref(), Some("key"));
    assert_eq!(parts[0].file_name.as_deref(), Some(""));
    assert_eq!(parts[0].content_type.as_deref(), Some("multipart/form-data"));
    assert_eq!(parts[0].data, "(1,2,34,55,666)");
}

#[test]
fn unencoded_query_is_a_build_error() {
    let err = get(base_url())
        .path("/echo")
        .url_param("q", "a b")
        .unmarshal::<EchoReply>()
        .unwrap_err();
    assert!(matches!(err, ApiError::Build(_)));
}

#[test]
fn simple_multipart_file_post() {
    let path = std::env::temp_dir().join(format!("fluent-rest-{}.golden", unique_suffix()));
    std::fs::write(&path, "header1,header2\nvalue1,value2\n").unwrap();

    let parts: Vec<ReceivedPart> = post(base_url())
        .path("/multipart")
        .multipart_file("key", &path, true)
        .unmarshal()
        .unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].file_name.as_deref(), Some(&*path.to_string_lossy()));
    assert_eq!(parts[0].content_type.as_deref(), Some("multipart/form-data"));
    assert_eq!(parts[0].data, "header1,header2\nvalue1,value2\n");
}

#[test]
fn simple_multipart_value_as_file_post() {
    let parts: Vec<ReceivedPart> = post(base_url())
        .path("/multipart")
        .multipart_as_form_file(
            "key",
            "sample.csv",
            Cursor::new("header1,header2\nvalue1,value2\n"),
            false,
        )
        .multipart_data("note", Cursor::new("plain"), false)
        .unmarshal()
        .unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].file_name.as_deref(), Some("sample.csv"));
    assert_eq!(
        parts[0].content_type.as_deref(),
        Some("application/octet-stream")
    );
    assert_eq!(parts[0].data, "header1,header2\nvalue1,value2\n");
    assert_eq!(parts[1].name.as_deref(), Some("note"));
    assert_eq!(parts[1].data, "plain");
}

#[test]
fn error_status_carries_code_and_body() {
    let err = put(base_url())
        .path("/status/418")
        .form_field("a", "1")
        .unmarshal::<serde_json::Value>()
        .unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 418);
            assert_eq!(body, b"status 418 (3 bytes received)");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[test]
fn raw_execute_does_not_check_status() {
    let mut response = get(base_url()).path("/status/500").execute().unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(
        response.body.read_to_string().unwrap(),
        "status 500 (0 bytes received)"
    );
}

#[test]
fn connection_failure_is_a_transport_error() {
    // Bind and immediately drop a listener to get a port nobody serves.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let err = get(format!("http://{addr}")).execute().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{nanos}", std::process::id())
}
