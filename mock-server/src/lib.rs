use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Multipart, Path},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Everything the server saw of an `/echo` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoReply {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// One part of a multipart body received on `/multipart`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedPart {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/multipart", post(multipart))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<EchoReply> {
    tracing::debug!(%method, %uri, "echo");
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(EchoReply {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn multipart(mut form: Multipart) -> Result<Json<Vec<ReceivedPart>>, (StatusCode, String)> {
    let mut parts = Vec::new();
    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data: String::from_utf8_lossy(&data).into_owned(),
        });
    }
    Ok(Json(parts))
}

async fn status(Path(code): Path<u16>, body: Bytes) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (
        status,
        format!("status {} ({} bytes received)", status.as_u16(), body.len()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_reply_serializes_to_json() {
        let reply = EchoReply {
            method: "POST".to_string(),
            path: "/echo".to_string(),
            query: None,
            headers: BTreeMap::new(),
            body: "key=value".to_string(),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["query"], serde_json::Value::Null);
        assert_eq!(json["body"], "key=value");
    }

    #[test]
    fn echo_reply_roundtrips_through_json() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let reply = EchoReply {
            method: "PUT".to_string(),
            path: "/echo/a/b".to_string(),
            query: Some("x=1".to_string()),
            headers,
            body: "{}".to_string(),
        };
        let json = serde_json::to_string(&reply).unwrap();
        let back: EchoReply = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reply);
    }

    #[test]
    fn received_part_allows_missing_file_name() {
        let part: ReceivedPart = serde_json::from_str(
            r#"{"name":"key","file_name":null,"content_type":null,"data":"v"}"#,
        )
        .unwrap();
        assert_eq!(part.name.as_deref(), Some("key"));
        assert!(part.file_name.is_none());
    }
}
