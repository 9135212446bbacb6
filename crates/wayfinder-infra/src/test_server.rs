//! Canned-response axum server for exercising the reqwest clients in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

struct ServerState {
    routes: HashMap<String, (StatusCode, Vec<u8>)>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Canned responses keyed by request path. Unknown paths get a 404.
pub struct TestServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl TestServer {
    pub async fn start(routes: &[(&str, u16, &[u8])]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = Arc::new(ServerState {
            routes: routes
                .iter()
                .map(|(path, status, body)| {
                    let status = StatusCode::from_u16(*status).unwrap();
                    (path.to_string(), (status, body.to_vec()))
                })
                .collect(),
            requests: Arc::clone(&requests),
        });
        let app = Router::new().fallback(respond).with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Vec<u8>) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        content_type,
        body: body.to_vec(),
    });

    state
        .routes
        .get(uri.path())
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, b"not found".to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_chunked_request_body_is_decoded() {
        let server = TestServer::start(&[("/build", 201, b"ok".as_slice())]).await;
        let addr = server.base_url.trim_start_matches("http://").to_string();

        let mut stream = TcpStream::connect(&addr).await.unwrap();
        stream
            .write_all(
                b"POST /build HTTP/1.1\r\nHost: test\r\nContent-Type: text/plain\r\n\
                  Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
                  5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
            )
            .await
            .unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let response = String::from_utf8_lossy(&response);
        assert!(response.starts_with("HTTP/1.1 201"), "got: {response}");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/build");
        assert_eq!(requests[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(requests[0].body, b"hello world");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let server = TestServer::start(&[]).await;
        let status = reqwest::get(format!("{}/missing", server.base_url))
            .await
            .unwrap()
            .status();
        assert_eq!(status, 404);
        assert_eq!(server.requests()[0].path, "/missing");
    }
}
