//! Test fixtures: a throwaway HTTP server and in-memory zip archives.

use std::convert::Infallible;
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

pub struct Route {
    path: String,
    body: Vec<u8>,
    /// Chunk count and delay before each chunk; `None` sends the body at once.
    pacing: Option<(usize, Duration)>,
}

impl Route {
    pub fn text(path: &str, body: &str) -> Self {
        Self {
            path: path.to_string(),
            body: body.as_bytes().to_vec(),
            pacing: None,
        }
    }

    pub fn bytes(path: &str, body: Vec<u8>) -> Self {
        Self {
            path: path.to_string(),
            body,
            pacing: None,
        }
    }

    /// Stream `body` in `chunks` pieces, sleeping `delay` before each one.
    pub fn slow(path: &str, body: Vec<u8>, chunks: usize, delay: Duration) -> Self {
        Self {
            path: path.to_string(),
            body,
            pacing: Some((chunks.max(1), delay)),
        }
    }
}

fn respond(body: Vec<u8>, pacing: Option<(usize, Duration)>) -> Response {
    let Some((chunks, delay)) = pacing else {
        return (StatusCode::OK, body).into_response();
    };

    let total = body.len();
    let chunk_len = total.div_ceil(chunks).max(1);
    let pieces: Vec<Bytes> = body
        .chunks(chunk_len)
        .map(Bytes::copy_from_slice)
        .collect();
    let stream = futures_util::stream::unfold(pieces.into_iter(), move |mut rest| async move {
        let piece = rest.next()?;
        tokio::time::sleep(delay).await;
        Some((Ok::<_, Infallible>(piece), rest))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("content-length", total.to_string())
        .body(Body::from_stream(stream))
        .unwrap()
}

pub struct TestServer {
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve each route's body with `200 OK`; anything else is `404`.
pub async fn serve(routes: Vec<Route>) -> TestServer {
    let mut app = Router::new();
    for route in routes {
        let body = route.body;
        let pacing = route.pacing;
        app = app.route(
            &route.path,
            get(move || {
                let body = body.clone();
                async move { respond(body, pacing) }
            }),
        );
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer { addr, handle }
}

/// Build a zip archive in memory. Names ending in `/` become directories.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}
