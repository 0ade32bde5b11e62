#![allow(dead_code)]

use access_logger::prelude::*;
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::routing::get;
use axum::{Extension, Router, middleware};
use axum_test::TestServer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

/// Address reported as the TCP peer of every test request.
pub const PEER_IP: &str = "10.0.0.7";

/// A record together with the tags it was sent with.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub record: LogRecord,
    pub tags: Vec<String>,
}

/// Sink collecting records on a channel.
pub struct MemorySink {
    tx: mpsc::UnboundedSender<Delivered>,
}

#[async_trait]
impl LogSink for MemorySink {
    async fn send(&self, record: &LogRecord, tags: &[String]) -> SinkResult<()> {
        let _ = self.tx.send(Delivered {
            record: record.clone(),
            tags: tags.to_vec(),
        });
        Ok(())
    }
}

/// Receiving side of a [`MemorySink`].
pub struct Inbox {
    rx: Mutex<mpsc::UnboundedReceiver<Delivered>>,
}

impl Inbox {
    /// Waits for the next record, failing the test after one second.
    pub async fn next(&self) -> Delivered {
        tokio::time::timeout(Duration::from_secs(1), self.rx.lock().await.recv())
            .await
            .expect("no record delivered")
            .expect("sink closed")
    }

    /// Asserts that no record arrives within a short grace period.
    pub async fn assert_empty(&self) {
        let received =
            tokio::time::timeout(Duration::from_millis(200), self.rx.lock().await.recv()).await;
        if let Ok(Some(delivered)) = received {
            panic!("unexpected record: {:?}", delivered.record);
        }
    }
}

pub fn memory_sink() -> (Arc<MemorySink>, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Arc::new(MemorySink { tx }),
        Inbox { rx: Mutex::new(rx) },
    )
}

pub fn create_test_registry() -> Arc<TokenRegistry> {
    Arc::new(TokenRegistry::with_host(HostInfo::new(
        "web-01",
        Some("10.0.0.5".parse().unwrap()),
    )))
}

pub fn create_test_catalog() -> Arc<FormatCatalog> {
    Arc::new(FormatCatalog::with_builtins(create_test_registry()))
}

/// Pause before each chunk of the `/stream` route.
pub const STREAM_CHUNK_DELAY: Duration = Duration::from_millis(50);

/// Chunks sent by the `/stream` route, in order.
pub const STREAM_CHUNKS: [&str; 3] = ["alpha", "beta", "gamma"];

/// Streams [`STREAM_CHUNKS`] with a pause before each one.
async fn stream() -> Body {
    let chunks = futures::stream::unfold(0, |n| async move {
        let chunk = STREAM_CHUNKS.get(n)?;
        tokio::time::sleep(STREAM_CHUNK_DELAY).await;
        Some((Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes())), n + 1))
    });
    Body::from_stream(chunks)
}

/// Counts how often the wrapped handlers ran.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Demo routes behind the access log, with a fixed peer address.
pub fn create_test_app(logger: AccessLogger, hits: Hits) -> Router {
    let people = {
        let hits = hits.clone();
        move || {
            let hits = hits.clone();
            async move {
                hits.0.fetch_add(1, Ordering::SeqCst);
                "people"
            }
        }
    };
    let services = move || {
        let hits = hits.clone();
        async move {
            hits.0.fetch_add(1, Ordering::SeqCst);
            "services"
        }
    };

    Router::new()
        .route("/", get(|| async { "home" }))
        .route("/people", get(people))
        .route("/services", get(services))
        .route("/stream", get(stream))
        .layer(middleware::from_fn_with_state(logger, access_log::layer))
        .layer(Extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 51234)))))
}

pub fn create_test_server(logger: AccessLogger) -> (TestServer, Hits) {
    let hits = Hits::default();
    let server = TestServer::new(create_test_app(logger, hits.clone())).unwrap();
    (server, hits)
}
