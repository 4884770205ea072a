pub mod backdrop;
pub mod quote;

use async_trait::async_trait;
use futures::FutureExt;
use std::cell::Cell;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

pub use backdrop::{BackdropFetcher, Picture};
pub use quote::{QuoteFetcher, QuoteRecord};

/// Outcome of a single acquisition. Never retried, never cached.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Every way an acquisition can fail. Widgets treat all of them the same way:
/// log and leave their slots alone.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response body: {0}")]
    Malformed(String),

    #[error("response contained no items")]
    EmptyCollection,

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("acquisition task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug)]
pub struct FeedMessage {
    pub widget_id: String,
    pub result: FetchResult<FeedData>,
}

#[derive(Debug, Clone)]
pub enum FeedData {
    Backdrop(Arc<Picture>),
    Quote(QuoteRecord),
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self) -> FetchResult<FeedData>;
}

/// Starts acquisitions on the runtime and hands their completions back to the
/// UI thread, which is the only place widget callbacks run.
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<FeedMessage>,
    rx: mpsc::UnboundedReceiver<FeedMessage>,
    in_flight: Cell<usize>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            in_flight: Cell::new(0),
        }
    }

    /// Spawns exactly one acquisition for `widget_id`. Returns immediately.
    pub fn spawn(&self, widget_id: &str, fetcher: Arc<dyn FeedFetcher>) {
        let tx = self.tx.clone();
        let widget_id = widget_id.to_string();
        self.in_flight.set(self.in_flight.get() + 1);

        tokio::spawn(async move {
            let result = match AssertUnwindSafe(fetcher.fetch()).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(FetchError::Aborted(panic_message(panic.as_ref()))),
            };
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(FeedMessage { widget_id, result });
        });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    pub fn try_next(&mut self) -> Option<FeedMessage> {
        let message = self.rx.try_recv().ok()?;
        self.settle_one();
        Some(message)
    }

    /// Waits for the next completion. `None` once nothing is in flight.
    pub async fn next(&mut self) -> Option<FeedMessage> {
        if self.in_flight.get() == 0 {
            return None;
        }
        let message = self.rx.recv().await?;
        self.settle_one();
        Some(message)
    }

    fn settle_one(&self) {
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Hands out one canned result, then fails every later call.
    pub struct StubFetcher {
        result: Mutex<Option<FetchResult<FeedData>>>,
    }

    impl StubFetcher {
        pub fn ok(data: FeedData) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(Ok(data))),
            })
        }

        pub fn err(error: FetchError) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(Err(error))),
            })
        }
    }

    #[async_trait]
    impl FeedFetcher for StubFetcher {
        async fn fetch(&self) -> FetchResult<FeedData> {
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(FetchError::Aborted("stub already used".into())))
        }
    }

    /// Serves one canned HTTP response on a loopback port and returns its base URL.
    pub async fn serve_once(status: &str, content_type: &str, body: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        );

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    /// A loopback URL nothing is listening on.
    pub async fn refused_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    pub struct PanickingFetcher;

    #[async_trait]
    impl FeedFetcher for PanickingFetcher {
        async fn fetch(&self) -> FetchResult<FeedData> {
            panic!("fetcher blew up")
        }
    }
}
