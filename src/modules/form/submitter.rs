//! Pluggable backends that receive contact form submissions.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::platform::Clock;

/// Named field values of a submitted form, serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormSubmission {
    fields: BTreeMap<String, String>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("submission timed out after {0:?}")]
    Timeout(Duration),
    #[error("endpoint answered with status {0}")]
    Status(u16),
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Backend that accepts a submission.
#[async_trait]
pub trait FormSubmitter: Send + Sync {
    fn name(&self) -> &'static str;
    async fn submit(&self, submission: FormSubmission) -> Result<(), SubmitError>;
}

/// Completes once the page clock reaches a deadline.
///
/// Executors re-poll it; it wakes itself while pending so it also makes
/// progress under a runtime that waits on wakers.
pub struct ClockDelay {
    clock: Arc<dyn Clock>,
    until: Duration,
}

impl ClockDelay {
    pub fn new(clock: Arc<dyn Clock>, delay: Duration) -> Self {
        let until = clock.now().saturating_add(delay);
        Self { clock, until }
    }
}

impl Future for ClockDelay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.now() >= self.until {
            Poll::Ready(())
        } else {
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Stand-in backend for demos and tests: waits a fixed time against the
/// page clock, then succeeds or fails as configured.
pub struct SimulatedSubmitter {
    clock: Arc<dyn Clock>,
    delay: Duration,
    failure: Option<String>,
    received: Mutex<Vec<FormSubmission>>,
}

impl SimulatedSubmitter {
    pub fn new(clock: Arc<dyn Clock>, delay: Duration) -> Self {
        Self {
            clock,
            delay,
            failure: None,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Make every submission fail with `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    fn record(&self, submission: FormSubmission) {
        match self.received.lock() {
            Ok(mut received) => received.push(submission),
            Err(poisoned) => poisoned.into_inner().push(submission),
        }
    }

    pub fn received(&self) -> Vec<FormSubmission> {
        match self.received.lock() {
            Ok(received) => received.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl FormSubmitter for SimulatedSubmitter {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn submit(&self, submission: FormSubmission) -> Result<(), SubmitError> {
        self.record(submission);
        ClockDelay::new(self.clock.clone(), self.delay).await;
        match &self.failure {
            Some(reason) => Err(SubmitError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

/// POSTs submissions as JSON. Must be driven inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpSubmitter {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, endpoint, timeout))
    }

    pub fn with_client(client: reqwest::Client, endpoint: Url, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl FormSubmitter for HttpSubmitter {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn submit(&self, submission: FormSubmission) -> Result<(), SubmitError> {
        let request = self
            .client
            .post(self.endpoint.clone())
            .json(&submission)
            .send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| SubmitError::Timeout(self.timeout))??;

        let status = response.status();
        if !status.is_success() {
            log::debug!("contact endpoint {} answered {}", self.endpoint, status);
            return Err(SubmitError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualClock;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn submission() -> FormSubmission {
        let mut submission = FormSubmission::new();
        submission.insert("name", "Ada");
        submission.insert("email", "ada@example.com");
        submission
    }

    #[test]
    fn serializes_as_flat_object() {
        let json = serde_json::to_value(submission()).unwrap();
        assert_eq!(json, serde_json::json!({ "email": "ada@example.com", "name": "Ada" }));
    }

    #[tokio::test]
    async fn simulated_submitter_records_and_reports_outcome() {
        let clock = Arc::new(ManualClock::new());
        let ok = SimulatedSubmitter::new(clock.clone(), Duration::ZERO);
        ok.submit(submission()).await.unwrap();
        assert_eq!(ok.received().len(), 1);

        let failing = SimulatedSubmitter::new(clock, Duration::ZERO).failing("mailbox full");
        let err = failing.submit(submission()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected(reason) if reason == "mailbox full"));
    }

    #[test]
    fn clock_delay_waits_for_page_time() {
        let clock = Arc::new(ManualClock::new());
        let mut delay = Box::pin(ClockDelay::new(clock.clone(), Duration::from_millis(2000)));
        let mut cx = Context::from_waker(std::task::Waker::noop());

        assert!(delay.as_mut().poll(&mut cx).is_pending());
        clock.advance(Duration::from_millis(1999));
        assert!(delay.as_mut().poll(&mut cx).is_pending());
        clock.advance(Duration::from_millis(1));
        assert!(delay.as_mut().poll(&mut cx).is_ready());
    }

    async fn one_shot_server(response: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        Url::parse(&format!("http://{addr}/contact")).unwrap()
    }

    #[tokio::test]
    async fn http_submitter_accepts_2xx() {
        let url = one_shot_server(
            "HTTP/1.1 204 No Content\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let submitter = HttpSubmitter::new(url, Duration::from_secs(5)).unwrap();
        submitter.submit(submission()).await.unwrap();
    }

    #[tokio::test]
    async fn http_submitter_maps_error_status() {
        let url = one_shot_server(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let submitter = HttpSubmitter::new(url, Duration::from_secs(5)).unwrap();
        let err = submitter.submit(submission()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Status(503)));
    }
}
