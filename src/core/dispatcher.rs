// Notification dispatcher with a bounded queue and capped concurrency

use crate::core::transport::NotificationTransport;
use crate::models::notification::NotificationPayload;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use uuid::Uuid;

// ==============================================================================
// Configuration
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    pub endpoint: Option<String>, // No endpoint means notifications are skipped
    pub max_in_flight: usize,     // Requests on the wire at once (default: 2)
    pub queue_capacity: usize,    // Pending notifications before new ones are dropped (default: 8)
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_in_flight: 2,
            queue_capacity: 8,
        }
    }
}

// ==============================================================================
// Metrics
// ==============================================================================

#[derive(Debug, Default)]
struct Counters {
    sent: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    skipped_unconfigured: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DispatchMetrics {
        DispatchMetrics {
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            skipped_unconfigured: self.skipped_unconfigured.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchMetrics {
    pub sent: u64,
    pub failed: u64,
    pub dropped: u64,
    pub skipped_unconfigured: u64,
}

// ==============================================================================
// Dispatch Job
// ==============================================================================

#[derive(Debug, Clone)]
struct DispatchJob {
    id: Uuid,
    payload: NotificationPayload,
}

// ==============================================================================
// Dispatcher
// ==============================================================================

/// Fire-and-forget delivery of notifications
///
/// [`dispatch`](Self::dispatch) never blocks. Jobs go through a bounded queue to a worker task that
/// starts each request as a detached task, with at most `max_in_flight` requests running at once.
/// Requests start in queue order; they may complete in any order. Failures are logged and
/// counted, never retried and never returned to the caller.
pub struct Dispatcher {
    endpoint: Option<Arc<str>>,
    sender: mpsc::Sender<DispatchJob>,
    worker: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Start the dispatcher worker on the given runtime
    pub fn spawn(
        config: DispatcherConfig,
        transport: Arc<dyn NotificationTransport>,
        runtime: &tokio::runtime::Handle,
    ) -> Self {
        let max_in_flight = config.max_in_flight.max(1);
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let endpoint: Option<Arc<str>> = config.endpoint.map(Arc::from);
        let counters = Arc::new(Counters::default());

        if endpoint.is_none() {
            log::warn!("API endpoint is not set; notifications will be skipped");
        }

        let worker = runtime.spawn(Self::run_worker(
            receiver,
            endpoint.clone(),
            transport,
            Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight as u32,
            counters.clone(),
        ));

        Self {
            endpoint,
            sender,
            worker,
            counters,
        }
    }

    /// Hand a notification to the background worker
    ///
    /// Returns immediately. Without a configured endpoint the notification is reported and
    /// skipped. When the queue is full it is dropped.
    pub fn dispatch(&self, payload: NotificationPayload) {
        if self.endpoint.is_none() {
            log::warn!("API endpoint is not set; skipping notification");
            self.counters
                .skipped_unconfigured
                .fetch_add(1, Ordering::Relaxed);
            return;
        }

        let job = DispatchJob {
            id: Uuid::new_v4(),
            payload,
        };
        let id = job.id;

        match self.sender.try_send(job) {
            Ok(()) => log::debug!("Queued notification {}", id),
            Err(TrySendError::Full(_)) => {
                log::warn!("Dispatch queue is full; dropping notification {}", id);
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Closed(_)) => {
                log::error!("Dispatcher worker has stopped; dropping notification {}", id);
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn metrics(&self) -> DispatchMetrics {
        self.counters.snapshot()
    }

    /// Stop accepting notifications and wait for queued and in-flight ones to finish
    pub async fn shutdown(self) -> DispatchMetrics {
        let Self {
            sender,
            worker,
            counters,
            ..
        } = self;
        drop(sender);

        if let Err(e) = worker.await {
            log::error!("Dispatcher worker panicked: {}", e);
        }

        counters.snapshot()
    }

    /// Background task draining the queue
    async fn run_worker(
        mut receiver: mpsc::Receiver<DispatchJob>,
        endpoint: Option<Arc<str>>,
        transport: Arc<dyn NotificationTransport>,
        permits: Arc<Semaphore>,
        max_in_flight: u32,
        counters: Arc<Counters>,
    ) {
        let Some(endpoint) = endpoint else {
            // Nothing is ever queued without an endpoint
            while receiver.recv().await.is_some() {}
            return;
        };

        while let Some(job) = receiver.recv().await {
            let permit = match permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let endpoint = endpoint.clone();
            let transport = transport.clone();
            let counters = counters.clone();

            tokio::spawn(async move {
                let _permit = permit;
                Self::deliver(job, &endpoint, transport.as_ref(), &counters).await;
            });
        }

        // Queue closed: wait for in-flight requests by taking every permit back
        if permits.acquire_many(max_in_flight).await.is_err() {
            log::warn!("Dispatch permits closed before in-flight requests finished");
        }
    }

    async fn deliver(
        job: DispatchJob,
        endpoint: &str,
        transport: &dyn NotificationTransport,
        counters: &Counters,
    ) {
        match transport.send(endpoint, &job.payload).await {
            Ok(response) => {
                counters.sent.fetch_add(1, Ordering::Relaxed);
                log::info!(
                    "Notification {} delivered: {}, {}",
                    job.id,
                    response.status,
                    response.body
                );
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                log::error!("Failed to deliver notification {}: {}", job.id, e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::transport::TransportResponse;
    use crate::models::notification::{DispatchError, DispatchResult, PayloadTemplate};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Records every request; optionally fails or waits for a release signal first
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub requests: Mutex<Vec<(String, NotificationPayload)>>,
        pub fail: bool,
        pub hold: Option<Arc<Notify>>,
    }

    impl RecordingTransport {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NotificationTransport for RecordingTransport {
        async fn send(
            &self,
            endpoint: &str,
            payload: &NotificationPayload,
        ) -> DispatchResult<TransportResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((endpoint.to_string(), payload.clone()));

            if let Some(hold) = &self.hold {
                hold.notified().await;
            }

            if self.fail {
                return Err(DispatchError::Transport("connection refused".to_string()));
            }
            Ok(TransportResponse {
                status: 200,
                body: "{}".to_string(),
            })
        }
    }

    fn config(endpoint: Option<&str>) -> DispatcherConfig {
        DispatcherConfig {
            endpoint: endpoint.map(str::to_string),
            ..DispatcherConfig::default()
        }
    }

    fn payload(seconds: i64) -> NotificationPayload {
        PayloadTemplate::default().stamp(Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap())
    }

    #[tokio::test]
    async fn test_delivers_in_background() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::spawn(
            config(Some("http://svc/notify")),
            transport.clone(),
            &tokio::runtime::Handle::current(),
        );
        assert!(dispatcher.is_configured());

        dispatcher.dispatch(payload(0));
        dispatcher.dispatch(payload(5));
        let metrics = dispatcher.shutdown().await;

        assert_eq!(metrics.sent, 2);
        assert_eq!(metrics.failed, 0);
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "http://svc/notify");
        assert_eq!(requests[0].1, payload(0));
    }

    #[tokio::test]
    async fn test_missing_endpoint_makes_no_requests() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::spawn(
            config(None),
            transport.clone(),
            &tokio::runtime::Handle::current(),
        );
        assert!(!dispatcher.is_configured());

        dispatcher.dispatch(payload(0));
        let metrics = dispatcher.shutdown().await;

        assert_eq!(transport.request_count(), 0);
        assert_eq!(metrics.skipped_unconfigured, 1);
        assert_eq!(metrics.sent, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_swallowed() {
        let transport = Arc::new(RecordingTransport::failing());
        let dispatcher = Dispatcher::spawn(
            config(Some("http://svc/notify")),
            transport.clone(),
            &tokio::runtime::Handle::current(),
        );

        dispatcher.dispatch(payload(0));
        let metrics = dispatcher.shutdown().await;

        assert_eq!(transport.request_count(), 1);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.sent, 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_notifications() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::spawn(
            DispatcherConfig {
                endpoint: Some("http://svc/notify".to_string()),
                max_in_flight: 1,
                queue_capacity: 1,
            },
            transport.clone(),
            &tokio::runtime::Handle::current(),
        );

        // The current-thread test runtime does not run the worker until we await
        dispatcher.dispatch(payload(0));
        dispatcher.dispatch(payload(5));
        dispatcher.dispatch(payload(10));
        assert_eq!(dispatcher.metrics().dropped, 2);

        let metrics = dispatcher.shutdown().await;
        assert_eq!(metrics.sent, 1);
        assert_eq!(metrics.dropped, 2);
        assert_eq!(transport.requests.lock().unwrap()[0].1, payload(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_in_flight_requests_are_capped() {
        let hold = Arc::new(Notify::new());
        let transport = Arc::new(RecordingTransport {
            hold: Some(hold.clone()),
            ..RecordingTransport::default()
        });
        let dispatcher = Dispatcher::spawn(
            DispatcherConfig {
                endpoint: Some("http://svc/notify".to_string()),
                max_in_flight: 2,
                queue_capacity: 8,
            },
            transport.clone(),
            &tokio::runtime::Handle::current(),
        );

        for i in 0..4 {
            dispatcher.dispatch(payload(i * 5));
        }

        // Two requests start, the other two wait for a permit
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(transport.request_count(), 2);

        let finish = tokio::spawn(dispatcher.shutdown());
        for _ in 0..20 {
            hold.notify_waiters();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let metrics = finish.await.unwrap();
        assert_eq!(metrics.sent, 4);
        assert_eq!(transport.request_count(), 4);
    }
}
