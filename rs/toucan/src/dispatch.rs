//! Off-thread delivery of interaction events to the collector.
//!
//! A batch handed to [EventDispatcher::dispatch] runs on a background task and reports a single
//! boolean to the completion callback. Events are sent one at a time, in order, and the batch
//! stops at the first event that fails: `false` means delivery stopped, not that every event was lost.
//! Nothing is retried; the caller decides whether to dispatch again.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use reqwest::{Client, StatusCode};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::Instrument;
use url::Url;

use crate::{DispatchConfig, Error, Event, Result};

/// Sends a single event request.
///
/// Keeps the batch logic independent of the HTTP client, so tests and embedders can swap it out.
pub trait Deliver: Send + Sync + 'static {
	fn deliver(&self, url: Url) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// `reqwest` implementation of [Deliver].
///
/// A GET request counts as delivered only when the collector answers exactly 200.
#[derive(Clone)]
pub struct HttpDelivery {
	client: Client,
	connect_timeout: Duration,
}

impl HttpDelivery {
	pub fn new(config: &DispatchConfig) -> Result<Self> {
		let mut headers = HeaderMap::new();
		headers.insert(CONNECTION, HeaderValue::from_static("close"));

		let mut builder = Client::builder()
			.user_agent(config.user_agent.as_str())
			.default_headers(headers)
			.connect_timeout(config.connect_timeout);

		if let Some(timeout) = config.request_timeout {
			builder = builder.timeout(timeout);
		}

		Ok(Self {
			client: builder.build()?,
			connect_timeout: config.connect_timeout,
		})
	}

	/// How long a request may wait for the TCP connection before it fails.
	pub fn connect_timeout(&self) -> Duration {
		self.connect_timeout
	}
}

impl Deliver for HttpDelivery {
	fn deliver(&self, url: Url) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			let response = self.client.get(url).send().await?;

			match response.status() {
				StatusCode::OK => Ok(()),
				status => Err(Error::Status(status.as_u16())),
			}
		})
	}
}

// Used when the dispatcher is created outside of any tokio runtime, e.g. on the render thread.
static RUNTIME: LazyLock<std::io::Result<Runtime>> = LazyLock::new(|| {
	tokio::runtime::Builder::new_multi_thread()
		.worker_threads(1)
		.thread_name("toucan-dispatch")
		.enable_all()
		.build()
});

fn background() -> Result<Handle> {
	match RUNTIME.as_ref() {
		Ok(runtime) => Ok(runtime.handle().clone()),
		Err(err) => Err(Error::Runtime(Arc::new(std::io::Error::new(err.kind(), err.to_string())))),
	}
}

/// Delivers batches of [Event]s without blocking the caller.
#[derive(Clone)]
pub struct EventDispatcher {
	delivery: Arc<dyn Deliver>,
	endpoint: String,
	runtime: Handle,
}

impl EventDispatcher {
	/// Create a dispatcher that sends events over HTTP.
	///
	/// Tasks run on the current tokio runtime if there is one, otherwise on a shared background runtime.
	pub fn new(config: DispatchConfig) -> Result<Self> {
		let delivery = HttpDelivery::new(&config)?;
		let runtime = match Handle::try_current() {
			Ok(handle) => handle,
			Err(_) => background()?,
		};

		Ok(Self::with_delivery(Arc::new(delivery), config.endpoint, runtime))
	}

	pub fn with_delivery(delivery: Arc<dyn Deliver>, endpoint: impl Into<String>, runtime: Handle) -> Self {
		Self {
			delivery,
			endpoint: endpoint.into(),
			runtime,
		}
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	/// Deliver `events` to the configured endpoint.
	pub fn dispatch<F>(&self, events: Vec<Event>, on_complete: F) -> DispatchHandle
	where
		F: FnOnce(bool) + Send + 'static,
	{
		self.dispatch_to(self.endpoint.clone(), events, on_complete)
	}

	/// Deliver `events` to `endpoint` on a background task and return immediately.
	///
	/// `on_complete` runs exactly once on the background task: `true` if every event was delivered,
	/// `false` as soon as one fails, in which case the remaining events are never attempted.
	/// An empty batch succeeds.
	pub fn dispatch_to<F>(&self, endpoint: impl Into<String>, events: Vec<Event>, on_complete: F) -> DispatchHandle
	where
		F: FnOnce(bool) + Send + 'static,
	{
		let delivery = self.delivery.clone();
		let endpoint = endpoint.into();
		let (cancel, cancelled) = oneshot::channel();

		let span = tracing::debug_span!("dispatch", events = events.len());

		let task = self.runtime.spawn(
			async move {
				let delivered = tokio::select! {
					biased;
					_ = wait_cancelled(cancelled) => {
						tracing::debug!("dispatch cancelled");
						false
					}
					delivered = deliver_batch(delivery.as_ref(), &endpoint, &events) => delivered,
				};

				on_complete(delivered);
				delivered
			}
			.instrument(span),
		);

		DispatchHandle {
			cancel: Some(cancel),
			task,
		}
	}
}

async fn deliver_batch(delivery: &dyn Deliver, endpoint: &str, events: &[Event]) -> bool {
	for (index, event) in events.iter().enumerate() {
		let res = match event.target(endpoint) {
			Ok(url) => delivery.deliver(url).await,
			Err(err) => Err(err),
		};

		if let Err(err) = res {
			tracing::debug!(index, remaining = events.len() - index - 1, %err, "event delivery failed");
			return false;
		}
	}

	true
}

// Resolves only on an explicit cancel; a dropped handle leaves the batch running.
async fn wait_cancelled(cancelled: oneshot::Receiver<()>) {
	if cancelled.await.is_err() {
		std::future::pending::<()>().await;
	}
}

/// A running batch.
///
/// Dropping the handle does not stop the batch.
pub struct DispatchHandle {
	cancel: Option<oneshot::Sender<()>>,
	task: JoinHandle<bool>,
}

impl DispatchHandle {
	/// Abandon any events not yet attempted.
	///
	/// Best effort: a request already in flight is dropped, and the callback receives `false`
	/// unless it has already run. A callback that already ran is never repeated.
	pub fn cancel(&mut self) {
		if let Some(cancel) = self.cancel.take() {
			let _ = cancel.send(());
		}
	}

	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}

	/// Wait for the batch and return the same result given to the callback.
	pub async fn join(self) -> bool {
		self.task.await.unwrap_or(false)
	}
}
