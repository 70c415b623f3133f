use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use axum::Router;
use toucan::{DispatchConfig, Event, EventDispatcher, Orientation};

// A stand-in for the PHP collector, recording each request it sees.
#[derive(Clone)]
struct Collector {
	requests: Arc<Mutex<Vec<String>>>,
	user_agents: Arc<Mutex<Vec<String>>>,
	connections: Arc<Mutex<Vec<String>>>,
	tap_status: StatusCode,
}

impl Collector {
	fn record(&self, path: &str, query: Option<String>, headers: &HeaderMap) {
		let query = query.unwrap_or_default();
		self.requests.lock().unwrap().push(format!("{path}?{query}"));

		let value = |name: header::HeaderName| {
			headers
				.get(name)
				.and_then(|v| v.to_str().ok())
				.unwrap_or_default()
				.to_string()
		};
		self.user_agents.lock().unwrap().push(value(header::USER_AGENT));
		self.connections.lock().unwrap().push(value(header::CONNECTION));
	}

	fn requests(&self) -> Vec<String> {
		self.requests.lock().unwrap().clone()
	}
}

async fn head_motion(State(collector): State<Collector>, headers: HeaderMap, RawQuery(query): RawQuery) -> StatusCode {
	collector.record("/logHeadMotion.php", query, &headers);
	StatusCode::OK
}

async fn tap(State(collector): State<Collector>, headers: HeaderMap, RawQuery(query): RawQuery) -> StatusCode {
	collector.record("/logTapEvent.php", query, &headers);
	collector.tap_status
}

async fn serve(tap_status: StatusCode) -> anyhow::Result<(SocketAddr, Collector)> {
	let collector = Collector {
		requests: Default::default(),
		user_agents: Default::default(),
		connections: Default::default(),
		tap_status,
	};

	let app = Router::new()
		.route("/logHeadMotion.php", get(head_motion))
		.route("/logTapEvent.php", get(tap))
		.with_state(collector.clone());

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
	let addr = listener.local_addr()?;

	tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});

	Ok((addr, collector))
}

fn dispatcher(addr: SocketAddr) -> EventDispatcher {
	EventDispatcher::new(DispatchConfig {
		endpoint: format!("http://{addr}"),
		request_timeout: Some(Duration::from_secs(5)),
		..Default::default()
	})
	.unwrap()
}

#[tokio::test]
async fn test_delivers_batch() -> anyhow::Result<()> {
	let (addr, collector) = serve(StatusCode::OK).await?;

	let events = vec![
		Event::head_motion(100, &Orientation::new(0.1, 0.2, 0.3)),
		Event::tap(50),
	];
	let delivered = dispatcher(addr).dispatch(events, |_| {}).join().await;

	assert!(delivered);
	assert_eq!(
		collector.requests(),
		vec![
			"/logHeadMotion.php?timestamp=100&x=0.1&y=0.2&z=0.3",
			"/logTapEvent.php?timestamp=50",
		]
	);
	assert_eq!(*collector.user_agents.lock().unwrap(), vec!["Test", "Test"]);
	assert_eq!(*collector.connections.lock().unwrap(), vec!["close", "close"]);

	Ok(())
}

#[tokio::test]
async fn test_error_status_stops_batch() -> anyhow::Result<()> {
	let (addr, collector) = serve(StatusCode::INTERNAL_SERVER_ERROR).await?;

	let events = vec![
		Event::tap(1),
		Event::head_motion(2, &Orientation::default()),
		Event::tap(3),
	];

	let (tx, rx) = tokio::sync::oneshot::channel();
	dispatcher(addr).dispatch(events, move |ok| {
		let _ = tx.send(ok);
	});

	assert!(!rx.await?);
	assert_eq!(collector.requests(), vec!["/logTapEvent.php?timestamp=1"]);

	Ok(())
}

// Only 200 counts; any other success code is a failure.
#[tokio::test]
async fn test_no_content_is_failure() -> anyhow::Result<()> {
	let (addr, collector) = serve(StatusCode::NO_CONTENT).await?;

	let delivered = dispatcher(addr).dispatch(vec![Event::tap(9)], |_| {}).join().await;

	assert!(!delivered);
	assert_eq!(collector.requests().len(), 1);

	Ok(())
}

#[tokio::test]
async fn test_connection_refused_is_failure() -> anyhow::Result<()> {
	// Grab a free port, then close it again.
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
	let addr = listener.local_addr()?;
	drop(listener);

	let delivered = dispatcher(addr).dispatch(vec![Event::tap(1), Event::tap(2)], |_| {}).join().await;
	assert!(!delivered);

	Ok(())
}
