use anyhow::Context;
use clap::Subcommand;
use tokio::sync::oneshot;
use toucan::{DispatchConfig, Event, EventDispatcher, Orientation};

#[derive(Subcommand, Clone)]
pub enum EventArgs {
	/// A head motion sample with the given orientation, in degrees.
	Head {
		/// Capture time in milliseconds. Defaults to now.
		#[arg(long)]
		timestamp: Option<u64>,

		#[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
		pitch: f32,

		#[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
		yaw: f32,

		#[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
		roll: f32,
	},
	/// A tap on the headset.
	Tap {
		/// Capture time in milliseconds. Defaults to now.
		#[arg(long)]
		timestamp: Option<u64>,
	},
}

impl EventArgs {
	fn into_event(self) -> Event {
		match self {
			Self::Head {
				timestamp,
				pitch,
				yaw,
				roll,
			} => {
				let orientation = Orientation::new(pitch, yaw, roll);
				match timestamp {
					Some(timestamp) => Event::head_motion(timestamp, &orientation),
					None => Event::capture_head_motion(&orientation),
				}
			}
			Self::Tap { timestamp } => timestamp.map(Event::tap).unwrap_or_else(Event::capture_tap),
		}
	}
}

pub async fn push(config: DispatchConfig, event: EventArgs) -> anyhow::Result<()> {
	let event = event.into_event();
	let dispatcher = EventDispatcher::new(config).context("failed to build dispatcher")?;

	tracing::info!(endpoint = %dispatcher.endpoint(), ?event, "pushing event");

	let (tx, rx) = oneshot::channel();
	dispatcher.dispatch(vec![event], move |delivered| {
		let _ = tx.send(delivered);
	});

	if !rx.await.context("dispatch task dropped")? {
		anyhow::bail!("event was not delivered to {}", dispatcher.endpoint());
	}

	tracing::info!("event delivered");
	Ok(())
}
