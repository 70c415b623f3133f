use url::Url;

use crate::{clock, Result};

const HEAD_MOTION_PATH: &str = "/logHeadMotion.php";
const TAP_EVENT_PATH: &str = "/logTapEvent.php";

/// Head orientation angles as reported by the scene, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
	pub pitch: f32,
	pub yaw: f32,
	pub roll: f32,
}

impl Orientation {
	pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
		Self { pitch, yaw, roll }
	}
}

/// Anything that can report the current head orientation, typically the camera rig of the scene.
///
/// Read on the render thread, at the moment an event is captured.
pub trait OrientationSource {
	fn orientation(&self) -> Orientation;
}

impl OrientationSource for Orientation {
	fn orientation(&self) -> Orientation {
		*self
	}
}

impl<F: Fn() -> Orientation> OrientationSource for F {
	fn orientation(&self) -> Orientation {
		self()
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
	HeadMotion(Orientation),
	Tap,
}

/// One user interaction sample, destined for the remote collector.
///
/// Immutable once built. A head motion event carries the orientation read when it was constructed,
/// not when it is delivered; the scene has moved on by then.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
	/// Capture time in milliseconds.
	pub timestamp: u64,
	pub kind: EventKind,
}

impl Event {
	pub fn head_motion<S: OrientationSource + ?Sized>(timestamp: u64, source: &S) -> Self {
		Self {
			timestamp,
			kind: EventKind::HeadMotion(source.orientation()),
		}
	}

	pub fn tap(timestamp: u64) -> Self {
		Self {
			timestamp,
			kind: EventKind::Tap,
		}
	}

	/// Capture a head motion event stamped with the current wall-clock time.
	pub fn capture_head_motion<S: OrientationSource + ?Sized>(source: &S) -> Self {
		Self::head_motion(clock::wall_clock_millis(), source)
	}

	/// Capture a tap event stamped with the current wall-clock time.
	pub fn capture_tap() -> Self {
		Self::tap(clock::wall_clock_millis())
	}

	pub fn is_head_motion(&self) -> bool {
		matches!(self.kind, EventKind::HeadMotion(_))
	}

	/// Build the collector URL for this event.
	///
	/// `endpoint` is the collector base, e.g. `http://10.0.0.2`. A trailing slash is ignored.
	/// Angles use the shortest `Display` form of `f32`: `180` rather than `180.0`, and never an exponent.
	pub fn target(&self, endpoint: &str) -> Result<Url> {
		let endpoint = endpoint.strip_suffix('/').unwrap_or(endpoint);

		let target = match self.kind {
			EventKind::HeadMotion(o) => format!(
				"{endpoint}{HEAD_MOTION_PATH}?timestamp={}&x={}&y={}&z={}",
				self.timestamp, o.pitch, o.yaw, o.roll
			),
			EventKind::Tap => format!("{endpoint}{TAP_EVENT_PATH}?timestamp={}", self.timestamp),
		};

		Ok(Url::parse(&target)?)
	}
}
