//! # toucan: client-side telemetry for VR playback
//!
//! Two independent pieces, both fire-and-forget from the point of view of the playback loop:
//! - [EventDispatcher]: delivers head motion and tap [Event]s to a remote collector over HTTP,
//!   off the render thread, reporting one boolean per batch.
//! - [BandwidthSampler]: a [TransferListener] that appends cumulative bytes consumed to a
//!   per-session CSV log.
//!
//! They share no state. Configuration lives in [DispatchConfig] and [SamplerConfig], and [Log]
//! sets up diagnostic logging.

mod bandwidth;
mod clock;
mod config;
mod dispatch;
mod error;
mod event;
mod id;
mod log;

pub use bandwidth::*;
pub use clock::*;
pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use event::*;
pub use id::*;
pub use log::*;
