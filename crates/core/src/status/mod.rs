//! Status surface: the ordered feed of job state transitions.
//!
//! The orchestrator publishes every transition exactly once, in order, to a
//! single [`StatusSink`]. Sinks never influence orchestration.

mod sink;
mod types;

pub use sink::{BroadcastSink, ChannelSink, FanoutSink, LogSink, StatusSink};
pub use types::{StatusDetail, StatusEvent};
