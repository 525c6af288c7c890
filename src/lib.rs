//! TCP connect latency probing: a paced prober, a streaming stats accumulator
//! and the adapters the `tcp-pinger` binary wires around them.
pub mod config;
pub mod interrupt;
pub mod metrics;
pub mod prober;
pub mod report;
pub mod scheduler;
pub mod stats;
pub mod util;
