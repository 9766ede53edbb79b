//! venue_sim: simulated order venue core.
//!
//! An order engine actor owns a per-symbol order store and answers place,
//! cancel and query requests, each through its own reply slot. Around it sit a
//! session-facing gateway that builds execution reports, a mock client flow,
//! a JSONL recorder and Prometheus metrics.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod ids;
pub mod metrics;
pub mod posttrade;
pub mod recorder;
pub mod report;
pub mod store;

pub use engine::{Engine, EngineCfg, EngineHandle};
pub use error::{Error, Result};
