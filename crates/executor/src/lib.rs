//! Job executor for tabtester.
//!
//! An executor works one job against one borrowed browser tab. While a job
//! runs, lifecycle and diagnostic events fan out on a broadcast bus:
//!
//! - `log`: page console output
//! - `test-pass` / `test-failed`: one per test, in list order
//! - `page-load-failure`: the primary document could not load (terminal)
//! - `network-failed` / `network-received`: request diagnostics
//! - `done`: the terminal signal, fired exactly once per job
//!
//! The executor reconciles the tab's independent event streams (readiness,
//! network, console) into a single completion latch; tests only run once the
//! document is ready, strictly one at a time.

pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod script;

pub use config::ExecutorConfig;
pub use error::JobError;
pub use events::{event_bus, EventBus, ExecEvent};
pub use executor::{JobExecutor, Phase, TESTER_HEADER};
pub use script::wrap_async;
