//! ParseHub REST client with background run tracking.
//!
//! Submit a run with a completion handler and get a [`Run`] back
//! immediately; a watch task polls ParseHub until the run finishes and
//! then calls the handler exactly once. The pieces:
//!
//! - [`api`]: the reqwest client for the v2 endpoints.
//! - [`remote::RemoteClient`]: the seam the tracker talks through.
//! - [`registry::RunRegistry`]: runs known to this process.
//! - `watcher`: the per-run poll loop.
//! - [`handler`]: completion handlers and their dispatch.
//! - [`tracker::ParseHub`]: the caller-facing client tying it together.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod logging;
pub mod project;
pub mod registry;
pub mod remote;
pub mod retry;
pub mod run;
pub mod tracker;
mod watcher;

pub use api::ParseHubApi;
pub use config::TrackerConfig;
pub use error::ParseHubError;
pub use events::RunEvent;
pub use handler::{handler_fn, HandlerError, RunHandler};
pub use logging::{log_sink, LogLevel};
pub use project::Project;
pub use registry::RunRegistry;
pub use remote::RemoteClient;
pub use retry::RetryPolicy;
pub use run::{Run, WatchState};
pub use tracker::{ParseHub, ParseHubBuilder};

pub use hubwatch_core::{ProjectRunParams, RunResponse, RunStatus};
