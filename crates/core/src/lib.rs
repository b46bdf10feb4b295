//! Domain types and pure logic for the ParseHub run tracker.
//!
//! Nothing in this crate performs I/O. The wire models, the completion
//! detector and the HTTP status classification live here so that both the
//! network client and the tracker can share them, and so they can be
//! tested without a runtime.

pub mod completion;
pub mod error;
pub mod http_status;
pub mod models;
pub mod params;
pub mod run_status;
pub mod types;

pub use completion::is_complete;
pub use error::CoreError;
pub use models::{ProjectResponse, ProjectsResponse, RunResponse};
pub use params::ProjectRunParams;
pub use run_status::RunStatus;
