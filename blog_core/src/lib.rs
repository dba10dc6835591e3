//! The core of `simpleblog`: articles, their persistence, the HTML views
//! and the HTTP plumbing required to serve them.
pub mod articles;
pub mod configuration;
mod error;
pub mod http;
pub mod router;
pub mod routes;
pub mod server;
pub mod telemetry;
pub mod views;

pub use error::Error;
pub use router::{ApplicationState, build_application_state, run};
