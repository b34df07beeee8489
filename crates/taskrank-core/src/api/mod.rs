//! Scoring service clients.
//!
//! [`ScoringApi`] is the seam the action controller talks to. Two
//! implementations ship with the crate: [`HttpScoringClient`] for the
//! remote service and [`LocalScoringService`] for offline use.

pub mod http;
pub mod local;
pub mod traits;

pub use http::HttpScoringClient;
pub use local::LocalScoringService;
pub use traits::{ScoringApi, SubmissionPayload};
