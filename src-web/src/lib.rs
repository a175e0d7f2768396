//! Web dashboard for the contact intake.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
