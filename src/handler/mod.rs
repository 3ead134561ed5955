//! Request handler module
//!
//! Routes requests to the health check or the validation endpoint.

pub mod router;
pub mod validate;

// Re-export main entry point
pub use router::handle_request;
