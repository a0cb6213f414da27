//! Typed wrappers over the platform's REST endpoints, one module per
//! console screen. Each is a thin consumer: build the request, hand it to
//! the coordinator, decode what the backend returns, and invalidate the
//! endpoint prefix after mutations.

pub mod agents;
pub mod dashboard;
pub mod knowledge;
pub mod projects;
pub mod scheduler;
pub mod tools;
pub mod workflows;
