//! Service layer for the foos-ladder service
//!
//! This module contains the application state, the HTTP API and the health
//! checks served alongside it.

pub mod app;
pub mod health;
pub mod routes;

pub use app::{AppState, ServiceError};
pub use health::{HealthCheck, HealthStatus};
pub use routes::{router, HttpServer, HttpServerConfig};
