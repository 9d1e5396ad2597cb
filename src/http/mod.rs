//! HTTP server module providing the JSON:API REST surface.
//!
//! This module is only available when the `http-server` feature is enabled.
//!
//! # Architecture
//!
//! - `router`: Route definitions and middleware setup
//! - `handlers`: Request handlers delegating to the service layer
//! - `dto`: JSON:API request and response documents
//! - `error`: Error documents and status mapping
//! - `schema`: OpenAPI description served at `/api/schema/`
//! - `state`: Shared application state
//! - `shutdown`: Signals that stop the server gracefully

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod shutdown;
pub mod state;

pub use error::AppError;
pub use router::create_router;
pub use shutdown::shutdown_signal;
pub use state::AppState;
