//! JSON HTTP API for screening and profiling.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! sc-screen serve
//!
//! # Custom port and configuration
//! sc-screen serve --port 3000 --config my_vocab.json
//!
//! # Bind to all interfaces
//! sc-screen serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /api/config` - Active configuration name, version, fingerprint and weights
//! - `POST /api/screen` - `{"records": [...], "full_audit": false}` to `{results, summary}`
//! - `POST /api/profile` - A table sample to its relevance map

pub mod server;
