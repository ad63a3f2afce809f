//! review-cloud - merchant review management backend
//!
//! Long-running service that:
//! - Mirrors the shop's product catalog (bulk sync + platform webhooks)
//! - Moderates customer reviews (CRUD, bulk transitions, CSV import/export)
//! - Serves the public storefront widget API (list/summary/submit/vote)
//! - Maintains denormalized per-product review stats
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── api/           # HTTP routes and handlers
//! ├── auth.rs        # Shop JWT authentication
//! ├── catalog.rs     # Host platform catalog client
//! ├── config.rs      # Environment configuration
//! ├── csv.rs         # CSV row parsing/quoting
//! ├── db/            # Pool setup, row types, store functions
//! ├── error.rs       # Error envelope
//! └── state.rs       # Shared application state
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod csv;
pub mod db;
pub mod error;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
