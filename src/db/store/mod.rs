//! Review-domain store operations
//!
//! Free async functions over `&SqlitePool`. Multi-statement writes use
//! explicit transactions; every admin-facing query is scoped by shop id.

pub mod product;
pub mod review;
pub mod settings;

/// Opaque row id for new records.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
