//! Document store and admin backend: influencers, products, partners,
//! posts and users, plus the snapshot loader the dashboard reads from.
//!
//! Data stored in DashMap; swap for the hosted document database in production.

pub mod auth;
pub mod handlers;
pub mod models;
pub mod router;
pub mod snapshot;
pub mod store;

pub use auth::{AdminUser, AuthService};
pub use handlers::ManagementState;
pub use router::management_router;
pub use snapshot::{DocumentSource, Snapshot, SnapshotLoader};
pub use store::ManagementStore;
