#![warn(clippy::unwrap_used)]

pub mod billing_rest;
pub mod email_rest;
pub mod rest;
pub mod server;

pub use server::ApiServer;
