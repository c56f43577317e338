//! Outbound user communication for the LCI dashboard.

pub mod email;

pub use email::{EmailKind, EmailService, LogMailer, Mailer, RenderedEmail};
