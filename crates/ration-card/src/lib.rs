//! Ration card intake, administrative adjudication, and collection-token
//! distribution.
//!
//! Identity, document storage, the fraud model, and SMS delivery live outside
//! this crate; they are reached through the ports declared in [`users`],
//! [`cards::verification`], and [`tokens::transport`].

pub mod access;
pub mod api;
pub mod cards;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod tokens;
pub mod users;

pub use access::{AdminCapabilities, CitizenCapabilities, PortalPorts, Principal, RationPortal};
pub use users::Role;
