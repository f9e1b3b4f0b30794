//! # Huddle
//!
//! The access-control core of a self-hostable collaboration platform:
//! spaces, membership, roles, per-role capability ACLs, and the HTTP
//! surface around them. Usable as a standalone binary or as a library.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use huddle::server::{AppState, create_router};
//! use huddle::store::SqliteStore;
//!
//! let store = SqliteStore::new("./data/huddle.db".as_ref()).unwrap();
//! store.initialize().unwrap();
//! // Build an AppState with an IdP resolver and a notifier, then:
//! // let router = create_router(state);
//! ```

pub mod acl;
pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod notify;
pub mod roles;
pub mod server;
pub mod spaces;
pub mod store;
pub mod types;
