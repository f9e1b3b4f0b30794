pub mod acl;
pub mod dto;
pub mod files;
pub mod profiles;
pub mod reports;
pub mod response;
pub mod roles;
mod router;
pub mod search;
pub mod spaces;
pub mod timeline;
pub mod validation;

pub use router::{AppState, create_router};
