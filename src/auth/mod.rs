pub mod cache;
pub mod idp;
pub mod middleware;
pub mod resolver;

pub use cache::PrincipalCache;
pub use idp::{HttpIdp, IdpClient, IdpIdentity};
pub use middleware::RequireAuth;
pub use resolver::PrincipalResolver;
