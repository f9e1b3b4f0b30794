mod capability;
mod models;

pub use capability::{GlobalCapability, SpaceCapability};
pub use models::*;
