//! The two-level ACL: a global table keyed by role and a per-space table
//! keyed by (role, space). Missing rows for existing roles are repaired
//! lazily on read; that repair path is the only reconciliation mechanism.

pub mod global;
pub mod space;
