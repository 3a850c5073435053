pub mod env;
pub mod types;
pub mod validator;

pub use env::*;
pub use types::*;
pub use validator::*;

/// Fields the store assigns; never accepted from clients.
pub const RESERVED_FIELDS: &[&str] = &["id", "created_at", "updated_at"];
