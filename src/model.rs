//! Mirrored authorizer model: identifiers, secrets, profiles, and records.

pub mod id;
pub mod profile;
pub mod record;
pub mod secret;

pub use id::*;
pub use profile::*;
pub use record::*;
pub use secret::*;
