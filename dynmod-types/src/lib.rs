//! Runtime type descriptors and tagged values for dynmod.
//!
//! Models declared at runtime have no Rust struct behind them. This crate
//! provides the pieces used to describe and hold them instead:
//! - [`TypeRef`]: a member type (primitive, optional, sequence, map or nested composite)
//! - [`CompositeType`]: an ordered, named, tagged member list built from a schema
//! - [`Value`]: a tagged value that can occupy any member slot
//! - [`Record`]: one instance of a `CompositeType`, one slot per member
//!
//! Conversion between a `Value` and a slot's `TypeRef` follows the
//! "directly convertible" rules documented on [`TypeRef::convert`].

mod record;
mod types;
mod value;

pub use record::Record;
pub use types::{CompositeType, Member, TypeRef};
pub use value::Value;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting or addressing values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("cannot convert {from} to {to}")]
    NotConvertible { from: String, to: String },

    #[error("no member named {0}")]
    UnknownMember(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
