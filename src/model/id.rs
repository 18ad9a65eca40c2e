//! Directory identifiers.
//!
//! The directory hands out app ids as `wx`-prefixed ASCII tokens and public handles as
//! `gh_`-prefixed ones. Both travel inside query strings, JSON bodies, and store keys, so anything
//! outside `[A-Za-z0-9_-]` is rejected at the boundary rather than escaped later.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Shape constraints the directory imposes on one identifier kind.
#[derive(Clone, Copy, Debug)]
struct IdShape {
	kind: &'static str,
	prefix: &'static str,
	max_len: usize,
}
impl IdShape {
	fn check(self, view: &str) -> Result<(), IdentifierError> {
		let IdShape { kind, prefix, max_len } = self;

		if view.is_empty() {
			return Err(IdentifierError::Empty { kind });
		}
		if let Some(found) = view.chars().find(|&c| !is_token_char(c)) {
			return Err(IdentifierError::Character { kind, found });
		}
		if view.strip_prefix(prefix).is_none_or(str::is_empty) {
			return Err(IdentifierError::Prefix { kind, prefix });
		}
		if view.len() > max_len {
			return Err(IdentifierError::TooLong { kind, max: max_len });
		}

		Ok(())
	}
}

fn is_token_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
}

macro_rules! def_id {
	($(#[$meta:meta])* $name:ident => $shape:expr) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			const SHAPE: IdShape = $shape;

			/// Validates and wraps a raw identifier.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				Self::SHAPE.check(&value)?;

				Ok(Self(value))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", stringify!($name), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Reason an identifier was refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("The {kind} is empty.")]
	Empty {
		/// Identifier kind.
		kind: &'static str,
	},
	/// A character outside `[A-Za-z0-9_-]` was found.
	#[error("The {kind} contains {found:?}; only ASCII letters, digits, `_` and `-` are allowed.")]
	Character {
		/// Identifier kind.
		kind: &'static str,
		/// First offending character.
		found: char,
	},
	/// The directory prefix is missing or nothing follows it.
	#[error("The {kind} must start with `{prefix}` followed by at least one character.")]
	Prefix {
		/// Identifier kind.
		kind: &'static str,
		/// Prefix the directory assigns to this kind.
		prefix: &'static str,
	},
	/// Longer than the directory ever issues.
	#[error("The {kind} exceeds {max} characters.")]
	TooLong {
		/// Identifier kind.
		kind: &'static str,
		/// Maximum accepted length.
		max: usize,
	},
}

def_id! {
	/// Directory identifier of an authorizer; the mirror's primary key.
	AppId => IdShape { kind: "app id", prefix: "wx", max_len: 32 }
}
def_id! {
	/// Public handle (original username) of an authorizer.
	Handle => IdShape { kind: "handle", prefix: "gh_", max_len: 32 }
}
def_id! {
	/// Integrator account that owns the directory.
	ComponentAppId => IdShape { kind: "component app id", prefix: "wx", max_len: 32 }
}
