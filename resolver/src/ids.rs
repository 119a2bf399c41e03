//! Typed identifiers for resolver tables
//!
//! Each ID is a lightweight wrapper around a u32 index into the table that
//! owns the item, so a `ScopeId` can never be used where a `DeclId` is meant.

use serde::Serialize;
use std::fmt;

macro_rules! define_id_type {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn as_raw(self) -> u32 {
                self.0
            }

            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this ID is valid (not the sentinel value)
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }

            pub const fn invalid() -> Self {
                Self(u32::MAX)
            }

            /// ID for the next item pushed onto a table of `len` items
            pub(crate) fn for_len(len: usize) -> Self {
                Self(u32::try_from(len).unwrap_or(u32::MAX))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(<invalid>)", stringify!($name))
                }
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self::from_raw(raw)
            }
        }
    };
}

define_id_type!(
    /// Lexical scope in a unit's scope tree
    ScopeId
);

define_id_type!(
    /// Declaration site
    DeclId
);

define_id_type!(
    /// Identifier use site
    RefId
);

define_id_type!(
    /// Struct type literal (named or anonymous)
    StructTypeId
);
