//! Strongly-typed identifiers for ledger records
//!
//! Every collection assigns its own integer ids (`max + 1`), so the ids of
//! different collections overlap numerically. Newtype wrappers keep a
//! `HouseId` from being passed where a `ContractId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw store identifier
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns the identifier that follows the current maximum
            ///
            /// An empty collection starts at 1.
            pub fn next_after(max: Option<i64>) -> Self {
                Self(max.unwrap_or(0) + 1)
            }

            /// Returns the identifier prefix used in log output
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(raw.trim().parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(HouseId, "HSE");
define_id!(ReceiptId, "RCP");
define_id!(ContractId, "CON");
define_id!(PaymentId, "PAY");
define_id!(ResaleId, "RSL");
