pub mod address;
pub mod label;

pub use address::*;
pub use label::*;

/// Value in the smallest native unit (10^-18 of one token).
pub type Amount = u128;

/// Seconds since the UNIX epoch, as supplied by the execution environment.
pub type Timestamp = u64;

/// Smallest units per whole native token.
pub const UNITS_PER_TOKEN: Amount = 1_000_000_000_000_000_000;
