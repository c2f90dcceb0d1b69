// SPDX-License-Identifier: CC0-1.0

//! Typed PSBT records.
//!
//! A record is a single key-value pair scoped to one of the three PSBT maps. Each scope owns its
//! own closed key-type registry; a key type that is meaningful in one scope is plain data in
//! another. Key types outside a scope's registry are preserved verbatim as `Unknown` records and
//! survive serialization and combining untouched.

mod global;
mod input;
mod output;

#[rustfmt::skip]                // Keep public re-exports separate.
#[doc(inline)]
pub use self::{global::GlobalRecord, input::InputRecord, output::OutputRecord};
