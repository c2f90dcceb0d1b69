// SPDX-License-Identifier: CC0-1.0

//! Partially Signed Bitcoin Transactions.
//!
//! Implementation of the Partially Signed Bitcoin Transaction Format as defined in [BIP-174]:
//! the typed key-value record model and its per-scope maps, bit-exact serialization, the
//! multi-party combine operation, per-input finalization, and extraction of the fully signed
//! transaction.
//!
//! This crate is the data plane only. It never touches private keys; callers obtain signatures
//! from their own signing infrastructure and insert them as
//! [`record::InputRecord::PartialSignature`] records.
//!
//! [BIP-174]: <https://github.com/bitcoin/bips/blob/master/bip-0174.mediawiki>

#![no_std]
// Experimental features we need.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// Coding conventions
#![warn(missing_docs)]

#[cfg(any(feature = "std", test))]
extern crate std;

#[macro_use]
extern crate alloc;

/// Re-export of the `rust-bitcoin` crate.
pub extern crate bitcoin;

mod consts;
mod error;
mod finalizer;
#[macro_use]
mod macros;
mod sighash_type;
mod version;

pub mod map;
pub mod psbt;
pub mod raw;
pub mod record;
pub mod serialize;
pub mod template;

use bitcoin::io;

#[rustfmt::skip]                // Keep public re-exports separate.
#[doc(inline)]
pub use crate::{
    error::{Error, UtxoError},
    finalizer::FinalizeError,
    map::{GlobalMap, InputMap, OutputMap},
    psbt::{CombineError, ExtractError, ParseError, Psbt},
    record::{GlobalRecord, InputRecord, OutputRecord},
    sighash_type::{ParseSighashTypeError, PsbtSighashType},
    template::{ScriptTemplate, TemplateKind},
    version::Version,
};

#[rustfmt::skip]
mod prelude {
    #![allow(unused_imports)]

    #[cfg(all(not(feature = "std"), not(test)))]
    pub use alloc::{string::{String, ToString}, vec::Vec, boxed::Box, borrow::{Borrow, BorrowMut, Cow, ToOwned}, slice, rc};

    #[cfg(all(not(feature = "std"), not(test), target_has_atomic = "ptr"))]
    pub use alloc::sync;

    #[cfg(any(feature = "std", test))]
    pub use std::{string::{String, ToString}, vec::Vec, boxed::Box, borrow::{Borrow, BorrowMut, Cow, ToOwned}, slice, rc, sync};

    #[cfg(all(not(feature = "std"), not(test)))]
    pub use alloc::collections::{BTreeMap, BTreeSet, btree_map, BinaryHeap};

    #[cfg(any(feature = "std", test))]
    pub use std::collections::{BTreeMap, BTreeSet, btree_map, BinaryHeap};

    #[cfg(any(feature = "std", test))]
    pub use std::{println, print, format, write, writeln};

    pub use bitcoin::hex::DisplayHex;
}
