// SPDX-License-Identifier: CC0-1.0

//! The global, input, and output key-value maps.
//!
//! A map is an ordered set of typed records with unique full keys. Maps are never mutated in
//! place; every operation that changes a map's contents rebuilds it through the validating
//! constructor so the cross-record invariants hold by construction.

mod global;
mod input;
mod output;

use crate::io;
use crate::prelude::*;
use crate::serialize::Serialize;
use crate::{raw, Error};

#[rustfmt::skip]                // Keep public re-exports separate.
#[doc(inline)]
pub use self::{global::GlobalMap, input::InputMap, output::OutputMap};

/// A trait that describes a PSBT key-value map.
pub(crate) trait Map {
    /// Attempt to get all key-value pairs.
    fn get_pairs(&self) -> Vec<raw::Pair>;

    /// Serialize PSBT binary map data according to BIP-174 specification.
    ///
    /// `<map> := <keypair>* 0x00`
    ///
    /// Pairs are emitted in ascending order of their full keys, making the serialized form
    /// canonical.
    fn serialize_map(&self) -> Vec<u8> {
        let mut pairs = Map::get_pairs(self);
        pairs.sort_by(|a, b| a.key.cmp(&b.key));

        let mut buf = Vec::new();
        for pair in pairs {
            buf.extend(pair.serialize());
        }
        buf.push(0x00_u8);
        buf
    }
}

/// Reads raw pairs from `r` until the `0x00` map separator is consumed.
pub(crate) fn decode_pairs<R: io::Read + ?Sized>(r: &mut R) -> Result<Vec<raw::Pair>, Error> {
    let mut pairs = Vec::new();
    loop {
        match raw::Pair::decode(r) {
            Ok(pair) => pairs.push(pair),
            Err(Error::NoMorePairs) => return Ok(pairs),
            Err(e) => return Err(e),
        }
    }
}

/// Sorts records ascending by full key and rejects duplicates.
pub(crate) fn sort_and_check_keys<R, F>(records: &mut [R], raw_key: F) -> Result<(), Error>
where
    F: Fn(&R) -> raw::Key,
{
    records.sort_by(|a, b| raw_key(a).cmp(&raw_key(b)));
    for pair in records.windows(2) {
        let key = raw_key(&pair[0]);
        if key == raw_key(&pair[1]) {
            return Err(Error::DuplicateKey(key));
        }
    }
    Ok(())
}

/// Unions two record lists by full key; on a collision the left record is kept.
pub(crate) fn union_keep_left<R, F>(left: Vec<R>, right: Vec<R>, raw_key: F) -> Vec<R>
where
    F: Fn(&R) -> raw::Key,
{
    let mut records = left;
    for candidate in right {
        let key = raw_key(&candidate);
        if !records.iter().any(|existing| raw_key(existing) == key) {
            records.push(candidate);
        }
    }
    records
}
