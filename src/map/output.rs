// SPDX-License-Identifier: CC0-1.0

use bitcoin::bip32::KeySource;
use bitcoin::{secp256k1, Script};

use crate::io;
use crate::map::{self, Map};
use crate::prelude::*;
use crate::record::OutputRecord;
use crate::{raw, Error};

/// A key-value map for an output of the corresponding index in the unsigned transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputMap {
    records: Vec<OutputRecord>,
}

impl OutputMap {
    /// Constructs an output map from records, enforcing key uniqueness.
    ///
    /// Records are stored in canonical (full key) order, so two maps built from the same records
    /// in different order compare equal.
    pub fn from_records(mut records: Vec<OutputRecord>) -> Result<Self, Error> {
        map::sort_and_check_keys(&mut records, OutputRecord::raw_key)?;
        Ok(OutputMap { records })
    }

    /// Returns the records of this map in canonical order.
    pub fn records(&self) -> &[OutputRecord] { &self.records }

    /// Returns all records whose key type differs from `key_type_value`.
    pub fn filter_records(&self, key_type_value: u8) -> Vec<OutputRecord> {
        self.records
            .iter()
            .filter(|record| record.key_type_value() != key_type_value)
            .cloned()
            .collect()
    }

    /// Returns a new map holding the records of this one plus `record`.
    pub fn with_record(&self, record: OutputRecord) -> Result<Self, Error> {
        let mut records = self.records.clone();
        records.push(record);
        Self::from_records(records)
    }

    /// Returns the redeem script, if any.
    pub fn redeem_script(&self) -> Option<&Script> {
        self.records.iter().find_map(|record| match record {
            OutputRecord::RedeemScript(script) => Some(script.as_script()),
            _ => None,
        })
    }

    /// Returns the witness script, if any.
    pub fn witness_script(&self) -> Option<&Script> {
        self.records.iter().find_map(|record| match record {
            OutputRecord::WitnessScript(script) => Some(script.as_script()),
            _ => None,
        })
    }

    /// Returns the BIP 32 derivation records.
    pub fn bip32_derivations(&self) -> impl Iterator<Item = (&secp256k1::PublicKey, &KeySource)> {
        self.records.iter().filter_map(|record| match record {
            OutputRecord::Bip32Derivation(pk, source) => Some((pk, source)),
            _ => None,
        })
    }

    pub(crate) fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
        let pairs = map::decode_pairs(r)?;
        let records =
            pairs.into_iter().map(OutputRecord::from_pair).collect::<Result<Vec<_>, _>>()?;
        Self::from_records(records)
    }

    /// Merges `other` into this map, unioning records by full key with this map winning
    /// collisions.
    pub(crate) fn combine(&mut self, other: Self) {
        let left = core::mem::take(&mut self.records);
        let records = map::union_keep_left(left, other.records, OutputRecord::raw_key);
        *self = OutputMap::from_records(records).expect("union of valid maps is valid");
    }
}

impl Map for OutputMap {
    fn get_pairs(&self) -> Vec<raw::Pair> {
        self.records.iter().map(OutputRecord::to_pair).collect()
    }
}
