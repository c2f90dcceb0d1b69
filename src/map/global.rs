// SPDX-License-Identifier: CC0-1.0

use bitcoin::bip32::{KeySource, Xpub};
use bitcoin::transaction::Transaction;

use crate::io;
use crate::map::{self, Map};
use crate::prelude::*;
use crate::record::GlobalRecord;
use crate::version::Version;
use crate::{raw, Error};

/// The global key-value map.
///
/// Always carries exactly one unsigned transaction record; the validating constructor rejects
/// record sets without one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalMap {
    records: Vec<GlobalRecord>,
}

impl GlobalMap {
    /// Constructs a global map from records, enforcing the cross-record invariants.
    ///
    /// Records are stored in canonical (full key) order, so two maps built from the same records
    /// in different order compare equal.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateKey`] if two records share their full key (this also covers a second
    ///   unsigned transaction or version record, whose keys are always empty).
    /// - [`Error::MissingUnsignedTx`] if no unsigned transaction record is present.
    /// - [`Error::UnsignedTxHasScriptSigs`] / [`Error::UnsignedTxHasScriptWitnesses`] if the
    ///   unsigned transaction is not actually unsigned.
    pub fn from_records(mut records: Vec<GlobalRecord>) -> Result<Self, Error> {
        map::sort_and_check_keys(&mut records, GlobalRecord::raw_key)?;

        let tx = records
            .iter()
            .find_map(|record| match record {
                GlobalRecord::UnsignedTransaction(tx) => Some(tx),
                _ => None,
            })
            .ok_or(Error::MissingUnsignedTx)?;
        unsigned_tx_checks(tx)?;

        Ok(GlobalMap { records })
    }

    /// Constructs a global map holding `tx` and nothing else.
    ///
    /// # Errors
    ///
    /// If the transaction is not unsigned.
    pub fn from_unsigned_tx(tx: Transaction) -> Result<Self, Error> {
        Self::from_records(vec![GlobalRecord::UnsignedTransaction(tx)])
    }

    /// Returns the records of this map in canonical order.
    pub fn records(&self) -> &[GlobalRecord] { &self.records }

    /// Returns the unsigned transaction.
    pub fn unsigned_tx(&self) -> &Transaction {
        self.records
            .iter()
            .find_map(|record| match record {
                GlobalRecord::UnsignedTransaction(tx) => Some(tx),
                _ => None,
            })
            .expect("constructor guarantees an unsigned transaction record")
    }

    /// Returns the PSBT version, zero if no version record is present.
    pub fn version(&self) -> Version {
        self.records
            .iter()
            .find_map(|record| match record {
                GlobalRecord::Version(version) => Some(*version),
                _ => None,
            })
            .unwrap_or(Version::ZERO)
    }

    /// Returns the extended public key records.
    pub fn xpubs(&self) -> impl Iterator<Item = (&Xpub, &KeySource)> {
        self.records.iter().filter_map(|record| match record {
            GlobalRecord::Xpub { xpub, source } => Some((xpub, source)),
            _ => None,
        })
    }

    /// Returns a new map holding the records of this one plus `record`.
    pub fn with_record(&self, record: GlobalRecord) -> Result<Self, Error> {
        let mut records = self.records.clone();
        records.push(record);
        Self::from_records(records)
    }

    pub(crate) fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
        let pairs = map::decode_pairs(r)?;
        let records =
            pairs.into_iter().map(GlobalRecord::from_pair).collect::<Result<Vec<_>, _>>()?;
        Self::from_records(records)
    }

    /// Merges `other` into this map.
    ///
    /// The caller is responsible for checking that both sides carry the same unsigned
    /// transaction. When the versions differ the lower version's record set is dropped; records
    /// then union by full key with this map winning collisions.
    pub(crate) fn combine(&mut self, other: Self) {
        let mut left = core::mem::take(&mut self.records);
        let mut right = other.records;

        let (a, b) = (version_of(&left), version_of(&right));
        if a > b {
            right.retain(|record| !matches!(record, GlobalRecord::Version(_)));
        } else if b > a {
            left.retain(|record| !matches!(record, GlobalRecord::Version(_)));
        }

        let records = map::union_keep_left(left, right, GlobalRecord::raw_key);
        *self = GlobalMap::from_records(records)
            .expect("both operands were valid maps with the same unsigned transaction");
    }
}

impl Map for GlobalMap {
    fn get_pairs(&self) -> Vec<raw::Pair> {
        self.records.iter().map(GlobalRecord::to_pair).collect()
    }
}

fn version_of(records: &[GlobalRecord]) -> Version {
    records
        .iter()
        .find_map(|record| match record {
            GlobalRecord::Version(version) => Some(*version),
            _ => None,
        })
        .unwrap_or(Version::ZERO)
}

/// Checks that the transaction does not have scriptSigs or witness data.
fn unsigned_tx_checks(tx: &Transaction) -> Result<(), Error> {
    for txin in &tx.input {
        if !txin.script_sig.is_empty() {
            return Err(Error::UnsignedTxHasScriptSigs);
        }

        if !txin.witness.is_empty() {
            return Err(Error::UnsignedTxHasScriptWitnesses);
        }
    }

    Ok(())
}
