// SPDX-License-Identifier: CC0-1.0

use bitcoin::bip32::KeySource;
use bitcoin::key::PublicKey;
use bitcoin::sighash::{EcdsaSighashType, NonStandardSighashTypeError};
use bitcoin::{ecdsa, secp256k1, Script, Transaction, TxIn, TxOut, Witness};

use crate::error::UtxoError;
use crate::io;
use crate::map::{self, Map};
use crate::prelude::*;
use crate::record::InputRecord;
use crate::sighash_type::PsbtSighashType;
use crate::{raw, Error};

/// A key-value map for an input of the corresponding index in the unsigned transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputMap {
    records: Vec<InputRecord>,
}

impl InputMap {
    /// Constructs an input map from records, enforcing the cross-record invariants.
    ///
    /// Records are stored in canonical (full key) order, so two maps built from the same records
    /// in different order compare equal.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateKey`] if two records share their full key.
    /// - [`Error::ConflictingUtxo`] if both a witness and a non-witness UTXO record are present.
    pub fn from_records(mut records: Vec<InputRecord>) -> Result<Self, Error> {
        map::sort_and_check_keys(&mut records, InputRecord::raw_key)?;

        let non_witness =
            records.iter().any(|record| matches!(record, InputRecord::NonWitnessUtxo(_)));
        let witness = records.iter().any(|record| matches!(record, InputRecord::WitnessUtxo(_)));
        if non_witness && witness {
            return Err(Error::ConflictingUtxo);
        }

        Ok(InputMap { records })
    }

    /// Returns the records of this map in canonical order.
    pub fn records(&self) -> &[InputRecord] { &self.records }

    /// Returns all records whose key type differs from `key_type_value`.
    ///
    /// This is the drop-and-replace helper: rebuild the map from the returned records plus the
    /// replacements.
    pub fn filter_records(&self, key_type_value: u8) -> Vec<InputRecord> {
        self.records
            .iter()
            .filter(|record| record.key_type_value() != key_type_value)
            .cloned()
            .collect()
    }

    /// Returns a new map holding the records of this one plus `record`.
    pub fn with_record(&self, record: InputRecord) -> Result<Self, Error> {
        let mut records = self.records.clone();
        records.push(record);
        Self::from_records(records)
    }

    /// Returns the non-witness UTXO transaction, if any.
    pub fn non_witness_utxo(&self) -> Option<&Transaction> {
        self.records.iter().find_map(|record| match record {
            InputRecord::NonWitnessUtxo(tx) => Some(tx),
            _ => None,
        })
    }

    /// Returns the witness UTXO, if any.
    pub fn witness_utxo(&self) -> Option<&TxOut> {
        self.records.iter().find_map(|record| match record {
            InputRecord::WitnessUtxo(txout) => Some(txout),
            _ => None,
        })
    }

    /// Returns the partial signatures together with the public keys they were produced for.
    pub fn partial_sigs(&self) -> Vec<(PublicKey, ecdsa::Signature)> {
        self.records
            .iter()
            .filter_map(|record| match record {
                InputRecord::PartialSignature(pk, sig) => Some((*pk, *sig)),
                _ => None,
            })
            .collect()
    }

    /// Returns the sighash type record, if any.
    pub fn sighash_type(&self) -> Option<PsbtSighashType> {
        self.records.iter().find_map(|record| match record {
            InputRecord::SighashType(ty) => Some(*ty),
            _ => None,
        })
    }

    /// Obtains the [`EcdsaSighashType`] for this input if one is specified. If no sighash type is
    /// specified, returns [`EcdsaSighashType::All`].
    ///
    /// # Errors
    ///
    /// If the `sighash_type` record is set to a non-standard ECDSA sighash value.
    pub fn ecdsa_hash_ty(&self) -> Result<EcdsaSighashType, NonStandardSighashTypeError> {
        self.sighash_type()
            .map(|sighash_type| sighash_type.ecdsa_hash_ty())
            .unwrap_or(Ok(EcdsaSighashType::All))
    }

    /// Returns the redeem script, if any.
    pub fn redeem_script(&self) -> Option<&Script> {
        self.records.iter().find_map(|record| match record {
            InputRecord::RedeemScript(script) => Some(script.as_script()),
            _ => None,
        })
    }

    /// Returns the witness script, if any.
    pub fn witness_script(&self) -> Option<&Script> {
        self.records.iter().find_map(|record| match record {
            InputRecord::WitnessScript(script) => Some(script.as_script()),
            _ => None,
        })
    }

    /// Returns the BIP 32 derivation records.
    pub fn bip32_derivations(&self) -> impl Iterator<Item = (&secp256k1::PublicKey, &KeySource)> {
        self.records.iter().filter_map(|record| match record {
            InputRecord::Bip32Derivation(pk, source) => Some((pk, source)),
            _ => None,
        })
    }

    /// Returns the finalized scriptSig, if any.
    pub fn final_script_sig(&self) -> Option<&Script> {
        self.records.iter().find_map(|record| match record {
            InputRecord::FinalScriptSig(script) => Some(script.as_script()),
            _ => None,
        })
    }

    /// Returns the finalized scriptWitness, if any.
    pub fn final_script_witness(&self) -> Option<&Witness> {
        self.records.iter().find_map(|record| match record {
            InputRecord::FinalScriptWitness(witness) => Some(witness),
            _ => None,
        })
    }

    /// Returns `true` if this input carries a finalized scriptSig or scriptWitness.
    pub fn is_finalized(&self) -> bool {
        self.final_script_sig().is_some() || self.final_script_witness().is_some()
    }

    /// Returns the script pubkey of the output this input spends.
    ///
    /// `txin` must be the corresponding input of the unsigned transaction; it is used to index
    /// the spent output when the UTXO is recorded as a full transaction.
    pub fn spent_script_pubkey(&self, txin: &TxIn) -> Result<&Script, UtxoError> {
        if let Some(txout) = self.witness_utxo() {
            return Ok(&txout.script_pubkey);
        }

        let tx = self.non_witness_utxo().ok_or(UtxoError::Missing)?;
        let vout = txin.previous_output.vout as usize;
        let txout = tx
            .output
            .get(vout)
            .ok_or(UtxoError::OutOfBounds { index: vout, length: tx.output.len() })?;
        Ok(&txout.script_pubkey)
    }

    /// Replaces a non-witness UTXO record with the equivalent witness UTXO when the spent output
    /// is a segwit script, directly or P2SH-wrapped with a witness program redeem script.
    ///
    /// This is always safe because a segwit input's sighash does not commit to the full spent
    /// transaction. Returns the map unchanged for finalized inputs, witness UTXOs, and
    /// non-segwit spends.
    ///
    /// # Errors
    ///
    /// [`UtxoError::OutOfBounds`] if `txin.previous_output.vout` exceeds the stored
    /// transaction's output count.
    pub fn compress(&self, txin: &TxIn) -> Result<Self, UtxoError> {
        if self.is_finalized() {
            return Ok(self.clone());
        }

        let tx = match self.non_witness_utxo() {
            Some(tx) => tx,
            None => return Ok(self.clone()),
        };

        let vout = txin.previous_output.vout as usize;
        let txout = tx
            .output
            .get(vout)
            .ok_or(UtxoError::OutOfBounds { index: vout, length: tx.output.len() })?
            .clone();

        let segwit_spend = txout.script_pubkey.is_witness_program()
            || (txout.script_pubkey.is_p2sh()
                && self.redeem_script().map(Script::is_witness_program).unwrap_or(false));
        if !segwit_spend {
            return Ok(self.clone());
        }

        let mut records = self.filter_records(crate::consts::PSBT_IN_NON_WITNESS_UTXO);
        records.push(InputRecord::WitnessUtxo(txout));
        Ok(Self::from_records(records).expect("replacing the only UTXO record keeps the map valid"))
    }

    pub(crate) fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
        let pairs = map::decode_pairs(r)?;
        let records =
            pairs.into_iter().map(InputRecord::from_pair).collect::<Result<Vec<_>, _>>()?;
        Self::from_records(records)
    }

    /// Merges `other` into this map.
    ///
    /// Records union by full key with this map winning collisions. If the union would carry both
    /// UTXO kinds the non-witness record is dropped, keeping the merge commutative.
    pub(crate) fn combine(&mut self, other: Self) {
        let left = core::mem::take(&mut self.records);
        let mut records = map::union_keep_left(left, other.records, InputRecord::raw_key);

        let non_witness =
            records.iter().any(|record| matches!(record, InputRecord::NonWitnessUtxo(_)));
        let witness = records.iter().any(|record| matches!(record, InputRecord::WitnessUtxo(_)));
        if non_witness && witness {
            records.retain(|record| !matches!(record, InputRecord::NonWitnessUtxo(_)));
        }

        *self = InputMap::from_records(records)
            .expect("union of valid maps with the UTXO conflict resolved is valid");
    }
}

impl Map for InputMap {
    fn get_pairs(&self) -> Vec<raw::Pair> {
        self.records.iter().map(InputRecord::to_pair).collect()
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;
    use bitcoin::{absolute, transaction, Amount, OutPoint, ScriptBuf, Sequence};

    use super::*;
    use crate::consts::PSBT_IN_PARTIAL_SIG;

    fn prev_tx() -> Transaction {
        Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![],
            output: vec![TxOut {
                value: Amount::from_sat(50_000),
                script_pubkey: ScriptBuf::new_p2wpkh(&bitcoin::WPubkeyHash::from_byte_array(
                    [0x11; 20],
                )),
            }],
        }
    }

    fn txin_spending(tx: &Transaction, vout: u32) -> TxIn {
        TxIn {
            previous_output: OutPoint { txid: tx.txid(), vout },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        }
    }

    #[test]
    fn rejects_conflicting_utxo_kinds() {
        let tx = prev_tx();
        let records = vec![
            InputRecord::NonWitnessUtxo(tx.clone()),
            InputRecord::WitnessUtxo(tx.output[0].clone()),
        ];
        match InputMap::from_records(records) {
            Err(Error::ConflictingUtxo) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn filter_records_drops_only_requested_type() {
        let tx = prev_tx();
        let map = InputMap::from_records(vec![InputRecord::NonWitnessUtxo(tx)]).unwrap();
        assert_eq!(map.filter_records(PSBT_IN_PARTIAL_SIG).len(), 1);
        assert!(map.filter_records(0x00).is_empty());
    }

    #[test]
    fn compress_replaces_non_witness_utxo_for_segwit_spend() {
        let tx = prev_tx();
        let txin = txin_spending(&tx, 0);
        let map = InputMap::from_records(vec![InputRecord::NonWitnessUtxo(tx.clone())]).unwrap();

        let compressed = map.compress(&txin).unwrap();
        assert!(compressed.non_witness_utxo().is_none());
        assert_eq!(compressed.witness_utxo(), Some(&tx.output[0]));
    }

    #[test]
    fn compress_rejects_out_of_range_vout() {
        let tx = prev_tx();
        let txin = txin_spending(&tx, 7);
        let map = InputMap::from_records(vec![InputRecord::NonWitnessUtxo(tx)]).unwrap();

        match map.compress(&txin) {
            Err(UtxoError::OutOfBounds { index: 7, length: 1 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn compress_leaves_non_segwit_spend_alone() {
        let mut tx = prev_tx();
        tx.output[0].script_pubkey =
            ScriptBuf::new_p2pkh(&bitcoin::PubkeyHash::from_byte_array([0x22; 20]));
        let txin = txin_spending(&tx, 0);
        let map = InputMap::from_records(vec![InputRecord::NonWitnessUtxo(tx)]).unwrap();

        let compressed = map.compress(&txin).unwrap();
        assert_eq!(compressed, map);
    }

    #[test]
    fn combine_prefers_witness_utxo() {
        let tx = prev_tx();
        let mut a = InputMap::from_records(vec![InputRecord::NonWitnessUtxo(tx.clone())]).unwrap();
        let b = InputMap::from_records(vec![InputRecord::WitnessUtxo(tx.output[0].clone())]).unwrap();

        a.combine(b);
        assert!(a.non_witness_utxo().is_none());
        assert!(a.witness_utxo().is_some());
    }
}
