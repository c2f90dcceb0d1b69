// SPDX-License-Identifier: CC0-1.0

use bitcoin::bip32::KeySource;
use bitcoin::key::PublicKey;
use bitcoin::{ecdsa, secp256k1, ScriptBuf, Transaction, TxOut, Witness};

use crate::consts::{
    self, PSBT_IN_BIP32_DERIVATION, PSBT_IN_FINAL_SCRIPTSIG, PSBT_IN_FINAL_SCRIPTWITNESS,
    PSBT_IN_NON_WITNESS_UTXO, PSBT_IN_PARTIAL_SIG, PSBT_IN_POR_COMMITMENT,
    PSBT_IN_REDEEM_SCRIPT, PSBT_IN_SIGHASH_TYPE, PSBT_IN_WITNESS_SCRIPT, PSBT_IN_WITNESS_UTXO,
};
use crate::prelude::*;
use crate::serialize::{Deserialize, Serialize};
use crate::sighash_type::PsbtSighashType;
use crate::{raw, Error};

/// A record from an input map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InputRecord {
    /// The non-witness transaction this input spends from. Should only be used for inputs which
    /// spend non-segwit outputs or if it is unknown whether an input spends a segwit output.
    NonWitnessUtxo(Transaction),
    /// The transaction output this input spends from. Should only be used for inputs which spend
    /// segwit outputs, including P2SH embedded ones.
    WitnessUtxo(TxOut),
    /// A signature for this input, as would be pushed to the stack from a scriptSig or witness,
    /// together with the public key it was produced for.
    PartialSignature(PublicKey, ecdsa::Signature),
    /// The sighash type to be used for this input. Signatures for this input must use the
    /// sighash type.
    SighashType(PsbtSighashType),
    /// The redeem script for this input.
    RedeemScript(ScriptBuf),
    /// The witness script for this input.
    WitnessScript(ScriptBuf),
    /// The master key fingerprint and derivation path of a public key needed to sign this input.
    Bip32Derivation(secp256k1::PublicKey, KeySource),
    /// The finalized, fully-constructed scriptSig with signatures and any other scripts
    /// necessary for this input to pass validation.
    FinalScriptSig(ScriptBuf),
    /// The finalized, fully-constructed scriptWitness with signatures and any other scripts
    /// necessary for this input to pass validation.
    FinalScriptWitness(Witness),
    /// Proof-of-reserves commitment, carried verbatim and never interpreted.
    PorCommitment(Vec<u8>),
    /// A key-value pair whose key type is not part of the input registry.
    Unknown {
        /// The raw key.
        key: raw::Key,
        /// The raw value bytes.
        value: Vec<u8>,
    },
}

impl InputRecord {
    /// Returns the key type value of this record.
    pub fn key_type_value(&self) -> u8 {
        use InputRecord::*;

        match *self {
            NonWitnessUtxo(_) => PSBT_IN_NON_WITNESS_UTXO,
            WitnessUtxo(_) => PSBT_IN_WITNESS_UTXO,
            PartialSignature(..) => PSBT_IN_PARTIAL_SIG,
            SighashType(_) => PSBT_IN_SIGHASH_TYPE,
            RedeemScript(_) => PSBT_IN_REDEEM_SCRIPT,
            WitnessScript(_) => PSBT_IN_WITNESS_SCRIPT,
            Bip32Derivation(..) => PSBT_IN_BIP32_DERIVATION,
            FinalScriptSig(_) => PSBT_IN_FINAL_SCRIPTSIG,
            FinalScriptWitness(_) => PSBT_IN_FINAL_SCRIPTWITNESS,
            PorCommitment(_) => PSBT_IN_POR_COMMITMENT,
            Unknown { ref key, .. } => key.type_value,
        }
    }

    /// Returns the BIP-174 name of this record's key type, useful for debugging.
    pub fn key_type_name(&self) -> &'static str {
        consts::psbt_in_key_type_value_to_str(self.key_type_value())
    }

    /// Returns the full raw key (type and key data) of this record.
    pub fn raw_key(&self) -> raw::Key {
        use InputRecord::*;

        let key_data = match *self {
            PartialSignature(ref pk, _) => Serialize::serialize(pk),
            Bip32Derivation(ref pk, _) => Serialize::serialize(pk),
            Unknown { ref key, .. } => return key.clone(),
            _ => vec![],
        };

        raw::Key { type_value: self.key_type_value(), key: key_data }
    }

    /// Converts this record to a raw key-value pair.
    pub fn to_pair(&self) -> raw::Pair {
        use InputRecord::*;

        let value = match *self {
            NonWitnessUtxo(ref tx) => Serialize::serialize(tx),
            WitnessUtxo(ref txout) => Serialize::serialize(txout),
            PartialSignature(_, ref sig) => Serialize::serialize(sig),
            SighashType(ref ty) => Serialize::serialize(ty),
            RedeemScript(ref script) | WitnessScript(ref script) | FinalScriptSig(ref script) =>
                Serialize::serialize(script),
            Bip32Derivation(_, ref source) => Serialize::serialize(source),
            FinalScriptWitness(ref witness) => Serialize::serialize(witness),
            PorCommitment(ref bytes) => bytes.clone(),
            Unknown { ref value, .. } => value.clone(),
        };

        raw::Pair { key: self.raw_key(), value }
    }

    /// Parses a raw key-value pair into a typed input record.
    pub fn from_pair(pair: raw::Pair) -> Result<Self, Error> {
        let raw::Pair { key, value } = pair;

        match key.type_value {
            PSBT_IN_NON_WITNESS_UTXO => {
                expect_empty_key_data(key)?;
                Ok(InputRecord::NonWitnessUtxo(Transaction::deserialize(&value)?))
            }
            PSBT_IN_WITNESS_UTXO => {
                expect_empty_key_data(key)?;
                Ok(InputRecord::WitnessUtxo(TxOut::deserialize(&value)?))
            }
            PSBT_IN_PARTIAL_SIG => {
                if key.key.is_empty() {
                    return Err(Error::InvalidKeyDataEmpty(key));
                }
                let pk = PublicKey::deserialize(&key.key)?;
                let sig = ecdsa::Signature::deserialize(&value)?;
                Ok(InputRecord::PartialSignature(pk, sig))
            }
            PSBT_IN_SIGHASH_TYPE => {
                expect_empty_key_data(key)?;
                Ok(InputRecord::SighashType(PsbtSighashType::deserialize(&value)?))
            }
            PSBT_IN_REDEEM_SCRIPT => {
                expect_empty_key_data(key)?;
                Ok(InputRecord::RedeemScript(ScriptBuf::deserialize(&value)?))
            }
            PSBT_IN_WITNESS_SCRIPT => {
                expect_empty_key_data(key)?;
                Ok(InputRecord::WitnessScript(ScriptBuf::deserialize(&value)?))
            }
            PSBT_IN_BIP32_DERIVATION => {
                if key.key.is_empty() {
                    return Err(Error::InvalidKeyDataEmpty(key));
                }
                let pk = secp256k1::PublicKey::deserialize(&key.key)?;
                let source = KeySource::deserialize(&value)?;
                Ok(InputRecord::Bip32Derivation(pk, source))
            }
            PSBT_IN_FINAL_SCRIPTSIG => {
                expect_empty_key_data(key)?;
                Ok(InputRecord::FinalScriptSig(ScriptBuf::deserialize(&value)?))
            }
            PSBT_IN_FINAL_SCRIPTWITNESS => {
                expect_empty_key_data(key)?;
                Ok(InputRecord::FinalScriptWitness(Witness::deserialize(&value)?))
            }
            PSBT_IN_POR_COMMITMENT => {
                expect_empty_key_data(key)?;
                Ok(InputRecord::PorCommitment(value))
            }
            _ => Ok(InputRecord::Unknown { key, value }),
        }
    }
}

fn expect_empty_key_data(key: raw::Key) -> Result<raw::Key, Error> {
    if !key.key.is_empty() {
        return Err(Error::InvalidKeyDataNotEmpty(key));
    }
    Ok(key)
}
