// SPDX-License-Identifier: CC0-1.0

use bitcoin::bip32::KeySource;
use bitcoin::{secp256k1, ScriptBuf};

use crate::consts::{
    self, PSBT_OUT_BIP32_DERIVATION, PSBT_OUT_REDEEM_SCRIPT, PSBT_OUT_WITNESS_SCRIPT,
};
use crate::prelude::*;
use crate::serialize::{Deserialize, Serialize};
use crate::{raw, Error};

/// A record from an output map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum OutputRecord {
    /// The redeem script for this output.
    RedeemScript(ScriptBuf),
    /// The witness script for this output.
    WitnessScript(ScriptBuf),
    /// The master key fingerprint and derivation path of a public key involved in this output.
    Bip32Derivation(secp256k1::PublicKey, KeySource),
    /// A key-value pair whose key type is not part of the output registry.
    Unknown {
        /// The raw key.
        key: raw::Key,
        /// The raw value bytes.
        value: Vec<u8>,
    },
}

impl OutputRecord {
    /// Returns the key type value of this record.
    pub fn key_type_value(&self) -> u8 {
        use OutputRecord::*;

        match *self {
            RedeemScript(_) => PSBT_OUT_REDEEM_SCRIPT,
            WitnessScript(_) => PSBT_OUT_WITNESS_SCRIPT,
            Bip32Derivation(..) => PSBT_OUT_BIP32_DERIVATION,
            Unknown { ref key, .. } => key.type_value,
        }
    }

    /// Returns the BIP-174 name of this record's key type, useful for debugging.
    pub fn key_type_name(&self) -> &'static str {
        consts::psbt_out_key_type_value_to_str(self.key_type_value())
    }

    /// Returns the full raw key (type and key data) of this record.
    pub fn raw_key(&self) -> raw::Key {
        use OutputRecord::*;

        let key_data = match *self {
            Bip32Derivation(ref pk, _) => Serialize::serialize(pk),
            Unknown { ref key, .. } => return key.clone(),
            _ => vec![],
        };

        raw::Key { type_value: self.key_type_value(), key: key_data }
    }

    /// Converts this record to a raw key-value pair.
    pub fn to_pair(&self) -> raw::Pair {
        use OutputRecord::*;

        let value = match *self {
            RedeemScript(ref script) | WitnessScript(ref script) => Serialize::serialize(script),
            Bip32Derivation(_, ref source) => Serialize::serialize(source),
            Unknown { ref value, .. } => value.clone(),
        };

        raw::Pair { key: self.raw_key(), value }
    }

    /// Parses a raw key-value pair into a typed output record.
    pub fn from_pair(pair: raw::Pair) -> Result<Self, Error> {
        let raw::Pair { key, value } = pair;

        match key.type_value {
            PSBT_OUT_REDEEM_SCRIPT => {
                if !key.key.is_empty() {
                    return Err(Error::InvalidKeyDataNotEmpty(key));
                }
                Ok(OutputRecord::RedeemScript(ScriptBuf::deserialize(&value)?))
            }
            PSBT_OUT_WITNESS_SCRIPT => {
                if !key.key.is_empty() {
                    return Err(Error::InvalidKeyDataNotEmpty(key));
                }
                Ok(OutputRecord::WitnessScript(ScriptBuf::deserialize(&value)?))
            }
            PSBT_OUT_BIP32_DERIVATION => {
                if key.key.is_empty() {
                    return Err(Error::InvalidKeyDataEmpty(key));
                }
                let pk = secp256k1::PublicKey::deserialize(&key.key)?;
                let source = KeySource::deserialize(&value)?;
                Ok(OutputRecord::Bip32Derivation(pk, source))
            }
            _ => Ok(OutputRecord::Unknown { key, value }),
        }
    }
}
