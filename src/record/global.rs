// SPDX-License-Identifier: CC0-1.0

use bitcoin::bip32::{KeySource, Xpub};
use bitcoin::consensus::encode as consensus;
use bitcoin::consensus::Decodable;
use bitcoin::transaction::Transaction;

use crate::consts::{self, PSBT_GLOBAL_UNSIGNED_TX, PSBT_GLOBAL_VERSION, PSBT_GLOBAL_XPUB};
use crate::io::Cursor;
use crate::prelude::*;
use crate::serialize::{Deserialize, Serialize};
use crate::version::Version;
use crate::{raw, Error};

/// A record from the global map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum GlobalRecord {
    /// The unsigned transaction, scriptSigs and witnesses for each input must be empty.
    UnsignedTransaction(Transaction),
    /// An extended public key together with the key fingerprint and derivation path it was
    /// derived with, as defined by BIP 32.
    Xpub {
        /// The extended public key.
        xpub: Xpub,
        /// Master key fingerprint and derivation path of `xpub`.
        source: KeySource,
    },
    /// The version number of this PSBT. If omitted, the version number is 0.
    Version(Version),
    /// A key-value pair whose key type is not part of the global registry.
    Unknown {
        /// The raw key.
        key: raw::Key,
        /// The raw value bytes.
        value: Vec<u8>,
    },
}

impl GlobalRecord {
    /// Returns the key type value of this record.
    pub fn key_type_value(&self) -> u8 {
        use GlobalRecord::*;

        match *self {
            UnsignedTransaction(_) => PSBT_GLOBAL_UNSIGNED_TX,
            Xpub { .. } => PSBT_GLOBAL_XPUB,
            Version(_) => PSBT_GLOBAL_VERSION,
            Unknown { ref key, .. } => key.type_value,
        }
    }

    /// Returns the BIP-174 name of this record's key type, useful for debugging.
    pub fn key_type_name(&self) -> &'static str {
        consts::psbt_global_key_type_value_to_str(self.key_type_value())
    }

    /// Returns the full raw key (type and key data) of this record.
    pub fn raw_key(&self) -> raw::Key {
        use GlobalRecord::*;

        match *self {
            UnsignedTransaction(_) =>
                raw::Key { type_value: PSBT_GLOBAL_UNSIGNED_TX, key: vec![] },
            Xpub { ref xpub, .. } =>
                raw::Key { type_value: PSBT_GLOBAL_XPUB, key: xpub.encode().to_vec() },
            Version(_) => raw::Key { type_value: PSBT_GLOBAL_VERSION, key: vec![] },
            Unknown { ref key, .. } => key.clone(),
        }
    }

    /// Converts this record to a raw key-value pair.
    pub fn to_pair(&self) -> raw::Pair {
        use GlobalRecord::*;

        let value = match *self {
            UnsignedTransaction(ref tx) => {
                // Manually serialized to ensure 0-input txs are serialized
                // without witnesses.
                let mut ret = Vec::new();
                ret.extend(consensus::serialize(&tx.version));
                ret.extend(consensus::serialize(&tx.input));
                ret.extend(consensus::serialize(&tx.output));
                ret.extend(consensus::serialize(&tx.lock_time));
                ret
            }
            Xpub { ref source, .. } => Serialize::serialize(source),
            Version(ref version) => Serialize::serialize(version),
            Unknown { ref value, .. } => value.clone(),
        };

        raw::Pair { key: self.raw_key(), value }
    }

    /// Parses a raw key-value pair into a typed global record.
    pub fn from_pair(pair: raw::Pair) -> Result<Self, Error> {
        let raw::Pair { key, value } = pair;

        match key.type_value {
            PSBT_GLOBAL_UNSIGNED_TX => {
                if !key.key.is_empty() {
                    return Err(Error::InvalidKeyDataNotEmpty(key));
                }

                let vlen = value.len();
                let mut decoder = Cursor::new(value);

                // Manually deserialized to ensure 0-input txs without
                // witnesses are deserialized properly.
                let tx = Transaction {
                    version: Decodable::consensus_decode(&mut decoder)?,
                    input: Decodable::consensus_decode(&mut decoder)?,
                    output: Decodable::consensus_decode(&mut decoder)?,
                    lock_time: Decodable::consensus_decode(&mut decoder)?,
                };

                if decoder.position() != vlen as u64 {
                    return Err(Error::PartialDataConsumption);
                }

                Ok(GlobalRecord::UnsignedTransaction(tx))
            }
            PSBT_GLOBAL_XPUB => {
                if key.key.is_empty() {
                    return Err(Error::InvalidKeyDataEmpty(key));
                }

                let xpub = Xpub::decode(&key.key)
                    .map_err(|_| Error::Xpub("can't deserialize xpub from global XPUB key data"))?;

                if value.is_empty() || value.len() % 4 != 0 {
                    return Err(Error::Xpub("incorrect length of global xpub derivation data"));
                }

                let source = KeySource::deserialize(&value)?;
                Ok(GlobalRecord::Xpub { xpub, source })
            }
            PSBT_GLOBAL_VERSION => {
                if !key.key.is_empty() {
                    return Err(Error::InvalidKeyDataNotEmpty(key));
                }

                let version = Version::deserialize(&value)?;
                Ok(GlobalRecord::Version(version))
            }
            _ => Ok(GlobalRecord::Unknown { key, value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::absolute;
    use bitcoin::transaction;

    use super::*;

    fn unsigned_tx() -> Transaction {
        Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![],
            output: vec![],
        }
    }

    #[test]
    fn unsigned_tx_record_roundtrip() {
        let record = GlobalRecord::UnsignedTransaction(unsigned_tx());
        let pair = record.to_pair();

        assert_eq!(pair.key, raw::Key { type_value: 0x00, key: vec![] });
        // version (4) + input count (1) + output count (1) + locktime (4)
        assert_eq!(pair.value.len(), 10);

        let decoded = GlobalRecord::from_pair(pair).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn unsigned_tx_key_must_be_empty() {
        let mut pair = GlobalRecord::UnsignedTransaction(unsigned_tx()).to_pair();
        pair.key.key = vec![0x00];
        match GlobalRecord::from_pair(pair) {
            Err(Error::InvalidKeyDataNotEmpty(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unsigned_tx_trailing_bytes_rejected() {
        let mut pair = GlobalRecord::UnsignedTransaction(unsigned_tx()).to_pair();
        pair.value.push(0x00);
        match GlobalRecord::from_pair(pair) {
            Err(Error::PartialDataConsumption) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn version_record_roundtrip() {
        let record = GlobalRecord::Version(Version::from(0));
        let decoded = GlobalRecord::from_pair(record.to_pair()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn key_type_name_reports_registry_names() {
        let record = GlobalRecord::UnsignedTransaction(unsigned_tx());
        assert_eq!(record.key_type_name(), "PSBT_GLOBAL_UNSIGNED_TX");

        let unknown = GlobalRecord::Unknown {
            key: raw::Key { type_value: 0xAB, key: vec![] },
            value: vec![],
        };
        assert_eq!(unknown.key_type_name(), "unknown PSBT_GLOBAL_ key type value");
    }

    #[test]
    fn unknown_key_type_is_preserved() {
        let pair = raw::Pair {
            key: raw::Key { type_value: 0xAB, key: vec![0x01] },
            value: vec![0x02, 0x03],
        };
        match GlobalRecord::from_pair(pair.clone()).unwrap() {
            GlobalRecord::Unknown { key, value } => {
                assert_eq!(key, pair.key);
                assert_eq!(value, pair.value);
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }
}
