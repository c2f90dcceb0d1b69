// SPDX-License-Identifier: CC0-1.0

//! Raw PSBT key-value pairs.
//!
//! Raw PSBT key-value pairs as defined at
//! <https://github.com/bitcoin/bips/blob/master/bip-0174.mediawiki>.

use core::fmt;

use bitcoin::consensus::encode::{self, Decodable, Encodable, VarInt, MAX_VEC_SIZE};

use crate::io;
use crate::prelude::*;
use crate::serialize::{Deserialize, Serialize};
use crate::Error;

/// A PSBT key in its raw byte form.
///
/// `<key> := <keylen> <keytype> <keydata>`
///
/// We do not carry the `keylen` around, we just create the `VarInt` length when serializing and
/// deserializing. Derived ordering is `keytype` first then `keydata`, which is the canonical
/// record order within a map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key {
    /// The type of this PSBT key.
    pub type_value: u8,
    /// The key data itself in raw byte form.
    pub key: Vec<u8>,
}

/// A PSBT key-value pair in its raw byte form.
///
/// `<keypair> := <key> <value>`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pair {
    /// The key of this key-value pair.
    pub key: Key,
    /// The value data of this key-value pair in raw byte form.
    /// `<value> := <valuelen> <valuedata>`
    pub value: Vec<u8>,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "type: {:#x}, key: {:x}", self.type_value, self.key.as_hex())
    }
}

impl Key {
    pub(crate) fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
        let VarInt(byte_size): VarInt = Decodable::consensus_decode(r)?;

        if byte_size == 0 {
            return Err(Error::NoMorePairs);
        }

        let key_byte_size: u64 = byte_size - 1;

        if key_byte_size > MAX_VEC_SIZE as u64 {
            return Err(encode::Error::OversizedVectorAllocation {
                requested: key_byte_size as usize,
                max: MAX_VEC_SIZE,
            }
            .into());
        }

        let type_value: u8 = Decodable::consensus_decode(r)?;

        let mut key = Vec::with_capacity(key_byte_size as usize);
        for _ in 0..key_byte_size {
            key.push(Decodable::consensus_decode(r)?);
        }

        Ok(Key { type_value, key })
    }
}

impl Serialize for Key {
    fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        VarInt((self.key.len() + 1) as u64)
            .consensus_encode(&mut buf)
            .expect("in-memory writers don't error");

        self.type_value.consensus_encode(&mut buf).expect("in-memory writers don't error");

        for key in &self.key {
            key.consensus_encode(&mut buf).expect("in-memory writers don't error");
        }

        buf
    }
}

impl Serialize for Pair {
    fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(self.key.serialize());
        // <value> := <valuelen> <valuedata>
        self.value.consensus_encode(&mut buf).expect("in-memory writers don't error");
        buf
    }
}

impl Deserialize for Pair {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut decoder = bytes;
        Pair::decode(&mut decoder)
    }
}

impl Pair {
    pub(crate) fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, Error> {
        Ok(Pair { key: Key::decode(r)?, value: Decodable::consensus_decode(r)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_roundtrip() {
        let original = Key { type_value: 0x06, key: vec![0x01, 0x02, 0x03, 0x04] };
        let encoded = original.serialize();

        assert_eq!(encoded, vec![0x05, 0x06, 0x01, 0x02, 0x03, 0x04]);

        let mut slice = encoded.as_slice();
        let decoded = Key::decode(&mut slice).unwrap();
        assert_eq!(decoded, original);
        assert!(slice.is_empty());
    }

    #[test]
    fn keytype_only() {
        let key = Key { type_value: 0x00, key: vec![] };
        assert_eq!(key.serialize(), vec![0x01, 0x00]);
    }

    #[test]
    fn zero_length_key_signals_end_of_map() {
        let bytes = [0x00u8];
        let mut slice = bytes.as_slice();
        match Key::decode(&mut slice) {
            Err(Error::NoMorePairs) => {}
            other => panic!("expected NoMorePairs, got {:?}", other),
        }
    }

    #[test]
    fn truncated_key_data() {
        // Key length says three bytes follow the type, only one does.
        let bytes = [0x04u8, 0x02, 0x01];
        let mut slice = bytes.as_slice();
        match Key::decode(&mut slice) {
            Err(Error::Truncated) => {}
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn pair_roundtrip() {
        let original = Pair {
            key: Key { type_value: 0x02, key: vec![0xaa, 0xbb] },
            value: vec![0x01, 0x02, 0x03],
        };
        let encoded = original.serialize();
        let decoded = Pair::deserialize(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn key_ordering_is_type_then_data() {
        let a = Key { type_value: 0x00, key: vec![0xff] };
        let b = Key { type_value: 0x01, key: vec![] };
        let c = Key { type_value: 0x01, key: vec![0x00] };
        assert!(a < b);
        assert!(b < c);
    }
}
