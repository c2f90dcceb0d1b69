// SPDX-License-Identifier: CC0-1.0

use core::fmt;

use bitcoin::consensus::encode;
use bitcoin::{ecdsa, secp256k1};

use crate::io;
use crate::raw;

/// A structural error while decoding or constructing a PSBT.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Serialized data does not start with the PSBT magic bytes.
    InvalidMagic,
    /// The byte stream ended in the middle of a record or map.
    Truncated,
    /// Signals that a map separator byte was read, no more key-value pairs follow.
    NoMorePairs,
    /// Keys within a key-value map must never repeat.
    DuplicateKey(raw::Key),
    /// Key should contain data.
    InvalidKeyDataEmpty(raw::Key),
    /// Key should not contain data.
    InvalidKeyDataNotEmpty(raw::Key),
    /// The number of input/output maps does not match the unsigned transaction.
    StructuralMismatch,
    /// An input map contains both a witness and a non-witness UTXO record.
    ConflictingUtxo,
    /// The global map must contain an unsigned transaction record.
    MissingUnsignedTx,
    /// The unsigned transaction has script sigs.
    UnsignedTxHasScriptSigs,
    /// The unsigned transaction has script witnesses.
    UnsignedTxHasScriptWitnesses,
    /// A record value parsed without consuming all of its bytes.
    PartialDataConsumption,
    /// Input or output index out of range for this PSBT.
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of maps present.
        length: usize,
    },
    /// Version record is malformed.
    Version(&'static str),
    /// Extended public key record is malformed.
    Xpub(&'static str),
    /// A public key failed to parse.
    InvalidPublicKey(bitcoin::key::FromSliceError),
    /// A secp256k1 public key failed to parse.
    InvalidSecp256k1PublicKey(secp256k1::Error),
    /// An ECDSA signature failed to parse.
    InvalidEcdsaSignature(ecdsa::Error),
    /// Bitcoin consensus encoding error.
    Consensus(encode::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;

        match *self {
            InvalidMagic => f.write_str("invalid magic"),
            Truncated => f.write_str("data ended before the map separator"),
            NoMorePairs => f.write_str("no more key-value pairs for this psbt map"),
            DuplicateKey(ref key) => write!(f, "duplicate key: {}", key),
            InvalidKeyDataEmpty(ref key) => write!(f, "key should contain data: {}", key),
            InvalidKeyDataNotEmpty(ref key) => write!(f, "key should not contain data: {}", key),
            StructuralMismatch =>
                f.write_str("map count does not match the unsigned transaction input/output count"),
            ConflictingUtxo => f.write_str("input map has both witness and non-witness UTXO"),
            MissingUnsignedTx => f.write_str("global map must have an unsigned transaction"),
            UnsignedTxHasScriptSigs => f.write_str("the unsigned transaction has script sigs"),
            UnsignedTxHasScriptWitnesses =>
                f.write_str("the unsigned transaction has script witnesses"),
            PartialDataConsumption =>
                f.write_str("data not consumed entirely when explicitly deserializing"),
            IndexOutOfBounds { index, length } =>
                write!(f, "index {} out of range for psbt with {} maps", index, length),
            Version(s) => write!(f, "version: {}", s),
            Xpub(s) => write!(f, "xpub: {}", s),
            InvalidPublicKey(ref e) => write_err!(f, "invalid public key"; e),
            InvalidSecp256k1PublicKey(ref e) => write_err!(f, "invalid secp256k1 public key"; e),
            InvalidEcdsaSignature(ref e) => write_err!(f, "invalid ECDSA signature"; e),
            Consensus(ref e) => write_err!(f, "bitcoin consensus encoding error"; e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match *self {
            InvalidPublicKey(ref e) => Some(e),
            InvalidSecp256k1PublicKey(ref e) => Some(e),
            InvalidEcdsaSignature(ref e) => Some(e),
            Consensus(ref e) => Some(e),
            InvalidMagic
            | Truncated
            | NoMorePairs
            | DuplicateKey(_)
            | InvalidKeyDataEmpty(_)
            | InvalidKeyDataNotEmpty(_)
            | StructuralMismatch
            | ConflictingUtxo
            | MissingUnsignedTx
            | UnsignedTxHasScriptSigs
            | UnsignedTxHasScriptWitnesses
            | PartialDataConsumption
            | IndexOutOfBounds { .. }
            | Version(_)
            | Xpub(_) => None,
        }
    }
}

impl From<encode::Error> for Error {
    fn from(e: encode::Error) -> Self {
        match e {
            encode::Error::Io(ref io_err) if io_err.kind() == io::ErrorKind::UnexpectedEof =>
                Error::Truncated,
            e => Error::Consensus(e),
        }
    }
}

/// An error resolving the funding UTXO of an input map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UtxoError {
    /// The prevout index is out of bounds for the referenced transaction's output list.
    OutOfBounds {
        /// The index used.
        index: usize,
        /// The length of the list.
        length: usize,
    },
    /// No UTXO record found.
    Missing,
}

impl fmt::Display for UtxoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use UtxoError::*;

        match *self {
            OutOfBounds { index, length } =>
                write!(f, "index {} out of bounds for list of length {}", index, length),
            Missing => write!(f, "no UTXO record found"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UtxoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use UtxoError::*;

        match *self {
            OutOfBounds { .. } | Missing => None,
        }
    }
}

/// Formats error.
///
/// If `std` feature is OFF appends error source (delimited by `: `). We do this because
/// `e.source()` is only available in std builds, without this macro the error source is lost for
/// no-std builds.
macro_rules! write_err {
    ($writer:expr, $string:literal $(, $args:expr)*; $source:expr) => {
        {
            #[cfg(feature = "std")]
            {
                let _ = &$source;   // Prevents clippy warnings.
                write!($writer, $string $(, $args)*)
            }
            #[cfg(not(feature = "std"))]
            {
                write!($writer, concat!($string, ": {}") $(, $args)*, $source)
            }
        }
    }
}
pub(crate) use write_err;
