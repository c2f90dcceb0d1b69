// SPDX-License-Identifier: CC0-1.0

//! The PSBT envelope.
//!
//! A [`Psbt`] is the outer container defined by BIP-174: the magic bytes, one global map, one
//! input map per unsigned transaction input, and one output map per unsigned transaction output.

use core::fmt;
use core::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bitcoin::hex::{self, FromHex};
use bitcoin::transaction::Transaction;

use crate::error::{write_err, UtxoError};
use crate::finalizer::{self, FinalizeError};
use crate::map::{GlobalMap, InputMap, Map, OutputMap};
use crate::prelude::*;
use crate::record::{GlobalRecord, InputRecord, OutputRecord};
use crate::Error;

/// The PSBT magic prefix: `psbt` followed by `0xff`.
const PSBT_MAGIC: &[u8] = b"psbt\xff";

/// A Partially Signed Bitcoin Transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Psbt {
    /// The global map.
    pub global: GlobalMap,
    /// The corresponding key-value map for each input in the unsigned transaction.
    pub inputs: Vec<InputMap>,
    /// The corresponding key-value map for each output in the unsigned transaction.
    pub outputs: Vec<OutputMap>,
}

impl Psbt {
    /// Creates a PSBT from an unsigned transaction: the global map holds the transaction, and
    /// every input and output gets an empty map.
    ///
    /// # Errors
    ///
    /// If the transaction is not unsigned.
    pub fn from_unsigned_tx(tx: Transaction) -> Result<Self, Error> {
        let input_count = tx.input.len();
        let output_count = tx.output.len();
        let global = GlobalMap::from_unsigned_tx(tx)?;

        Ok(Psbt {
            global,
            inputs: vec![InputMap::default(); input_count],
            outputs: vec![OutputMap::default(); output_count],
        })
    }

    /// Returns the unsigned transaction.
    pub fn unsigned_tx(&self) -> &Transaction { self.global.unsigned_tx() }

    /// Serialize as raw binary data.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();

        buf.extend_from_slice(PSBT_MAGIC);
        buf.extend(self.global.serialize_map());

        for input in &self.inputs {
            buf.extend(input.serialize_map());
        }

        for output in &self.outputs {
            buf.extend(output.serialize_map());
        }

        buf
    }

    /// Serialize as bytes in lower case hex.
    pub fn serialize_hex(&self) -> String { self.serialize().to_lower_hex_string() }

    /// Deserialize a PSBT from raw binary data.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.get(0..PSBT_MAGIC.len()) != Some(PSBT_MAGIC) {
            return Err(Error::InvalidMagic);
        }

        let mut d = &bytes[PSBT_MAGIC.len()..];

        let global = GlobalMap::decode(&mut d)?;

        let input_count = global.unsigned_tx().input.len();
        let mut inputs: Vec<InputMap> = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            if d.is_empty() {
                return Err(Error::StructuralMismatch);
            }
            inputs.push(InputMap::decode(&mut d)?);
        }

        let output_count = global.unsigned_tx().output.len();
        let mut outputs: Vec<OutputMap> = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            if d.is_empty() {
                return Err(Error::StructuralMismatch);
            }
            outputs.push(OutputMap::decode(&mut d)?);
        }

        if !d.is_empty() {
            return Err(Error::StructuralMismatch);
        }

        Ok(Psbt { global, inputs, outputs })
    }

    /// Combines this [`Psbt`] with `other` PSBT as described by BIP 174.
    ///
    /// In accordance with BIP 174 this function is commutative i.e., `A.combine(B) == B.combine(A)`.
    /// On key collisions the record of `self` is kept.
    pub fn combine(&mut self, other: Self) -> Result<(), CombineError> {
        if self.global.unsigned_tx() != other.global.unsigned_tx() {
            return Err(CombineError::UnexpectedUnsignedTx {
                expected: Box::new(self.global.unsigned_tx().clone()),
                actual: Box::new(other.global.unsigned_tx().clone()),
            });
        }

        self.global.combine(other.global);

        for (self_input, other_input) in self.inputs.iter_mut().zip(other.inputs.into_iter()) {
            self_input.combine(other_input);
        }

        for (self_output, other_output) in self.outputs.iter_mut().zip(other.outputs.into_iter()) {
            self_output.combine(other_output);
        }

        Ok(())
    }

    /// Finalizes the input at `index`, replacing its map with one carrying only UTXO records,
    /// unknown records, and the finalized scriptSig/scriptWitness.
    ///
    /// On error the input map is left untouched. Finalizing an already finalized input is a
    /// no-op.
    pub fn finalize_input(&mut self, index: usize) -> Result<(), FinalizeError> {
        let length = self.inputs.len();
        if index >= length {
            return Err(FinalizeError::IndexOutOfBounds { index, length });
        }

        let txin = &self.global.unsigned_tx().input[index];
        let finalized = finalizer::finalize_input_map(&self.inputs[index], txin)?;
        self.inputs[index] = finalized;
        Ok(())
    }

    /// Finalizes every input independently, returning the per-input results.
    ///
    /// A failed input keeps its original map; other inputs still finalize.
    pub fn finalize_all(&mut self) -> Vec<Result<(), FinalizeError>> {
        (0..self.inputs.len()).map(|index| self.finalize_input(index)).collect()
    }

    /// Returns `true` if every input carries a finalized scriptSig or scriptWitness.
    pub fn is_finalized(&self) -> bool { self.inputs.iter().all(InputMap::is_finalized) }

    /// Extracts the signed [`Transaction`] from a finalized PSBT.
    ///
    /// The extracted transaction copies version, locktime, prevouts, sequences, and outputs from
    /// the unsigned transaction; each input's scriptSig and witness come from its finalized
    /// records.
    ///
    /// # Errors
    ///
    /// [`ExtractError::NotFinalized`] if any input lacks a finalized record.
    pub fn extract_tx(self) -> Result<Transaction, ExtractError> {
        for (index, input) in self.inputs.iter().enumerate() {
            if !input.is_finalized() {
                return Err(ExtractError::NotFinalized { index });
            }
        }

        let mut tx = self.global.unsigned_tx().clone();
        for (txin, map) in tx.input.iter_mut().zip(self.inputs.iter()) {
            txin.script_sig = map.final_script_sig().map(ToOwned::to_owned).unwrap_or_default();
            txin.witness = map.final_script_witness().cloned().unwrap_or_default();
        }

        Ok(tx)
    }

    /// Replaces the non-witness UTXO record of the input at `index` with the equivalent witness
    /// UTXO when the spent output is segwit. See [`InputMap::compress`].
    pub fn compress_input(&mut self, index: usize) -> Result<(), UtxoError> {
        let length = self.inputs.len();
        if index >= length {
            return Err(UtxoError::OutOfBounds { index, length });
        }

        let txin = &self.global.unsigned_tx().input[index];
        let compressed = self.inputs[index].compress(txin)?;
        self.inputs[index] = compressed;
        Ok(())
    }

    /// Adds a record to the global map.
    pub fn add_global_record(&mut self, record: GlobalRecord) -> Result<(), Error> {
        self.global = self.global.with_record(record)?;
        Ok(())
    }

    /// Adds a record to the input map at `index`.
    pub fn add_input_record(&mut self, index: usize, record: InputRecord) -> Result<(), Error> {
        let length = self.inputs.len();
        let map = self.inputs.get(index).ok_or(Error::IndexOutOfBounds { index, length })?;
        let map = map.with_record(record)?;
        self.inputs[index] = map;
        Ok(())
    }

    /// Adds a record to the output map at `index`.
    pub fn add_output_record(&mut self, index: usize, record: OutputRecord) -> Result<(), Error> {
        let length = self.outputs.len();
        let map = self.outputs.get(index).ok_or(Error::IndexOutOfBounds { index, length })?;
        let map = map.with_record(record)?;
        self.outputs[index] = map;
        Ok(())
    }
}

impl fmt::Display for Psbt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", STANDARD.encode(self.serialize()))
    }
}

impl FromStr for Psbt {
    type Err = ParseError;

    /// Parses a PSBT from its text form.
    ///
    /// Accepts both lower/upper case hex and standard base64; the encoding is sniffed from the
    /// magic prefix (`70736274ff` vs. `cHNidP8`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.len() >= 10 && s.as_bytes()[..10].eq_ignore_ascii_case(b"70736274ff") {
            let bytes = Vec::<u8>::from_hex(s).map_err(ParseError::Hex)?;
            return Psbt::deserialize(&bytes).map_err(ParseError::Psbt);
        }

        let bytes = STANDARD.decode(s).map_err(ParseError::Base64)?;
        Psbt::deserialize(&bytes).map_err(ParseError::Psbt)
    }
}

/// An error parsing a PSBT from its text form.
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// Error decoding the hex form.
    Hex(hex::HexToBytesError),
    /// Error decoding the base64 form.
    Base64(base64::DecodeError),
    /// Error deserializing the decoded bytes.
    Psbt(Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseError::*;

        match *self {
            Hex(ref e) => write_err!(f, "error decoding hex"; e),
            Base64(ref e) => write_err!(f, "error decoding base64"; e),
            Psbt(ref e) => write_err!(f, "error deserializing PSBT"; e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ParseError::*;

        match *self {
            Hex(ref e) => Some(e),
            Base64(ref e) => Some(e),
            Psbt(ref e) => Some(e),
        }
    }
}

/// An error combining two PSBTs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CombineError {
    /// Attempted to combine PSBTs with different unsigned transactions.
    UnexpectedUnsignedTx {
        /// The unsigned transaction of the left operand.
        expected: Box<Transaction>,
        /// The unsigned transaction of the right operand.
        actual: Box<Transaction>,
    },
}

impl fmt::Display for CombineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CombineError::*;

        match *self {
            UnexpectedUnsignedTx { ref expected, ref actual } =>
                write!(f, "combine expected unsigned tx {:?} but got {:?}", expected, actual),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CombineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use CombineError::*;

        match *self {
            UnexpectedUnsignedTx { .. } => None,
        }
    }
}

/// An error extracting the signed transaction from a PSBT.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractError {
    /// An input carries neither a finalized scriptSig nor a finalized scriptWitness.
    NotFinalized {
        /// The first offending input index.
        index: usize,
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ExtractError::*;

        match *self {
            NotFinalized { index } => write!(f, "input {} is not finalized", index),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ExtractError::*;

        match *self {
            NotFinalized { .. } => None,
        }
    }
}
