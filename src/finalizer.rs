// SPDX-License-Identifier: CC0-1.0

//! The Input Finalizer role.
//!
//! Resolves an input map's partial signatures and scripts into a finalized
//! scriptSig/scriptWitness pair by recursing over the spent output's [`ScriptTemplate`]. The
//! original map is never modified; finalization produces a replacement map carrying exactly the
//! UTXO records, unknown records, and the finalized records.

use core::fmt;

use bitcoin::blockdata::script::Instruction;
use bitcoin::key::PublicKey;
use bitcoin::opcodes::all::{OP_PUSHBYTES_0, OP_PUSHNUM_1, OP_PUSHNUM_16};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::{ecdsa, PubkeyHash, Script, ScriptBuf, TxIn, Witness};

use crate::error::{write_err, UtxoError};
use crate::map::InputMap;
use crate::prelude::*;
use crate::record::InputRecord;
use crate::template::{ScriptTemplate, TemplateKind, MAX_NESTING_DEPTH};

/// An error finalizing an input map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FinalizeError {
    /// Could not resolve the script pubkey being spent.
    Utxo(UtxoError),
    /// The spent output is P2SH but the map has no redeem script record.
    MissingRedeemScript,
    /// The spent output is P2WSH but the map has no witness script record.
    MissingWitnessScript,
    /// The redeem script record does not hash to the spent script pubkey.
    RedeemScriptMismatch,
    /// The witness script record does not hash to the witness program.
    WitnessScriptMismatch,
    /// The map does not carry enough partial signatures for this template.
    SignatureCount {
        /// Number of signatures the template requires.
        required: usize,
        /// Number of partial signature records present.
        got: usize,
    },
    /// A partial signature's public key does not appear in the multisig key list.
    UnknownSigner(PublicKey),
    /// The provided signatures do not fit any branch of the conditional.
    UnsatisfiableBranch,
    /// The template cannot be finalized.
    Unsupported(TemplateKind),
    /// Script nesting exceeds the supported depth.
    NestingTooDeep,
    /// Input index out of range for this PSBT.
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of input maps present.
        length: usize,
    },
    /// A script is too large to be pushed as a single element.
    OversizedScriptPush,
    /// A nested scriptSig contained a non-push opcode while lifting it into a witness.
    NonPushScriptSig,
    /// A script failed to parse.
    Script(bitcoin::blockdata::script::Error),
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use FinalizeError::*;

        match *self {
            Utxo(ref e) => write_err!(f, "could not resolve the spent script pubkey"; e),
            MissingRedeemScript => f.write_str("spending a P2SH output requires a redeem script record"),
            MissingWitnessScript =>
                f.write_str("spending a P2WSH output requires a witness script record"),
            RedeemScriptMismatch =>
                f.write_str("redeem script does not hash to the spent script pubkey"),
            WitnessScriptMismatch =>
                f.write_str("witness script does not hash to the witness program"),
            SignatureCount { required, got } =>
                write!(f, "template requires {} signature(s), {} provided", required, got),
            UnknownSigner(ref pk) =>
                write!(f, "signature public key {} is not part of the multisig key list", pk),
            UnsatisfiableBranch =>
                f.write_str("provided signatures do not fit any conditional branch"),
            Unsupported(kind) => write!(f, "cannot finalize a {} script", kind),
            NestingTooDeep => f.write_str("script nesting exceeds the supported depth"),
            IndexOutOfBounds { index, length } =>
                write!(f, "input index {} out of range for psbt with {} inputs", index, length),
            OversizedScriptPush =>
                f.write_str("script is too large to be pushed as a single element"),
            NonPushScriptSig =>
                f.write_str("nested scriptSig contains a non-push opcode"),
            Script(ref e) => write_err!(f, "script failed to parse"; e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FinalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use FinalizeError::*;

        match *self {
            Utxo(ref e) => Some(e),
            Script(ref e) => Some(e),
            MissingRedeemScript
            | MissingWitnessScript
            | RedeemScriptMismatch
            | WitnessScriptMismatch
            | SignatureCount { .. }
            | UnknownSigner(_)
            | UnsatisfiableBranch
            | Unsupported(_)
            | NestingTooDeep
            | IndexOutOfBounds { .. }
            | OversizedScriptPush
            | NonPushScriptSig => None,
        }
    }
}

impl From<UtxoError> for FinalizeError {
    fn from(e: UtxoError) -> Self { Self::Utxo(e) }
}

/// The resolved scriptSig/scriptWitness pair for one input.
struct Satisfaction {
    script_sig: ScriptBuf,
    witness: Option<Witness>,
}

/// Finalizes one input map against its unsigned transaction input.
///
/// Already finalized maps are returned unchanged. On error the original map is untouched.
pub(crate) fn finalize_input_map(map: &InputMap, txin: &TxIn) -> Result<InputMap, FinalizeError> {
    if map.is_finalized() {
        return Ok(map.clone());
    }

    let script_pubkey = map.spent_script_pubkey(txin)?;
    let template = ScriptTemplate::classify(script_pubkey);
    let sigs = map.partial_sigs();
    let satisfaction = satisfy(&template, &sigs, map, 0)?;

    let mut records: Vec<InputRecord> = map
        .records()
        .iter()
        .filter(|record| {
            matches!(
                record,
                InputRecord::NonWitnessUtxo(_)
                    | InputRecord::WitnessUtxo(_)
                    | InputRecord::Unknown { .. }
            )
        })
        .cloned()
        .collect();

    match satisfaction.witness {
        Some(witness) => {
            if !satisfaction.script_sig.is_empty() {
                records.push(InputRecord::FinalScriptSig(satisfaction.script_sig));
            }
            records.push(InputRecord::FinalScriptWitness(witness));
        }
        None => records.push(InputRecord::FinalScriptSig(satisfaction.script_sig)),
    }

    Ok(InputMap::from_records(records).expect("finalized records have unique keys"))
}

fn satisfy(
    template: &ScriptTemplate,
    sigs: &[(PublicKey, ecdsa::Signature)],
    map: &InputMap,
    depth: usize,
) -> Result<Satisfaction, FinalizeError> {
    use ScriptTemplate::*;

    if depth > MAX_NESTING_DEPTH {
        return Err(FinalizeError::NestingTooDeep);
    }

    match template {
        Empty => Ok(Satisfaction { script_sig: trivial_true_script_sig(), witness: None }),
        P2Pk { .. } => {
            let (_, sig) = exactly_one(sigs)?;
            Ok(Satisfaction { script_sig: p2pk_script_sig(&sig), witness: None })
        }
        P2Pkh { .. } => {
            let (pk, sig) = exactly_one(sigs)?;
            Ok(Satisfaction { script_sig: p2pkh_script_sig(&sig, &pk), witness: None })
        }
        MultiSig { required, pubkeys } => Ok(Satisfaction {
            script_sig: multisig_script_sig(*required, pubkeys, sigs)?,
            witness: None,
        }),
        P2Sh { script_hash } => {
            let redeem_script = map.redeem_script().ok_or(FinalizeError::MissingRedeemScript)?;
            if redeem_script.script_hash() != *script_hash {
                return Err(FinalizeError::RedeemScriptMismatch);
            }

            let nested_template = ScriptTemplate::classify(redeem_script);
            let nested = satisfy(&nested_template, sigs, map, depth + 1)?;
            Ok(Satisfaction {
                script_sig: p2sh_script_sig(&nested.script_sig, redeem_script)?,
                witness: nested.witness,
            })
        }
        P2Wpkh { .. } => {
            let (pk, sig) = exactly_one(sigs)?;
            Ok(Satisfaction {
                script_sig: ScriptBuf::new(),
                witness: Some(Witness::from_slice(&[sig.to_vec(), pk.to_bytes()])),
            })
        }
        P2Wsh { script_hash } => {
            let witness_script =
                map.witness_script().ok_or(FinalizeError::MissingWitnessScript)?;
            if witness_script.wscript_hash() != *script_hash {
                return Err(FinalizeError::WitnessScriptMismatch);
            }

            let nested_template = ScriptTemplate::classify(witness_script);
            let nested = satisfy(&nested_template, sigs, map, depth + 1)?;
            if nested.witness.is_some() {
                return Err(FinalizeError::Unsupported(nested_template.kind()));
            }

            Ok(Satisfaction {
                script_sig: ScriptBuf::new(),
                witness: Some(p2wsh_witness(&nested.script_sig, witness_script)?),
            })
        }
        Cltv { nested, .. } | Csv { nested, .. } => satisfy(nested, sigs, map, depth + 1),
        P2PkWithTimeout { pubkey, timeout_pubkey, .. } => {
            let (pk, sig) = exactly_one(sigs)?;
            let branch = if pk == *pubkey {
                true
            } else if pk == *timeout_pubkey {
                false
            } else {
                return Err(FinalizeError::UnsatisfiableBranch);
            };

            Ok(Satisfaction {
                script_sig: conditional_script_sig(&p2pk_script_sig(&sig), branch),
                witness: None,
            })
        }
        Conditional { .. } => satisfy_conditional(template, sigs, map, depth),
        WitnessCommitment | UnassignedWitness { .. } | NonStandard =>
            Err(FinalizeError::Unsupported(template.kind())),
    }
}

/// Resolves a conditional by flattening it into leaves and picking the first leaf whose signing
/// threshold is met by the provided signatures' key hashes.
fn satisfy_conditional(
    template: &ScriptTemplate,
    sigs: &[(PublicKey, ecdsa::Signature)],
    map: &InputMap,
    depth: usize,
) -> Result<Satisfaction, FinalizeError> {
    let mut leaves = Vec::new();
    flatten_leaves(template, Vec::new(), &mut leaves, depth)?;

    let provided: Vec<PubkeyHash> = sigs.iter().map(|(pk, _)| pk.pubkey_hash()).collect();

    let leaf = leaves
        .iter()
        .find(|leaf| {
            let matched =
                provided.iter().filter(|hash| leaf.key_hashes.contains(hash)).count();
            matched >= leaf.threshold
        })
        .ok_or(FinalizeError::UnsatisfiableBranch)?;

    let leaf_sigs: Vec<(PublicKey, ecdsa::Signature)> = sigs
        .iter()
        .filter(|(pk, _)| leaf.key_hashes.contains(&pk.pubkey_hash()))
        .copied()
        .collect();
    let nested = satisfy(&leaf.template, &leaf_sigs, map, depth + 1)?;

    let mut script_sig = nested.script_sig;
    for branch in leaf.path.iter().rev() {
        script_sig = conditional_script_sig(&script_sig, *branch);
    }

    Ok(Satisfaction { script_sig, witness: nested.witness })
}

/// One spendable leaf of a flattened conditional tree.
struct Leaf {
    /// Branch selectors from the root conditional down to this leaf.
    path: Vec<bool>,
    /// Number of `key_hashes` that must have a signature for this leaf to be chosen.
    threshold: usize,
    /// Hashes of the keys that can sign for this leaf.
    key_hashes: Vec<PubkeyHash>,
    /// The leaf script itself.
    template: ScriptTemplate,
}

fn flatten_leaves(
    template: &ScriptTemplate,
    path: Vec<bool>,
    leaves: &mut Vec<Leaf>,
    depth: usize,
) -> Result<(), FinalizeError> {
    use ScriptTemplate::*;

    if depth > MAX_NESTING_DEPTH {
        return Err(FinalizeError::NestingTooDeep);
    }

    match template {
        Conditional { when_true, when_false } => {
            let mut true_path = path.clone();
            true_path.push(true);
            flatten_leaves(when_true, true_path, leaves, depth + 1)?;

            let mut false_path = path;
            false_path.push(false);
            flatten_leaves(when_false, false_path, leaves, depth + 1)?;
        }
        P2PkWithTimeout { pubkey, timeout_pubkey, .. } => {
            let mut true_path = path.clone();
            true_path.push(true);
            leaves.push(Leaf {
                path: true_path,
                threshold: 1,
                key_hashes: vec![pubkey.pubkey_hash()],
                template: P2Pk { pubkey: *pubkey },
            });

            let mut false_path = path;
            false_path.push(false);
            leaves.push(Leaf {
                path: false_path,
                threshold: 1,
                key_hashes: vec![timeout_pubkey.pubkey_hash()],
                template: P2Pk { pubkey: *timeout_pubkey },
            });
        }
        Cltv { nested, .. } | Csv { nested, .. } =>
            flatten_leaves(nested, path, leaves, depth + 1)?,
        Empty => leaves.push(Leaf {
            path,
            threshold: 0,
            key_hashes: vec![],
            template: Empty,
        }),
        P2Pk { pubkey } => leaves.push(Leaf {
            path,
            threshold: 1,
            key_hashes: vec![pubkey.pubkey_hash()],
            template: template.clone(),
        }),
        P2Pkh { pubkey_hash } => leaves.push(Leaf {
            path,
            threshold: 1,
            key_hashes: vec![*pubkey_hash],
            template: template.clone(),
        }),
        MultiSig { required, pubkeys } => leaves.push(Leaf {
            path,
            threshold: *required,
            key_hashes: pubkeys.iter().map(PublicKey::pubkey_hash).collect(),
            template: template.clone(),
        }),
        P2Sh { .. } | P2Wpkh { .. } | P2Wsh { .. } | WitnessCommitment
        | UnassignedWitness { .. } | NonStandard =>
            return Err(FinalizeError::Unsupported(template.kind())),
    }

    Ok(())
}

fn exactly_one(
    sigs: &[(PublicKey, ecdsa::Signature)],
) -> Result<(PublicKey, ecdsa::Signature), FinalizeError> {
    match sigs {
        [only] => Ok(*only),
        _ => Err(FinalizeError::SignatureCount { required: 1, got: sigs.len() }),
    }
}

fn push_sig(sig: &ecdsa::Signature) -> PushBytesBuf {
    PushBytesBuf::try_from(sig.to_vec()).expect("ECDSA signatures are within push limits")
}

fn push_pubkey(pk: &PublicKey) -> PushBytesBuf {
    PushBytesBuf::try_from(pk.to_bytes()).expect("public keys are within push limits")
}

fn trivial_true_script_sig() -> ScriptBuf {
    Builder::new().push_opcode(OP_PUSHNUM_1).into_script()
}

fn p2pk_script_sig(sig: &ecdsa::Signature) -> ScriptBuf {
    Builder::new().push_slice(push_sig(sig)).into_script()
}

fn p2pkh_script_sig(sig: &ecdsa::Signature, pk: &PublicKey) -> ScriptBuf {
    Builder::new().push_slice(push_sig(sig)).push_slice(push_pubkey(pk)).into_script()
}

fn multisig_script_sig(
    required: usize,
    pubkeys: &[PublicKey],
    sigs: &[(PublicKey, ecdsa::Signature)],
) -> Result<ScriptBuf, FinalizeError> {
    if sigs.len() < required {
        return Err(FinalizeError::SignatureCount { required, got: sigs.len() });
    }

    let mut indexed: Vec<(usize, ecdsa::Signature)> = Vec::with_capacity(sigs.len());
    for (pk, sig) in sigs {
        let index = pubkeys
            .iter()
            .position(|candidate| candidate == pk)
            .ok_or(FinalizeError::UnknownSigner(*pk))?;
        indexed.push((index, *sig));
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.truncate(required);

    // The leading OP_0 feeds the extra element OP_CHECKMULTISIG pops.
    let mut builder = Builder::new().push_opcode(OP_PUSHBYTES_0);
    for (_, sig) in &indexed {
        builder = builder.push_slice(push_sig(sig));
    }
    Ok(builder.into_script())
}

fn p2sh_script_sig(nested: &Script, redeem_script: &Script) -> Result<ScriptBuf, FinalizeError> {
    let redeem_push = PushBytesBuf::try_from(redeem_script.to_bytes())
        .map_err(|_| FinalizeError::OversizedScriptPush)?;
    let push = Builder::new().push_slice(redeem_push).into_script();

    let mut bytes = nested.to_bytes();
    bytes.extend_from_slice(push.as_bytes());
    Ok(ScriptBuf::from_bytes(bytes))
}

/// Wraps a scriptSig with the selector push consumed by the conditional's `OP_IF`.
fn conditional_script_sig(nested: &Script, branch: bool) -> ScriptBuf {
    let selector = if branch { OP_PUSHNUM_1 } else { OP_PUSHBYTES_0 };
    let mut bytes = nested.to_bytes();
    bytes.push(selector.to_u8());
    ScriptBuf::from_bytes(bytes)
}

fn p2wsh_witness(nested: &Script, witness_script: &Script) -> Result<Witness, FinalizeError> {
    let mut items = witness_items(nested)?;
    items.push(witness_script.to_bytes());
    Ok(Witness::from_slice(&items))
}

/// Lifts a scriptSig made of pushes into witness stack items.
fn witness_items(script_sig: &Script) -> Result<Vec<Vec<u8>>, FinalizeError> {
    let mut items = Vec::new();
    for instruction in script_sig.instructions() {
        match instruction.map_err(FinalizeError::Script)? {
            Instruction::PushBytes(push) => items.push(push.as_bytes().to_vec()),
            Instruction::Op(op) => {
                let code = op.to_u8();
                if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&code) {
                    items.push(vec![code - OP_PUSHNUM_1.to_u8() + 1]);
                } else {
                    return Err(FinalizeError::NonPushScriptSig);
                }
            }
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use bitcoin::opcodes::all::{OP_CHECKSIG, OP_ELSE, OP_ENDIF, OP_IF};
    use bitcoin::secp256k1::{self, Secp256k1, SecretKey};
    use bitcoin::sighash::EcdsaSighashType;
    use bitcoin::{absolute, transaction, Amount, OutPoint, Sequence, Transaction, TxOut};

    use super::*;

    fn keypair(seed: u8) -> (SecretKey, PublicKey) {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        (sk, PublicKey::new(secp256k1::PublicKey::from_secret_key(&secp, &sk)))
    }

    fn dummy_sig(seed: u8) -> ecdsa::Signature {
        let secp = Secp256k1::new();
        let (sk, _) = keypair(seed);
        let msg = secp256k1::Message::from_digest_slice(&[0x42; 32]).unwrap();
        ecdsa::Signature { signature: secp.sign_ecdsa(&msg, &sk), sighash_type: EcdsaSighashType::All }
    }

    fn funding_tx(script_pubkey: ScriptBuf) -> (Transaction, TxIn) {
        let tx = Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![],
            output: vec![TxOut { value: Amount::from_sat(100_000), script_pubkey }],
        };
        let txin = TxIn {
            previous_output: OutPoint { txid: tx.txid(), vout: 0 },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        };
        (tx, txin)
    }

    #[test]
    fn finalize_p2pkh() {
        let (_, pk) = keypair(1);
        let sig = dummy_sig(1);
        let (tx, txin) = funding_tx(ScriptBuf::new_p2pkh(&pk.pubkey_hash()));

        let map = InputMap::from_records(vec![
            InputRecord::NonWitnessUtxo(tx),
            InputRecord::PartialSignature(pk, sig),
        ])
        .unwrap();

        let finalized = finalize_input_map(&map, &txin).unwrap();
        assert!(finalized.is_finalized());
        assert_eq!(finalized.final_script_sig(), Some(p2pkh_script_sig(&sig, &pk).as_script()));
        assert!(finalized.final_script_witness().is_none());
        // Only the UTXO record and the finalized record remain.
        assert_eq!(finalized.records().len(), 2);
    }

    #[test]
    fn finalize_p2pkh_requires_signature() {
        let (_, pk) = keypair(1);
        let (tx, txin) = funding_tx(ScriptBuf::new_p2pkh(&pk.pubkey_hash()));
        let map = InputMap::from_records(vec![InputRecord::NonWitnessUtxo(tx)]).unwrap();

        match finalize_input_map(&map, &txin) {
            Err(FinalizeError::SignatureCount { required: 1, got: 0 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn finalize_is_identity_on_finalized_input() {
        let (_, pk) = keypair(1);
        let sig = dummy_sig(1);
        let (tx, txin) = funding_tx(ScriptBuf::new_p2pkh(&pk.pubkey_hash()));
        let map = InputMap::from_records(vec![
            InputRecord::NonWitnessUtxo(tx),
            InputRecord::PartialSignature(pk, sig),
        ])
        .unwrap();

        let finalized = finalize_input_map(&map, &txin).unwrap();
        let again = finalize_input_map(&finalized, &txin).unwrap();
        assert_eq!(again, finalized);
    }

    #[test]
    fn finalize_missing_utxo() {
        let (_, pk) = keypair(1);
        let sig = dummy_sig(1);
        let (_tx, txin) = funding_tx(ScriptBuf::new_p2pkh(&pk.pubkey_hash()));
        let map =
            InputMap::from_records(vec![InputRecord::PartialSignature(pk, sig)]).unwrap();

        match finalize_input_map(&map, &txin) {
            Err(FinalizeError::Utxo(UtxoError::Missing)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn finalize_multisig_orders_by_key_index() {
        let (_, pk1) = keypair(1);
        let (_, pk2) = keypair(2);
        let (sig1, sig2) = (dummy_sig(1), dummy_sig(2));

        let redeem_script = Builder::new()
            .push_int(2)
            .push_key(&pk1)
            .push_key(&pk2)
            .push_int(2)
            .push_opcode(bitcoin::opcodes::all::OP_CHECKMULTISIG)
            .into_script();
        let (tx, txin) = funding_tx(ScriptBuf::new_p2sh(&redeem_script.script_hash()));

        // Records deliberately inserted with the second key first.
        let map = InputMap::from_records(vec![
            InputRecord::NonWitnessUtxo(tx),
            InputRecord::PartialSignature(pk2, sig2),
            InputRecord::PartialSignature(pk1, sig1),
            InputRecord::RedeemScript(redeem_script.clone()),
        ])
        .unwrap();

        let finalized = finalize_input_map(&map, &txin).unwrap();

        let mut expected = Builder::new()
            .push_opcode(OP_PUSHBYTES_0)
            .push_slice(push_sig(&sig1))
            .push_slice(push_sig(&sig2))
            .into_script()
            .to_bytes();
        expected.extend_from_slice(
            Builder::new()
                .push_slice(PushBytesBuf::try_from(redeem_script.to_bytes()).unwrap())
                .into_script()
                .as_bytes(),
        );
        assert_eq!(finalized.final_script_sig(), Some(ScriptBuf::from_bytes(expected).as_script()));
    }

    #[test]
    fn finalize_p2wpkh() {
        let (_, pk) = keypair(1);
        let sig = dummy_sig(1);
        let (tx, txin) = funding_tx(ScriptBuf::new_p2wpkh(&pk.wpubkey_hash().unwrap()));

        let map = InputMap::from_records(vec![
            InputRecord::WitnessUtxo(tx.output[0].clone()),
            InputRecord::PartialSignature(pk, sig),
        ])
        .unwrap();

        let finalized = finalize_input_map(&map, &txin).unwrap();
        assert!(finalized.final_script_sig().is_none());
        let witness = finalized.final_script_witness().unwrap();
        assert_eq!(witness.len(), 2);
        assert_eq!(witness.iter().next().unwrap(), sig.to_vec().as_slice());
    }

    #[test]
    fn finalize_p2pk_with_timeout_picks_branch_by_key() {
        let (_, pk) = keypair(1);
        let (_, timeout_pk) = keypair(2);
        let script = Builder::new()
            .push_opcode(OP_IF)
            .push_key(&pk)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ELSE)
            .push_int(500)
            .push_opcode(bitcoin::opcodes::all::OP_CLTV)
            .push_opcode(bitcoin::opcodes::all::OP_DROP)
            .push_key(&timeout_pk)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ENDIF)
            .into_script();
        let (tx, txin) = funding_tx(script);

        let timeout_sig = dummy_sig(2);
        let map = InputMap::from_records(vec![
            InputRecord::NonWitnessUtxo(tx),
            InputRecord::PartialSignature(timeout_pk, timeout_sig),
        ])
        .unwrap();

        let finalized = finalize_input_map(&map, &txin).unwrap();
        let expected = conditional_script_sig(&p2pk_script_sig(&timeout_sig), false);
        assert_eq!(finalized.final_script_sig(), Some(expected.as_script()));
    }

    #[test]
    fn finalize_p2pk_with_timeout_rejects_unknown_key() {
        let (_, pk) = keypair(1);
        let (_, timeout_pk) = keypair(2);
        let (_, stranger) = keypair(3);
        let script = Builder::new()
            .push_opcode(OP_IF)
            .push_key(&pk)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ELSE)
            .push_int(500)
            .push_opcode(bitcoin::opcodes::all::OP_CLTV)
            .push_opcode(bitcoin::opcodes::all::OP_DROP)
            .push_key(&timeout_pk)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ENDIF)
            .into_script();
        let (tx, txin) = funding_tx(script);

        let map = InputMap::from_records(vec![
            InputRecord::NonWitnessUtxo(tx),
            InputRecord::PartialSignature(stranger, dummy_sig(3)),
        ])
        .unwrap();

        match finalize_input_map(&map, &txin) {
            Err(FinalizeError::UnsatisfiableBranch) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn finalize_conditional_selects_leaf_by_signature_hashes() {
        let (_, pk_true) = keypair(1);
        let (_, pk_false) = keypair(2);
        let script = Builder::new()
            .push_opcode(OP_IF)
            .push_key(&pk_true)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ELSE)
            .push_key(&pk_false)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ENDIF)
            .into_script();
        let (tx, txin) = funding_tx(script);

        let sig = dummy_sig(2);
        let map = InputMap::from_records(vec![
            InputRecord::NonWitnessUtxo(tx),
            InputRecord::PartialSignature(pk_false, sig),
        ])
        .unwrap();

        let finalized = finalize_input_map(&map, &txin).unwrap();
        let expected = conditional_script_sig(&p2pk_script_sig(&sig), false);
        assert_eq!(finalized.final_script_sig(), Some(expected.as_script()));
    }

    #[test]
    fn finalize_conditional_multisig_at_threshold() {
        let (_, pk1) = keypair(1);
        let (_, pk2) = keypair(2);
        let (_, pk3) = keypair(3);
        let (_, pk_else) = keypair(4);

        // OP_IF <2-of-3 multisig> OP_ELSE <p2pk> OP_ENDIF
        let script = Builder::new()
            .push_opcode(OP_IF)
            .push_int(2)
            .push_key(&pk1)
            .push_key(&pk2)
            .push_key(&pk3)
            .push_int(3)
            .push_opcode(bitcoin::opcodes::all::OP_CHECKMULTISIG)
            .push_opcode(OP_ELSE)
            .push_key(&pk_else)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ENDIF)
            .into_script();
        let (tx, txin) = funding_tx(script);

        // Two of the three multisig keys sign; that meets the leaf's threshold.
        let (sig1, sig3) = (dummy_sig(1), dummy_sig(3));
        let map = InputMap::from_records(vec![
            InputRecord::NonWitnessUtxo(tx),
            InputRecord::PartialSignature(pk3, sig3),
            InputRecord::PartialSignature(pk1, sig1),
        ])
        .unwrap();

        let finalized = finalize_input_map(&map, &txin).unwrap();

        let multisig_sig = Builder::new()
            .push_opcode(OP_PUSHBYTES_0)
            .push_slice(push_sig(&sig1))
            .push_slice(push_sig(&sig3))
            .into_script();
        let expected = conditional_script_sig(&multisig_sig, true);
        assert_eq!(finalized.final_script_sig(), Some(expected.as_script()));
    }

    #[test]
    fn finalize_conditional_multisig_below_threshold_is_unsatisfiable() {
        let (_, pk1) = keypair(1);
        let (_, pk2) = keypair(2);
        let (_, pk_else) = keypair(4);

        let script = Builder::new()
            .push_opcode(OP_IF)
            .push_int(2)
            .push_key(&pk1)
            .push_key(&pk2)
            .push_int(2)
            .push_opcode(bitcoin::opcodes::all::OP_CHECKMULTISIG)
            .push_opcode(OP_ELSE)
            .push_key(&pk_else)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ENDIF)
            .into_script();
        let (tx, txin) = funding_tx(script);

        let map = InputMap::from_records(vec![
            InputRecord::NonWitnessUtxo(tx),
            InputRecord::PartialSignature(pk1, dummy_sig(1)),
        ])
        .unwrap();

        match finalize_input_map(&map, &txin) {
            Err(FinalizeError::UnsatisfiableBranch) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn finalize_non_standard_is_unsupported() {
        let script = Builder::new().push_opcode(bitcoin::opcodes::all::OP_DROP).into_script();
        let (tx, txin) = funding_tx(script);
        let map = InputMap::from_records(vec![InputRecord::NonWitnessUtxo(tx)]).unwrap();

        match finalize_input_map(&map, &txin) {
            Err(FinalizeError::Unsupported(TemplateKind::NonStandard)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn witness_items_lifts_op_zero_and_pushnums() {
        let script = Builder::new()
            .push_opcode(OP_PUSHBYTES_0)
            .push_slice(PushBytesBuf::try_from(vec![0xaa, 0xbb]).unwrap())
            .push_opcode(OP_PUSHNUM_1)
            .into_script();
        let items = witness_items(&script).unwrap();
        assert_eq!(items, vec![vec![], vec![0xaa, 0xbb], vec![0x01]]);
    }
}
