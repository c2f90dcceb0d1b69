// SPDX-License-Identifier: CC0-1.0

//! Script pubkey template classification.
//!
//! Pattern matches a raw script pubkey into the closed set of spendable templates the finalizer
//! understands. Classification is purely syntactic; it never evaluates a script. Nested
//! templates (P2SH redeem scripts, witness scripts, timelock wrappers, conditional branches) are
//! classified recursively up to [`MAX_NESTING_DEPTH`].

use core::fmt;

use bitcoin::blockdata::script::Instruction;
use bitcoin::hashes::Hash as _;
use bitcoin::key::PublicKey;
use bitcoin::opcodes::all::{
    OP_CHECKMULTISIG, OP_CHECKSIG, OP_CLTV, OP_CSV, OP_DROP, OP_DUP, OP_ELSE, OP_ENDIF, OP_EQUAL,
    OP_EQUALVERIFY, OP_HASH160, OP_IF, OP_NOTIF, OP_PUSHNUM_1, OP_PUSHNUM_16, OP_PUSHNUM_NEG1,
};
use bitcoin::opcodes::Opcode;
use bitcoin::{PubkeyHash, Script, ScriptHash, WPubkeyHash, WScriptHash};

use crate::prelude::*;

/// Maximum nesting depth of timelock wrappers and conditional branches the classifier and the
/// finalizer will traverse.
pub const MAX_NESTING_DEPTH: usize = 10;

/// The magic prefix of a segwit commitment output: `aa21a9ed`.
const WITNESS_COMMITMENT_HEADER: [u8; 4] = [0xaa, 0x21, 0xa9, 0xed];

/// A script pubkey classified into one of the spendable templates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScriptTemplate {
    /// The empty script, trivially spendable.
    Empty,
    /// `<pubkey> OP_CHECKSIG`.
    P2Pk {
        /// The public key the signature must verify against.
        pubkey: PublicKey,
    },
    /// `OP_DUP OP_HASH160 <hash160(pubkey)> OP_EQUALVERIFY OP_CHECKSIG`.
    P2Pkh {
        /// Hash of the public key the signature must verify against.
        pubkey_hash: PubkeyHash,
    },
    /// `OP_m <pubkey>* OP_n OP_CHECKMULTISIG`.
    MultiSig {
        /// Number of signatures required.
        required: usize,
        /// The public keys, in script order.
        pubkeys: Vec<PublicKey>,
    },
    /// `OP_HASH160 <hash160(redeem script)> OP_EQUAL`.
    P2Sh {
        /// Hash of the redeem script.
        script_hash: ScriptHash,
    },
    /// Version-zero witness program committing to a public key hash.
    P2Wpkh {
        /// Hash of the public key.
        pubkey_hash: WPubkeyHash,
    },
    /// Version-zero witness program committing to a witness script.
    P2Wsh {
        /// SHA-256 of the witness script.
        script_hash: WScriptHash,
    },
    /// `<locktime> OP_CHECKLOCKTIMEVERIFY OP_DROP <nested>`.
    Cltv {
        /// The raw locktime value.
        locktime: i64,
        /// The script following the timelock guard.
        nested: Box<ScriptTemplate>,
    },
    /// `<locktime> OP_CHECKSEQUENCEVERIFY OP_DROP <nested>`.
    Csv {
        /// The raw relative locktime value.
        locktime: i64,
        /// The script following the timelock guard.
        nested: Box<ScriptTemplate>,
    },
    /// A two-key template spendable by `pubkey` at any time and by `timeout_pubkey` once the
    /// timelock passes.
    ///
    /// `OP_IF <pubkey> OP_CHECKSIG OP_ELSE <locktime> OP_CLTV/OP_CSV OP_DROP <timeout_pubkey>
    /// OP_CHECKSIG OP_ENDIF`.
    P2PkWithTimeout {
        /// The key of the before-timeout branch.
        pubkey: PublicKey,
        /// The raw locktime value guarding the timeout branch.
        locktime: i64,
        /// The key of the after-timeout branch.
        timeout_pubkey: PublicKey,
    },
    /// `OP_IF <true branch> OP_ELSE <false branch> OP_ENDIF` with both branches themselves
    /// spendable templates.
    Conditional {
        /// The branch taken when the spender pushes true.
        when_true: Box<ScriptTemplate>,
        /// The branch taken when the spender pushes false.
        when_false: Box<ScriptTemplate>,
    },
    /// An `OP_RETURN` output carrying a segwit commitment; never spendable.
    WitnessCommitment,
    /// A witness program whose version or program length has no assigned meaning.
    UnassignedWitness {
        /// The witness version, 0 through 16.
        version: u8,
        /// The raw program bytes.
        program: Vec<u8>,
    },
    /// Anything that matches no other template.
    NonStandard,
}

impl ScriptTemplate {
    /// Classifies a script pubkey.
    pub fn classify(script: &Script) -> ScriptTemplate {
        let bytes = script.as_bytes();

        if bytes.is_empty() {
            return ScriptTemplate::Empty;
        }

        if script.is_op_return()
            && bytes.len() >= 38
            && bytes[1] == 0x24
            && bytes[2..6] == WITNESS_COMMITMENT_HEADER
        {
            return ScriptTemplate::WitnessCommitment;
        }

        if script.is_p2wpkh() {
            let hash: [u8; 20] =
                bytes[2..22].try_into().expect("p2wpkh program is 20 bytes");
            return ScriptTemplate::P2Wpkh { pubkey_hash: WPubkeyHash::from_byte_array(hash) };
        }

        if script.is_p2wsh() {
            let hash: [u8; 32] =
                bytes[2..34].try_into().expect("p2wsh program is 32 bytes");
            return ScriptTemplate::P2Wsh { script_hash: WScriptHash::from_byte_array(hash) };
        }

        if script.is_witness_program() {
            let version = match bytes[0] {
                0x00 => 0,
                v => v - OP_PUSHNUM_1.to_u8() + 1,
            };
            return ScriptTemplate::UnassignedWitness { version, program: bytes[2..].to_vec() };
        }

        let instructions = match script.instructions().collect::<Result<Vec<_>, _>>() {
            Ok(instructions) => instructions,
            Err(_) => return ScriptTemplate::NonStandard,
        };

        classify_instructions(&instructions, 0)
    }

    /// Returns the kind discriminant of this template.
    pub fn kind(&self) -> TemplateKind {
        use ScriptTemplate::*;

        match *self {
            Empty => TemplateKind::Empty,
            P2Pk { .. } => TemplateKind::P2Pk,
            P2Pkh { .. } => TemplateKind::P2Pkh,
            MultiSig { .. } => TemplateKind::MultiSig,
            P2Sh { .. } => TemplateKind::P2Sh,
            P2Wpkh { .. } => TemplateKind::P2Wpkh,
            P2Wsh { .. } => TemplateKind::P2Wsh,
            Cltv { .. } => TemplateKind::Cltv,
            Csv { .. } => TemplateKind::Csv,
            P2PkWithTimeout { .. } => TemplateKind::P2PkWithTimeout,
            Conditional { .. } => TemplateKind::Conditional,
            WitnessCommitment => TemplateKind::WitnessCommitment,
            UnassignedWitness { .. } => TemplateKind::UnassignedWitness,
            NonStandard => TemplateKind::NonStandard,
        }
    }
}

/// The kind of a [`ScriptTemplate`], without its payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TemplateKind {
    /// See [`ScriptTemplate::Empty`].
    Empty,
    /// See [`ScriptTemplate::P2Pk`].
    P2Pk,
    /// See [`ScriptTemplate::P2Pkh`].
    P2Pkh,
    /// See [`ScriptTemplate::MultiSig`].
    MultiSig,
    /// See [`ScriptTemplate::P2Sh`].
    P2Sh,
    /// See [`ScriptTemplate::P2Wpkh`].
    P2Wpkh,
    /// See [`ScriptTemplate::P2Wsh`].
    P2Wsh,
    /// See [`ScriptTemplate::Cltv`].
    Cltv,
    /// See [`ScriptTemplate::Csv`].
    Csv,
    /// See [`ScriptTemplate::P2PkWithTimeout`].
    P2PkWithTimeout,
    /// See [`ScriptTemplate::Conditional`].
    Conditional,
    /// See [`ScriptTemplate::WitnessCommitment`].
    WitnessCommitment,
    /// See [`ScriptTemplate::UnassignedWitness`].
    UnassignedWitness,
    /// See [`ScriptTemplate::NonStandard`].
    NonStandard,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TemplateKind::*;

        let s = match *self {
            Empty => "empty",
            P2Pk => "p2pk",
            P2Pkh => "p2pkh",
            MultiSig => "multisig",
            P2Sh => "p2sh",
            P2Wpkh => "p2wpkh",
            P2Wsh => "p2wsh",
            Cltv => "cltv",
            Csv => "csv",
            P2PkWithTimeout => "p2pk-with-timeout",
            Conditional => "conditional",
            WitnessCommitment => "witness-commitment",
            UnassignedWitness => "unassigned-witness",
            NonStandard => "non-standard",
        };
        f.write_str(s)
    }
}

fn classify_instructions(ins: &[Instruction], depth: usize) -> ScriptTemplate {
    if depth > MAX_NESTING_DEPTH {
        return ScriptTemplate::NonStandard;
    }

    if ins.is_empty() {
        return ScriptTemplate::Empty;
    }

    if let Some(template) = as_p2pkh(ins) {
        return template;
    }
    if let Some(template) = as_p2sh(ins) {
        return template;
    }
    if let Some(template) = as_p2pk(ins) {
        return template;
    }
    if let Some(template) = as_multisig(ins) {
        return template;
    }
    if let Some(template) = as_timelock(ins, depth) {
        return template;
    }
    if let Some(template) = as_p2pk_with_timeout(ins) {
        return template;
    }
    if let Some(template) = as_conditional(ins, depth) {
        return template;
    }

    ScriptTemplate::NonStandard
}

fn is_op(ins: &Instruction, op: Opcode) -> bool {
    matches!(ins, Instruction::Op(o) if *o == op)
}

fn push_bytes<'a>(ins: &'a Instruction) -> Option<&'a [u8]> {
    match ins {
        Instruction::PushBytes(push) => Some(push.as_bytes()),
        Instruction::Op(_) => None,
    }
}

fn push_key(ins: &Instruction) -> Option<PublicKey> {
    let bytes = push_bytes(ins)?;
    if bytes.len() != 33 && bytes.len() != 65 {
        return None;
    }
    PublicKey::from_slice(bytes).ok()
}

/// Reads a push as a script number: minimal signed-magnitude little-endian, at most 4 bytes,
/// with `OP_PUSHNUM` opcodes accepted as their literal values.
fn push_num(ins: &Instruction) -> Option<i64> {
    match ins {
        Instruction::PushBytes(push) => {
            let v = push.as_bytes();
            let len = v.len();
            if len == 0 {
                return Some(0);
            }
            if len > 4 {
                return None;
            }

            let (mut ret, sh) =
                v.iter().fold((0, 0), |(acc, sh), n| (acc + ((*n as i64) << sh), sh + 8));
            if v[len - 1] & 0x80 != 0 {
                ret &= (1 << (sh - 1)) - 1;
                ret = -ret;
            }
            Some(ret)
        }
        Instruction::Op(op) => {
            let code = op.to_u8();
            if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&code) {
                Some((code - OP_PUSHNUM_1.to_u8() + 1) as i64)
            } else if *op == OP_PUSHNUM_NEG1 {
                Some(-1)
            } else {
                None
            }
        }
    }
}

fn as_p2pkh(ins: &[Instruction]) -> Option<ScriptTemplate> {
    match ins {
        [a, b, c, d, e]
            if is_op(a, OP_DUP)
                && is_op(b, OP_HASH160)
                && is_op(d, OP_EQUALVERIFY)
                && is_op(e, OP_CHECKSIG) =>
        {
            let hash: [u8; 20] = push_bytes(c)?.try_into().ok()?;
            Some(ScriptTemplate::P2Pkh { pubkey_hash: PubkeyHash::from_byte_array(hash) })
        }
        _ => None,
    }
}

fn as_p2sh(ins: &[Instruction]) -> Option<ScriptTemplate> {
    match ins {
        [a, b, c] if is_op(a, OP_HASH160) && is_op(c, OP_EQUAL) => {
            let hash: [u8; 20] = push_bytes(b)?.try_into().ok()?;
            Some(ScriptTemplate::P2Sh { script_hash: ScriptHash::from_byte_array(hash) })
        }
        _ => None,
    }
}

fn as_p2pk(ins: &[Instruction]) -> Option<ScriptTemplate> {
    match ins {
        [key, op] if is_op(op, OP_CHECKSIG) =>
            Some(ScriptTemplate::P2Pk { pubkey: push_key(key)? }),
        _ => None,
    }
}

fn as_multisig(ins: &[Instruction]) -> Option<ScriptTemplate> {
    if ins.len() < 3 || !is_op(ins.last()?, OP_CHECKMULTISIG) {
        return None;
    }

    let required = push_num(&ins[0])?;
    let total = push_num(&ins[ins.len() - 2])?;
    let key_ins = &ins[1..ins.len() - 2];

    if required < 0 || total < 1 || required > total || key_ins.len() != total as usize {
        return None;
    }

    let mut pubkeys = Vec::with_capacity(key_ins.len());
    for key in key_ins {
        pubkeys.push(push_key(key)?);
    }

    Some(ScriptTemplate::MultiSig { required: required as usize, pubkeys })
}

fn as_timelock(ins: &[Instruction], depth: usize) -> Option<ScriptTemplate> {
    if ins.len() < 4 {
        return None;
    }

    let locktime = push_num(&ins[0])?;
    if !is_op(&ins[2], OP_DROP) {
        return None;
    }
    let nested = Box::new(classify_instructions(&ins[3..], depth + 1));

    if is_op(&ins[1], OP_CLTV) {
        Some(ScriptTemplate::Cltv { locktime, nested })
    } else if is_op(&ins[1], OP_CSV) {
        Some(ScriptTemplate::Csv { locktime, nested })
    } else {
        None
    }
}

fn as_p2pk_with_timeout(ins: &[Instruction]) -> Option<ScriptTemplate> {
    match ins {
        [a, key, b, c, lock, tl, d, timeout_key, e, f]
            if is_op(a, OP_IF)
                && is_op(b, OP_CHECKSIG)
                && is_op(c, OP_ELSE)
                && (is_op(tl, OP_CLTV) || is_op(tl, OP_CSV))
                && is_op(d, OP_DROP)
                && is_op(e, OP_CHECKSIG)
                && is_op(f, OP_ENDIF) =>
        {
            Some(ScriptTemplate::P2PkWithTimeout {
                pubkey: push_key(key)?,
                locktime: push_num(lock)?,
                timeout_pubkey: push_key(timeout_key)?,
            })
        }
        _ => None,
    }
}

fn as_conditional(ins: &[Instruction], depth: usize) -> Option<ScriptTemplate> {
    if ins.len() < 5 || !is_op(&ins[0], OP_IF) || !is_op(ins.last()?, OP_ENDIF) {
        return None;
    }

    // Find the OP_ELSE belonging to the opening OP_IF.
    let body = &ins[1..ins.len() - 1];
    let mut nesting = 0usize;
    let mut split = None;
    for (i, item) in body.iter().enumerate() {
        if is_op(item, OP_IF) || is_op(item, OP_NOTIF) {
            nesting += 1;
        } else if is_op(item, OP_ENDIF) {
            nesting = nesting.checked_sub(1)?;
        } else if is_op(item, OP_ELSE) && nesting == 0 {
            split = Some(i);
            break;
        }
    }
    let split = split?;

    let (when_true, when_false) = (&body[..split], &body[split + 1..]);
    if when_true.is_empty() || when_false.is_empty() {
        return None;
    }

    Some(ScriptTemplate::Conditional {
        when_true: Box::new(classify_instructions(when_true, depth + 1)),
        when_false: Box::new(classify_instructions(when_false, depth + 1)),
    })
}

#[cfg(test)]
mod tests {
    use bitcoin::opcodes::all::OP_RETURN;
    use bitcoin::script::{Builder, PushBytesBuf};
    use bitcoin::secp256k1;

    use super::*;

    fn key(seed: u8) -> PublicKey {
        let secp = secp256k1::Secp256k1::new();
        let sk = secp256k1::SecretKey::from_slice(&[seed; 32]).unwrap();
        PublicKey::new(secp256k1::PublicKey::from_secret_key(&secp, &sk))
    }

    fn multisig_script(required: i64, keys: &[PublicKey]) -> bitcoin::ScriptBuf {
        let mut builder = Builder::new().push_int(required);
        for key in keys {
            builder = builder.push_key(key);
        }
        builder.push_int(keys.len() as i64).push_opcode(OP_CHECKMULTISIG).into_script()
    }

    #[test]
    fn classify_empty() {
        assert_eq!(ScriptTemplate::classify(&bitcoin::ScriptBuf::new()), ScriptTemplate::Empty);
    }

    #[test]
    fn classify_p2pkh() {
        let pk = key(1);
        let script = bitcoin::ScriptBuf::new_p2pkh(&pk.pubkey_hash());
        assert_eq!(
            ScriptTemplate::classify(&script),
            ScriptTemplate::P2Pkh { pubkey_hash: pk.pubkey_hash() }
        );
    }

    #[test]
    fn classify_p2pk() {
        let pk = key(1);
        let script = Builder::new().push_key(&pk).push_opcode(OP_CHECKSIG).into_script();
        assert_eq!(ScriptTemplate::classify(&script), ScriptTemplate::P2Pk { pubkey: pk });
    }

    #[test]
    fn classify_multisig() {
        let keys = [key(1), key(2), key(3)];
        let script = multisig_script(2, &keys);
        match ScriptTemplate::classify(&script) {
            ScriptTemplate::MultiSig { required: 2, pubkeys } => {
                assert_eq!(pubkeys, keys);
            }
            other => panic!("unexpected template: {:?}", other),
        }
    }

    #[test]
    fn classify_zero_of_n_multisig() {
        let keys = [key(1)];
        let script = multisig_script(0, &keys);
        match ScriptTemplate::classify(&script) {
            ScriptTemplate::MultiSig { required: 0, .. } => {}
            other => panic!("unexpected template: {:?}", other),
        }
    }

    #[test]
    fn classify_p2sh() {
        let redeem = multisig_script(1, &[key(1)]);
        let script = bitcoin::ScriptBuf::new_p2sh(&redeem.script_hash());
        assert_eq!(
            ScriptTemplate::classify(&script),
            ScriptTemplate::P2Sh { script_hash: redeem.script_hash() }
        );
    }

    #[test]
    fn classify_witness_programs() {
        let pk = key(1);
        let p2wpkh = bitcoin::ScriptBuf::new_p2wpkh(&pk.wpubkey_hash().unwrap());
        assert!(matches!(ScriptTemplate::classify(&p2wpkh), ScriptTemplate::P2Wpkh { .. }));

        let witness_script = multisig_script(1, &[pk]);
        let p2wsh = bitcoin::ScriptBuf::new_p2wsh(&witness_script.wscript_hash());
        assert!(matches!(ScriptTemplate::classify(&p2wsh), ScriptTemplate::P2Wsh { .. }));
    }

    #[test]
    fn classify_unassigned_witness() {
        let program = PushBytesBuf::try_from(vec![0x11u8; 32]).unwrap();
        let script = Builder::new()
            .push_opcode(OP_PUSHNUM_1)
            .push_slice(program)
            .into_script();
        match ScriptTemplate::classify(&script) {
            ScriptTemplate::UnassignedWitness { version: 1, program } => {
                assert_eq!(program, vec![0x11u8; 32]);
            }
            other => panic!("unexpected template: {:?}", other),
        }
    }

    #[test]
    fn classify_cltv() {
        let pk = key(1);
        let script = Builder::new()
            .push_int(1_000)
            .push_opcode(OP_CLTV)
            .push_opcode(OP_DROP)
            .push_key(&pk)
            .push_opcode(OP_CHECKSIG)
            .into_script();
        match ScriptTemplate::classify(&script) {
            ScriptTemplate::Cltv { locktime: 1_000, nested } => {
                assert_eq!(*nested, ScriptTemplate::P2Pk { pubkey: pk });
            }
            other => panic!("unexpected template: {:?}", other),
        }
    }

    #[test]
    fn classify_csv() {
        let pk = key(1);
        let script = Builder::new()
            .push_int(5)
            .push_opcode(OP_CSV)
            .push_opcode(OP_DROP)
            .push_key(&pk)
            .push_opcode(OP_CHECKSIG)
            .into_script();
        assert!(matches!(ScriptTemplate::classify(&script), ScriptTemplate::Csv { locktime: 5, .. }));
    }

    #[test]
    fn classify_p2pk_with_timeout() {
        let (pk, timeout_pk) = (key(1), key(2));
        let script = Builder::new()
            .push_opcode(OP_IF)
            .push_key(&pk)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ELSE)
            .push_int(500)
            .push_opcode(OP_CLTV)
            .push_opcode(OP_DROP)
            .push_key(&timeout_pk)
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ENDIF)
            .into_script();
        assert_eq!(
            ScriptTemplate::classify(&script),
            ScriptTemplate::P2PkWithTimeout { pubkey: pk, locktime: 500, timeout_pubkey: timeout_pk }
        );
    }

    #[test]
    fn classify_conditional() {
        let keys = [key(1), key(2)];
        let script = Builder::new()
            .push_opcode(OP_IF)
            .push_key(&keys[0])
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ELSE)
            .push_key(&keys[1])
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_ENDIF)
            .into_script();
        match ScriptTemplate::classify(&script) {
            ScriptTemplate::Conditional { when_true, when_false } => {
                assert_eq!(*when_true, ScriptTemplate::P2Pk { pubkey: keys[0] });
                assert_eq!(*when_false, ScriptTemplate::P2Pk { pubkey: keys[1] });
            }
            other => panic!("unexpected template: {:?}", other),
        }
    }

    #[test]
    fn unbalanced_conditional_is_non_standard() {
        let script = Builder::new()
            .push_opcode(OP_IF)
            .push_opcode(OP_ENDIF)
            .push_opcode(OP_IF)
            .push_opcode(OP_ELSE)
            .push_opcode(OP_ENDIF)
            .into_script();
        assert_eq!(ScriptTemplate::classify(&script), ScriptTemplate::NonStandard);
    }

    #[test]
    fn classify_witness_commitment() {
        let mut commitment = PushBytesBuf::new();
        commitment.extend_from_slice(&WITNESS_COMMITMENT_HEADER).unwrap();
        commitment.extend_from_slice(&[0x42u8; 32]).unwrap();
        let script = Builder::new().push_opcode(OP_RETURN).push_slice(commitment).into_script();
        assert_eq!(ScriptTemplate::classify(&script), ScriptTemplate::WitnessCommitment);
    }

    #[test]
    fn classify_non_standard() {
        let script = Builder::new().push_opcode(OP_DROP).into_script();
        assert_eq!(ScriptTemplate::classify(&script), ScriptTemplate::NonStandard);
    }

    #[test]
    fn deep_conditional_nesting_is_bounded() {
        let pk = key(1);
        let mut script = Builder::new().push_key(&pk).push_opcode(OP_CHECKSIG).into_script();
        for _ in 0..(MAX_NESTING_DEPTH + 2) {
            let mut builder = Builder::new().push_opcode(OP_IF);
            for ins in script.instructions() {
                builder = match ins.unwrap() {
                    Instruction::Op(op) => builder.push_opcode(op),
                    Instruction::PushBytes(push) => {
                        builder.push_slice(PushBytesBuf::try_from(push.as_bytes().to_vec()).unwrap())
                    }
                };
            }
            script = builder
                .push_opcode(OP_ELSE)
                .push_key(&pk)
                .push_opcode(OP_CHECKSIG)
                .push_opcode(OP_ENDIF)
                .into_script();
        }

        // The tree is deeper than the traversal bound, so somewhere below the root a branch
        // degrades to non-standard.
        fn contains_non_standard(t: &ScriptTemplate) -> bool {
            match t {
                ScriptTemplate::Conditional { when_true, when_false } =>
                    contains_non_standard(when_true) || contains_non_standard(when_false),
                ScriptTemplate::NonStandard => true,
                _ => false,
            }
        }
        assert!(contains_non_standard(&ScriptTemplate::classify(&script)));
    }
}
