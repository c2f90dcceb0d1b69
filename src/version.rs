// SPDX-License-Identifier: CC0-1.0

use core::fmt;

use bitcoin::consensus::encode as consensus;

use crate::prelude::Vec;
use crate::serialize::{self, Deserialize, Serialize};
use crate::Error;

/// The PSBT version number.
///
/// A PSBT with no version record is version zero, the original format from [BIP-174].
///
/// [BIP-174]: <https://github.com/bitcoin/bips/blob/master/bip-0174.mediawiki>
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version(u32);

impl Version {
    /// The original PSBT format version.
    pub const ZERO: Self = Self(0);

    /// Returns the version number as a `u32`.
    pub fn to_u32(self) -> u32 { self.0 }
}

impl From<u32> for Version {
    fn from(n: u32) -> Self { Version(n) }
}

impl From<Version> for u32 {
    fn from(v: Version) -> u32 { v.to_u32() }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

impl Serialize for Version {
    fn serialize(&self) -> Vec<u8> { consensus::serialize(&self.to_u32()) }
}

impl Deserialize for Version {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let n = serialize::deserialize_u32(bytes)?;
        Ok(Version(n))
    }
}
