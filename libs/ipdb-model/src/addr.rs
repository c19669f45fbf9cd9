// Copyright 2025 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Fixed-width IP address values and their textual codec.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// IP protocol version; fixes the bit width of every address value and
/// interval belonging to a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    /// 32-bit addresses.
    V4,
    /// 128-bit addresses.
    V6,
}

impl IpVersion {
    /// Width of an address of this version, in bytes.
    pub const fn width(&self) -> usize {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 16,
        }
    }

    /// Width of an address of this version, in bits.
    pub const fn bits(&self) -> u32 {
        self.width() as u32 * 8
    }

    /// Largest value representable at this width.
    const fn max_value(&self) -> u128 {
        match self {
            IpVersion::V4 => u32::MAX as u128,
            IpVersion::V6 => u128::MAX,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "v4"),
            IpVersion::V6 => write!(f, "v6"),
        }
    }
}

/// Address text parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddrParseError {
    /// Wrong number of dot-separated octets in an IPv4 address.
    #[error("expected 4 dot-separated octets, got {0}")]
    WrongOctetCount(usize),
    /// An octet is not a decimal number in [0, 255].
    #[error("invalid octet `{0}`")]
    InvalidOctet(String),
    /// A colon-separated group is empty, longer than 4 digits, or not hex.
    #[error("invalid hex group `{0}`")]
    InvalidGroup(String),
    /// Group count does not add up to 16 bytes.
    #[error("expected 8 colon-separated groups, got {0}")]
    WrongGroupCount(usize),
    /// More than one `::` run in an IPv6 address.
    #[error("more than one `::` in address")]
    MultipleZeroRuns,
}

/// Errors converting raw integers or byte slices into address values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddrValueError {
    /// The integer needs more bytes than the version width allows.
    #[error("value {value:#x} does not fit a {version} address")]
    Overflow {
        /// Requested version.
        version: IpVersion,
        /// Value that did not fit.
        value: u128,
    },
    /// Byte slice length does not match the version width.
    #[error("expected {expected} bytes for a {version} address, got {got}")]
    WrongWidth {
        /// Requested version.
        version: IpVersion,
        /// Width the version requires.
        expected: usize,
        /// Length that was supplied.
        got: usize,
    },
}

/// A fixed-width unsigned address value.
///
/// The numeric value is held as a `u128` so that 128-bit addresses keep
/// full precision; the declared version bounds the usable width. The
/// derived ordering compares the version tag first and the numeric
/// value second, so same-version values order numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IpAddrValue {
    version: IpVersion,
    value: u128,
}

impl IpAddrValue {
    /// Parses the canonical textual form of an address.
    ///
    /// IPv4 is exactly four dot-separated decimal octets. IPv6 is
    /// colon-separated groups of 1-4 hex digits, eight groups in total;
    /// a single `::` run stands for the missing zero groups.
    pub fn parse(text: &str, version: IpVersion) -> Result<Self, AddrParseError> {
        let value = match version {
            IpVersion::V4 => parse_v4(text)?,
            IpVersion::V6 => parse_v6(text)?,
        };
        Ok(Self { version, value })
    }

    /// Creates an address value from its big-endian integer form.
    ///
    /// Fails with [AddrValueError::Overflow] if the value does not fit
    /// the version's width.
    pub const fn from_bits(version: IpVersion, value: u128) -> Result<Self, AddrValueError> {
        if value > version.max_value() {
            return Err(AddrValueError::Overflow { version, value });
        }
        Ok(Self { version, value })
    }

    /// Big-endian integer form of the address.
    pub const fn to_bits(&self) -> u128 {
        self.value
    }

    /// Creates an address value from its fixed-width big-endian byte form.
    ///
    /// The slice length must match the version width exactly; there is
    /// no implicit truncation or padding of stored bytes.
    pub fn from_bytes(version: IpVersion, bytes: &[u8]) -> Result<Self, AddrValueError> {
        if bytes.len() != version.width() {
            return Err(AddrValueError::WrongWidth {
                version,
                expected: version.width(),
                got: bytes.len(),
            });
        }
        let value = bytes.iter().fold(0u128, |acc, b| (acc << 8) | *b as u128);
        Ok(Self { version, value })
    }

    /// Fixed-width big-endian byte form of the address (4 or 16 bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.version {
            IpVersion::V4 => (self.value as u32).to_be_bytes().to_vec(),
            IpVersion::V6 => self.value.to_be_bytes().to_vec(),
        }
    }

    /// The version this value belongs to.
    pub const fn version(&self) -> IpVersion {
        self.version
    }
}

impl fmt::Display for IpAddrValue {
    /// Canonical textual form: decimal dotted octets for IPv4, eight
    /// zero-padded lowercase hex groups for IPv6.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            IpVersion::V4 => {
                let octets = (self.value as u32).to_be_bytes();
                write!(f, "{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
            }
            IpVersion::V6 => {
                for i in 0..8 {
                    if i > 0 {
                        write!(f, ":")?;
                    }
                    write!(f, "{:04x}", (self.value >> ((7 - i) * 16)) as u16)?;
                }
                Ok(())
            }
        }
    }
}

fn parse_v4(text: &str) -> Result<u128, AddrParseError> {
    let octets: Vec<&str> = text.split('.').collect();
    if octets.len() != 4 {
        return Err(AddrParseError::WrongOctetCount(octets.len()));
    }
    let mut value = 0u128;
    for octet in octets {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddrParseError::InvalidOctet(octet.to_string()));
        }
        let octet_value: u8 = octet
            .parse()
            .map_err(|_| AddrParseError::InvalidOctet(octet.to_string()))?;
        value = (value << 8) | octet_value as u128;
    }
    Ok(value)
}

fn parse_v6(text: &str) -> Result<u128, AddrParseError> {
    let groups = if let Some((head, tail)) = text.split_once("::") {
        if tail.contains("::") {
            return Err(AddrParseError::MultipleZeroRuns);
        }
        let head = parse_v6_groups(head)?;
        let tail = parse_v6_groups(tail)?;
        // The `::` run must stand for at least one zero group.
        if head.len() + tail.len() >= 8 {
            return Err(AddrParseError::WrongGroupCount(head.len() + tail.len()));
        }
        let mut groups = head;
        groups.resize(8 - tail.len(), 0);
        groups.extend(tail);
        groups
    } else {
        let groups = parse_v6_groups(text)?;
        if groups.len() != 8 {
            return Err(AddrParseError::WrongGroupCount(groups.len()));
        }
        groups
    };
    Ok(groups
        .into_iter()
        .fold(0u128, |acc, group| (acc << 16) | group as u128))
}

fn parse_v6_groups(text: &str) -> Result<Vec<u16>, AddrParseError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(':')
        .map(|group| {
            if group.is_empty()
                || group.len() > 4
                || !group.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(AddrParseError::InvalidGroup(group.to_string()));
            }
            u16::from_str_radix(group, 16).map_err(|_| AddrParseError::InvalidGroup(group.to_string()))
        })
        .collect()
}
