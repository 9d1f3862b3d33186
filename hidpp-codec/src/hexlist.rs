//! Byte sequences as carried in HID++ frames

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodecError;

/// Owned byte sequence, displayed as contiguous upper-case hex
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexList(Vec<u8>);

impl HexList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Zero-filled sequence of `len` bytes
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Big-endian encoding of `value` on exactly `len` bytes
    pub fn from_int(value: u128, len: usize) -> Result<Self, CodecError> {
        let raw = value.to_be_bytes();
        if len < raw.len() {
            let (head, tail) = raw.split_at(raw.len() - len);
            if head.iter().any(|&b| b != 0) {
                return Err(CodecError::out_of_range(
                    "HexList",
                    format!("0x{value:X} does not fit in {len} bytes"),
                ));
            }
            Ok(Self(tail.to_vec()))
        } else {
            let mut out = vec![0u8; len - raw.len()];
            out.extend_from_slice(&raw);
            Ok(Self(out))
        }
    }

    /// Big-endian unsigned interpretation; `None` past 128 significant bits
    pub fn to_int(&self) -> Option<u128> {
        let first = self.0.iter().position(|&b| b != 0).unwrap_or(self.0.len());
        let significant = &self.0[first..];
        if significant.len() > 16 {
            return None;
        }
        Some(
            significant
                .iter()
                .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)),
        )
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn push(&mut self, byte: u8) {
        self.0.push(byte);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }
}

impl Deref for HexList {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for HexList {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HexList {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for HexList {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for HexList {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<HexList> for Vec<u8> {
    fn from(list: HexList) -> Self {
        list.0
    }
}

impl fmt::Display for HexList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl FromStr for HexList {
    type Err = CodecError;

    /// Accepts `"1101044040"`, `"11 01 04 40"` and an optional `0x` prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let digits: Vec<u8> = body
            .bytes()
            .filter(|b| !b.is_ascii_whitespace() && *b != b':')
            .collect();
        if digits.len() % 2 != 0 {
            return Err(CodecError::InvalidHex(s.to_string()));
        }
        digits
            .chunks(2)
            .map(|pair| {
                std::str::from_utf8(pair)
                    .ok()
                    .and_then(|text| u8::from_str_radix(text, 16).ok())
                    .ok_or_else(|| CodecError::InvalidHex(s.to_string()))
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Self)
    }
}

impl Serialize for HexList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HexList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Fixed-length bit set, bit 0 being the LSB of the last byte
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitStruct(HexList);

impl BitStruct {
    pub fn new(len: usize) -> Self {
        Self(HexList::zeros(len))
    }

    pub fn from_bytes(bytes: impl Into<HexList>) -> Self {
        Self(bytes.into())
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn test_bit(&self, bit: usize) -> bool {
        let Some(byte) = self.byte_index(bit) else {
            return false;
        };
        self.0[byte] & (1 << (bit % 8)) != 0
    }

    pub fn set_bit(&mut self, bit: usize, on: bool) -> Result<(), CodecError> {
        let byte = self.byte_index(bit).ok_or_else(|| {
            CodecError::out_of_range("BitStruct", format!("bit {bit} past {} bytes", self.len()))
        })?;
        if on {
            self.0 .0[byte] |= 1 << (bit % 8);
        } else {
            self.0 .0[byte] &= !(1 << (bit % 8));
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &HexList {
        &self.0
    }

    fn byte_index(&self, bit: usize) -> Option<usize> {
        let from_end = bit / 8;
        (from_end < self.len()).then(|| self.len() - 1 - from_end)
    }
}

impl fmt::Display for BitStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
