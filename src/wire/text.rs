//! Lazily decoded string field.
//!
//! A decoded string starts out as the raw bytes sliced from the source
//! buffer. The first `as_str` validates and converts them once and memoizes
//! the result; re-encoding an untouched field writes the raw bytes back
//! without converting at all.

use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};

use bytes::Bytes;

use super::constants::byte_list_encoded_size;
use crate::error::{CodecError, Result};

#[derive(Clone)]
enum Repr {
    Raw { bytes: Bytes, decoded: OnceCell<String> },
    Owned(String),
}

/// A string field held either as raw UTF-8 bytes or as a decoded `String`.
#[derive(Clone)]
pub struct Text {
    repr: Repr,
}

impl Text {
    /// Wrap raw bytes from the wire without validating them.
    pub fn from_raw(bytes: Bytes) -> Self {
        Self {
            repr: Repr::Raw {
                bytes,
                decoded: OnceCell::new(),
            },
        }
    }

    /// Borrow the string, converting from raw bytes on first access.
    pub fn as_str(&self) -> Result<&str> {
        match &self.repr {
            Repr::Owned(s) => Ok(s),
            Repr::Raw { bytes, decoded } => {
                if let Some(s) = decoded.get() {
                    return Ok(s);
                }
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| CodecError::InvalidUtf8)?
                    .to_owned();
                Ok(decoded.get_or_init(|| s))
            }
        }
    }

    /// Take the string out, converting if still raw.
    pub fn into_string(self) -> Result<String> {
        match self.repr {
            Repr::Owned(s) => Ok(s),
            Repr::Raw { bytes, decoded } => match decoded.into_inner() {
                Some(s) => Ok(s),
                None => String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8),
            },
        }
    }

    /// The UTF-8 bytes, without conversion.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.repr {
            Repr::Owned(s) => s.as_bytes(),
            Repr::Raw { bytes, .. } => bytes,
        }
    }

    /// Byte length of the UTF-8 encoding.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Check if the string is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the field is still held as unconverted wire bytes.
    pub fn is_raw(&self) -> bool {
        matches!(&self.repr, Repr::Raw { decoded, .. } if decoded.get().is_none())
    }

    /// Encoded size, length prefix included.
    #[inline]
    pub fn encoded_size(&self) -> usize {
        byte_list_encoded_size(self.len())
    }
}

impl Default for Text {
    fn default() -> Self {
        Self {
            repr: Repr::Owned(String::new()),
        }
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self {
            repr: Repr::Owned(value),
        }
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Text {}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Hash for Text {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.as_bytes()) {
            Ok(s) => fmt::Debug::fmt(s, f),
            Err(_) => write!(f, "Text({:?})", self.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_converts_once() {
        let text = Text::from_raw(Bytes::from_static(b"hello"));
        assert!(text.is_raw());
        let first = text.as_str().unwrap().as_ptr();
        assert!(!text.is_raw());
        let second = text.as_str().unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_owned_is_not_raw() {
        let text = Text::from("hi");
        assert!(!text.is_raw());
        assert_eq!(text.as_str().unwrap(), "hi");
    }

    #[test]
    fn test_invalid_utf8() {
        let text = Text::from_raw(Bytes::from_static(&[0xFF, 0xFE]));
        assert_eq!(text.as_str().unwrap_err(), CodecError::InvalidUtf8);
        assert_eq!(text.len(), 2);
    }

    #[test]
    fn test_equality_ignores_representation() {
        let raw = Text::from_raw(Bytes::from_static(b"same"));
        let owned = Text::from("same");
        assert_eq!(raw, owned);
        assert_eq!(raw, "same");
    }

    #[test]
    fn test_encoded_size() {
        assert_eq!(Text::from("abc").encoded_size(), 4);
        assert_eq!(Text::from("").encoded_size(), 1);
    }

    #[test]
    fn test_into_string() {
        let raw = Text::from_raw(Bytes::from_static(b"owned"));
        assert_eq!(raw.into_string().unwrap(), "owned");
    }
}
