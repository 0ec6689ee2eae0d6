//! Lazily decoded nested objects.

use std::cell::OnceCell;
use std::fmt;

use bytes::Bytes;

use crate::error::Result;
use crate::wire::{Deserializer, Serializer};

use super::envelope::CodecObject;

/// A nested object kept as its raw encoded bytes until first access.
///
/// Decoding happens at most once. A value that is never materialized is
/// re-encoded by copying its original bytes verbatim, so forwarding an
/// untouched nested object costs a memcpy instead of a decode/encode pair.
pub struct Lazy<T> {
    /// Encoded object, length prefix included. Dropped once the value may
    /// have been mutated.
    raw: Option<Bytes>,
    /// Filled by the first shared access to `raw`.
    decoded: OnceCell<T>,
    /// Supplied or mutably borrowed value. Set only while `raw` is `None`.
    owned: Option<T>,
}

impl<T> Lazy<T> {
    fn current(&self) -> Option<&T> {
        self.owned.as_ref().or_else(|| self.decoded.get())
    }
}

impl<T: CodecObject + Default> Lazy<T> {
    /// Wrap an already decoded value.
    pub fn new(value: T) -> Self {
        Self {
            raw: None,
            decoded: OnceCell::new(),
            owned: Some(value),
        }
    }

    /// Wrap an encoded object (length prefix included) without decoding it.
    pub fn from_raw(encoded: Bytes) -> Self {
        Self {
            raw: Some(encoded),
            decoded: OnceCell::new(),
            owned: None,
        }
    }

    /// Read a nested object from `d`, deferring its decode.
    pub fn read_from(d: &mut Deserializer) -> Result<Self> {
        Ok(Self::from_raw(d.read_object()?))
    }

    /// The decoded value, decoding on first call.
    pub fn get(&self) -> Result<&T> {
        if let Some(value) = self.current() {
            return Ok(value);
        }
        let value = self.decode_raw()?;
        Ok(self.decoded.get_or_init(|| value))
    }

    /// Mutable access. The raw bytes are discarded, since the value may change.
    pub fn get_mut(&mut self) -> Result<&mut T> {
        let value = match self.owned.take() {
            Some(value) => value,
            None => match self.decoded.take() {
                Some(value) => value,
                None => self.decode_raw()?,
            },
        };
        self.raw = None;
        Ok(self.owned.insert(value))
    }

    /// Replace the value outright.
    pub fn set(&mut self, value: T) {
        self.raw = None;
        self.decoded = OnceCell::new();
        self.owned = Some(value);
    }

    /// Consume and return the decoded value.
    pub fn into_inner(self) -> Result<T> {
        if let Some(value) = self.owned {
            return Ok(value);
        }
        match self.decoded.into_inner() {
            Some(value) => Ok(value),
            None => match self.raw {
                Some(raw) => Self::decode(raw),
                None => Ok(T::default()),
            },
        }
    }

    /// Check if the value has been decoded (or was supplied decoded).
    #[inline]
    pub fn is_materialized(&self) -> bool {
        self.current().is_some()
    }

    /// Original encoded bytes, if still authoritative.
    #[inline]
    pub fn raw(&self) -> Option<&Bytes> {
        self.raw.as_ref()
    }

    /// Encoded size, length prefix included.
    pub fn encoded_size(&self) -> usize {
        match (self.current(), &self.raw) {
            (Some(value), _) => value.encoded_size(),
            (None, Some(raw)) => raw.len(),
            (None, None) => T::default().encoded_size(),
        }
    }

    /// Write the value, or the original bytes if never decoded.
    pub fn encode_to(&self, s: &mut Serializer) {
        match (self.current(), &self.raw) {
            (Some(value), _) => value.encode_to(s),
            (None, Some(raw)) => s.write_encoded_object(raw),
            (None, None) => T::default().encode_to(s),
        }
    }

    fn decode_raw(&self) -> Result<T> {
        match &self.raw {
            Some(raw) => Self::decode(raw.clone()),
            None => Ok(T::default()),
        }
    }

    fn decode(raw: Bytes) -> Result<T> {
        let mut d = Deserializer::new(raw);
        let mut value = T::default();
        value.decode_from(&mut d)?;
        d.done()?;
        Ok(value)
    }
}

impl<T: CodecObject + Default> Default for Lazy<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: CodecObject + Default> From<T> for Lazy<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            decoded: self.decoded.clone(),
            owned: self.owned.clone(),
        }
    }
}

impl<T: CodecObject + Default + PartialEq> PartialEq for Lazy<T> {
    fn eq(&self, other: &Self) -> bool {
        if let (None, None, Some(a), Some(b)) =
            (self.current(), other.current(), &self.raw, &other.raw)
        {
            return a == b;
        }
        match (self.get(), other.get()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.current(), &self.raw) {
            (Some(value), _) => f.debug_tuple("Lazy").field(value).finish(),
            (None, Some(raw)) => write!(f, "Lazy(<{} raw bytes>)", raw.len()),
            (None, None) => f.write_str("Lazy(<empty>)"),
        }
    }
}
