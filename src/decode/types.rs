//! Decoder types and traits
//!
//! Defines the listing page type and the item decoder abstraction.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;

/// One page of results from a Reddit listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<A> {
    /// Cursor toward newer items
    pub before: Option<String>,
    /// Cursor toward older items; absent when there is nothing left
    pub after: Option<String>,
    /// Number of children the API reported for this page
    pub dist: u64,
    /// Children that decoded successfully, in API order
    pub children: Vec<A>,
}

impl<A> Listing<A> {
    /// Whether the API advertised another page
    pub fn has_next(&self) -> bool {
        self.after.is_some()
    }

    /// Transform every child, keeping cursors and `dist`
    pub fn map<B>(self, f: impl FnMut(A) -> B) -> Listing<B> {
        Listing {
            before: self.before,
            after: self.after,
            dist: self.dist,
            children: self.children.into_iter().map(f).collect(),
        }
    }
}

/// Why a payload did not match the expected shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {message}")]
pub struct DecodeError {
    /// Dotted path of the offending field
    pub path: String,
    /// What was wrong with it
    pub message: String,
}

impl DecodeError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// A required field was absent
    pub fn missing(path: impl Into<String>) -> Self {
        Self::new(path, "missing required field")
    }

    /// A field had the wrong type
    pub fn invalid(path: impl Into<String>, expected: &str) -> Self {
        Self::new(path, format!("expected {expected}"))
    }
}

/// A `Listing` together with the children that were dropped while decoding it
#[derive(Debug, Clone)]
pub struct DecodedListing<A> {
    /// The decoded page
    pub listing: Listing<A>,
    /// Index in the raw `children` array and the error, for each dropped child
    pub skipped: Vec<(usize, DecodeError)>,
}

/// Decodes one raw listing child into a typed item
pub trait ItemDecoder: Send + Sync {
    /// The decoded item type
    type Item;

    /// Decode a single child of `data.children`
    fn decode(&self, raw: &Value) -> Result<Self::Item, DecodeError>;
}

/// Item decoder backed by a closure, see [`decode_fn`]
pub struct FnDecoder<F, A> {
    f: F,
    _item: PhantomData<fn() -> A>,
}

/// Wrap a closure as an [`ItemDecoder`]
pub fn decode_fn<F, A>(f: F) -> FnDecoder<F, A>
where
    F: Fn(&Value) -> Result<A, DecodeError> + Send + Sync,
{
    FnDecoder {
        f,
        _item: PhantomData,
    }
}

impl<F, A> ItemDecoder for FnDecoder<F, A>
where
    F: Fn(&Value) -> Result<A, DecodeError> + Send + Sync,
{
    type Item = A;

    fn decode(&self, raw: &Value) -> Result<A, DecodeError> {
        (self.f)(raw)
    }
}

/// Item decoder that deserializes each child with serde
pub struct SerdeDecoder<T> {
    _item: PhantomData<fn() -> T>,
}

impl<T> SerdeDecoder<T> {
    pub fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for SerdeDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> ItemDecoder for SerdeDecoder<T> {
    type Item = T;

    fn decode(&self, raw: &Value) -> Result<T, DecodeError> {
        T::deserialize(raw).map_err(|e| DecodeError::new("$", e.to_string()))
    }
}
