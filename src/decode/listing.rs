//! Listing envelope decoding
//!
//! Validates the `{ kind: "Listing", data: { before, after, dist, children } }`
//! envelope and decodes children one by one. A malformed envelope rejects the
//! whole page; a malformed child is logged and dropped.

use super::types::{DecodeError, DecodedListing, ItemDecoder, Listing};
use serde_json::Value;
use tracing::warn;

const LISTING_KIND: &str = "Listing";

/// Decode a listing page, dropping children that fail to decode
///
/// Emits one warning per dropped child naming its index in the raw array.
pub fn decode_listing<D>(raw: &Value, decoder: &D) -> Result<Listing<D::Item>, DecodeError>
where
    D: ItemDecoder + ?Sized,
{
    let decoded = decode_listing_detailed(raw, decoder)?;

    for (index, error) in &decoded.skipped {
        warn!(index, error = %error, "Dropping listing child that failed to decode");
    }

    Ok(decoded.listing)
}

/// Decode a listing page and report the dropped children instead of logging them
pub fn decode_listing_detailed<D>(
    raw: &Value,
    decoder: &D,
) -> Result<DecodedListing<D::Item>, DecodeError>
where
    D: ItemDecoder + ?Sized,
{
    let kind = raw
        .get("kind")
        .ok_or_else(|| DecodeError::missing("kind"))?
        .as_str()
        .ok_or_else(|| DecodeError::invalid("kind", "a string"))?;
    if kind != LISTING_KIND {
        return Err(DecodeError::new(
            "kind",
            format!("expected \"{LISTING_KIND}\", found \"{kind}\""),
        ));
    }

    let data = raw.get("data").ok_or_else(|| DecodeError::missing("data"))?;
    if !data.is_object() {
        return Err(DecodeError::invalid("data", "an object"));
    }

    let before = optional_string(data, "before")?;
    let after = optional_string(data, "after")?;

    let dist = data
        .get("dist")
        .ok_or_else(|| DecodeError::missing("data.dist"))?
        .as_u64()
        .ok_or_else(|| DecodeError::invalid("data.dist", "a non-negative integer"))?;

    let raw_children = data
        .get("children")
        .ok_or_else(|| DecodeError::missing("data.children"))?
        .as_array()
        .ok_or_else(|| DecodeError::invalid("data.children", "an array"))?;

    let mut children = Vec::with_capacity(raw_children.len());
    let mut skipped = Vec::new();

    for (index, child) in raw_children.iter().enumerate() {
        match decoder.decode(child) {
            Ok(item) => children.push(item),
            Err(error) => skipped.push((index, error)),
        }
    }

    Ok(DecodedListing {
        listing: Listing {
            before,
            after,
            dist,
            children,
        },
        skipped,
    })
}

/// Read `data.<field>` as an optional string; absent and `null` both mean `None`
fn optional_string(data: &Value, field: &str) -> Result<Option<String>, DecodeError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::invalid(
            format!("data.{field}"),
            "a string or null",
        )),
    }
}
