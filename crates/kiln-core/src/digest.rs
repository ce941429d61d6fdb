//! Canonical JSON normalization and digest computation.
//!
//! Specs, manifests, and reports are identified by the SHA-256 of their
//! canonical JSON form: object keys sorted, integer-valued floats
//! collapsed to integers, NaN/Infinity rejected. Two structurally equal
//! documents always hash to the same digest regardless of field order.

use std::fmt;

use sha2::{Digest as Sha2Digest, Sha256};

use crate::error::{KilnError, Result};

/// SHA-256 digest of raw bytes, used to address blobs in the artifact store.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Compute the digest of a byte slice.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Digest(hasher.finalize().into())
    }

    /// Lowercase hex encoding (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-char hex string back into a digest.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| KilnError::InvalidDigest(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| KilnError::InvalidDigest(s.to_string()))?;
        Ok(Digest(arr))
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

/// Recursively sort JSON object keys. Array order is preserved.
fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), sort_keys(v));
                }
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(sort_keys).collect())
        }
        other => other.clone(),
    }
}

/// Normalize numbers: integer-valued floats become integers; NaN/Infinity rejected.
fn normalize_numbers(value: &serde_json::Value) -> Result<serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map.iter() {
                out.insert(k.clone(), normalize_numbers(v)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        serde_json::Value::Array(arr) => Ok(serde_json::Value::Array(
            arr.iter()
                .map(normalize_numbers)
                .collect::<Result<Vec<_>>>()?,
        )),
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Ok(serde_json::Value::Number(n.clone()));
            }
            let f = n.as_f64().unwrap_or(f64::NAN);
            if !f.is_finite() {
                return Err(KilnError::InvalidSpec(
                    "NaN/Infinity not permitted in canonical JSON".to_string(),
                ));
            }
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                Ok(serde_json::Value::Number(serde_json::Number::from(
                    f as i64,
                )))
            } else {
                Ok(serde_json::Value::Number(n.clone()))
            }
        }
        other => Ok(other.clone()),
    }
}

/// Convert a JSON value to canonical form: normalize numbers, sort keys, compact output.
pub fn canonical_json(value: &serde_json::Value) -> Result<String> {
    let normalized = normalize_numbers(value)?;
    let sorted = sort_keys(&normalized);
    Ok(serde_json::to_string(&sorted)?)
}

/// SHA-256 hex digest of a JSON value's canonical form.
pub fn compute_digest(value: &serde_json::Value) -> Result<String> {
    let canonical = canonical_json(value)?;
    Ok(Digest::compute(canonical.as_bytes()).to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_roundtrip_hex() {
        let d = Digest::compute(b"kiln");
        let parsed = Digest::from_hex(&d.to_hex()).unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn digest_rejects_bad_hex() {
        assert!(Digest::from_hex("nothex").is_err());
        assert!(Digest::from_hex("abcd").is_err());
    }

    #[test]
    fn digest_short_is_prefix() {
        let d = Digest::compute(b"abc");
        assert_eq!(d.short(), d.to_hex()[..12]);
    }

    #[test]
    fn canonical_json_field_order_invariant() {
        let a = serde_json::json!({ "x": 1, "y": 2, "z": { "b": 1, "a": 2 } });
        let b = serde_json::json!({ "z": { "a": 2, "b": 1 }, "y": 2, "x": 1 });
        assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
    }

    #[test]
    fn canonical_json_array_order_preserved() {
        let a = serde_json::json!({ "steps": [3, 1, 2] });
        let b = serde_json::json!({ "steps": [1, 2, 3] });
        assert_ne!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
    }

    #[test]
    fn canonical_json_integer_valued_float() {
        let v = serde_json::json!({ "timeout": 30.0 });
        assert_eq!(canonical_json(&v).unwrap(), r#"{"timeout":30}"#);
    }

    #[test]
    fn compute_digest_is_deterministic() {
        let v = serde_json::json!({ "base": "ubuntu:20.04", "steps": [] });
        assert_eq!(compute_digest(&v).unwrap(), compute_digest(&v).unwrap());
        assert_eq!(compute_digest(&v).unwrap().len(), 64);
    }

    #[test]
    fn compute_digest_single_field_delta() {
        let a = serde_json::json!({ "base": "ubuntu:20.04" });
        let b = serde_json::json!({ "base": "ubuntu:22.04" });
        assert_ne!(compute_digest(&a).unwrap(), compute_digest(&b).unwrap());
    }
}
