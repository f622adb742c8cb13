//! GA4GH digest algorithms.
//!
//! `sha512t24u` is SHA-512 truncated to 24 bytes and base64url-encoded. It is
//! the digest behind refget sequence accessions (`SQ.`) and every VRS
//! object identifier. `canonicalize_json` produces the serialization that VRS
//! objects are hashed over: object keys sorted, no insignificant whitespace.

use serde_json::Value;
use sha2::{Digest, Sha512};

/// Compute the GA4GH sha512t24u digest of the given bytes.
///
/// # Examples
/// ```
/// use vats_refget::sha512t24u;
///
/// assert_eq!(sha512t24u("ACGT"), "aKF498dAxcJAqme6QYQ7EZ07-fiw8Kw2");
/// ```
pub fn sha512t24u<T: AsRef<[u8]>>(input: T) -> String {
    let mut hasher = Sha512::new();
    hasher.update(input.as_ref());
    let hash = hasher.finalize();
    base64_url::encode(&hash[..24])
}

/// Serialize a JSON value in GA4GH canonical form.
///
/// Keys are sorted recursively regardless of how the `Value` map was built,
/// so the output does not depend on serde_json's `preserve_order` feature.
pub fn canonicalize_json(value: &Value) -> String {
    let mut out = String::with_capacity(256);
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Display on a Value::String gives the escaped, quoted form
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXc")]
    #[case("ACGT", "aKF498dAxcJAqme6QYQ7EZ07-fiw8Kw2")]
    fn test_sha512t24u_vectors(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sha512t24u(input), expected);
    }

    #[rstest]
    fn test_sha512t24u_accepts_bytes() {
        assert_eq!(sha512t24u(b"ACGT".as_slice()), sha512t24u("ACGT"));
        assert_eq!(sha512t24u("ACGT").len(), 32);
    }

    #[rstest]
    fn test_canonicalize_json_sorts_keys() {
        let value = json!({
            "type": "SequenceLocation",
            "start": 1,
            "end": 2,
            "sequenceReference": {"type": "SequenceReference", "refgetAccession": "SQ.abc"}
        });
        assert_eq!(
            canonicalize_json(&value),
            r#"{"end":2,"sequenceReference":{"refgetAccession":"SQ.abc","type":"SequenceReference"},"start":1,"type":"SequenceLocation"}"#
        );
    }

    #[rstest]
    fn test_canonicalize_json_arrays_and_escapes() {
        let value = json!({"b": [3, "x\"y"], "a": null});
        assert_eq!(canonicalize_json(&value), r#"{"a":null,"b":[3,"x\"y"]}"#);
    }
}
