//! # Canonical Serialization — Code-Point Ordered Canonical JSON
//!
//! This module defines [`CanonicalValue`], the closed value type every
//! artifact is converted into, and [`CanonicalBytes`], the sole construction
//! path for bytes used in digest computation.
//!
//! ## Encoding Rules
//!
//! 1. `null`, `true`, `false` as literals.
//! 2. Integers printed exactly. Integral floats inside the `i64`/`u64` range
//!    print exactly as the equal integer would. Other floats use the
//!    ECMAScript shortest round-trip form (RFC 8785 §3.2.2.3, rendered by
//!    `serde_jcs`): exponents look like `1e+21` / `1e-7`, and negative zero
//!    prints as `0`. NaN and the infinities are rejected.
//! 3. Strings as JSON string literals with the standard escapes.
//! 4. Sequences keep their element order.
//! 5. Mapping keys are emitted in Unicode code-point order. `BTreeMap<String, _>`
//!    orders by UTF-8 bytes, which is the same order.
//! 6. No whitespace anywhere.
//!
//! ## Security Invariant
//!
//! The inner buffer of `CanonicalBytes` is private. Any function that needs
//! canonical bytes for a digest must accept `&CanonicalBytes`, and the only
//! way to produce one is through [`canonicalize`].

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, Serializer};

use crate::error::CanonicalizationError;
use crate::ser::ValueSerializer;

/// Identifier recorded in transcripts so verifiers know which encoding
/// produced the bytes behind every digest.
pub const CANONICALIZER_ID: &str = "fossil-jcs:codepoint-v1";

/// A JSON number as held by [`CanonicalValue`].
///
/// Non-negative integers that fit in `i64` are always stored as `Int`, so
/// structurally equal numbers compare equal regardless of their source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt(u64),
    /// Binary floating point. Must be finite to canonicalize.
    Float(f64),
}

impl Number {
    /// Build a float number, rejecting NaN and the infinities.
    pub fn from_f64(f: f64) -> Result<Self, CanonicalizationError> {
        if f.is_finite() {
            Ok(Self::Float(f))
        } else {
            Err(CanonicalizationError::NonFiniteNumber(f))
        }
    }

    /// Returns the value as `f64`, possibly losing precision.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(i) => i as f64,
            Self::UInt(u) => u as f64,
            Self::Float(f) => f,
        }
    }

    fn write_canonical(&self, out: &mut String) -> Result<(), CanonicalizationError> {
        match *self {
            Self::Int(i) => out.push_str(&i.to_string()),
            Self::UInt(u) => out.push_str(&u.to_string()),
            Self::Float(f) => out.push_str(&render_float(f)?),
        }
        Ok(())
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u64> for Number {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Self::Int(i),
            Err(_) => Self::UInt(u),
        }
    }
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn render_float(f: f64) -> Result<String, CanonicalizationError> {
    if !f.is_finite() {
        return Err(CanonicalizationError::NonFiniteNumber(f));
    }
    // Integral floats in integer range print like the equal `Int`/`UInt`.
    if f.fract() == 0.0 {
        if (-TWO_POW_63..TWO_POW_63).contains(&f) {
            return Ok((f as i64).to_string());
        }
        if (0.0..TWO_POW_64).contains(&f) {
            return Ok((f as u64).to_string());
        }
    }
    Ok(serde_jcs::to_string(&f)?)
}

/// Reject JSON integer literals that would be silently rounded.
///
/// `serde_json` parses integer text beyond `u64` as `f64`, so distinct
/// integers can collapse onto one float and one digest. A literal passes
/// when it fits in `i64`/`u64`, or when it is already the canonical
/// rendering of the float it parses to.
///
/// # Errors
///
/// Returns `CanonicalizationError::IntegerOutOfRange` with the first
/// offending literal.
pub fn check_integer_literals(text: &str) -> Result<(), CanonicalizationError> {
    let bytes = text.as_bytes();
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => {
                in_string = true;
                i += 1;
            }
            b'-' | b'0'..=b'9' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i], b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9')
                {
                    i += 1;
                }
                check_integer_token(&text[start..i])?;
            }
            _ => i += 1,
        }
    }
    Ok(())
}

fn check_integer_token(token: &str) -> Result<(), CanonicalizationError> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    if token.parse::<i64>().is_ok() || token.parse::<u64>().is_ok() {
        return Ok(());
    }
    match token.parse::<f64>() {
        Ok(f) if render_float(f).ok().as_deref() == Some(token) => Ok(()),
        _ => Err(CanonicalizationError::IntegerOutOfRange(token.to_string())),
    }
}

/// The universal value type the canonicalizer operates on.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CanonicalValue {
    /// JSON `null`. Also the placeholder for digests not yet computed.
    #[default]
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Number(Number),
    /// JSON string.
    String(String),
    /// Ordered sequence; order is significant.
    Sequence(Vec<CanonicalValue>),
    /// Mapping with unique string keys.
    Mapping(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// An empty mapping.
    pub fn mapping() -> Self {
        Self::Mapping(BTreeMap::new())
    }

    /// Convert any `Serialize` value into a canonical value.
    ///
    /// Unlike a round trip through `serde_json::Value`, non-finite floats are
    /// rejected here instead of silently becoming `null`.
    pub fn from_serialize<T: Serialize + ?Sized>(
        value: &T,
    ) -> Result<Self, CanonicalizationError> {
        value.serialize(ValueSerializer)
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the entries, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, CanonicalValue>> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Mutably borrow the entries, if this is a mapping.
    pub fn as_mapping_mut(&mut self) -> Option<&mut BTreeMap<String, CanonicalValue>> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the elements, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[CanonicalValue]> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a key of a mapping. Returns `None` for non-mappings.
    pub fn get(&self, key: &str) -> Option<&CanonicalValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Insert `key` into a mapping, returning the previous value.
    ///
    /// Returns `None` without inserting when `self` is not a mapping.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<CanonicalValue>,
    ) -> Option<CanonicalValue> {
        self.as_mapping_mut()
            .and_then(|m| m.insert(key.into(), value.into()))
    }

    fn write_canonical(&self, out: &mut String) -> Result<(), CanonicalizationError> {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(true) => out.push_str("true"),
            Self::Bool(false) => out.push_str("false"),
            Self::Number(n) => n.write_canonical(out)?,
            Self::String(s) => write_string(s, out)?,
            Self::Sequence(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(out)?;
                }
                out.push(']');
            }
            Self::Mapping(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_string(key, out)?;
                    out.push(':');
                    value.write_canonical(out)?;
                }
                out.push('}');
            }
        }
        Ok(())
    }
}

fn write_string(s: &str, out: &mut String) -> Result<(), CanonicalizationError> {
    out.push_str(&serde_json::to_string(s)?);
    Ok(())
}

impl From<bool> for CanonicalValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for CanonicalValue {
    fn from(i: i64) -> Self {
        Self::Number(Number::from(i))
    }
}

impl From<i32> for CanonicalValue {
    fn from(i: i32) -> Self {
        Self::Number(Number::Int(i64::from(i)))
    }
}

impl From<u64> for CanonicalValue {
    fn from(u: u64) -> Self {
        Self::Number(Number::from(u))
    }
}

impl From<&str> for CanonicalValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<CanonicalValue>> for CanonicalValue {
    fn from(v: Vec<CanonicalValue>) -> Self {
        Self::Sequence(v)
    }
}

impl From<BTreeMap<String, CanonicalValue>> for CanonicalValue {
    fn from(m: BTreeMap<String, CanonicalValue>) -> Self {
        Self::Mapping(m)
    }
}

impl TryFrom<f64> for CanonicalValue {
    type Error = CanonicalizationError;

    fn try_from(f: f64) -> Result<Self, Self::Error> {
        Number::from_f64(f).map(Self::Number)
    }
}

impl From<serde_json::Value> for CanonicalValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Number(Number::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Self::Number(Number::from(u))
                } else {
                    // serde_json numbers are always finite.
                    Self::Number(Number::Float(n.as_f64().unwrap_or(0.0)))
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            Self::Number(Number::UInt(u)) => serializer.serialize_u64(*u),
            Self::Number(Number::Float(f)) => {
                if !f.is_finite() {
                    return Err(ser::Error::custom(CanonicalizationError::NonFiniteNumber(*f)));
                }
                serializer.serialize_f64(*f)
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(items) => serializer.collect_seq(items),
            Self::Mapping(entries) => serializer.collect_map(entries),
        }
    }
}

impl<'de> Deserialize<'de> for CanonicalValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CanonicalValueVisitor)
    }
}

struct CanonicalValueVisitor;

impl<'de> Visitor<'de> for CanonicalValueVisitor {
    type Value = CanonicalValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON-compatible value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
        Ok(CanonicalValue::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
        Ok(CanonicalValue::from(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
        Ok(CanonicalValue::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(CanonicalValue::from)
            .map_err(|_| de::Error::custom(CanonicalizationError::IntegerOutOfRange(v.to_string())))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(CanonicalValue::from)
            .map_err(|_| de::Error::custom(CanonicalizationError::IntegerOutOfRange(v.to_string())))
    }

    // Non-finite floats are kept as-is and rejected at canonicalization.
    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
        Ok(CanonicalValue::Number(Number::Float(v)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
        Ok(CanonicalValue::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
        Ok(CanonicalValue::String(v))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(CanonicalValue::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(CanonicalValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(CanonicalValue::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, CanonicalValue>()? {
            if entries.insert(key.clone(), value).is_some() {
                return Err(de::Error::custom(format!("duplicate mapping key `{key}`")));
            }
        }
        Ok(CanonicalValue::Mapping(entries))
    }
}

/// Bytes produced exclusively by the canonicalizer.
///
/// The inner buffer is private, so downstream code cannot construct
/// `CanonicalBytes` except through [`canonicalize`] or [`CanonicalBytes::new`].
/// The buffer is always valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(String);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::NonFiniteNumber` if the value contains
    /// NaN or an infinity, and `NonStringKey` for maps keyed by non-strings.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        canonicalize(&CanonicalValue::from_serialize(obj)?)
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The canonical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume and return the inner bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CanonicalBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert a value into its unique canonical byte sequence.
///
/// Two values that differ only in mapping insertion order produce identical
/// output. Fails with `NonFiniteNumber` for NaN or an infinity anywhere in
/// the tree; no partial output is ever returned.
pub fn canonicalize(value: &CanonicalValue) -> Result<CanonicalBytes, CanonicalizationError> {
    let mut out = String::new();
    value.write_canonical(&mut out)?;
    Ok(CanonicalBytes(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canon(v: serde_json::Value) -> String {
        canonicalize(&CanonicalValue::from(v))
            .expect("should canonicalize")
            .as_str()
            .to_string()
    }

    #[test]
    fn test_simple_dict_sorted_compact() {
        assert_eq!(
            canon(json!({"b": 2, "a": 1, "c": "hello"})),
            r#"{"a":1,"b":2,"c":"hello"}"#
        );
    }

    #[test]
    fn test_nested_objects_sorted() {
        let data = json!({"outer": {"b": 2, "a": 1}, "list": [3, 2, 1]});
        assert_eq!(canon(data), r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn test_sequence_order_preserved() {
        assert_eq!(canon(json!(["z", "a", "m"])), r#"["z","a","m"]"#);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(canon(json!({})), "{}");
        assert_eq!(canon(json!([])), "[]");
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            canon(json!({"t": true, "f": false, "n": null})),
            r#"{"f":false,"n":null,"t":true}"#
        );
    }

    #[test]
    fn test_integral_float_has_no_decimal_point() {
        assert_eq!(canon(json!(1.0)), "1");
        assert_eq!(canon(json!(-250.0)), "-250");
    }

    #[test]
    fn test_float_shortest_form() {
        assert_eq!(canon(json!(1.5)), "1.5");
        assert_eq!(canon(json!(0.1)), "0.1");
    }

    #[test]
    fn test_negative_zero_prints_zero() {
        let v = CanonicalValue::try_from(-0.0f64).unwrap();
        assert_eq!(canonicalize(&v).unwrap().as_str(), "0");
    }

    #[test]
    fn test_large_integers_exact() {
        assert_eq!(canon(json!(9999999999i64)), "9999999999");
        assert_eq!(canon(json!(u64::MAX)), "18446744073709551615");
        assert_eq!(canon(json!(-42)), "-42");
    }

    #[test]
    fn test_nan_rejected() {
        let v = CanonicalValue::Sequence(vec![CanonicalValue::Number(Number::Float(f64::NAN))]);
        assert!(matches!(
            canonicalize(&v),
            Err(CanonicalizationError::NonFiniteNumber(_))
        ));
    }

    #[test]
    fn test_infinity_rejected_at_construction() {
        assert!(CanonicalValue::try_from(f64::INFINITY).is_err());
        assert!(Number::from_f64(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(canon(json!("a\"b\\c\nd")), r#""a\"b\\c\nd""#);
        assert_eq!(canon(json!("\u{0001}")), r#""\u0001""#);
    }

    #[test]
    fn test_unicode_passthrough() {
        let s = canon(json!({"name": "\u{00e9}\u{00e8}"}));
        assert!(s.contains('\u{00e9}'));
    }

    #[test]
    fn test_keys_in_code_point_order() {
        // U+00E9 (2 UTF-8 bytes) sorts after 'z'; U+1F600 after U+FFFD.
        let data = json!({"\u{1F600}": 4, "\u{FFFD}": 3, "\u{00e9}": 2, "z": 1});
        assert_eq!(canon(data), "{\"z\":1,\"\u{00e9}\":2,\"\u{FFFD}\":3,\"\u{1F600}\":4}");
    }

    #[test]
    fn test_int_and_integral_float_equivalent() {
        let a = canonicalize(&CanonicalValue::from(7i64)).unwrap();
        let b = canonicalize(&CanonicalValue::try_from(7.0f64).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_int_and_float_equivalent_above_f64_mantissa() {
        let two_pow_60 = 1u64 << 60;
        let a = canonicalize(&CanonicalValue::from(two_pow_60)).unwrap();
        let b = canonicalize(&CanonicalValue::try_from(two_pow_60 as f64).unwrap()).unwrap();
        assert_eq!(a, b);
        let min = CanonicalValue::try_from(-9_223_372_036_854_775_808.0f64).unwrap();
        assert_eq!(canonicalize(&min).unwrap().as_str(), "-9223372036854775808");
        let top = CanonicalValue::try_from(18_446_744_073_709_549_568.0f64).unwrap();
        assert_eq!(canonicalize(&top).unwrap().as_str(), "18446744073709549568");
    }

    #[test]
    fn test_128_bit_integers_must_fit() {
        use serde::de::value::{Error, I128Deserializer, U128Deserializer};
        use serde::de::IntoDeserializer;

        let small: U128Deserializer<Error> = 7u128.into_deserializer();
        assert_eq!(CanonicalValue::deserialize(small).unwrap(), CanonicalValue::from(7i64));
        let big: U128Deserializer<Error> = (u128::from(u64::MAX) + 1).into_deserializer();
        assert!(CanonicalValue::deserialize(big).is_err());
        let low: I128Deserializer<Error> = (i128::from(i64::MIN) - 1).into_deserializer();
        assert!(CanonicalValue::deserialize(low).is_err());
    }

    #[test]
    fn test_u64_in_i64_range_normalized() {
        assert_eq!(CanonicalValue::from(5u64), CanonicalValue::from(5i64));
    }

    #[test]
    fn test_deserialize_rejects_duplicate_keys() {
        let parsed: Result<CanonicalValue, _> = serde_json::from_str(r#"{"a":1,"a":2}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_deserialize_matches_value_conversion() {
        let text = r#"{"b":[1,2.5,"x"],"a":{"c":null}}"#;
        let direct: CanonicalValue = serde_json::from_str(text).unwrap();
        let via_value =
            CanonicalValue::from(serde_json::from_str::<serde_json::Value>(text).unwrap());
        assert_eq!(direct, via_value);
    }

    #[test]
    fn test_serialize_rejects_nan() {
        let v = CanonicalValue::Number(Number::Float(f64::NAN));
        assert!(serde_json::to_string(&v).is_err());
    }

    #[test]
    fn test_canonical_bytes_from_struct() {
        #[derive(serde::Serialize)]
        struct Setpoint {
            zeta: u32,
            alpha: &'static str,
        }
        let cb = CanonicalBytes::new(&Setpoint { zeta: 1, alpha: "a" }).unwrap();
        assert_eq!(cb.as_str(), r#"{"alpha":"a","zeta":1}"#);
        assert_eq!(cb.len(), cb.as_bytes().len());
        assert!(!cb.is_empty());
    }

    #[test]
    fn test_canonical_bytes_rejects_nan_field() {
        #[derive(serde::Serialize)]
        struct Reading {
            value: f64,
        }
        let result = CanonicalBytes::new(&Reading { value: f64::NAN });
        assert!(matches!(result, Err(CanonicalizationError::NonFiniteNumber(_))));
    }

    #[test]
    fn test_insert_and_get() {
        let mut m = CanonicalValue::mapping();
        assert!(m.insert("k", "v").is_none());
        assert_eq!(m.get("k").and_then(CanonicalValue::as_str), Some("v"));
        let mut not_map = CanonicalValue::from(1i64);
        assert!(not_map.insert("k", "v").is_none());
        assert!(not_map.get("k").is_none());
    }
}
