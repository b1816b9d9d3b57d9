//! Serde serializer producing [`CanonicalValue`] trees.
//!
//! Follows the shape of `serde_json`'s value serializer, with one
//! difference: non-finite floats are an error instead of `null`.

use std::collections::BTreeMap;

use serde::ser::{self, Serialize};

use crate::canonical::{CanonicalValue, Number};
use crate::error::CanonicalizationError;

pub(crate) struct ValueSerializer;

type Result<T> = std::result::Result<T, CanonicalizationError>;

impl ser::Serializer for ValueSerializer {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<CanonicalValue> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<CanonicalValue> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<CanonicalValue> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Number(Number::Int(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<CanonicalValue> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<CanonicalValue> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<CanonicalValue> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Number(Number::from(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<CanonicalValue> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<CanonicalValue> {
        Number::from_f64(v).map(CanonicalValue::Number)
    }

    fn serialize_char(self, v: char) -> Result<CanonicalValue> {
        Ok(CanonicalValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<CanonicalValue> {
        Ok(CanonicalValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Sequence(
            v.iter().map(|b| CanonicalValue::from(u64::from(*b))).collect(),
        ))
    }

    fn serialize_none(self) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<CanonicalValue> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<CanonicalValue> {
        Ok(CanonicalValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<CanonicalValue> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<CanonicalValue> {
        let mut map = BTreeMap::new();
        map.insert(variant.to_string(), value.serialize(ValueSerializer)?);
        Ok(CanonicalValue::Mapping(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            name: variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            entries: BTreeMap::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            name: variant,
            entries: BTreeMap::new(),
        })
    }
}

pub(crate) struct SerializeVec {
    items: Vec<CanonicalValue>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Sequence(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<CanonicalValue> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<CanonicalValue> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct SerializeTupleVariant {
    name: &'static str,
    items: Vec<CanonicalValue>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<CanonicalValue> {
        let mut map = BTreeMap::new();
        map.insert(self.name.to_string(), CanonicalValue::Sequence(self.items));
        Ok(CanonicalValue::Mapping(map))
    }
}

pub(crate) struct SerializeMap {
    entries: BTreeMap<String, CanonicalValue>,
    next_key: Option<String>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.next_key = Some(map_key(key.serialize(ValueSerializer)?)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| CanonicalizationError::Custom("map value without a key".into()))?;
        self.entries.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Mapping(self.entries))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.entries
            .insert(key.to_string(), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<CanonicalValue> {
        Ok(CanonicalValue::Mapping(self.entries))
    }
}

pub(crate) struct SerializeStructVariant {
    name: &'static str,
    entries: BTreeMap<String, CanonicalValue>,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = CanonicalValue;
    type Error = CanonicalizationError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.entries
            .insert(key.to_string(), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<CanonicalValue> {
        let mut map = BTreeMap::new();
        map.insert(self.name.to_string(), CanonicalValue::Mapping(self.entries));
        Ok(CanonicalValue::Mapping(map))
    }
}

/// Map keys become strings; integer keys are stringified as serde_json does.
fn map_key(key: CanonicalValue) -> Result<String> {
    match key {
        CanonicalValue::String(s) => Ok(s),
        CanonicalValue::Number(Number::Int(i)) => Ok(i.to_string()),
        CanonicalValue::Number(Number::UInt(u)) => Ok(u.to_string()),
        other => Err(CanonicalizationError::NonStringKey(other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(serde::Serialize)]
    enum Shape {
        Unit,
        Newtype(u8),
        Tuple(u8, u8),
        Struct { w: u8 },
    }

    #[test]
    fn enum_variants_follow_serde_json_shapes() {
        let v = CanonicalValue::from_serialize(&vec![
            Shape::Unit,
            Shape::Newtype(1),
            Shape::Tuple(1, 2),
            Shape::Struct { w: 3 },
        ])
        .unwrap();
        let expected: CanonicalValue = serde_json::from_str(
            r#"["Unit",{"Newtype":1},{"Tuple":[1,2]},{"Struct":{"w":3}}]"#,
        )
        .unwrap();
        assert_eq!(v, expected);
    }

    #[test]
    fn option_none_is_null() {
        let v = CanonicalValue::from_serialize(&Option::<u8>::None).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn integer_keys_are_stringified() {
        let mut m = HashMap::new();
        m.insert(7u32, "seven");
        let v = CanonicalValue::from_serialize(&m).unwrap();
        assert_eq!(v.get("7").and_then(CanonicalValue::as_str), Some("seven"));
    }

    #[test]
    fn bool_keys_rejected() {
        let mut m = HashMap::new();
        m.insert(true, 1u8);
        assert!(matches!(
            CanonicalValue::from_serialize(&m),
            Err(CanonicalizationError::NonStringKey("bool"))
        ));
    }

    #[test]
    fn non_finite_f32_rejected() {
        assert!(CanonicalValue::from_serialize(&f32::NAN).is_err());
    }
}
