//! `serde` integration
//!
//! [`Value`] implements `Serialize` and `Deserialize`, so it can be moved to
//! and from any `serde` data format. In the other direction, [`to_value`]
//! and [`to_bytes`] take any `T: Serialize` and map it onto the value model:
//!
//! | serde data model | Value |
//! |---|---|
//! | unit, unit struct, `None` | `Null` |
//! | bool | `Bool` |
//! | integers (up to 128 bits) | `Int` |
//! | char, string, bytes, unit variant | `Bytes` |
//! | seq, tuple, tuple struct | `List` |
//! | map, struct | `Map` (field names as `Bytes` keys) |
//! | newtype / tuple / struct variant | single-entry `Map` keyed by the variant name |
//!
//! Floating-point numbers have no counterpart and fail with
//! [`EncodeError::UnsupportedType`].
//!
//! `Value::Bytes` serializes as a string when it holds valid UTF-8, and as a
//! byte array otherwise.

use num_bigint::BigInt;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Unexpected, Visitor};
use serde::ser::{self, Serialize, SerializeMap as _, SerializeSeq as _, Serializer};

use crate::conv::EncodeLength;
use crate::error::{EncodeError, EncodeResult};
use crate::value::Value;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => {
                if let Ok(i) = i64::try_from(n) {
                    serializer.serialize_i64(i)
                } else if let Ok(u) = u64::try_from(n) {
                    serializer.serialize_u64(u)
                } else if let Ok(i) = i128::try_from(n) {
                    serializer.serialize_i128(i)
                } else if let Ok(u) = u128::try_from(n) {
                    serializer.serialize_u128(u)
                } else {
                    Err(ser::Error::custom(format!(
                        "integer {} does not fit in 128 bits",
                        n
                    )))
                }
            }
            Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => serializer.serialize_str(s),
                Err(_) => serializer.serialize_bytes(bytes),
            },
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("null, a boolean, an integer, a string, bytes, a sequence or a map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Err(E::invalid_type(Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Bytes(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry()? {
            pairs.push(entry);
        }
        Ok(Value::Map(pairs))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Converts any serializable value into a [`Value`].
///
/// # Errors
///
/// [`EncodeError::UnsupportedType`] if `value` contains a floating-point
/// number, or whatever error its `Serialize` implementation raises.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> EncodeResult<Value> {
    value.serialize(ValueSerializer)
}

/// Encodes any serializable value directly into ordered tnetstring bytes.
///
/// # Errors
///
/// As for [`to_value`].
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> EncodeResult<Vec<u8>> {
    Ok(to_value(value)?.to_bytes_full())
}

/// `serde::Serializer` whose output is a [`Value`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueSerializer;

fn variant_entry(variant: &'static str, payload: Value) -> Value {
    Value::Map(vec![(Value::from(variant), payload)])
}

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = EncodeError;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializePairs;
    type SerializeStruct = SerializePairs;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> EncodeResult<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> EncodeResult<Value> {
        Ok(Value::Int(BigInt::from(v)))
    }

    fn serialize_u8(self, v: u8) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> EncodeResult<Value> {
        Ok(Value::Int(BigInt::from(v)))
    }

    fn serialize_f32(self, _: f32) -> EncodeResult<Value> {
        Err(EncodeError::UnsupportedType { type_name: "f32" })
    }

    fn serialize_f64(self, _: f64) -> EncodeResult<Value> {
        Err(EncodeError::UnsupportedType { type_name: "f64" })
    }

    fn serialize_char(self, v: char) -> EncodeResult<Value> {
        let mut buf = [0u8; 4];
        Ok(Value::from(v.encode_utf8(&mut buf) as &str))
    }

    fn serialize_str(self, v: &str) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> EncodeResult<Value> {
        Ok(Value::from(v))
    }

    fn serialize_none(self) -> EncodeResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> EncodeResult<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> EncodeResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> EncodeResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> EncodeResult<Value> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> EncodeResult<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> EncodeResult<Value> {
        Ok(variant_entry(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> EncodeResult<SerializeVec> {
        Ok(SerializeVec {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> EncodeResult<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> EncodeResult<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> EncodeResult<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> EncodeResult<SerializePairs> {
        Ok(SerializePairs {
            pairs: Vec::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> EncodeResult<SerializePairs> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> EncodeResult<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            pairs: Vec::with_capacity(len),
        })
    }
}

pub struct SerializeVec {
    items: Vec<Value>,
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Value>,
}

pub struct SerializePairs {
    pairs: Vec<(Value, Value)>,
    next_key: Option<Value>,
}

pub struct SerializeStructVariant {
    variant: &'static str,
    pairs: Vec<(Value, Value)>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> EncodeResult<Value> {
        Ok(Value::List(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> EncodeResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> EncodeResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> EncodeResult<Value> {
        Ok(variant_entry(self.variant, Value::List(self.items)))
    }
}

impl ser::SerializeMap for SerializePairs {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> EncodeResult<()> {
        self.next_key = Some(to_value(key)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| EncodeError::Custom("map value serialized before its key".into()))?;
        self.pairs.push((key, to_value(value)?));
        Ok(())
    }

    fn end(self) -> EncodeResult<Value> {
        Ok(Value::Map(self.pairs))
    }
}

impl ser::SerializeStruct for SerializePairs {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> EncodeResult<()> {
        self.pairs.push((Value::from(key), to_value(value)?));
        Ok(())
    }

    fn end(self) -> EncodeResult<Value> {
        Ok(Value::Map(self.pairs))
    }
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> EncodeResult<()> {
        self.pairs.push((Value::from(key), to_value(value)?));
        Ok(())
    }

    fn end(self) -> EncodeResult<Value> {
        Ok(variant_entry(self.variant, Value::Map(self.pairs)))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: Option<u8>,
        tag: &'static str,
    }

    #[derive(Serialize)]
    enum Shape {
        Dot,
        Circle(u32),
        Segment(Point, Point),
        Named { name: String },
    }

    #[test]
    fn records_become_maps() {
        let p = Point {
            x: -1,
            y: None,
            tag: "p",
        };
        assert_eq!(to_bytes(&p).unwrap(), b"20{1,x2#-11,y0~3,tag1,p");
    }

    #[test]
    fn variants() {
        assert_eq!(to_value(&Shape::Dot).unwrap(), Value::from("Dot"));
        assert_eq!(
            to_value(&Shape::Circle(3)).unwrap(),
            Value::Map(vec![(Value::from("Circle"), Value::from(3))])
        );
        let seg = Shape::Segment(
            Point { x: 0, y: Some(1), tag: "a" },
            Point { x: 2, y: None, tag: "b" },
        );
        let v = to_value(&seg).unwrap();
        assert_eq!(v.get("Segment").and_then(Value::as_list).map(<[_]>::len), Some(2));
        let named = to_value(&Shape::Named { name: "n".into() }).unwrap();
        assert_eq!(named.get("Named").and_then(|m| m.get("name")), Some(&Value::from("n")));
    }

    #[test]
    fn floats_are_rejected() {
        assert_eq!(
            to_value(&1.5f64),
            Err(EncodeError::UnsupportedType { type_name: "f64" })
        );
        assert!(to_bytes(&vec![Some(0.0f32)]).is_err());
    }

    #[test]
    fn collections() {
        let mut m = BTreeMap::new();
        m.insert('b', vec![1u64, 2]);
        m.insert('a', vec![]);
        assert_eq!(to_bytes(&m).unwrap(), b"16{1,a0[1,b6[1#11#2");
        assert_eq!(to_value(&(true, ())).unwrap(), Value::from_iter([Value::Bool(true), Value::Null]));
        assert_eq!(to_value(&u128::MAX).unwrap(), Value::from(u128::MAX));
    }

    #[test]
    fn value_through_json() {
        let v = Value::Map(vec![
            (Value::from("hello"), Value::from_iter([1, 2])),
            (Value::from("none"), Value::Null),
            (Value::from("ok"), Value::Bool(true)),
        ]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"hello":[1,2],"none":null,"ok":true}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<Value>("[1.5]").is_err());
        assert_eq!(Value::deserialize(serde_json::json!(-9)).unwrap(), Value::from(-9));
    }
}
