//! Numbers, boxed and primitive.
//!
//! Unmarshalling never truncates: a JSON number is accepted for a target
//! width only if narrowing it and widening it back gives the same value.
//! `3.0` becomes the int `3`, while `3.5` and `2147483648` are rejected for
//! int. For `float` the comparison is made on the shortest decimal form, so
//! `0.1` is accepted and `0.123456789` is not.

use serde_json::{Number, Value};

use crate::class::ClassTable;
use crate::error::{MarshalError, MarshalErrorKind, UnmarshalError, UnmarshalErrorKind};
use crate::native::{Native, NativeType, ObjectHeap, Primitive};
use crate::registry::SerializerRegistry;
use crate::score::MatchScore;
use crate::state::SerializerState;

use super::{type_mismatch, unexpected, JsonKind, Serializer};

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// JSON form of a numeric scalar.
pub(crate) fn number_to_json(
    serializer: &'static str,
    value: &Native,
) -> Result<Value, MarshalError> {
    match value {
        Native::Byte(v) => Ok(Value::from(*v)),
        Native::Short(v) => Ok(Value::from(*v)),
        Native::Int(v) => Ok(Value::from(*v)),
        Native::Long(v) => Ok(Value::from(*v)),
        Native::Float(v) => float_to_json(*v),
        Native::Double(v) => double_to_json(*v),
        other => Err(unexpected(serializer, other)),
    }
}

/// Floats are written in their shortest decimal form rather than as the
/// exact binary expansion of the widened double.
pub(crate) fn float_to_json(v: f32) -> Result<Value, MarshalError> {
    let widened = v.to_string().parse::<f64>().unwrap_or(f64::from(v));
    double_to_json(widened)
}

pub(crate) fn double_to_json(v: f64) -> Result<Value, MarshalError> {
    Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| MarshalError::new(MarshalErrorKind::NonFiniteNumber(v)))
}

/// Converts `json` to the numeric primitive `p`, without loss.
pub(crate) fn to_number(p: Primitive, json: &Value) -> Result<Native, UnmarshalError> {
    match json {
        Value::Number(n) => from_json_number(p, n),
        Value::String(s) => parse_numeral(p, s),
        other => Err(type_mismatch(p.name(), other)),
    }
}

/// The narrowest of `int`, `long` and `double` that holds `n` exactly.
pub(crate) fn natural_primitive(n: &Number) -> Primitive {
    match n.as_i64() {
        Some(i) if i32::try_from(i).is_ok() => Primitive::Int,
        Some(_) => Primitive::Long,
        None => Primitive::Double,
    }
}

fn from_json_number(p: Primitive, n: &Number) -> Result<Native, UnmarshalError> {
    let converted = match p {
        Primitive::Byte => integral(n).and_then(|i| i8::try_from(i).ok()).map(Native::Byte),
        Primitive::Short => integral(n).and_then(|i| i16::try_from(i).ok()).map(Native::Short),
        Primitive::Int => integral(n).and_then(|i| i32::try_from(i).ok()).map(Native::Int),
        Primitive::Long => integral(n).map(Native::Long),
        Primitive::Float => exact_double(n).and_then(narrow_float).map(Native::Float),
        Primitive::Double => exact_double(n).map(Native::Double),
        Primitive::Boolean | Primitive::Char => {
            return Err(type_mismatch(p.name(), &Value::Number(n.clone())))
        }
    };
    converted.ok_or_else(|| {
        UnmarshalError::new(UnmarshalErrorKind::LossyNumber {
            value: n.to_string(),
            target: p.name().to_string(),
        })
    })
}

/// The `i64` that `n` denotes exactly, if any.
fn integral(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        return None;
    }
    let f = n.as_f64()?;
    let i = f as i64;
    (i as f64 == f && f < TWO_POW_63).then_some(i)
}

/// The `f64` that `n` denotes exactly, if any.
fn exact_double(n: &Number) -> Option<f64> {
    if let Some(i) = n.as_i64() {
        let f = i as f64;
        return (f as i128 == i128::from(i)).then_some(f);
    }
    if let Some(u) = n.as_u64() {
        let f = u as f64;
        return (f as i128 == i128::from(u)).then_some(f);
    }
    n.as_f64()
}

fn narrow_float(f: f64) -> Option<f32> {
    let narrowed = f as f32;
    if !narrowed.is_finite() {
        return None;
    }
    let widened = narrowed.to_string().parse::<f64>().ok()?;
    (widened == f).then_some(narrowed)
}

fn parse_numeral(p: Primitive, s: &str) -> Result<Native, UnmarshalError> {
    let parsed = match p {
        Primitive::Byte => s.parse().ok().map(Native::Byte),
        Primitive::Short => s.parse().ok().map(Native::Short),
        Primitive::Int => s.parse().ok().map(Native::Int),
        Primitive::Long => s.parse().ok().map(Native::Long),
        Primitive::Float => s
            .parse::<f32>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Native::Float),
        Primitive::Double => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Native::Double),
        Primitive::Boolean | Primitive::Char => None,
    };
    parsed.ok_or_else(|| {
        UnmarshalError::new(UnmarshalErrorKind::NotANumber {
            value: s.to_string(),
            target: p.name().to_string(),
        })
    })
}

fn accepts_json(json: Option<JsonKind>) -> bool {
    matches!(json, None | Some(JsonKind::Number) | Some(JsonKind::String))
}

fn numeric(ty: &NativeType) -> Option<Primitive> {
    match ty {
        NativeType::Primitive(p) | NativeType::Boxed(p) if p.is_numeric() => Some(*p),
        _ => None,
    }
}

/// Boxed numbers (`java.lang.Integer`, ...). Also marshals every numeric
/// scalar, since that is their runtime type.
#[derive(Debug, Default)]
pub struct NumberSerializer;

impl Serializer for NumberSerializer {
    fn name(&self) -> &'static str {
        "number"
    }

    fn can_serialize(
        &self,
        _classes: &ClassTable,
        ty: &NativeType,
        json: Option<JsonKind>,
    ) -> bool {
        matches!(ty, NativeType::Boxed(p) if p.is_numeric()) && accepts_json(json)
    }

    fn marshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        number_to_json(self.name(), value)
    }

    fn try_unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        let p = numeric(ty).ok_or_else(|| type_mismatch(ty, json))?;
        to_number(p, json).map(|_| MatchScore::OKAY)
    }

    fn unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        let p = numeric(ty).ok_or_else(|| type_mismatch(ty, json))?;
        to_number(p, json)
    }
}

/// Unboxed numeric primitives (`int`, `double`, ...).
#[derive(Debug, Default)]
pub struct PrimitiveSerializer;

impl Serializer for PrimitiveSerializer {
    fn name(&self) -> &'static str {
        "primitive"
    }

    fn can_serialize(
        &self,
        _classes: &ClassTable,
        ty: &NativeType,
        json: Option<JsonKind>,
    ) -> bool {
        matches!(ty, NativeType::Primitive(p) if p.is_numeric()) && accepts_json(json)
    }

    fn marshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &ObjectHeap,
        value: &Native,
    ) -> Result<Value, MarshalError> {
        number_to_json(self.name(), value)
    }

    fn try_unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        ty: &NativeType,
        json: &Value,
    ) -> Result<MatchScore, UnmarshalError> {
        let p = numeric(ty).ok_or_else(|| type_mismatch(ty, json))?;
        to_number(p, json).map(|_| MatchScore::OKAY)
    }

    fn unmarshal(
        &self,
        _ser: &SerializerRegistry,
        _state: &mut SerializerState,
        _heap: &mut ObjectHeap,
        ty: &NativeType,
        json: &Value,
    ) -> Result<Native, UnmarshalError> {
        let p = numeric(ty).ok_or_else(|| type_mismatch(ty, json))?;
        to_number(p, json)
    }
}
