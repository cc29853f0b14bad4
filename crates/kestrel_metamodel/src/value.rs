//! Value types and their wire representation.
//!
//! Every value the framework exchanges is one of the [`ValueType`]s. A
//! [`Value`] is encoded into a [`ValueWithTypeDto`]: the type tag plus a
//! [`ValueDto`] in which exactly the field matching the tag is set.
//!
//! ```
//! use kestrel_metamodel::value::{self, Value, ValueType};
//!
//! let dto = value::encode(&Value::Int(42));
//! assert_eq!(dto.value_type, ValueType::Int);
//! assert_eq!(dto.value.int, Some(42));
//! assert_eq!(value::decode(&dto).unwrap(), Value::Int(42));
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::class::{PrimitiveType, builtin};
use crate::facet::ValueFacet;
use crate::ident::ClassName;
use crate::spec::{BeanSort, ObjectSpecification};

/// The closed set of marshallable value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[expect(missing_docs, reason = "Variant names are the value types")]
pub enum ValueType {
    String,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    LocalDate,
    LocalDateTime,
    Enum,
    Reference,
    Collection,
    Void,
}

impl ValueType {
    /// Value type of a builtin class or primitive.
    #[must_use]
    pub fn for_class_name(name: &ClassName) -> Option<Self> {
        if let Some(primitive) = PrimitiveType::from_name(name.as_str()) {
            return Some(Self::for_primitive(primitive));
        }
        let value_type = match name.as_str() {
            builtin::STRING => Self::String,
            builtin::BOOLEAN => Self::Boolean,
            builtin::CHARACTER => Self::Char,
            builtin::BYTE => Self::Byte,
            builtin::SHORT => Self::Short,
            builtin::INTEGER => Self::Int,
            builtin::LONG => Self::Long,
            builtin::FLOAT => Self::Float,
            builtin::DOUBLE => Self::Double,
            builtin::BIG_INTEGER => Self::BigInteger,
            builtin::BIG_DECIMAL => Self::BigDecimal,
            builtin::LOCAL_DATE => Self::LocalDate,
            builtin::LOCAL_DATE_TIME => Self::LocalDateTime,
            _ => return None,
        };
        Some(value_type)
    }

    /// Value type of a primitive.
    #[must_use]
    pub fn for_primitive(primitive: PrimitiveType) -> Self {
        match primitive {
            PrimitiveType::Boolean => Self::Boolean,
            PrimitiveType::Byte => Self::Byte,
            PrimitiveType::Short => Self::Short,
            PrimitiveType::Int => Self::Int,
            PrimitiveType::Long => Self::Long,
            PrimitiveType::Float => Self::Float,
            PrimitiveType::Double => Self::Double,
            PrimitiveType::Char => Self::Char,
        }
    }

    /// How values of the specified type are marshalled: the type's value
    /// facet if it has one, `Collection` for array types, `Reference` for
    /// everything else.
    #[must_use]
    pub fn for_specification(spec: &ObjectSpecification) -> Self {
        if let Some(value) = spec.facet::<ValueFacet>() {
            return value.value_type;
        }
        match spec.bean_sort() {
            BeanSort::Collection => Self::Collection,
            _ => Self::Reference,
        }
    }
}

/// Reference to a domain object: its logical type and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    /// Logical type name.
    pub logical_type: String,
    /// Instance identifier.
    pub id: String,
}

/// A value.
///
/// Arbitrary precision numbers and temporal values are carried in their
/// canonical literal form.
#[derive(Debug, Clone, PartialEq)]
#[expect(missing_docs, reason = "Variants mirror ValueType")]
pub enum Value {
    String(String),
    Boolean(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInteger(String),
    BigDecimal(String),
    LocalDate(String),
    LocalDateTime(String),
    Enum { enum_type: String, name: String },
    Reference(ObjectRef),
    Collection { element_type: ValueType, elements: Vec<Value> },
    Void,
}

impl Value {
    /// The value's type tag.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Char(_) => ValueType::Char,
            Self::Byte(_) => ValueType::Byte,
            Self::Short(_) => ValueType::Short,
            Self::Int(_) => ValueType::Int,
            Self::Long(_) => ValueType::Long,
            Self::Float(_) => ValueType::Float,
            Self::Double(_) => ValueType::Double,
            Self::BigInteger(_) => ValueType::BigInteger,
            Self::BigDecimal(_) => ValueType::BigDecimal,
            Self::LocalDate(_) => ValueType::LocalDate,
            Self::LocalDateTime(_) => ValueType::LocalDateTime,
            Self::Enum { .. } => ValueType::Enum,
            Self::Reference(_) => ValueType::Reference,
            Self::Collection { .. } => ValueType::Collection,
            Self::Void => ValueType::Void,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Enum constant on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDto {
    /// Enum class.
    pub enum_type: String,
    /// Constant name.
    pub enum_name: String,
}

/// Collection on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDto {
    /// Type of every element.
    pub element_type: ValueType,
    /// Elements.
    pub values: Vec<ValueDto>,
}

/// Untagged value payload: one optional field per value type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(missing_docs, reason = "Fields mirror ValueType")]
pub struct ValueDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_integer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_date_time: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_value: Option<EnumDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ObjectRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionDto>,
}

/// A value with its type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueWithTypeDto {
    /// The type tag.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// The payload.
    #[serde(flatten)]
    pub value: ValueDto,
}

/// Errors raised while marshalling values.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// The field the declared type requires is absent.
    #[error("value of type {value_type:?} is missing its `{field}` field")]
    MissingField {
        /// Declared type.
        value_type: ValueType,
        /// The missing field.
        field: &'static str,
    },

    /// A literal is not in canonical form.
    #[error("invalid {value_type:?} literal: {literal:?}")]
    InvalidLiteral {
        /// Declared type.
        value_type: ValueType,
        /// The offending literal.
        literal: String,
    },

    /// A value does not have the type it is encoded as.
    #[error("expected a {expected:?} value, got {actual:?}")]
    TypeMismatch {
        /// Requested type.
        expected: ValueType,
        /// The value's type.
        actual: ValueType,
    },

    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Encodes a value with its own type tag.
#[must_use]
pub fn encode(value: &Value) -> ValueWithTypeDto {
    ValueWithTypeDto {
        value_type: value.value_type(),
        value: encode_payload(value),
    }
}

/// Encodes a value that must have type `expected`.
///
/// # Errors
///
/// [`MarshalError::TypeMismatch`] if the value has another type.
pub fn encode_as(expected: ValueType, value: &Value) -> Result<ValueWithTypeDto, MarshalError> {
    let actual = value.value_type();
    if actual != expected {
        return Err(MarshalError::TypeMismatch { expected, actual });
    }
    Ok(encode(value))
}

fn encode_payload(value: &Value) -> ValueDto {
    let mut dto = ValueDto::default();
    match value {
        Value::String(s) => dto.string = Some(s.clone()),
        Value::Boolean(b) => dto.boolean = Some(*b),
        Value::Char(c) => dto.char = Some(*c),
        Value::Byte(n) => dto.byte = Some(*n),
        Value::Short(n) => dto.short = Some(*n),
        Value::Int(n) => dto.int = Some(*n),
        Value::Long(n) => dto.long = Some(*n),
        Value::Float(n) => dto.float = Some(*n),
        Value::Double(n) => dto.double = Some(*n),
        Value::BigInteger(s) => dto.big_integer = Some(s.clone()),
        Value::BigDecimal(s) => dto.big_decimal = Some(s.clone()),
        Value::LocalDate(s) => dto.local_date = Some(s.clone()),
        Value::LocalDateTime(s) => dto.local_date_time = Some(s.clone()),
        Value::Enum { enum_type, name } => {
            dto.enum_value = Some(EnumDto {
                enum_type: enum_type.clone(),
                enum_name: name.clone(),
            });
        }
        Value::Reference(reference) => dto.reference = Some(reference.clone()),
        Value::Collection {
            element_type,
            elements,
        } => {
            dto.collection = Some(CollectionDto {
                element_type: *element_type,
                values: elements.iter().map(encode_payload).collect(),
            });
        }
        Value::Void => {}
    }
    dto
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decodes a tagged value.
///
/// # Errors
///
/// [`MarshalError::MissingField`] if the field the tag requires is absent,
/// [`MarshalError::InvalidLiteral`] for malformed numbers and dates.
pub fn decode(dto: &ValueWithTypeDto) -> Result<Value, MarshalError> {
    decode_payload(dto.value_type, &dto.value)
}

fn required<T: Clone>(
    field: &Option<T>,
    value_type: ValueType,
    name: &'static str,
) -> Result<T, MarshalError> {
    field.clone().ok_or(MarshalError::MissingField {
        value_type,
        field: name,
    })
}

fn checked(
    literal: String,
    value_type: ValueType,
    valid: fn(&str) -> bool,
) -> Result<String, MarshalError> {
    if valid(&literal) {
        Ok(literal)
    } else {
        Err(MarshalError::InvalidLiteral {
            value_type,
            literal,
        })
    }
}

fn decode_payload(value_type: ValueType, dto: &ValueDto) -> Result<Value, MarshalError> {
    let t = value_type;
    let value = match value_type {
        ValueType::String => Value::String(required(&dto.string, t, "string")?),
        ValueType::Boolean => Value::Boolean(required(&dto.boolean, t, "boolean")?),
        ValueType::Char => Value::Char(required(&dto.char, t, "char")?),
        ValueType::Byte => Value::Byte(required(&dto.byte, t, "byte")?),
        ValueType::Short => Value::Short(required(&dto.short, t, "short")?),
        ValueType::Int => Value::Int(required(&dto.int, t, "int")?),
        ValueType::Long => Value::Long(required(&dto.long, t, "long")?),
        ValueType::Float => Value::Float(required(&dto.float, t, "float")?),
        ValueType::Double => Value::Double(required(&dto.double, t, "double")?),
        ValueType::BigInteger => Value::BigInteger(checked(
            required(&dto.big_integer, t, "bigInteger")?,
            t,
            is_integer_literal,
        )?),
        ValueType::BigDecimal => Value::BigDecimal(checked(
            required(&dto.big_decimal, t, "bigDecimal")?,
            t,
            is_decimal_literal,
        )?),
        ValueType::LocalDate => Value::LocalDate(checked(
            required(&dto.local_date, t, "localDate")?,
            t,
            is_date_literal,
        )?),
        ValueType::LocalDateTime => Value::LocalDateTime(checked(
            required(&dto.local_date_time, t, "localDateTime")?,
            t,
            is_date_time_literal,
        )?),
        ValueType::Enum => {
            let enum_dto = required(&dto.enum_value, t, "enum")?;
            Value::Enum {
                enum_type: enum_dto.enum_type,
                name: enum_dto.enum_name,
            }
        }
        ValueType::Reference => Value::Reference(required(&dto.reference, t, "reference")?),
        ValueType::Collection => {
            let collection = dto.collection.as_ref().ok_or(MarshalError::MissingField {
                value_type: t,
                field: "collection",
            })?;
            let elements = collection
                .values
                .iter()
                .map(|element| decode_payload(collection.element_type, element))
                .collect::<Result<Vec<_>, _>>()?;
            Value::Collection {
                element_type: collection.element_type,
                elements,
            }
        }
        ValueType::Void => Value::Void,
    };
    Ok(value)
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    match unsigned.split_once('.') {
        Some((whole, fraction)) => {
            !whole.is_empty()
                && !fraction.is_empty()
                && whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
        }
        None => is_integer_literal(unsigned),
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

fn is_date_literal(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok()
}

fn is_date_time_literal(s: &str) -> bool {
    s.split_once('T')
        .is_some_and(|(date, _)| is_date_literal(date))
        && DATE_TIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
}

/// Encodes a value as JSON.
///
/// # Errors
///
/// [`MarshalError::Json`] if serialization fails.
pub fn to_json(value: &Value) -> Result<String, MarshalError> {
    Ok(serde_json::to_string(&encode(value))?)
}

/// Decodes a value from JSON.
///
/// # Errors
///
/// [`MarshalError::Json`] for malformed JSON, otherwise as [`decode`].
pub fn from_json(json: &str) -> Result<Value, MarshalError> {
    let dto: ValueWithTypeDto = serde_json::from_str(json)?;
    decode(&dto)
}
