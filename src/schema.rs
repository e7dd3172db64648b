//! Schema normalization: raw message definitions into resolved, immutable
//! field lists.
//!
//! Every source field produces a fresh [`ResolvedField`]; the raw document is
//! never modified, so the same input can be normalized any number of times
//! with identical results.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::document::{MessageKind, RawField, RawMessage};
use crate::error::SchemaError;
use crate::naming::{
    capitalize_first, is_c_keyword, is_identifier, is_python_keyword, to_snake, to_upper_snake,
};
use crate::types::{HostScalar, TypeTag};

/// Largest enum that still encodes its ordinal in a single `B` byte.
pub const MAX_ENUM_VALUES: usize = 256;
/// A `p` field spends one byte on the length prefix, which caps the payload at 255.
pub const MAX_BYTES_LENGTH: u64 = 256;

/// Snake field names that would shadow the receiver, the `struct` module, a
/// builtin or a method of the generated Python class.
const RESERVED_FIELD_NAMES: &[&str] = &[
    "self",
    "cls",
    "struct",
    "int",
    "bytes",
    "pack",
    "unpack",
    "pack_returns",
    "unpack_returns",
];

/// Capitalized enum names taken by payload struct typedefs (`<Msg>Arguments_t`)
/// and by the class-level names of the generated Python class.
const RESERVED_ENUM_TYPE_NAMES: &[&str] = &[
    "Arguments",
    "Returns",
    "Parameters",
    "IntEnum",
    "FORMAT",
    "SIZE",
    "OPERATION_ID",
    "REPORT_ID",
    "ARGUMENTS_FORMAT",
    "ARGUMENTS_SIZE",
    "RETURNS_FORMAT",
    "RETURNS_SIZE",
];

const NOT_AN_IDENTIFIER: &str = "expected [A-Za-z_][A-Za-z0-9_]*";

/// Name forms derived once per message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageNames {
    pub source: String,
    pub snake: String,
    pub upper_snake: String,
    pub capitalized: String,
}

impl MessageNames {
    pub fn derive(name: &str) -> Result<Self, SchemaError> {
        let empty = |_| SchemaError::EmptyIdentifier {
            message: name.to_string(),
            location: "message name".to_string(),
        };
        let names = Self {
            source: name.to_string(),
            snake: to_snake(name).map_err(empty)?,
            upper_snake: to_upper_snake(name).map_err(empty)?,
            capitalized: capitalize_first(name).map_err(empty)?,
        };
        let problem = if !is_identifier(name) {
            Some(NOT_AN_IDENTIFIER)
        } else if is_python_keyword(&names.snake) || is_python_keyword(&names.capitalized) {
            Some("module or class name is a Python keyword")
        } else {
            None
        };
        match problem {
            Some(reason) => Err(SchemaError::InvalidIdentifier {
                message: name.to_string(),
                location: "message name".to_string(),
                identifier: name.to_string(),
                reason,
            }),
            None => Ok(names),
        }
    }
}

/// Enum metadata resolved from an `enum` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumSpec {
    /// `enumName` as written.
    pub name: String,
    /// Capitalized `enumName`.
    pub type_name: String,
    /// `<CapitalizedMessageName><CapitalizedEnumName>`, unique per message.
    pub type_ident: String,
    pub upper_snake: String,
    /// Source order is ordinal order.
    pub values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedType {
    /// One of the fixed-width numeric tags.
    Scalar(TypeTag),
    Enum(EnumSpec),
    String { length: usize },
    Bytes { length: usize },
}

impl ResolvedType {
    pub fn tag(&self) -> TypeTag {
        match self {
            ResolvedType::Scalar(tag) => *tag,
            ResolvedType::Enum(_) => TypeTag::Enum,
            ResolvedType::String { .. } => TypeTag::String,
            ResolvedType::Bytes { .. } => TypeTag::Bytes,
        }
    }

    fn length(&self) -> usize {
        match self {
            ResolvedType::String { length } | ResolvedType::Bytes { length } => *length,
            _ => 0,
        }
    }

    pub fn pack_symbol(&self) -> String {
        self.tag().pack_symbol(self.length())
    }

    pub fn byte_len(&self) -> usize {
        self.tag().byte_len(self.length())
    }

    pub fn host_scalar(&self) -> HostScalar {
        self.tag().host_scalar()
    }

    /// C type used in the generated struct member declaration.
    pub fn c_type(&self) -> String {
        match self {
            ResolvedType::Enum(spec) => format!("{}_t", spec.type_ident),
            other => other.tag().c_type().to_string(),
        }
    }

    pub fn as_enum(&self) -> Option<&EnumSpec> {
        match self {
            ResolvedType::Enum(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Validated default value for a field.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultValue {
    Integer(i64),
    Float(f64),
    Member { name: String, ordinal: usize },
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    /// Zero-based wire position within its field list.
    pub position: usize,
    pub snake_name: String,
    pub ty: ResolvedType,
    /// `name` or `name[n]` for string and bytes fields.
    pub c_declarator: String,
    pub description: Option<String>,
    pub default: Option<DefaultValue>,
}

impl ResolvedField {
    pub fn c_type(&self) -> String {
        self.ty.c_type()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedMessage {
    pub kind: MessageKind,
    pub id: u32,
    pub names: MessageNames,
    pub description: Option<String>,
    pub fields_in: Vec<ResolvedField>,
    pub fields_out: Option<Vec<ResolvedField>>,
}

impl NormalizedMessage {
    /// Inputs followed by outputs, in wire order.
    pub fn all_fields(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields_in
            .iter()
            .chain(self.fields_out.iter().flatten())
    }
}

/// Normalizes one raw definition listed under `kind`.
pub fn normalize(raw: &RawMessage, kind: MessageKind) -> Result<NormalizedMessage, SchemaError> {
    let names = MessageNames::derive(&raw.name)?;

    let misplaced = match kind {
        MessageKind::Telecommand => raw.parameters.as_ref().map(|_| "parameters"),
        MessageKind::Telemetry => raw.arguments.as_ref().map(|_| "arguments"),
    };
    if let Some(key) = misplaced {
        return Err(SchemaError::MisplacedFields {
            message: raw.name.clone(),
            kind,
            key,
        });
    }

    let source_in = match kind {
        MessageKind::Telecommand => raw.arguments.as_deref(),
        MessageKind::Telemetry => raw.parameters.as_deref(),
    }
    .unwrap_or_default();
    let source_out = output_fields(raw, kind)?;

    let mut enum_idents = HashSet::new();
    let fields_in = resolve_fields(&names, source_in, &mut enum_idents)?;
    let fields_out = match source_out {
        Some(fields) => Some(resolve_fields(&names, &fields, &mut enum_idents)?),
        None => None,
    };

    debug!(
        kind = %kind,
        message = %names.source,
        inputs = fields_in.len(),
        outputs = fields_out.as_ref().map_or(0, Vec::len),
        "normalized message"
    );

    Ok(NormalizedMessage {
        kind,
        id: raw.id,
        names,
        description: raw.description.clone(),
        fields_in,
        fields_out,
    })
}

/// Folds the legacy singular `return` into the plural form. An empty
/// `returns` list means no response payload.
fn output_fields(raw: &RawMessage, kind: MessageKind) -> Result<Option<Vec<RawField>>, SchemaError> {
    let has_outputs = raw.legacy_return.is_some() || raw.returns.is_some();
    if kind == MessageKind::Telemetry {
        if has_outputs {
            return Err(SchemaError::UnexpectedReturns {
                message: raw.name.clone(),
            });
        }
        return Ok(None);
    }

    match (&raw.legacy_return, &raw.returns) {
        (Some(_), Some(_)) => Err(SchemaError::ConflictingReturns {
            message: raw.name.clone(),
        }),
        (Some(single), None) => Ok(Some(vec![single.clone()])),
        (None, Some(list)) if !list.is_empty() => Ok(Some(list.clone())),
        _ => Ok(None),
    }
}

fn resolve_fields(
    names: &MessageNames,
    fields: &[RawField],
    enum_idents: &mut HashSet<String>,
) -> Result<Vec<ResolvedField>, SchemaError> {
    // Emitters use the snake form, so `busVoltage` and `bus_voltage` collide.
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(fields.len());
    for (position, field) in fields.iter().enumerate() {
        let next = resolve_field(names, position, field, enum_idents)?;
        if !seen.insert(next.snake_name.clone()) {
            return Err(SchemaError::DuplicateField {
                message: names.source.clone(),
                field: field.name.clone(),
            });
        }
        resolved.push(next);
    }
    Ok(resolved)
}

fn resolve_field(
    names: &MessageNames,
    position: usize,
    field: &RawField,
    enum_idents: &mut HashSet<String>,
) -> Result<ResolvedField, SchemaError> {
    let message = names.source.as_str();
    let snake_name = to_snake(&field.name).map_err(|_| SchemaError::EmptyIdentifier {
        message: message.to_string(),
        location: format!("field name at position {}", position),
    })?;
    if let Some(reason) = field_name_problem(&field.name, &snake_name) {
        return Err(SchemaError::InvalidIdentifier {
            message: message.to_string(),
            location: format!("field name at position {}", position),
            identifier: field.name.clone(),
            reason,
        });
    }

    let tag = TypeTag::from_tag(&field.type_tag).ok_or_else(|| SchemaError::UnsupportedType {
        message: message.to_string(),
        field: field.name.clone(),
        tag: field.type_tag.clone(),
    })?;

    let ty = match tag {
        TypeTag::Enum => ResolvedType::Enum(resolve_enum(names, field, enum_idents)?),
        TypeTag::String => ResolvedType::String {
            length: checked_length(message, field, tag, "stringLength", field.string_length, u64::MAX)?,
        },
        TypeTag::Bytes => ResolvedType::Bytes {
            length: checked_length(message, field, tag, "length", field.length, MAX_BYTES_LENGTH)?,
        },
        scalar => ResolvedType::Scalar(scalar),
    };

    let c_declarator = match &ty {
        ResolvedType::String { length } | ResolvedType::Bytes { length } => {
            format!("{}[{}]", snake_name, length)
        }
        _ => snake_name.clone(),
    };

    let default = match &field.default {
        Some(value) => Some(resolve_default(message, field, &ty, value)?),
        None => None,
    };

    Ok(ResolvedField {
        name: field.name.clone(),
        position,
        snake_name,
        ty,
        c_declarator,
        description: field.description.clone(),
        default,
    })
}

fn resolve_enum(
    names: &MessageNames,
    field: &RawField,
    enum_idents: &mut HashSet<String>,
) -> Result<EnumSpec, SchemaError> {
    let message = names.source.as_str();
    let enum_name = field
        .enum_name
        .as_deref()
        .ok_or_else(|| SchemaError::MissingEnumName {
            message: message.to_string(),
            field: field.name.clone(),
        })?;
    let values = field
        .values
        .as_ref()
        .ok_or_else(|| SchemaError::MissingEnumValues {
            message: message.to_string(),
            field: field.name.clone(),
        })?;

    let empty = |location: String| SchemaError::EmptyIdentifier {
        message: message.to_string(),
        location,
    };
    let type_name = capitalize_first(enum_name)
        .map_err(|_| empty(format!("enumName of field '{}'", field.name)))?;
    let upper_snake = to_upper_snake(enum_name)
        .map_err(|_| empty(format!("enumName of field '{}'", field.name)))?;
    let invalid = |location: &str, identifier: &str, reason| SchemaError::InvalidIdentifier {
        message: message.to_string(),
        location: format!("{} of field '{}'", location, field.name),
        identifier: identifier.to_string(),
        reason,
    };
    if !is_identifier(enum_name) {
        return Err(invalid("enumName", enum_name, NOT_AN_IDENTIFIER));
    }
    if is_python_keyword(&type_name) {
        return Err(invalid("enumName", enum_name, "class name is a Python keyword"));
    }
    if RESERVED_ENUM_TYPE_NAMES.contains(&type_name.as_str()) {
        return Err(invalid(
            "enumName",
            enum_name,
            "clashes with a generated payload type or class constant",
        ));
    }

    if values.is_empty() {
        return Err(SchemaError::EmptyEnumValues {
            message: message.to_string(),
            field: field.name.clone(),
        });
    }
    if values.len() > MAX_ENUM_VALUES {
        return Err(SchemaError::TooManyEnumValues {
            message: message.to_string(),
            field: field.name.clone(),
            count: values.len(),
        });
    }
    let mut seen = HashSet::new();
    for value in values {
        if value.is_empty() {
            return Err(empty(format!("values of field '{}'", field.name)));
        }
        if let Some(reason) = enum_value_problem(value) {
            return Err(invalid("values", value, reason));
        }
        if !seen.insert(value.as_str()) {
            return Err(SchemaError::DuplicateEnumValue {
                message: message.to_string(),
                field: field.name.clone(),
                value: value.clone(),
            });
        }
    }

    let type_ident = format!("{}{}", names.capitalized, type_name);
    if !enum_idents.insert(type_ident.clone()) {
        return Err(SchemaError::DuplicateEnumName {
            message: message.to_string(),
            field: field.name.clone(),
            enum_name: enum_name.to_string(),
        });
    }

    Ok(EnumSpec {
        name: enum_name.to_string(),
        type_name,
        type_ident,
        upper_snake,
        values: values.clone(),
    })
}

fn field_name_problem(name: &str, snake_name: &str) -> Option<&'static str> {
    if !is_identifier(name) {
        Some(NOT_AN_IDENTIFIER)
    } else if is_c_keyword(snake_name) {
        Some("is a C keyword")
    } else if is_python_keyword(snake_name) {
        Some("is a Python keyword")
    } else if RESERVED_FIELD_NAMES.contains(&snake_name) {
        Some("is taken by the generated Python class")
    } else {
        None
    }
}

/// Members are emitted verbatim into a Python `IntEnum` body.
fn enum_value_problem(value: &str) -> Option<&'static str> {
    if !is_identifier(value) {
        Some(NOT_AN_IDENTIFIER)
    } else if is_python_keyword(value) {
        Some("is a Python keyword")
    } else if value.starts_with('_') || value == "mro" {
        Some("is not a valid IntEnum member name")
    } else {
        None
    }
}

fn checked_length(
    message: &str,
    field: &RawField,
    tag: TypeTag,
    key: &'static str,
    length: Option<u64>,
    max: u64,
) -> Result<usize, SchemaError> {
    let length = length.ok_or_else(|| SchemaError::MissingLength {
        message: message.to_string(),
        field: field.name.clone(),
        tag: tag.as_str(),
        key,
    })?;
    let out_of_range = || SchemaError::LengthOutOfRange {
        message: message.to_string(),
        field: field.name.clone(),
        tag: tag.as_str(),
        length,
        min: 1,
        max,
    };
    if length == 0 || length > max {
        return Err(out_of_range());
    }
    usize::try_from(length).map_err(|_| out_of_range())
}

fn resolve_default(
    message: &str,
    field: &RawField,
    ty: &ResolvedType,
    value: &Value,
) -> Result<DefaultValue, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidDefault {
        message: message.to_string(),
        field: field.name.clone(),
        reason,
    };

    match ty {
        ResolvedType::Scalar(TypeTag::Float32) => {
            let number = value
                .as_f64()
                .ok_or_else(|| invalid(format!("expected a number, found {}", value)))?;
            if !number.is_finite() || number.abs() > f32::MAX as f64 {
                return Err(invalid(format!("{} does not fit in float32", number)));
            }
            Ok(DefaultValue::Float(number))
        }
        ResolvedType::Scalar(tag) => {
            let (min, max) = tag
                .integer_range()
                .ok_or_else(|| invalid(format!("no range known for {}", tag.as_str())))?;
            let number = match value.as_i64() {
                Some(number) => number,
                None if value.as_u64().is_some() => {
                    return Err(invalid(format!("{} does not fit in {}", value, tag.as_str())));
                }
                None => return Err(invalid(format!("expected an integer, found {}", value))),
            };
            if number < min || number > max {
                return Err(invalid(format!(
                    "{} does not fit in {} ({}..={})",
                    number,
                    tag.as_str(),
                    min,
                    max
                )));
            }
            Ok(DefaultValue::Integer(number))
        }
        ResolvedType::Enum(spec) => {
            let name = value
                .as_str()
                .ok_or_else(|| invalid(format!("expected a member name, found {}", value)))?;
            let ordinal = spec
                .values
                .iter()
                .position(|member| member == name)
                .ok_or_else(|| invalid(format!("'{}' is not a member of {}", name, spec.name)))?;
            Ok(DefaultValue::Member {
                name: name.to_string(),
                ordinal,
            })
        }
        ResolvedType::String { length } => {
            let text = value
                .as_str()
                .ok_or_else(|| invalid(format!("expected a string, found {}", value)))?;
            if !text.is_ascii() {
                return Err(invalid("string defaults must be ASCII".to_string()));
            }
            if text.len() > *length {
                return Err(invalid(format!(
                    "{} bytes exceed stringLength {}",
                    text.len(),
                    length
                )));
            }
            Ok(DefaultValue::Text(text.to_string()))
        }
        ResolvedType::Bytes { .. } => Err(invalid("bytes fields take no default".to_string())),
    }
}
