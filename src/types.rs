//! Fixed mapping from abstract field type tags to their C, pack-format and
//! host-side representations.

/// Closed set of field type tags accepted in a message definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int16,
    Int32,
    Float32,
    Enum,
    String,
    Bytes,
}

/// Value category a field takes on the Python side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostScalar {
    Integer,
    Float,
    Text,
    ByteBuffer,
}

impl HostScalar {
    pub fn python_type(self) -> &'static str {
        match self {
            HostScalar::Integer => "int",
            HostScalar::Float => "float",
            HostScalar::Text => "str",
            HostScalar::ByteBuffer => "bytes",
        }
    }
}

impl TypeTag {
    pub const ALL: [TypeTag; 10] = [
        TypeTag::Uint8,
        TypeTag::Uint16,
        TypeTag::Uint32,
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Float32,
        TypeTag::Enum,
        TypeTag::String,
        TypeTag::Bytes,
    ];

    /// Looks up a tag by its schema spelling. Matching is exact; `UINT8` is not
    /// a valid tag.
    pub fn from_tag(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Uint8 => "uint8",
            TypeTag::Uint16 => "uint16",
            TypeTag::Uint32 => "uint32",
            TypeTag::Int8 => "int8",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Float32 => "float32",
            TypeTag::Enum => "enum",
            TypeTag::String => "string",
            TypeTag::Bytes => "bytes",
        }
    }

    /// Pack-format character. `string` and `bytes` are prefixed with their
    /// declared length by [`TypeTag::pack_symbol`].
    pub fn pack_char(self) -> char {
        match self {
            TypeTag::Uint8 | TypeTag::Enum => 'B',
            TypeTag::Uint16 => 'H',
            TypeTag::Uint32 => 'I',
            TypeTag::Int8 => 'b',
            TypeTag::Int16 => 'h',
            TypeTag::Int32 => 'i',
            TypeTag::Float32 => 'f',
            TypeTag::String => 's',
            TypeTag::Bytes => 'p',
        }
    }

    pub fn is_length_parameterized(self) -> bool {
        matches!(self, TypeTag::String | TypeTag::Bytes)
    }

    /// Full pack symbol; `length` is only consulted for `string` and `bytes`.
    pub fn pack_symbol(self, length: usize) -> String {
        if self.is_length_parameterized() {
            format!("{}{}", length, self.pack_char())
        } else {
            self.pack_char().to_string()
        }
    }

    pub fn host_scalar(self) -> HostScalar {
        match self {
            TypeTag::Uint8
            | TypeTag::Uint16
            | TypeTag::Uint32
            | TypeTag::Int8
            | TypeTag::Int16
            | TypeTag::Int32
            | TypeTag::Enum => HostScalar::Integer,
            TypeTag::Float32 => HostScalar::Float,
            TypeTag::String => HostScalar::Text,
            TypeTag::Bytes => HostScalar::ByteBuffer,
        }
    }

    /// C element type. Enum fields are declared with their generated typedef
    /// instead, which is itself a `uint8_t`.
    pub fn c_type(self) -> &'static str {
        match self {
            TypeTag::Uint8 | TypeTag::Enum | TypeTag::Bytes => "uint8_t",
            TypeTag::Uint16 => "uint16_t",
            TypeTag::Uint32 => "uint32_t",
            TypeTag::Int8 => "int8_t",
            TypeTag::Int16 => "int16_t",
            TypeTag::Int32 => "int32_t",
            TypeTag::Float32 => "float",
            TypeTag::String => "char",
        }
    }

    /// Byte width on the wire; `length` is only consulted for `string` and `bytes`.
    pub fn byte_len(self, length: usize) -> usize {
        match self {
            TypeTag::Uint8 | TypeTag::Int8 | TypeTag::Enum => 1,
            TypeTag::Uint16 | TypeTag::Int16 => 2,
            TypeTag::Uint32 | TypeTag::Int32 | TypeTag::Float32 => 4,
            TypeTag::String | TypeTag::Bytes => length,
        }
    }

    /// Inclusive value range for the integer tags.
    pub fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            TypeTag::Uint8 => Some((0, u8::MAX as i64)),
            TypeTag::Uint16 => Some((0, u16::MAX as i64)),
            TypeTag::Uint32 => Some((0, u32::MAX as i64)),
            TypeTag::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            TypeTag::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            TypeTag::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            _ => None,
        }
    }
}
