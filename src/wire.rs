//! Pack-format derivation for resolved field lists.
//!
//! The format string uses Python `struct` notation and is the binary contract
//! between the generated C structs and the generated Python classes.

use std::fmt;

use crate::schema::ResolvedField;

/// Little-endian, standard sizes, no alignment padding.
pub const LITTLE_ENDIAN_MARKER: char = '<';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireFormat {
    format: String,
    size: usize,
}

impl WireFormat {
    pub fn as_str(&self) -> &str {
        &self.format
    }

    /// Total encoded size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format)
    }
}

/// Concatenates each field's pack symbol in field order behind a single
/// endianness marker. Symbols are space separated, which `struct` ignores.
pub fn derive(fields: &[ResolvedField]) -> WireFormat {
    let symbols: Vec<String> = fields.iter().map(|f| f.ty.pack_symbol()).collect();
    let mut format = String::with_capacity(1 + symbols.len() * 3);
    format.push(LITTLE_ENDIAN_MARKER);
    format.push_str(&symbols.join(" "));
    WireFormat {
        format,
        size: wire_size(fields),
    }
}

pub fn wire_size(fields: &[ResolvedField]) -> usize {
    fields.iter().map(|f| f.ty.byte_len()).sum()
}
