//! Identifier transforms shared by every generated artifact.
//!
//! Message and field names arrive in mixed case (`setPowerLevel`). File names,
//! C prefixes and Python modules use the snake stem, C type names and Python
//! classes use the capitalized stem.

use thiserror::Error;

/// Returned when an identifier transform is handed an empty string.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("identifier must not be empty")]
pub struct EmptyIdentifier;

/// Inserts `_` before every ASCII uppercase letter except a leading one, then
/// lower-cases the result.
///
/// Consecutive capitals are split individually (`ADCValue` -> `a_d_c_value`).
pub fn to_snake(name: &str) -> Result<String, EmptyIdentifier> {
    if name.is_empty() {
        return Err(EmptyIdentifier);
    }
    let mut result = String::with_capacity(name.len() + 4);
    for (index, ch) in name.chars().enumerate() {
        if index > 0 && ch.is_ascii_uppercase() {
            result.push('_');
        }
        result.push(ch.to_ascii_lowercase());
    }
    Ok(result)
}

/// Upper-case snake form, used for C macros and enum constants.
pub fn to_upper_snake(name: &str) -> Result<String, EmptyIdentifier> {
    Ok(to_snake(name)?.to_ascii_uppercase())
}

/// Uppercases only the first character; internal capitals are kept verbatim.
pub fn capitalize_first(name: &str) -> Result<String, EmptyIdentifier> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(EmptyIdentifier)?;
    let mut result = String::with_capacity(name.len());
    result.extend(first.to_uppercase());
    result.push_str(chars.as_str());
    Ok(result)
}

/// C11 keywords, plus the `stdbool.h` macros every generated header includes.
const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Alignas", "_Alignof", "_Atomic", "_Bool",
    "_Complex", "_Generic", "_Imaginary", "_Noreturn", "_Static_assert", "_Thread_local", "bool",
    "true", "false",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}

pub fn is_c_keyword(name: &str) -> bool {
    C_KEYWORDS.contains(&name)
}

pub fn is_python_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}
