//! C99 code generator for canonical records.
//!
//! Per message this emits a generated base header/source pair holding the
//! packed payload structs and their little-endian encode/decode functions, an
//! `_auto.c` glue file wiring the wire format to the application hook, and an
//! application header/source pair with the hook declaration and a stub.

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use crate::OutputFile;
use crate::document::MessageKind;
use crate::enums::Enumeration;
use crate::record::CanonicalRecord;
use crate::schema::{DefaultValue, ResolvedField, ResolvedType};
use crate::types::TypeTag;
use crate::wire::WireFormat;

/// Name of the shared helper header, placed next to the `tc`/`tm` directories.
pub const WIRE_HELPER_HEADER: &str = "tmtc_wire.h";

/// Little-endian read/write helpers, concatenated into [`WIRE_HELPER_HEADER`].
const TEMPLATE_FILES: &[&str] = &[
    include_str!("msg_template/c/helpers_u16.h"),
    include_str!("msg_template/c/helpers_u32.h"),
    include_str!("msg_template/c/helpers_f32.h"),
];

/// Which side of the link a generated function serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    /// Spacecraft produces the payload (returns, telemetry parameters).
    Encode,
    /// Spacecraft consumes the payload (telecommand arguments).
    Decode,
}

/// One packed struct inside a message.
struct Payload<'a> {
    suffix: &'static str,
    type_suffix: &'static str,
    fields: &'a [ResolvedField],
    wire: &'a WireFormat,
    direction: Direction,
}

/// Naming context shared by every file of one message.
struct CMessage<'a> {
    record: &'a CanonicalRecord,
    /// File stem and function prefix, `tm_`-prefixed for telemetry.
    stem: String,
    macro_prefix: String,
    payloads: Vec<Payload<'a>>,
}

impl<'a> CMessage<'a> {
    fn new(record: &'a CanonicalRecord) -> Self {
        let (stem, macro_prefix) = match record.kind {
            MessageKind::Telecommand => (
                record.names.snake.clone(),
                record.names.upper_snake.clone(),
            ),
            MessageKind::Telemetry => (
                format!("tm_{}", record.names.snake),
                format!("TM_{}", record.names.upper_snake),
            ),
        };

        let mut payloads = Vec::new();
        match record.kind {
            MessageKind::Telecommand => {
                if !record.fields_in.is_empty() {
                    payloads.push(Payload {
                        suffix: "arguments",
                        type_suffix: "Arguments",
                        fields: &record.fields_in,
                        wire: &record.wire_in,
                        direction: Direction::Decode,
                    });
                }
                if let (Some(fields), Some(wire)) = (&record.fields_out, &record.wire_out) {
                    payloads.push(Payload {
                        suffix: "returns",
                        type_suffix: "Returns",
                        fields,
                        wire,
                        direction: Direction::Encode,
                    });
                }
            }
            MessageKind::Telemetry => {
                if !record.fields_in.is_empty() {
                    payloads.push(Payload {
                        suffix: "parameters",
                        type_suffix: "Parameters",
                        fields: &record.fields_in,
                        wire: &record.wire_in,
                        direction: Direction::Encode,
                    });
                }
            }
        }

        Self {
            record,
            stem,
            macro_prefix,
            payloads,
        }
    }

    fn payload(&self, suffix: &str) -> Option<&Payload<'a>> {
        self.payloads.iter().find(|p| p.suffix == suffix)
    }

    fn struct_name(&self, payload: &Payload) -> String {
        format!("{}{}_t", self.record.names.capitalized, payload.type_suffix)
    }

    fn size_macro(&self, payload: &Payload) -> String {
        format!(
            "{}_{}_SIZE",
            self.macro_prefix,
            payload.suffix.to_ascii_uppercase()
        )
    }

    fn encode_fn(&self, payload: &Payload) -> String {
        format!("{}_encode_{}", self.stem, payload.suffix)
    }

    fn decode_fn(&self, payload: &Payload) -> String {
        format!("{}_decode_{}", self.stem, payload.suffix)
    }

    fn base_header(&self) -> String {
        format!("{}_base.h", self.stem)
    }

    fn app_header(&self) -> String {
        format!("{}.h", self.stem)
    }

    /// Application hook implemented in the user source file.
    fn hook_fn(&self) -> String {
        match self.record.kind {
            MessageKind::Telecommand => format!("{}_handler", self.stem),
            MessageKind::Telemetry => format!("{}_collect", self.stem),
        }
    }

    fn hook_params(&self) -> String {
        let mut params = Vec::new();
        for payload in &self.payloads {
            let constness = match (self.record.kind, payload.direction) {
                (MessageKind::Telecommand, Direction::Decode) => "const ",
                _ => "",
            };
            params.push(format!(
                "{}{} *{}",
                constness,
                self.struct_name(payload),
                payload.suffix
            ));
        }
        if params.is_empty() {
            "void".to_string()
        } else {
            params.join(", ")
        }
    }

    fn hook_prototype(&self) -> String {
        format!("int {}({})", self.hook_fn(), self.hook_params())
    }

    fn glue_prototype(&self) -> String {
        match self.record.kind {
            MessageKind::Telecommand => format!(
                "int {}_dispatch(const uint8_t *in_buf, size_t in_len, uint8_t *out_buf, size_t out_len, size_t *written)",
                self.stem
            ),
            MessageKind::Telemetry => format!(
                "size_t {}_build(uint8_t *out_buf, size_t out_len)",
                self.stem
            ),
        }
    }

    fn dir(&self) -> &'static str {
        match self.record.kind {
            MessageKind::Telecommand => "c/tc",
            MessageKind::Telemetry => "c/tm",
        }
    }
}

/// Generates every C file for `records`, plus the shared wire helper header.
///
/// Paths in the returned files are relative to the output root.
pub fn generate(records: &[CanonicalRecord], input_path: &Path) -> Vec<OutputFile> {
    let mut files = vec![OutputFile {
        path: PathBuf::from("c").join(WIRE_HELPER_HEADER),
        content: generate_wire_helpers(input_path),
    }];

    for record in records {
        let msg = CMessage::new(record);
        let dir = PathBuf::from(msg.dir());
        let generated = [
            (format!("{}_base.h", msg.stem), generate_base_header(&msg, input_path)),
            (format!("{}_base.c", msg.stem), generate_base_source(&msg)),
            (format!("{}_auto.c", msg.stem), generate_auto_source(&msg)),
            (format!("{}.h", msg.stem), generate_app_header(&msg)),
            (format!("{}.c", msg.stem), generate_app_source(&msg)),
        ];
        files.extend(generated.into_iter().map(|(name, content)| OutputFile {
            path: dir.join(name),
            content,
        }));
    }

    files
}

fn generate_wire_helpers(input_path: &Path) -> String {
    let guard = header_guard_name_from_str(WIRE_HELPER_HEADER);
    let mut out = String::new();
    writeln!(&mut out, "/*").unwrap();
    writeln!(&mut out, " * Auto-generated by tmtc_codegen.").unwrap();
    writeln!(&mut out, " * Source: {}", input_path.display()).unwrap();
    writeln!(&mut out, " * Little-endian wire helpers").unwrap();
    writeln!(&mut out, " */\n").unwrap();
    writeln!(&mut out, "#ifndef {}", guard).unwrap();
    writeln!(&mut out, "#define {}\n", guard).unwrap();
    out.push_str("#include <stdint.h>\n#include <string.h>\n\n");
    for template in TEMPLATE_FILES {
        out.push_str(template);
        if !template.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    writeln!(&mut out, "#endif /* {} */", guard).unwrap();
    out
}

fn generate_base_header(msg: &CMessage, input_path: &Path) -> String {
    let record = msg.record;
    let guard = header_guard_name_from_str(&msg.base_header());

    let mut out = String::new();
    writeln!(&mut out, "/*").unwrap();
    writeln!(&mut out, " * Auto-generated by tmtc_codegen. Do not edit.").unwrap();
    writeln!(&mut out, " * Source: {}", input_path.display()).unwrap();
    writeln!(
        &mut out,
        " * {}: {} (id {})",
        kind_title(record.kind),
        record.names.source,
        record.id
    )
    .unwrap();
    if let Some(desc) = &record.description {
        writeln!(&mut out, " * {}", desc).unwrap();
    }
    for payload in &msg.payloads {
        writeln!(&mut out, " * {} wire format: {}", payload.type_suffix, payload.wire).unwrap();
    }
    writeln!(&mut out, " */\n").unwrap();

    writeln!(&mut out, "#ifndef {}", guard).unwrap();
    writeln!(&mut out, "#define {}\n", guard).unwrap();
    out.push_str("#include <stdbool.h>\n#include <stddef.h>\n#include <stdint.h>\n\n");
    out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");

    let id_macro = match record.kind {
        MessageKind::Telecommand => "OPERATION",
        MessageKind::Telemetry => "REPORT",
    };
    writeln!(&mut out, "#define {}_{} {}", msg.macro_prefix, id_macro, record.id).unwrap();
    for payload in &msg.payloads {
        writeln!(&mut out, "#define {} {}", msg.size_macro(payload), payload.wire.size()).unwrap();
    }
    out.push('\n');

    for enumeration in &record.enums {
        generate_enum(&mut out, enumeration);
    }

    for payload in &msg.payloads {
        generate_defaults(&mut out, msg, record, payload);
        generate_struct_typedef(&mut out, msg, payload);
    }

    for payload in &msg.payloads {
        match payload.direction {
            Direction::Encode => writeln!(
                &mut out,
                "size_t {}(const {} *msg, uint8_t *out_buf, size_t out_len);",
                msg.encode_fn(payload),
                msg.struct_name(payload)
            )
            .unwrap(),
            Direction::Decode => writeln!(
                &mut out,
                "bool {}(const uint8_t *data, size_t len, {} *msg);",
                msg.decode_fn(payload),
                msg.struct_name(payload)
            )
            .unwrap(),
        }
    }
    writeln!(&mut out, "{};", msg.glue_prototype()).unwrap();

    out.push_str("\n#ifdef __cplusplus\n}\n#endif\n\n");
    writeln!(&mut out, "#endif /* {} */", guard).unwrap();
    out
}

fn generate_enum(out: &mut String, enumeration: &Enumeration) {
    writeln!(out, "/* {} ({}) */", enumeration.type_name, enumeration.field).unwrap();
    out.push_str("enum {\n");
    let last = enumeration.members.len().saturating_sub(1);
    for (index, member) in enumeration.members.iter().enumerate() {
        let separator = if index == last { "" } else { "," };
        writeln!(out, "    {} = {}{}", member.c_ident, member.ordinal, separator).unwrap();
    }
    out.push_str("};\n");
    writeln!(out, "typedef uint8_t {}_t;\n", enumeration.type_ident).unwrap();
}

fn generate_defaults(out: &mut String, msg: &CMessage, record: &CanonicalRecord, payload: &Payload) {
    let mut any = false;
    for field in payload.fields {
        let Some(default) = &field.default else {
            continue;
        };
        let literal = match default {
            DefaultValue::Integer(value) => value.to_string(),
            DefaultValue::Float(value) => format!("{:?}f", value),
            DefaultValue::Member { name, .. } => record
                .enumeration_for(field)
                .and_then(|e| e.members.iter().find(|m| &m.name == name))
                .map(|m| m.c_ident.clone())
                .unwrap_or_else(|| name.clone()),
            DefaultValue::Text(text) => c_string_literal(text),
        };
        writeln!(
            out,
            "#define {}_{}_{}_DEFAULT {}",
            msg.macro_prefix,
            payload.suffix.to_ascii_uppercase(),
            field.snake_name.to_ascii_uppercase(),
            literal
        )
        .unwrap();
        any = true;
    }
    if any {
        out.push('\n');
    }
}

fn generate_struct_typedef(out: &mut String, msg: &CMessage, payload: &Payload) {
    let struct_name = msg.struct_name(payload);
    out.push_str("typedef struct __attribute__((packed)) {\n");
    for field in payload.fields {
        write!(out, "    {} {};", field.c_type(), field.c_declarator).unwrap();
        if let ResolvedType::Bytes { length } = field.ty {
            write!(
                out,
                " /* [0] = payload length, at most {} */",
                length - 1
            )
            .unwrap();
        }
        out.push('\n');
    }
    writeln!(out, "}} {};\n", struct_name).unwrap();

    out.push_str("#if defined(__STDC_VERSION__) && __STDC_VERSION__ >= 201112L\n");
    writeln!(
        out,
        "_Static_assert(sizeof({}) == {}, \"{} must match wire format {}\");",
        struct_name,
        msg.size_macro(payload),
        struct_name,
        payload.wire
    )
    .unwrap();
    out.push_str("#endif\n\n");
}

fn generate_base_source(msg: &CMessage) -> String {
    let mut out = String::new();
    writeln!(&mut out, "/* Auto-generated by tmtc_codegen. Do not edit. */\n").unwrap();
    writeln!(&mut out, "#include \"{}\"\n", msg.base_header()).unwrap();
    writeln!(&mut out, "#include <string.h>\n").unwrap();
    writeln!(&mut out, "#include \"../{}\"\n", WIRE_HELPER_HEADER).unwrap();

    for payload in &msg.payloads {
        match payload.direction {
            Direction::Encode => generate_encode_fn(&mut out, msg, payload),
            Direction::Decode => generate_decode_fn(&mut out, msg, payload),
        }
    }
    out
}

fn generate_encode_fn(out: &mut String, msg: &CMessage, payload: &Payload) {
    writeln!(
        out,
        "size_t {}(const {} *msg, uint8_t *out_buf, size_t out_len) {{",
        msg.encode_fn(payload),
        msg.struct_name(payload)
    )
    .unwrap();
    out.push_str("    size_t offset = 0;\n");
    writeln!(
        out,
        "    if (!msg || !out_buf || out_len < {}) {{\n        return 0;\n    }}",
        msg.size_macro(payload)
    )
    .unwrap();
    for field in payload.fields {
        out.push_str(&field_encode_stmt(field, "    "));
        writeln!(out, "    offset += {};", field.ty.byte_len()).unwrap();
    }
    out.push_str("    return offset;\n}\n\n");
}

fn generate_decode_fn(out: &mut String, msg: &CMessage, payload: &Payload) {
    writeln!(
        out,
        "bool {}(const uint8_t *data, size_t len, {} *msg) {{",
        msg.decode_fn(payload),
        msg.struct_name(payload)
    )
    .unwrap();
    out.push_str("    size_t offset = 0;\n");
    writeln!(
        out,
        "    if (!data || !msg || len < {}) {{\n        return false;\n    }}",
        msg.size_macro(payload)
    )
    .unwrap();
    for field in payload.fields {
        out.push_str(&field_decode_stmt(field, "    "));
        writeln!(out, "    offset += {};", field.ty.byte_len()).unwrap();
    }
    out.push_str("    return true;\n}\n\n");
}

fn field_encode_stmt(field: &ResolvedField, indent: &str) -> String {
    let src = format!("msg->{}", field.snake_name);
    let dest = "out_buf + offset";
    match &field.ty {
        ResolvedType::Scalar(TypeTag::Uint16 | TypeTag::Int16) => {
            format!("{indent}tmtc_write_u16_le((uint16_t)({src}), {dest});\n")
        }
        ResolvedType::Scalar(TypeTag::Uint32 | TypeTag::Int32) => {
            format!("{indent}tmtc_write_u32_le((uint32_t)({src}), {dest});\n")
        }
        ResolvedType::Scalar(TypeTag::Float32) => {
            format!("{indent}tmtc_write_f32_le({src}, {dest});\n")
        }
        ResolvedType::Scalar(_) | ResolvedType::Enum(_) => {
            format!("{indent}({dest})[0] = (uint8_t)({src});\n")
        }
        ResolvedType::String { length } => {
            format!("{indent}memcpy({dest}, {src}, {length});\n")
        }
        ResolvedType::Bytes { length } => {
            let cap = length - 1;
            format!(
                "{indent}memcpy({dest}, {src}, {length});\n\
                 {indent}if (({dest})[0] > {cap}) {{\n\
                 {indent}    ({dest})[0] = {cap};\n\
                 {indent}}}\n"
            )
        }
    }
}

fn field_decode_stmt(field: &ResolvedField, indent: &str) -> String {
    let dest = format!("msg->{}", field.snake_name);
    let src = "data + offset";
    match &field.ty {
        ResolvedType::Scalar(TypeTag::Uint8) => format!("{indent}{dest} = ({src})[0];\n"),
        ResolvedType::Scalar(TypeTag::Int8) => {
            format!("{indent}{dest} = (int8_t)(({src})[0]);\n")
        }
        ResolvedType::Scalar(TypeTag::Uint16) => {
            format!("{indent}{dest} = tmtc_read_u16_le({src});\n")
        }
        ResolvedType::Scalar(TypeTag::Int16) => {
            format!("{indent}{dest} = (int16_t)tmtc_read_u16_le({src});\n")
        }
        ResolvedType::Scalar(TypeTag::Uint32) => {
            format!("{indent}{dest} = tmtc_read_u32_le({src});\n")
        }
        ResolvedType::Scalar(TypeTag::Int32) => {
            format!("{indent}{dest} = (int32_t)tmtc_read_u32_le({src});\n")
        }
        ResolvedType::Scalar(TypeTag::Float32) => {
            format!("{indent}{dest} = tmtc_read_f32_le({src});\n")
        }
        ResolvedType::Scalar(other) => {
            format!("{indent}{dest} = ({})(({src})[0]);\n", other.c_type())
        }
        ResolvedType::Enum(spec) => {
            let assign = format!("{indent}{dest} = ({})(({src})[0]);\n", field.c_type());
            let count = spec.values.len();
            // A full 256-member enum accepts every byte.
            if count > usize::from(u8::MAX) {
                return assign;
            }
            format!(
                "{indent}if (({src})[0] >= {count}) {{\n\
                 {indent}    return false;\n\
                 {indent}}}\n{assign}"
            )
        }
        ResolvedType::String { length } => {
            format!("{indent}memcpy({dest}, {src}, {length});\n")
        }
        ResolvedType::Bytes { length } => {
            let cap = length - 1;
            format!(
                "{indent}memcpy({dest}, {src}, {length});\n\
                 {indent}if (({dest})[0] > {cap}) {{\n\
                 {indent}    ({dest})[0] = {cap};\n\
                 {indent}}}\n"
            )
        }
    }
}

fn generate_auto_source(msg: &CMessage) -> String {
    let mut out = String::new();
    writeln!(&mut out, "/* Auto-generated by tmtc_codegen. Do not edit. */\n").unwrap();
    writeln!(&mut out, "#include <string.h>\n").unwrap();
    writeln!(&mut out, "#include \"{}\"\n", msg.app_header()).unwrap();
    match msg.record.kind {
        MessageKind::Telecommand => generate_dispatch(&mut out, msg),
        MessageKind::Telemetry => generate_build(&mut out, msg),
    }
    out
}

fn generate_dispatch(out: &mut String, msg: &CMessage) {
    let args = msg.payload("arguments");
    let returns = msg.payload("returns");

    writeln!(out, "{} {{", msg.glue_prototype()).unwrap();
    if let Some(payload) = args {
        writeln!(out, "    {} arguments;", msg.struct_name(payload)).unwrap();
    }
    if let Some(payload) = returns {
        writeln!(out, "    {} returns;", msg.struct_name(payload)).unwrap();
    }
    out.push_str("    int status;\n\n");
    out.push_str("    if (written) {\n        *written = 0;\n    }\n");

    match args {
        Some(payload) => writeln!(
            out,
            "    if (!{}(in_buf, in_len, &arguments)) {{\n        return -1;\n    }}",
            msg.decode_fn(payload)
        )
        .unwrap(),
        None => out.push_str("    (void)in_buf;\n    (void)in_len;\n"),
    }
    if returns.is_some() {
        out.push_str("    memset(&returns, 0, sizeof(returns));\n");
    }

    let call_args: Vec<&str> = msg
        .payloads
        .iter()
        .map(|p| match p.suffix {
            "arguments" => "&arguments",
            _ => "&returns",
        })
        .collect();
    writeln!(out, "\n    status = {}({});", msg.hook_fn(), call_args.join(", ")).unwrap();
    out.push_str("    if (status != 0) {\n        return status;\n    }\n");

    match returns {
        Some(payload) => {
            let size_macro = msg.size_macro(payload);
            writeln!(
                out,
                "    if ({}(&returns, out_buf, out_len) != {}) {{\n        return -1;\n    }}",
                msg.encode_fn(payload),
                size_macro
            )
            .unwrap();
            writeln!(out, "    if (written) {{\n        *written = {};\n    }}", size_macro).unwrap();
        }
        None => out.push_str("    (void)out_buf;\n    (void)out_len;\n"),
    }
    out.push_str("    return 0;\n}\n");
}

fn generate_build(out: &mut String, msg: &CMessage) {
    writeln!(out, "{} {{", msg.glue_prototype()).unwrap();
    match msg.payload("parameters") {
        Some(payload) => {
            writeln!(out, "    {} parameters;", msg.struct_name(payload)).unwrap();
            out.push_str("    memset(&parameters, 0, sizeof(parameters));\n");
            writeln!(
                out,
                "    if ({}(&parameters) != 0) {{\n        return 0;\n    }}",
                msg.hook_fn()
            )
            .unwrap();
            writeln!(
                out,
                "    return {}(&parameters, out_buf, out_len);",
                msg.encode_fn(payload)
            )
            .unwrap();
        }
        None => {
            out.push_str("    (void)out_buf;\n    (void)out_len;\n");
            writeln!(out, "    (void){}();", msg.hook_fn()).unwrap();
            out.push_str("    return 0;\n");
        }
    }
    out.push_str("}\n");
}

fn generate_app_header(msg: &CMessage) -> String {
    let guard = header_guard_name_from_str(&msg.app_header());
    let mut out = String::new();
    writeln!(&mut out, "#ifndef {}", guard).unwrap();
    writeln!(&mut out, "#define {}\n", guard).unwrap();
    writeln!(&mut out, "#include \"{}\"\n", msg.base_header()).unwrap();
    out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");
    match msg.record.kind {
        MessageKind::Telecommand => {
            out.push_str("/* Executes the command. Return 0 on success. */\n")
        }
        MessageKind::Telemetry => {
            out.push_str("/* Fills in the report parameters. Return 0 on success. */\n")
        }
    }
    writeln!(&mut out, "{};", msg.hook_prototype()).unwrap();
    out.push_str("\n#ifdef __cplusplus\n}\n#endif\n\n");
    writeln!(&mut out, "#endif /* {} */", guard).unwrap();
    out
}

fn generate_app_source(msg: &CMessage) -> String {
    let mut out = String::new();
    writeln!(&mut out, "#include \"{}\"\n", msg.app_header()).unwrap();
    writeln!(&mut out, "{} {{", msg.hook_prototype()).unwrap();
    for payload in &msg.payloads {
        writeln!(&mut out, "    (void){};", payload.suffix).unwrap();
    }
    out.push_str("    return 0;\n}\n");
    out
}

fn kind_title(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Telecommand => "Telecommand",
        MessageKind::Telemetry => "Telemetry",
    }
}

/// Escapes `text` as a C string literal. Non-printable bytes use three-digit
/// octal escapes so a following digit is never absorbed.
fn c_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for byte in text.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b' '..=b'~' => out.push(byte as char),
            other => write!(&mut out, "\\{:03o}", other).unwrap(),
        }
    }
    out.push('"');
    out
}

fn header_guard_name_from_str(file_name: &str) -> String {
    let mut guard = String::new();
    for ch in file_name.chars() {
        if ch.is_ascii_alphanumeric() {
            guard.push(ch.to_ascii_uppercase());
        } else {
            guard.push('_');
        }
    }
    if !guard.ends_with("_H") {
        if !guard.ends_with('_') {
            guard.push('_');
        }
        guard.push('H');
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::record::canonicalize_document;

    fn records(json: &str) -> Vec<CanonicalRecord> {
        canonicalize_document(&Document::from_json_str(json).unwrap()).unwrap()
    }

    fn file<'a>(files: &'a [OutputFile], path: &str) -> &'a str {
        files
            .iter()
            .find(|f| f.path == Path::new(path))
            .map(|f| f.content.as_str())
            .unwrap_or_else(|| panic!("{} not generated", path))
    }

    #[test]
    fn header_guard_from_file_name() {
        assert_eq!(header_guard_name_from_str("set_power_base.h"), "SET_POWER_BASE_H");
        assert_eq!(header_guard_name_from_str("tmtc_wire.h"), "TMTC_WIRE_H");
    }

    #[test]
    fn string_literals_escape_quotes_and_controls() {
        assert_eq!(c_string_literal("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(c_string_literal("x\n1"), "\"x\\0121\"");
    }

    #[test]
    fn telecommand_file_set() {
        let recs = records(
            r#"{"telecommands": [{"name": "setPower", "id": 9,
                "arguments": [{"name": "level", "type": "uint8"}]}]}"#,
        );
        let files = generate(&recs, Path::new("in.json"));
        let mut paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        paths.sort();
        let expected: Vec<PathBuf> = [
            "c/tc/set_power.c",
            "c/tc/set_power.h",
            "c/tc/set_power_auto.c",
            "c/tc/set_power_base.c",
            "c/tc/set_power_base.h",
            "c/tmtc_wire.h",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn enum_constants_and_one_byte_typedef() {
        let recs = records(
            r#"{"telecommands": [{"name": "setPower", "id": 9, "arguments": [
                {"name": "mode", "type": "enum", "enumName": "mode", "values": ["OFF", "ON"]}
            ]}]}"#,
        );
        let files = generate(&recs, Path::new("in.json"));
        let header = file(&files, "c/tc/set_power_base.h");
        assert!(header.contains("    SET_POWER_MODE_OFF = 0,\n    SET_POWER_MODE_ON = 1\n};"));
        assert!(header.contains("typedef uint8_t SetPowerMode_t;"));
        assert!(header.contains("    SetPowerMode_t mode;"));
        assert!(header.contains("#define SET_POWER_OPERATION 9"));
        assert!(header.contains("#define SET_POWER_ARGUMENTS_SIZE 1"));
    }

    #[test]
    fn string_and_bytes_layout() {
        let recs = records(
            r#"{"telecommands": [{"name": "upload", "id": 2, "arguments": [
                {"name": "fileName", "type": "string", "stringLength": 8},
                {"name": "chunk", "type": "bytes", "length": 16}
            ]}]}"#,
        );
        let files = generate(&recs, Path::new("in.json"));
        let header = file(&files, "c/tc/upload_base.h");
        assert!(header.contains("    char file_name[8];"));
        assert!(header.contains("    uint8_t chunk[16]; /* [0] = payload length, at most 15 */"));
        assert!(header.contains("UploadArguments_t must match wire format <8s 16p"));

        let source = file(&files, "c/tc/upload_base.c");
        assert!(source.contains("memcpy(msg->file_name, data + offset, 8);"));
        assert!(source.contains("bool upload_decode_arguments("));
    }

    #[test]
    fn returns_are_encoded_and_dispatched() {
        let recs = records(
            r#"{"telecommands": [{"name": "getTemp", "id": 3,
                "return": {"name": "celsius", "type": "int16"}}]}"#,
        );
        let files = generate(&recs, Path::new("in.json"));
        let source = file(&files, "c/tc/get_temp_base.c");
        assert!(source.contains("tmtc_write_u16_le((uint16_t)(msg->celsius), out_buf + offset);"));

        let auto = file(&files, "c/tc/get_temp_auto.c");
        assert!(auto.contains("status = get_temp_handler(&returns);"));
        assert!(auto.contains("(void)in_buf;"));

        let app = file(&files, "c/tc/get_temp.h");
        assert!(app.contains("int get_temp_handler(GetTempReturns_t *returns);"));
    }

    #[test]
    fn telemetry_files_are_prefixed() {
        let recs = records(
            r#"{"telemetries": [{"name": "heaterStatus", "id": 5, "parameters": [
                {"name": "temperature", "type": "float32", "default": 1.5},
                {"name": "state", "type": "enum", "enumName": "state", "values": ["IDLE", "HEATING"], "default": "HEATING"}
            ]}]}"#,
        );
        let files = generate(&recs, Path::new("in.json"));
        let header = file(&files, "c/tm/tm_heater_status_base.h");
        assert!(header.contains("#define TM_HEATER_STATUS_REPORT 5"));
        assert!(header.contains("HEATER_STATUS_STATE_HEATING = 1"));
        assert!(header.contains("#define TM_HEATER_STATUS_PARAMETERS_TEMPERATURE_DEFAULT 1.5f"));
        assert!(header.contains("#define TM_HEATER_STATUS_PARAMETERS_STATE_DEFAULT HEATER_STATUS_STATE_HEATING"));
        assert!(header.contains("size_t tm_heater_status_build(uint8_t *out_buf, size_t out_len);"));

        let auto = file(&files, "c/tm/tm_heater_status_auto.c");
        assert!(auto.contains("tm_heater_status_collect(&parameters)"));
    }

    #[test]
    fn defaults_are_scoped_by_payload() {
        let recs = records(
            r#"{"telecommands": [{"name": "setLevel", "id": 4,
                "arguments": [{"name": "level", "type": "uint8", "default": 1}],
                "returns": [{"name": "level", "type": "uint8", "default": 2}]}]}"#,
        );
        let files = generate(&recs, Path::new("in.json"));
        let header = file(&files, "c/tc/set_level_base.h");
        assert!(header.contains("#define SET_LEVEL_ARGUMENTS_LEVEL_DEFAULT 1\n"));
        assert!(header.contains("#define SET_LEVEL_RETURNS_LEVEL_DEFAULT 2\n"));
    }

    #[test]
    fn decoder_rejects_unknown_ordinals_and_clamps_bytes_length() {
        let recs = records(
            r#"{"telecommands": [{"name": "upload", "id": 2, "arguments": [
                {"name": "mode", "type": "enum", "enumName": "mode", "values": ["OFF", "ON", "STANDBY"]},
                {"name": "chunk", "type": "bytes", "length": 16}
            ]}]}"#,
        );
        let files = generate(&recs, Path::new("in.json"));
        let source = file(&files, "c/tc/upload_base.c");
        assert!(source.contains(
            "    if ((data + offset)[0] >= 3) {\n        return false;\n    }\n    msg->mode = (UploadMode_t)((data + offset)[0]);\n"
        ));
        assert!(source.contains(
            "    memcpy(msg->chunk, data + offset, 16);\n    if ((msg->chunk)[0] > 15) {\n        (msg->chunk)[0] = 15;\n    }\n"
        ));
    }

    #[test]
    fn full_enum_skips_the_ordinal_check() {
        let values: Vec<String> = (0..256).map(|i| format!("\"V{}\"", i)).collect();
        let json = format!(
            r#"{{"telecommands": [{{"name": "setMode", "id": 1, "arguments": [
                {{"name": "mode", "type": "enum", "enumName": "mode", "values": [{}]}}
            ]}}]}}"#,
            values.join(", ")
        );
        let files = generate(&records(&json), Path::new("in.json"));
        let source = file(&files, "c/tc/set_mode_base.c");
        assert!(!source.contains(">= 256"));
        assert!(source.contains("msg->mode = (SetModeMode_t)((data + offset)[0]);"));
    }
}
