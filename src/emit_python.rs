//! Python code generator for canonical records.
//!
//! Each message becomes one module holding a class that packs and unpacks its
//! payloads with `struct`, using the record's pack-format strings verbatim.

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use crate::OutputFile;
use crate::document::MessageKind;
use crate::record::CanonicalRecord;
use crate::schema::{DefaultValue, ResolvedField, ResolvedType};
use crate::types::HostScalar;
use crate::wire::WireFormat;

const INDENT: &str = "    ";

/// Generates one module per record and an `__init__.py` per category.
pub fn generate(records: &[CanonicalRecord], input_path: &Path) -> Vec<OutputFile> {
    let mut files = Vec::new();
    for kind in [MessageKind::Telecommand, MessageKind::Telemetry] {
        let dir = PathBuf::from(kind_dir(kind));
        let members: Vec<&CanonicalRecord> = records.iter().filter(|r| r.kind == kind).collect();
        if members.is_empty() {
            continue;
        }
        for record in &members {
            files.push(OutputFile {
                path: dir.join(format!("{}.py", record.names.snake)),
                content: generate_module(record, input_path),
            });
        }
        files.push(OutputFile {
            path: dir.join("__init__.py"),
            content: generate_package_init(&members),
        });
    }
    files
}

fn kind_dir(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Telecommand => "py/tc",
        MessageKind::Telemetry => "py/tm",
    }
}

fn generate_package_init(records: &[&CanonicalRecord]) -> String {
    let mut out = String::new();
    out.push_str("# Auto-generated by tmtc_codegen. Do not edit.\n\n");
    for record in records {
        writeln!(
            &mut out,
            "from .{} import {}",
            record.names.snake, record.names.capitalized
        )
        .unwrap();
    }
    out.push_str("\n__all__ = [\n");
    for record in records {
        writeln!(&mut out, "{}'{}',", INDENT, record.names.capitalized).unwrap();
    }
    out.push_str("]\n");
    out
}

fn generate_module(record: &CanonicalRecord, input_path: &Path) -> String {
    let class_name = &record.names.capitalized;
    let mut out = String::new();
    out.push_str("# Auto-generated by tmtc_codegen. Do not edit.\n");
    writeln!(&mut out, "# Source: {}\n", input_path.display()).unwrap();
    let summary = match record.kind {
        MessageKind::Telecommand => format!("Telecommand {} (operation {}).", record.names.source, record.id),
        MessageKind::Telemetry => format!("Telemetry {} (report {}).", record.names.source, record.id),
    };
    writeln!(&mut out, "\"\"\"{}\"\"\"\n", summary).unwrap();
    out.push_str("import struct\n");
    if !record.enums.is_empty() {
        out.push_str("from enum import IntEnum\n");
    }
    out.push_str("\n\n");

    writeln!(&mut out, "class {}:", class_name).unwrap();
    if let Some(desc) = &record.description {
        writeln!(&mut out, "{}\"\"\"{}\"\"\"\n", INDENT, desc.replace("\"\"\"", "'''")).unwrap();
    }

    match record.kind {
        MessageKind::Telecommand => {
            writeln!(&mut out, "{}OPERATION_ID = {}", INDENT, record.id).unwrap();
            write_format_constants(&mut out, "ARGUMENTS", &record.wire_in);
            if let Some(wire) = &record.wire_out {
                write_format_constants(&mut out, "RETURNS", wire);
            }
        }
        MessageKind::Telemetry => {
            writeln!(&mut out, "{}REPORT_ID = {}", INDENT, record.id).unwrap();
            write_format_constants(&mut out, "FORMAT", &record.wire_in);
        }
    }
    out.push('\n');

    for enumeration in &record.enums {
        writeln!(&mut out, "{}class {}(IntEnum):", INDENT, enumeration.type_name).unwrap();
        for member in &enumeration.members {
            writeln!(&mut out, "{0}{0}{1} = {2}", INDENT, member.name, member.ordinal).unwrap();
        }
        out.push('\n');
    }

    write_init(&mut out, record);

    match record.kind {
        MessageKind::Telecommand => {
            write_pack(&mut out, "pack", "ARGUMENTS_FORMAT", &record.fields_in);
            write_unpack_instance(&mut out, "unpack", "ARGUMENTS_FORMAT", record);
            if let Some(fields) = &record.fields_out {
                write_pack_returns(&mut out, fields);
                write_unpack_returns(&mut out, fields);
            }
        }
        MessageKind::Telemetry => {
            write_pack(&mut out, "pack", "FORMAT", &record.fields_in);
            write_unpack_instance(&mut out, "unpack", "FORMAT", record);
        }
    }

    // Drop the blank line left after the last method.
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

fn write_format_constants(out: &mut String, prefix: &str, wire: &WireFormat) {
    let format_const = if prefix == "FORMAT" {
        "FORMAT".to_string()
    } else {
        format!("{}_FORMAT", prefix)
    };
    let size_const = if prefix == "FORMAT" {
        "SIZE".to_string()
    } else {
        format!("{}_SIZE", prefix)
    };
    writeln!(out, "{}{} = '{}'", INDENT, format_const, wire).unwrap();
    writeln!(out, "{}{} = {}", INDENT, size_const, wire.size()).unwrap();
}

fn write_init(out: &mut String, record: &CanonicalRecord) {
    let params: Vec<String> = record
        .fields_in
        .iter()
        .map(|field| format!("{}={}", field.snake_name, default_literal(record, field)))
        .collect();
    if params.is_empty() {
        writeln!(out, "{}def __init__(self):", INDENT).unwrap();
        writeln!(out, "{0}{0}pass\n", INDENT).unwrap();
        return;
    }
    writeln!(out, "{}def __init__(self, {}):", INDENT, params.join(", ")).unwrap();
    for field in &record.fields_in {
        writeln!(out, "{0}{0}self.{1} = {1}", INDENT, field.snake_name).unwrap();
    }
    out.push('\n');
}

fn write_pack(out: &mut String, method: &str, format_const: &str, fields: &[ResolvedField]) {
    writeln!(out, "{}def {}(self):", INDENT, method).unwrap();
    let values: Vec<String> = fields
        .iter()
        .map(|field| pack_expr(&format!("self.{}", field.snake_name), field))
        .collect();
    write_struct_pack(out, "self", format_const, &values);
}

fn write_pack_returns(out: &mut String, fields: &[ResolvedField]) {
    let names: Vec<&str> = fields.iter().map(|f| f.snake_name.as_str()).collect();
    writeln!(out, "{}@classmethod", INDENT).unwrap();
    writeln!(out, "{}def pack_returns(cls, {}):", INDENT, names.join(", ")).unwrap();
    let values: Vec<String> = fields
        .iter()
        .map(|field| pack_expr(&field.snake_name, field))
        .collect();
    write_struct_pack(out, "cls", "RETURNS_FORMAT", &values);
}

fn write_struct_pack(out: &mut String, receiver: &str, format_const: &str, values: &[String]) {
    if values.is_empty() {
        writeln!(out, "{0}{0}return struct.pack({1}.{2})\n", INDENT, receiver, format_const).unwrap();
    } else {
        writeln!(
            out,
            "{0}{0}return struct.pack({1}.{2}, {3})\n",
            INDENT,
            receiver,
            format_const,
            values.join(", ")
        )
        .unwrap();
    }
}

fn write_unpack_instance(out: &mut String, method: &str, format_const: &str, record: &CanonicalRecord) {
    writeln!(out, "{}@classmethod", INDENT).unwrap();
    writeln!(out, "{}def {}(cls, data):", INDENT, method).unwrap();
    let fields = &record.fields_in;
    if fields.is_empty() {
        writeln!(out, "{0}{0}struct.unpack(cls.{1}, data)", INDENT, format_const).unwrap();
        writeln!(out, "{0}{0}return cls()\n", INDENT).unwrap();
        return;
    }
    write_unpack_targets(out, format_const, fields);
    let args: Vec<String> = fields
        .iter()
        .map(|field| format!("{}={}", field.snake_name, unpack_expr(&field.snake_name, field)))
        .collect();
    writeln!(out, "{0}{0}return cls({1})\n", INDENT, args.join(", ")).unwrap();
}

fn write_unpack_returns(out: &mut String, fields: &[ResolvedField]) {
    writeln!(out, "{}@classmethod", INDENT).unwrap();
    writeln!(out, "{}def unpack_returns(cls, data):", INDENT).unwrap();
    write_unpack_targets(out, "RETURNS_FORMAT", fields);
    let entries: Vec<String> = fields
        .iter()
        .map(|field| format!("'{}': {}", field.snake_name, unpack_expr(&field.snake_name, field)))
        .collect();
    writeln!(out, "{0}{0}return {{{1}}}\n", INDENT, entries.join(", ")).unwrap();
}

fn write_unpack_targets(out: &mut String, format_const: &str, fields: &[ResolvedField]) {
    let targets: Vec<&str> = fields.iter().map(|f| f.snake_name.as_str()).collect();
    // A trailing comma keeps single-element unpacking a tuple assignment.
    writeln!(
        out,
        "{0}{0}{1}, = struct.unpack(cls.{2}, data)",
        INDENT,
        targets.join(", "),
        format_const
    )
    .unwrap();
}

fn pack_expr(value: &str, field: &ResolvedField) -> String {
    match (&field.ty, field.ty.host_scalar()) {
        (ResolvedType::Enum(_), _) => format!("int({})", value),
        (_, HostScalar::Text) => format!("{}.encode('ascii')", value),
        (_, HostScalar::ByteBuffer) => format!("bytes({})", value),
        _ => value.to_string(),
    }
}

fn unpack_expr(value: &str, field: &ResolvedField) -> String {
    match (&field.ty, field.ty.host_scalar()) {
        (ResolvedType::Enum(spec), _) => format!("cls.{}({})", spec.type_name, value),
        (_, HostScalar::Text) => format!("{}.rstrip(b'\\x00').decode('ascii')", value),
        _ => value.to_string(),
    }
}

/// Keyword default for `__init__`. Enum classes are resolved in the class
/// body, so a bare `Mode.OFF` is in scope there.
fn default_literal(record: &CanonicalRecord, field: &ResolvedField) -> String {
    if let Some(default) = &field.default {
        return match default {
            DefaultValue::Integer(value) => value.to_string(),
            DefaultValue::Float(value) => format!("{:?}", value),
            DefaultValue::Member { name, .. } => match field.ty.as_enum() {
                Some(spec) => format!("{}.{}", spec.type_name, name),
                None => name.clone(),
            },
            DefaultValue::Text(text) => python_string_literal(text),
        };
    }
    match &field.ty {
        ResolvedType::Enum(spec) => record
            .enumeration_for(field)
            .and_then(|e| e.members.first())
            .map(|m| format!("{}.{}", spec.type_name, m.name))
            .unwrap_or_else(|| "0".to_string()),
        ResolvedType::String { .. } => "''".to_string(),
        ResolvedType::Bytes { .. } => "b''".to_string(),
        ty => match ty.host_scalar() {
            HostScalar::Float => "0.0".to_string(),
            _ => "0".to_string(),
        },
    }
}

fn python_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for byte in text.bytes() {
        match byte {
            b'\'' => out.push_str("\\'"),
            b'\\' => out.push_str("\\\\"),
            b' '..=b'~' => out.push(byte as char),
            other => write!(&mut out, "\\x{:02x}", other).unwrap(),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::record::canonicalize_document;

    fn generate_from(json: &str) -> Vec<OutputFile> {
        let records = canonicalize_document(&Document::from_json_str(json).unwrap()).unwrap();
        generate(&records, Path::new("in.json"))
    }

    fn module<'a>(files: &'a [OutputFile], path: &str) -> &'a str {
        files
            .iter()
            .find(|f| f.path == Path::new(path))
            .map(|f| f.content.as_str())
            .unwrap_or_else(|| panic!("{} not generated", path))
    }

    #[test]
    fn telecommand_class_uses_shared_format_and_ordinals() {
        let files = generate_from(
            r#"{"telecommands": [{"name": "setPower", "id": 4, "arguments": [
                {"name": "level", "type": "uint8", "default": 3},
                {"name": "mode", "type": "enum", "enumName": "mode", "values": ["OFF", "ON", "STANDBY"]},
                {"name": "label", "type": "string", "stringLength": 4}
            ]}]}"#,
        );
        let src = module(&files, "py/tc/set_power.py");
        assert!(src.contains("class SetPower:"));
        assert!(src.contains("    OPERATION_ID = 4"));
        assert!(src.contains("    ARGUMENTS_FORMAT = '<B B 4s'"));
        assert!(src.contains("    ARGUMENTS_SIZE = 6"));
        assert!(src.contains("    class Mode(IntEnum):\n        OFF = 0\n        ON = 1\n        STANDBY = 2\n"));
        assert!(src.contains("def __init__(self, level=3, mode=Mode.OFF, label=''):"));
        assert!(src.contains(
            "return struct.pack(self.ARGUMENTS_FORMAT, self.level, int(self.mode), self.label.encode('ascii'))"
        ));
        assert!(src.contains("level, mode, label, = struct.unpack(cls.ARGUMENTS_FORMAT, data)"));
        assert!(src.contains("mode=cls.Mode(mode)"));
    }

    #[test]
    fn returns_get_their_own_format() {
        let files = generate_from(
            r#"{"telecommands": [{"name": "getTemp", "id": 1,
                "returns": [{"name": "celsius", "type": "float32"}]}]}"#,
        );
        let src = module(&files, "py/tc/get_temp.py");
        assert!(src.contains("    RETURNS_FORMAT = '<f'"));
        assert!(src.contains("def pack_returns(cls, celsius):"));
        assert!(src.contains("return {'celsius': celsius}"));
        assert!(src.contains("def __init__(self):"));
        assert!(!src.contains("IntEnum"));
    }

    #[test]
    fn package_init_lists_every_class() {
        let files = generate_from(
            r#"{"telecommands": [{"name": "setPower", "id": 1}, {"name": "reboot", "id": 2}]}"#,
        );
        let init = module(&files, "py/tc/__init__.py");
        assert!(init.contains("from .set_power import SetPower\n"));
        assert!(init.contains("from .reboot import Reboot\n"));
        assert!(init.contains("    'Reboot',\n"));
        assert!(files.iter().all(|f| !f.path.starts_with("py/tm")));
    }

    #[test]
    fn telemetry_class_unpacks_into_instance() {
        let files = generate_from(
            r#"{"telemetries": [{"name": "heaterStatus", "id": 2, "parameters": [
                {"name": "temperature", "type": "int16"},
                {"name": "blob", "type": "bytes", "length": 8}
            ]}]}"#,
        );
        let src = module(&files, "py/tm/heater_status.py");
        assert!(src.contains("    REPORT_ID = 2"));
        assert!(src.contains("    FORMAT = '<h 8p'"));
        assert!(src.contains("    SIZE = 10"));
        assert!(src.contains("return struct.pack(self.FORMAT, self.temperature, bytes(self.blob))"));
        assert!(src.contains("return cls(temperature=temperature, blob=blob)"));
    }

    #[test]
    fn string_literal_escaping() {
        assert_eq!(python_string_literal("it's"), "'it\\'s'");
        assert_eq!(python_string_literal("a\tb"), "'a\\x09b'");
    }
}
