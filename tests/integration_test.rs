use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tmtc_codegen::{
    Args, Document, LanguageSelection, MessageKind, SchemaError, TargetLanguage,
    canonicalize_document,
};

const SATELLITE_JSON: &str = r#"{
    "telecommands": [
        {
            "name": "setPower",
            "id": 1,
            "description": "Switch a payload power rail",
            "arguments": [
                {"name": "rail", "type": "uint8"},
                {"name": "mode", "type": "enum", "enumName": "mode", "values": ["OFF", "ON", "STANDBY"], "default": "OFF"},
                {"name": "label", "type": "string", "stringLength": 4}
            ],
            "return": {"name": "status", "type": "int16"}
        },
        {
            "name": "uploadChunk",
            "id": 2,
            "arguments": [
                {"name": "offset", "type": "uint32"},
                {"name": "data", "type": "bytes", "length": 32}
            ],
            "returns": [
                {"name": "crc", "type": "uint16"},
                {"name": "mode", "type": "enum", "enumName": "mode", "values": ["OFF", "ON"]}
            ]
        },
        {
            "name": "reboot",
            "id": 3
        }
    ],
    "telemetries": [
        {
            "name": "heaterStatus",
            "id": 1,
            "parameters": [
                {"name": "temperature", "type": "float32"},
                {"name": "mode", "type": "enum", "enumName": "mode", "values": ["OFF", "ON"]},
                {"name": "name", "type": "string", "size": 8}
            ]
        }
    ]
}"#;

fn records() -> Vec<tmtc_codegen::CanonicalRecord> {
    let doc = Document::from_json_str(SATELLITE_JSON).unwrap();
    canonicalize_document(&doc).unwrap()
}

#[test]
fn test_wire_formats_for_all_messages() {
    let records = records();
    let formats: Vec<(&str, &str, Option<&str>)> = records
        .iter()
        .map(|r| {
            (
                r.names.source.as_str(),
                r.wire_in.as_str(),
                r.wire_out.as_ref().map(|w| w.as_str()),
            )
        })
        .collect();
    assert_eq!(
        formats,
        [
            ("setPower", "<B B 4s", Some("<h")),
            ("uploadChunk", "<I 32p", Some("<H B")),
            ("reboot", "<", None),
            ("heaterStatus", "<f B 8s", None),
        ]
    );
}

#[test]
fn test_enum_ordinals_agree_between_targets() {
    let records = records();
    let c_files = TargetLanguage::C.generate(&records, Path::new("sat.json"));
    let py_files = TargetLanguage::Python.generate(&records, Path::new("sat.json"));

    let c_header = content(&c_files, "c/tc/set_power_base.h");
    let py_module = content(&py_files, "py/tc/set_power.py");

    for (name, ordinal) in [("OFF", 0), ("ON", 1), ("STANDBY", 2)] {
        assert!(c_header.contains(&format!("SET_POWER_MODE_{} = {}", name, ordinal)));
        assert!(py_module.contains(&format!("        {} = {}\n", name, ordinal)));
    }
}

#[test]
fn test_same_enum_name_in_different_messages_stays_distinct() {
    let records = records();
    let c_files = TargetLanguage::C.generate(&records, Path::new("sat.json"));

    let set_power = content(&c_files, "c/tc/set_power_base.h");
    let upload = content(&c_files, "c/tc/upload_chunk_base.h");
    let heater = content(&c_files, "c/tm/tm_heater_status_base.h");

    assert!(set_power.contains("SET_POWER_MODE_ON = 1"));
    assert!(upload.contains("UPLOAD_CHUNK_MODE_ON = 1"));
    assert!(heater.contains("HEATER_STATUS_MODE_ON = 1"));
    assert!(set_power.contains("typedef uint8_t SetPowerMode_t;"));
    assert!(upload.contains("typedef uint8_t UploadChunkMode_t;"));
}

#[test]
fn test_both_targets_share_the_pack_format() {
    let records = records();
    let c_files = TargetLanguage::C.generate(&records, Path::new("sat.json"));
    let py_files = TargetLanguage::Python.generate(&records, Path::new("sat.json"));

    let c_header = content(&c_files, "c/tc/upload_chunk_base.h");
    let py_module = content(&py_files, "py/tc/upload_chunk.py");

    assert!(c_header.contains("#define UPLOAD_CHUNK_ARGUMENTS_SIZE 36"));
    assert!(c_header.contains("UploadChunkArguments_t must match wire format <I 32p"));
    assert!(py_module.contains("ARGUMENTS_FORMAT = '<I 32p'"));
    assert!(py_module.contains("ARGUMENTS_SIZE = 36"));
    assert!(py_module.contains("RETURNS_FORMAT = '<H B'"));
}

#[test]
fn test_message_without_fields_generates_void_hook() {
    let records = records();
    let c_files = TargetLanguage::C.generate(&records, Path::new("sat.json"));

    let app = content(&c_files, "c/tc/reboot.h");
    assert!(app.contains("int reboot_handler(void);"));
    let base = content(&c_files, "c/tc/reboot_base.h");
    assert!(!base.contains("typedef struct"));
}

#[test]
fn test_missing_enum_values_aborts_with_context() {
    let json = r#"{
        "telecommands": [
            {"name": "setPower", "id": 1, "arguments": [
                {"name": "mode", "type": "enum", "enumName": "mode"}
            ]}
        ]
    }"#;
    let doc = Document::from_json_str(json).unwrap();
    let err = canonicalize_document(&doc).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingEnumValues {
            message: "setPower".to_string(),
            field: "mode".to_string(),
        }
    );
}

#[test]
fn test_run_writes_full_tree() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("sat.json");
    let output_dir = temp_dir.path().join("out");
    fs::write(&input_path, SATELLITE_JSON).unwrap();

    tmtc_codegen::run_with(Args {
        input: Some(input_path.clone()),
        output_dir: Some(output_dir.clone()),
        lang: LanguageSelection::All,
    })
    .unwrap();

    for relative in [
        "c/tmtc_wire.h",
        "c/tc/set_power_base.h",
        "c/tc/set_power_base.c",
        "c/tc/set_power_auto.c",
        "c/tc/set_power.h",
        "c/tc/set_power.c",
        "c/tm/tm_heater_status_base.h",
        "c/tm/tm_heater_status.c",
        "py/tc/__init__.py",
        "py/tc/set_power.py",
        "py/tm/__init__.py",
        "py/tm/heater_status.py",
    ] {
        let path = output_dir.join(relative);
        assert!(path.exists(), "{} should be generated", relative);
    }

    let first = snapshot(&output_dir);
    tmtc_codegen::run_with(Args {
        input: Some(input_path),
        output_dir: Some(output_dir.clone()),
        lang: LanguageSelection::All,
    })
    .unwrap();
    assert_eq!(first, snapshot(&output_dir), "regeneration must be identical");
}

#[test]
fn test_run_python_only() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("sat.json");
    let output_dir = temp_dir.path().join("out");
    fs::write(&input_path, SATELLITE_JSON).unwrap();

    tmtc_codegen::run_with(Args {
        input: Some(input_path),
        output_dir: Some(output_dir.clone()),
        lang: LanguageSelection::Python,
    })
    .unwrap();

    assert!(output_dir.join("py/tc/reboot.py").exists());
    assert!(!output_dir.join("c").exists());
}

#[test]
fn test_run_rejects_duplicate_ids() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("dup.json");
    fs::write(
        &input_path,
        r#"{"telecommands": [{"name": "a", "id": 1}, {"name": "b", "id": 1}]}"#,
    )
    .unwrap();

    let result = tmtc_codegen::run_with(Args {
        input: Some(input_path),
        output_dir: Some(temp_dir.path().join("out")),
        lang: LanguageSelection::All,
    });
    let err = result.unwrap_err().to_string();
    assert!(err.contains("telecommand id 1"), "unexpected error: {}", err);
}

#[test]
fn test_run_rejects_empty_document() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("empty.json");
    fs::write(&input_path, "{}").unwrap();

    let result = tmtc_codegen::run_with(Args {
        input: Some(input_path),
        output_dir: Some(temp_dir.path().join("out")),
        lang: LanguageSelection::All,
    });
    assert!(result.is_err());
}

#[test]
fn test_kinds_are_tagged() {
    let records = records();
    let kinds: Vec<MessageKind> = records.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        [
            MessageKind::Telecommand,
            MessageKind::Telecommand,
            MessageKind::Telecommand,
            MessageKind::Telemetry,
        ]
    );
}

fn content<'a>(files: &'a [tmtc_codegen::OutputFile], path: &str) -> &'a str {
    files
        .iter()
        .find(|f| f.path == Path::new(path))
        .map(|f| f.content.as_str())
        .unwrap_or_else(|| panic!("{} not generated", path))
}

fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
    let mut entries = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let text = fs::read_to_string(&path).unwrap();
                entries.push((path, text));
            }
        }
    }
    entries.sort();
    entries
}

#[test]
fn test_bundled_example_document() {
    let input_path = PathBuf::from("msgs/tmtc.json");
    assert!(input_path.exists(), "Example JSON file should exist");

    let doc = tmtc_codegen::load_document(&input_path).unwrap();
    let records = canonicalize_document(&doc).unwrap();
    tmtc_codegen::check_unique_ids(&records).unwrap();

    let housekeeping = records
        .iter()
        .find(|r| r.names.source == "housekeeping")
        .unwrap();
    assert_eq!(housekeeping.wire_in.as_str(), "<I H b i");
    assert_eq!(housekeeping.wire_in.size(), 11);
}
