//! Canonical records handed to the emitters.

use std::collections::HashMap;

use tracing::debug;

use crate::document::{Document, MessageKind, RawMessage};
use crate::enums::{self, Enumeration};
use crate::error::{ConfigError, SchemaError};
use crate::schema::{self, MessageNames, ResolvedField};
use crate::wire::{self, WireFormat};

/// Target-agnostic view of one message: everything an emitter needs, with no
/// type or layout decision left open.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalRecord {
    pub kind: MessageKind,
    pub id: u32,
    pub names: MessageNames,
    pub description: Option<String>,
    pub fields_in: Vec<ResolvedField>,
    pub fields_out: Option<Vec<ResolvedField>>,
    pub enums: Vec<Enumeration>,
    pub wire_in: WireFormat,
    pub wire_out: Option<WireFormat>,
}

impl CanonicalRecord {
    pub fn enumeration_for(&self, field: &ResolvedField) -> Option<&Enumeration> {
        let spec = field.ty.as_enum()?;
        self.enums.iter().find(|e| e.type_ident == spec.type_ident)
    }
}

pub fn canonicalize(raw: &RawMessage, kind: MessageKind) -> Result<CanonicalRecord, SchemaError> {
    let message = schema::normalize(raw, kind)?;
    let enums = enums::synthesize(&message.names, message.all_fields());
    let wire_in = wire::derive(&message.fields_in);
    let wire_out = message.fields_out.as_deref().map(wire::derive);

    debug!(
        message = %message.names.source,
        wire_in = %wire_in,
        enums = enums.len(),
        "derived canonical record"
    );

    Ok(CanonicalRecord {
        kind: message.kind,
        id: message.id,
        names: message.names,
        description: message.description,
        fields_in: message.fields_in,
        fields_out: message.fields_out,
        enums,
        wire_in,
        wire_out,
    })
}

/// Canonicalizes every message, telecommands first. Stops at the first
/// Schema Error.
pub fn canonicalize_document(document: &Document) -> Result<Vec<CanonicalRecord>, SchemaError> {
    let telecommands = document
        .telecommands
        .iter()
        .map(|raw| (raw, MessageKind::Telecommand));
    let telemetries = document
        .telemetries
        .iter()
        .map(|raw| (raw, MessageKind::Telemetry));

    telecommands
        .chain(telemetries)
        .map(|(raw, kind)| canonicalize(raw, kind))
        .collect()
}

/// Ids must be unique within a category. Normalization does not need this, the
/// ground software dispatching on the ids does.
pub fn check_unique_ids(records: &[CanonicalRecord]) -> Result<(), ConfigError> {
    let mut seen: HashMap<(MessageKind, u32), &str> = HashMap::new();
    for record in records {
        if let Some(first) = seen.insert((record.kind, record.id), &record.names.source) {
            return Err(ConfigError::DuplicateId {
                kind: record.kind,
                id: record.id,
                first: first.to_string(),
                second: record.names.source.clone(),
            });
        }
    }
    Ok(())
}
