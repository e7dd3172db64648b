//! Derives enumeration tables from resolved `enum` fields.
//!
//! Ordinals are assigned once here and shared by every emitter: the C side
//! uses the long-form constant identifiers, the Python side the bare member
//! names. Both read the same [`EnumMember::ordinal`].

use crate::schema::{MessageNames, ResolvedField};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    pub ordinal: usize,
    /// `<UPPER_SNAKE_MESSAGE>_<UPPER_SNAKE_ENUM>_<VALUE>`.
    pub c_ident: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enumeration {
    /// Capitalized `enumName`.
    pub type_name: String,
    /// Generated C type stem, `<CapitalizedMessage><CapitalizedEnum>`.
    pub type_ident: String,
    /// Source name of the owning field.
    pub field: String,
    pub members: Vec<EnumMember>,
}

impl Enumeration {
    pub fn ordinal_of(&self, member: &str) -> Option<usize> {
        self.members
            .iter()
            .find(|m| m.name == member)
            .map(|m| m.ordinal)
    }
}

/// Builds one [`Enumeration`] per `enum` field, in field order.
pub fn synthesize<'a>(
    names: &MessageNames,
    fields: impl IntoIterator<Item = &'a ResolvedField>,
) -> Vec<Enumeration> {
    fields
        .into_iter()
        .filter_map(|field| {
            let spec = field.ty.as_enum()?;
            let prefix = format!("{}_{}", names.upper_snake, spec.upper_snake);
            let members = spec
                .values
                .iter()
                .enumerate()
                .map(|(ordinal, value)| EnumMember {
                    name: value.clone(),
                    ordinal,
                    c_ident: format!("{}_{}", prefix, value),
                })
                .collect();
            Some(Enumeration {
                type_name: spec.type_name.clone(),
                type_ident: spec.type_ident.clone(),
                field: field.name.clone(),
                members,
            })
        })
        .collect()
}
