//! Instruction block assembly.
//!
//! Each [`Mode`] selects one template. Modes that use reference material get three
//! labeled sections (schema, packages/functions, examples) in that order; a section
//! with nothing supplied is rendered as an explicit notice so the backend never
//! treats missing facts as implied.

mod reference;
pub mod templates;

pub use reference::{
    DirectoryReferenceSource, EmptyReferenceSource, ReferenceMaterial, ReferenceSource,
    EXAMPLES_FILE, PACKAGES_FILE, SCHEMA_FILE,
};

use crate::mode::Mode;
use templates::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAssembler {
    max_reference_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_REFERENCE_CHARS)
    }
}

impl ContextAssembler {
    pub fn new(max_reference_chars: usize) -> Self {
        Self { max_reference_chars }
    }

    /// Build the instruction block for `mode`.
    ///
    /// Reference material is ignored by modes that do not use it.
    pub fn assemble(&self, mode: Mode, reference: &ReferenceMaterial) -> String {
        let body = match mode {
            Mode::Sql => self.sql_block(reference),
            Mode::Email => EMAIL_TEMPLATE.to_string(),
            Mode::Wiki => WIKI_TEMPLATE.to_string(),
            Mode::Chat => CHAT_TEMPLATE.to_string(),
        };

        format!("{body}\n\n{RESPONSE_POLICY}")
    }

    fn sql_block(&self, reference: &ReferenceMaterial) -> String {
        let reference = reference.truncated(self.max_reference_chars);

        format!(
            "{SQL_ROLE}\n\n\
             # DATABASE SCHEMA:\n{schema}\n\n\
             # AVAILABLE PACKAGES/FUNCTIONS:\n{packages}\n\n\
             # EXAMPLES:\n{examples}\n\n\
             {SQL_GUIDELINES}",
            schema = section_or(&reference.schema, NO_SCHEMA_NOTICE),
            packages = section_or(&reference.packages, NO_PACKAGES_NOTICE),
            examples = section_or(&reference.examples, NO_EXAMPLES_NOTICE),
        )
    }
}

fn section_or<'a>(text: &'a str, notice: &'a str) -> &'a str {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        notice
    } else {
        trimmed
    }
}
