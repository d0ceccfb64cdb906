use thiserror;

use crate::fields::{FieldKey, FieldMap};
use crate::io::Origin;
use crate::template::Template;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error reading or writing \"{file}\": {source}")]
    FileIo {
        file: String,
        source: std::io::Error,
    },

    #[error("Error reading or writing {origin}: {source}")]
    StreamIo {
        origin: Origin,
        source: std::io::Error,
    },

    #[error("Invalid template {template}: {reason}")]
    Template {
        template: String,
        reason: String,
    },

    #[error("The {key} appears more than once in the template {template}")]
    DuplicateKey { key: FieldKey, template: String },

    #[error(
        "Cannot find the {key} in the fields:\n{fields}in the template {template}\nwhen {context}"
    )]
    MissingField {
        key: FieldKey,
        fields: FieldMap,
        template: Template,
        context: &'static str,
    },

    #[error(
        "Unknown standard template \"{0}\", \
         expected one of: gff3_ens_gene, gtf_ens_gene, gff3_ens_transcript"
    )]
    UnknownStandardTemplate(String),

    #[error("Error parsing config \"{file}\": {source}")]
    ParseConfig {
        file: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid regex \"{pattern}\" when {context}: {source}")]
    InvalidRegex {
        pattern: String,
        context: &'static str,
        source: regex::Error,
    },

    #[error("Line {line} in {origin} has no column {column} when {context}")]
    ColumnOutOfRange {
        origin: Origin,
        line: usize,
        column: usize,
        context: &'static str,
    },

    #[error("Could not parse \"{string}\": {reason}")]
    Parse { string: String, reason: &'static str },
}
