//! Note document codec.
//!
//! # Responsibility
//! - Convert a [`Note`](crate::model::note::Note) to and from its on-disk
//!   markdown document (YAML metadata block + shaped body sections).
//! - Normalize rich editor content to markdown at the write boundary.
//!
//! # Invariants
//! - Content is held as markdown in memory; decode never converts it back.
//! - Timestamps are written in RFC 3339 with full sub-second precision.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document;
pub mod html;

pub use document::{decode_note, encode_note};
pub use html::{html_to_markdown, looks_like_html, normalize_content};

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The document does not start with a `---` delimited metadata block.
    MissingMetadata,
    /// The metadata block exists but cannot be interpreted.
    InvalidMetadata(String),
    /// The metadata block could not be serialized.
    Encode(String),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMetadata => write!(f, "document has no metadata block"),
            Self::InvalidMetadata(message) => write!(f, "invalid metadata block: {message}"),
            Self::Encode(message) => write!(f, "failed to encode metadata block: {message}"),
        }
    }
}

impl Error for DocumentError {}

/// Lossless text form of a timestamp.
pub fn format_timestamp(value: &DateTime<Local>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parses RFC 3339, or an offset-less ISO form interpreted as local time.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Local>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Local));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

/// Serde adapter accepting every timestamp form [`parse_timestamp`] does.
pub(crate) mod timestamp_serde {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Local};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
    }

    fn parse<E: serde::de::Error>(raw: &str) -> Result<DateTime<Local>, E> {
        parse_timestamp(raw).ok_or_else(|| E::custom(format!("invalid timestamp `{raw}`")))
    }

    pub mod option {
        use super::format_timestamp;
        use chrono::{DateTime, Local};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<DateTime<Local>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_some(&format_timestamp(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Local>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw))
                .transpose()
        }
    }
}
