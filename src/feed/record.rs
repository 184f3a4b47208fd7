//! Feed Record Module
//!
//! Typed shapes for vehicle observations as they come off the feed, as they
//! are kept in the snapshot, and as they are returned in slim mode.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

// == Scalar ==
/// A JSON scalar emitted by the feed.
///
/// The feed is not consistent about types: identifiers, lines and timestamps
/// show up as numbers or strings depending on the row. Numbers keep their
/// integer precision so they round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// String form of the value, as a JS `String(x)` would render it.
    ///
    /// Whole floats lose their `.0`, so `1.0` and `1` read the same.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Number(n) => {
                let text = n.to_string();
                match text.strip_suffix(".0") {
                    Some(whole) if n.is_f64() => Cow::Owned(whole.to_string()),
                    _ => Cow::Owned(text),
                }
            }
            Scalar::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Finite numeric reading of the whole value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(s) => s.trim().parse().ok(),
        };
        value.filter(|v: &f64| v.is_finite())
    }

    /// True for empty or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Number(_) => false,
            Scalar::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(Scalar::Number)
            .unwrap_or_else(|| Scalar::Text(value.to_string()))
    }
}

// == Timestamp Order ==
/// Sort key for one timestamp. Variant order is the rank between classes.
#[derive(Debug, PartialEq, PartialOrd)]
enum TimestampKey<'a> {
    Missing,
    Numeric(f64),
    Text(Cow<'a, str>),
}

impl<'a> TimestampKey<'a> {
    fn of(value: Option<&'a Scalar>) -> Self {
        match value {
            None => TimestampKey::Missing,
            Some(v) => match v.as_f64() {
                Some(n) => TimestampKey::Numeric(n),
                None => TimestampKey::Text(v.as_text()),
            },
        }
    }
}

/// Total order over optional observation timestamps.
///
/// Missing sorts below numbers, and numbers sort below text. Numbers (JSON
/// numbers or numeric strings) compare by value, text compares by string form.
pub fn compare_timestamps(a: Option<&Scalar>, b: Option<&Scalar>) -> Ordering {
    // Numeric keys are always finite, so the comparison is always defined
    TimestampKey::of(a)
        .partial_cmp(&TimestampKey::of(b))
        .unwrap_or(Ordering::Equal)
}

// == Raw Record ==
/// One observation as decoded from the feed.
///
/// Fields the tracker never uses (send/server timestamps and the like) are
/// ignored during decoding.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub ordem: Option<Scalar>,
    #[serde(default)]
    pub linha: Option<Scalar>,
    #[serde(default)]
    pub latitude: Option<Scalar>,
    #[serde(default)]
    pub longitude: Option<Scalar>,
    #[serde(default)]
    pub velocidade: Option<Scalar>,
    #[serde(default)]
    pub datahora: Option<Scalar>,
}

// == Compressed Record ==
/// The retained subset of an observation. This is what the snapshot stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordem: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linha: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocidade: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datahora: Option<Scalar>,
}

impl CompressedRecord {
    /// Deduplication key: the string form of the identifier.
    ///
    /// Returns None when the identifier is missing or blank.
    pub fn identity(&self) -> Option<String> {
        self.ordem
            .as_ref()
            .filter(|id| !id.is_blank())
            .map(|id| id.as_text().into_owned())
    }
}

impl From<RawRecord> for CompressedRecord {
    fn from(raw: RawRecord) -> Self {
        Self {
            ordem: raw.ordem,
            linha: raw.linha,
            latitude: raw.latitude,
            longitude: raw.longitude,
            velocidade: raw.velocidade,
            datahora: raw.datahora,
        }
    }
}

// == Slim Record ==
/// Reduced shape for bandwidth-constrained callers: no speed, no timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlimRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordem: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linha: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Scalar>,
}

impl From<&CompressedRecord> for SlimRecord {
    fn from(record: &CompressedRecord) -> Self {
        Self {
            ordem: record.ordem.clone(),
            linha: record.linha.clone(),
            latitude: record.latitude.clone(),
            longitude: record.longitude.clone(),
        }
    }
}
