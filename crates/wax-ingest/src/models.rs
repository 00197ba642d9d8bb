//! Typed catalog records
//!
//! One record type per dump entity kind. Field sets mirror the upstream
//! catalog dumps: scalars come from attributes or single child elements,
//! multi-valued fields keep document order and are empty when absent.
//! Records are constructed only by the schema mappers and are immutable
//! once yielded by a scanner.

use serde::{Deserialize, Serialize};
use wax_common::WaxError;

/// The four dump entity kinds, each with its own mapper and store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Label,
    Master,
    Release,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Artist,
        EntityKind::Label,
        EntityKind::Master,
        EntityKind::Release,
    ];

    /// Root tag of one entry in this kind's dump file.
    pub fn root_tag(self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Label => "label",
            EntityKind::Master => "master",
            EntityKind::Release => "release",
        }
    }

    /// Plural category used in dump file names
    /// (`discogs_<date>_<category>.xml.gz`).
    pub fn dump_category(self) -> &'static str {
        match self {
            EntityKind::Artist => "artists",
            EntityKind::Label => "labels",
            EntityKind::Master => "masters",
            EntityKind::Release => "releases",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.root_tag())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = WaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "artist" | "artists" => Ok(EntityKind::Artist),
            "label" | "labels" => Ok(EntityKind::Label),
            "master" | "masters" => Ok(EntityKind::Master),
            "release" | "releases" => Ok(EntityKind::Release),
            other => Err(WaxError::Parse(format!("unknown entity kind: {other}"))),
        }
    }
}

/// An artist or group, from the artists dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub real_name: String,
    /// Free-text notes about the artist.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub profile: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_variations: Vec<String>,
}

/// A record label, from the labels dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contact_info: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub profile: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_labels: Vec<String>,
}

/// A master recording grouping its release versions, from the masters dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Master {
    pub id: u64,
    pub title: String,
    /// Release year as free text; not parsed into a date.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_release: Option<u64>,
    /// Primary artist name captured inline.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<String>,
}

/// One version of a release, from the releases dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    /// Release date as free text (dumps carry partial dates like "1994-00-00").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub released: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    /// Inline label reference; first `labels>label` entry, extras ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<ReleaseLabel>,
    /// Primary artist name captured inline, not a foreign-key join.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub artist: String,
    /// Track sequence in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<Track>,
}

/// Inline label reference on a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLabel {
    pub name: String,
    /// Catalog number, e.g. "SUAD 17".
    pub catno: String,
    pub id: u64,
}

/// One tracklist entry. Position and duration stay free text; "A1" and
/// "12:30" are display values, not structured data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub position: String,
    pub title: String,
    pub duration: String,
}
