#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Airport location hierarchy types.
//!
//! Safety reports are attributed to a two-level tree of locations: a main
//! branch (`cabang utama`) owns sub-branches (`cabang pembantu`) and units.
//! Only main branches own children, so only main branches aggregate the
//! reports of other nodes and support hierarchy rollups.
//!
//! The tree itself lives in [`tree::LocationTree`], an arena of locations
//! indexed by id where `parent_id` is a non-owning back reference.

pub mod tree;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use tree::{HierarchyError, LocationTree};

/// Opaque unique identifier of a [`Location`] (e.g. `"CGK"`).
///
/// Backends that use numeric keys are accepted; the number is kept as its
/// decimal text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct LocationId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for LocationId {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        }
    }
}

impl From<LocationId> for String {
    fn from(value: LocationId) -> Self {
        value.0
    }
}

impl LocationId {
    /// Creates a location id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Position of a location in the branch hierarchy.
///
/// The wire names are the ones used by the dashboard backend; the English
/// names are accepted when parsing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum LocationLevel {
    /// Top-level branch. Owns sub-branches and units.
    #[serde(rename = "cabang_utama", alias = "main_branch")]
    #[strum(to_string = "cabang_utama", serialize = "main_branch")]
    MainBranch,
    /// Supporting branch attributed to exactly one main branch.
    #[serde(rename = "cabang_pembantu", alias = "sub_branch")]
    #[strum(to_string = "cabang_pembantu", serialize = "sub_branch")]
    SubBranch,
    /// Operational unit attributed to exactly one main branch.
    #[serde(rename = "unit")]
    #[strum(to_string = "unit")]
    Unit,
}

impl LocationLevel {
    /// Whether locations at this level own children. Only main branches
    /// aggregate child reports and support rollups.
    #[must_use]
    pub const fn owns_children(self) -> bool {
        match self {
            Self::MainBranch => true,
            Self::SubBranch | Self::Unit => false,
        }
    }

    /// Short badge label shown next to the location name.
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            Self::MainBranch => "CABANG UTAMA",
            Self::SubBranch => "PEMBANTU",
            Self::Unit => "UNIT",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::MainBranch, Self::SubBranch, Self::Unit]
    }
}

/// A WGS84 coordinate pair, serialized as `[latitude, longitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    /// Latitude in degrees (negative is south).
    pub latitude: f64,
    /// Longitude in degrees (negative is west).
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        [value.latitude, value.longitude]
    }
}

/// A node in the branch hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Unique location id.
    pub id: LocationId,
    /// Display name (e.g. "Bandara Internasional Soekarno-Hatta").
    pub name: String,
    /// City the location is in.
    #[serde(default)]
    pub city: String,
    /// Province the location is in.
    #[serde(default, alias = "provinsi")]
    pub province: String,
    /// Hierarchy level.
    pub level: LocationLevel,
    /// Owning main branch, `None` for main branches.
    #[serde(default, alias = "parent_id")]
    pub parent_id: Option<LocationId>,
    /// Map position, only needed for map placement.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// Whether this location can be placed on the map as a marker.
    ///
    /// Only main branches with valid coordinates are plotted; children are
    /// reached through their main branch.
    #[must_use]
    pub fn is_mappable(&self) -> bool {
        self.level == LocationLevel::MainBranch
            && self.coordinates.is_some_and(|c| c.is_valid())
    }
}
