//! Catalog and collection records.
//!
//! Catalog records keep the field names the catalog REST API emits (`snake_case`); session
//! records (selected parts, collections) use `camelCase` to stay compatible with saved data.

use crate::foundation::core::Point;

/// A minifigure as listed by the catalog.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Minifig {
    /// Catalog identifier, e.g. `fig-000123`.
    pub set_num: String,
    /// Display name.
    pub name: String,
    /// Number of parts in the minifigure.
    #[serde(default)]
    pub num_parts: u32,
    /// Preview image.
    #[serde(default)]
    pub set_img_url: Option<String>,
    /// Catalog page.
    #[serde(default)]
    pub set_url: Option<String>,
    /// Last modification timestamp as reported by the catalog.
    #[serde(default)]
    pub last_modified_dt: Option<String>,
}

/// Part definition inside a [`MinifigPart`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartInfo {
    /// Part design number.
    pub part_num: String,
    /// Display name.
    pub name: String,
    /// Part image; some catalog entries have none.
    #[serde(default)]
    pub part_img_url: Option<String>,
}

/// Part color.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartColor {
    /// Catalog color id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Hex RGB without `#`.
    pub rgb: String,
    /// Transparent material.
    #[serde(default)]
    pub is_trans: bool,
}

/// One inventory line of a minifigure.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MinifigPart {
    /// Inventory line id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Part definition.
    pub part: PartInfo,
    /// Part color.
    pub color: PartColor,
    /// Count in the minifigure.
    #[serde(default = "one")]
    pub quantity: u32,
    /// Spare part flag.
    #[serde(default)]
    pub is_spare: bool,
}

fn one() -> u32 {
    1
}

impl MinifigPart {
    /// Image URL of the part, empty when the catalog has none.
    pub fn image_url(&self) -> &str {
        self.part.part_img_url.as_deref().unwrap_or("")
    }
}

/// A part picked from a source minifigure for composition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPart {
    /// Unique per selection, not per part type.
    pub id: String,
    /// The catalog part.
    pub part: MinifigPart,
    /// Minifigure the part was taken from.
    pub source_minifig: Minifig,
    /// Position saved with a collection, reused verbatim when the part is placed again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

/// A saved composition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Store-assigned id.
    pub id: String,
    /// User-supplied title.
    pub title: String,
    /// All minifigures used as part sources.
    #[serde(default)]
    pub source_minifigs: Vec<Minifig>,
    /// Selected parts, with positions.
    #[serde(default)]
    pub parts: Vec<SelectedPart>,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at_ms: u64,
    /// Last update time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at_ms: u64,
}
