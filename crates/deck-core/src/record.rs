use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Where `creation_timestamp` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// EXIF DateTimeOriginal
    Exif,
    /// Filesystem modification time
    FileModified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Source file
    pub path: PathBuf,
    /// Display name (NFC normalized)
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Decoder format name, e.g. "JPEG"
    pub format: String,
    /// Decoder color mode, e.g. "RGB"
    pub color_mode: String,
    /// Capture time as local wall clock
    pub creation_timestamp: NaiveDateTime,
    pub timestamp_source: TimestampSource,
    /// None until classified
    pub category: Option<Category>,
    pub category_label: Option<String>,
}

impl ImageRecord {
    /// Fills `category` and `category_label` in place.
    pub fn assign(&mut self, category: Category) {
        self.category = Some(category);
        self.category_label = Some(category.label().to_string());
    }
}
