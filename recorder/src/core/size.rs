//! Canvas and font size presets for recordings.

use serde::{Deserialize, Serialize};

/// Canvas dimensions and font size for a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoSize {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
}

/// Large text that stays readable on phones.
pub const SOCIAL: DemoSize = DemoSize {
    width: 1200,
    height: 700,
    font_size: 26,
};

/// More content per frame for the documentation site.
pub const DOCS: DemoSize = DemoSize {
    width: 1600,
    height: 900,
    font_size: 24,
};

/// Named preset as written in demo manifests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizePreset {
    Social,
    #[default]
    Docs,
}

impl SizePreset {
    pub fn size(self) -> DemoSize {
        match self {
            SizePreset::Social => SOCIAL,
            SizePreset::Docs => DOCS,
        }
    }
}
