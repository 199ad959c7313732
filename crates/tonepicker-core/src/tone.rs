//! The 3x3 tone grid. x runs formal → casual, y runs professional → casual.

use serde::{Deserialize, Serialize};

use crate::ToneCoordinate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Formal,
    Neutral,
    Casual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Register {
    Professional,
    Neutral,
    Casual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToneDescriptor {
    #[serde(rename = "x")]
    pub x_label: Formality,
    #[serde(rename = "y")]
    pub y_label: Register,
    pub description: String,
}

struct ToneEntry {
    x_label: Formality,
    y_label: Register,
    description: &'static str,
}

/// Row-major by x, then y.
const TONE_TABLE: [[ToneEntry; 3]; 3] = [
    [
        ToneEntry { x_label: Formality::Formal, y_label: Register::Professional, description: "Very formal and professional" },
        ToneEntry { x_label: Formality::Formal, y_label: Register::Neutral, description: "Formal but neutral" },
        ToneEntry { x_label: Formality::Formal, y_label: Register::Casual, description: "Formal but approachable" },
    ],
    [
        ToneEntry { x_label: Formality::Neutral, y_label: Register::Professional, description: "Neutral and professional" },
        ToneEntry { x_label: Formality::Neutral, y_label: Register::Neutral, description: "Balanced and neutral" },
        ToneEntry { x_label: Formality::Neutral, y_label: Register::Casual, description: "Neutral but casual" },
    ],
    [
        ToneEntry { x_label: Formality::Casual, y_label: Register::Professional, description: "Casual but professional" },
        ToneEntry { x_label: Formality::Casual, y_label: Register::Neutral, description: "Casual and neutral" },
        ToneEntry { x_label: Formality::Casual, y_label: Register::Casual, description: "Very casual and friendly" },
    ],
];

/// Look up the descriptor for a validated coordinate. Never fails: the
/// coordinate constructor already rejected anything off the grid.
pub fn describe(coordinate: ToneCoordinate) -> ToneDescriptor {
    let entry = &TONE_TABLE[coordinate.x() as usize][coordinate.y() as usize];
    ToneDescriptor {
        x_label: entry.x_label,
        y_label: entry.y_label,
        description: entry.description.to_string(),
    }
}
