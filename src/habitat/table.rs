use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HabitatLabel {
    Shelf,
    Slope,
    Canyon,
    Seamount,
    #[serde(rename = "CWC")]
    Cwc,
}

impl fmt::Display for HabitatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HabitatLabel::Shelf => write!(f, "Shelf"),
            HabitatLabel::Slope => write!(f, "Slope"),
            HabitatLabel::Canyon => write!(f, "Canyon"),
            HabitatLabel::Seamount => write!(f, "Seamount"),
            HabitatLabel::Cwc => write!(f, "CWC"),
        }
    }
}

/// One long-form row: the value of a single variable at a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitatRecord {
    pub x: f64,
    pub y: f64,
    pub variable: String,
    pub value: f64,
    pub habitat: HabitatLabel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitatTable {
    rows: Vec<HabitatRecord>,
}

impl HabitatTable {
    pub fn new(rows: Vec<HabitatRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[HabitatRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct labels in order of first appearance.
    pub fn labels(&self) -> Vec<HabitatLabel> {
        let mut labels = Vec::new();
        for row in &self.rows {
            if !labels.contains(&row.habitat) {
                labels.push(row.habitat);
            }
        }
        labels
    }

    pub fn for_habitat(&self, habitat: HabitatLabel) -> impl Iterator<Item = &HabitatRecord> {
        self.rows.iter().filter(move |r| r.habitat == habitat)
    }
}
