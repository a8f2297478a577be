use serde::Deserialize;
use tracing::{debug, warn};

use super::depth::{DepthClass, DepthThresholds};
use super::table::{HabitatLabel, HabitatRecord, HabitatTable};
use crate::error::AnalysisError;
use crate::grid::Grid;
use crate::mask::CellMask;

/// The geographic features a habitat table is built from. Only the EEZ is mandatory.
#[derive(Clone, Copy)]
pub struct HabitatMasks<'a> {
    pub eez: &'a dyn CellMask,
    pub canyon: Option<&'a dyn CellMask>,
    pub seamount: Option<&'a dyn CellMask>,
    pub coral: Option<&'a dyn CellMask>,
}

impl<'a> HabitatMasks<'a> {
    pub fn new(eez: &'a dyn CellMask) -> Self {
        Self {
            eez,
            canyon: None,
            seamount: None,
            coral: None,
        }
    }

    pub fn with_canyon(mut self, canyon: &'a dyn CellMask) -> Self {
        self.canyon = Some(canyon);
        self
    }

    pub fn with_seamount(mut self, seamount: &'a dyn CellMask) -> Self {
        self.seamount = Some(seamount);
        self
    }

    pub fn with_coral(mut self, coral: &'a dyn CellMask) -> Self {
        self.coral = Some(coral);
        self
    }
}

/// What to do when a mask selects no usable cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyMaskPolicy {
    #[default]
    Fail,
    Skip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HabitatMasker {
    thresholds: DepthThresholds,
    policy: EmptyMaskPolicy,
}

impl HabitatMasker {
    pub fn new(thresholds: DepthThresholds) -> Self {
        Self {
            thresholds,
            policy: EmptyMaskPolicy::Fail,
        }
    }

    pub fn with_empty_policy(mut self, policy: EmptyMaskPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the long-form habitat table for `variables`.
    ///
    /// Cells inside the EEZ are bucketed into shelf or slope by the elevation in `depth_band`.
    /// Canyon, seamount and coral cells must fall inside both their own mask and the EEZ and
    /// keep the fixed label of that mask. Any cell with a missing value in any band of `grid`
    /// is dropped, not only in the depth band and the requested variables.
    /// Groups come out as shelf/slope, canyon, seamount then CWC, each in row-major cell order,
    /// with one row per variable and cell.
    pub fn mask(
        &self,
        grid: &Grid,
        depth_band: &str,
        variables: &[&str],
        masks: &HabitatMasks<'_>,
    ) -> Result<HabitatTable, AnalysisError> {
        let depth = grid.band_index(depth_band)?;
        let columns = variables
            .iter()
            .map(|name| grid.band_index(name))
            .collect::<Result<Vec<_>, _>>()?;

        let lattice = grid.lattice();
        let complete = |row: usize, col: usize| {
            (0..grid.band_count()).all(|band| grid.value(band, row, col).is_some())
        };

        let eez = masks.eez.selection(lattice);
        let mut cells: Vec<(usize, usize, HabitatLabel)> = Vec::new();

        let in_eez: Vec<(usize, usize)> = grid
            .cells()
            .filter(|&(row, col)| eez[(row, col)] && complete(row, col))
            .collect();

        if in_eez.is_empty() {
            self.on_empty(masks.eez.name())?;
        }

        for (row, col) in in_eez {
            let Some(elevation) = grid.value(depth, row, col) else {
                continue;
            };
            match self.thresholds.classify_elevation(elevation) {
                DepthClass::Shelf => cells.push((row, col, HabitatLabel::Shelf)),
                DepthClass::Slope => cells.push((row, col, HabitatLabel::Slope)),
                DepthClass::OutOfRange => {}
            }
        }

        debug!(mask = masks.eez.name(), cells = cells.len(), "depth buckets");

        let features = [
            (masks.canyon, HabitatLabel::Canyon),
            (masks.seamount, HabitatLabel::Seamount),
            (masks.coral, HabitatLabel::Cwc),
        ];

        for (mask, label) in features {
            let Some(mask) = mask else {
                continue;
            };

            let selection = mask.selection(lattice);
            let group: Vec<(usize, usize, HabitatLabel)> = grid
                .cells()
                .filter(|&(row, col)| {
                    selection[(row, col)] && eez[(row, col)] && complete(row, col)
                })
                .map(|(row, col)| (row, col, label))
                .collect();

            if group.is_empty() {
                self.on_empty(mask.name())?;
            }

            debug!(mask = mask.name(), cells = group.len(), "feature mask");
            cells.extend(group);
        }

        let rows = cells
            .into_iter()
            .flat_map(|(row, col, habitat)| {
                let center = lattice.cell_center(row, col);
                variables
                    .iter()
                    .zip(&columns)
                    .filter_map(move |(name, &band)| {
                        grid.value(band, row, col).map(|value| HabitatRecord {
                            x: center.x,
                            y: center.y,
                            variable: name.to_string(),
                            value,
                            habitat,
                        })
                    })
            })
            .collect();

        Ok(HabitatTable::new(rows))
    }

    fn on_empty(&self, name: &str) -> Result<(), AnalysisError> {
        match self.policy {
            EmptyMaskPolicy::Fail => Err(AnalysisError::EmptyMaskResult(name.to_string())),
            EmptyMaskPolicy::Skip => {
                warn!(mask = name, "mask selects no cells, skipping habitat group");
                Ok(())
            }
        }
    }
}

/// [`HabitatMasker`] with the 200 m / 5000 m habitat thresholds, failing on empty masks.
pub fn mask_habitat(
    grid: &Grid,
    depth_band: &str,
    variables: &[&str],
    masks: &HabitatMasks<'_>,
) -> Result<HabitatTable, AnalysisError> {
    HabitatMasker::new(DepthThresholds::habitat()).mask(grid, depth_band, variables, masks)
}
