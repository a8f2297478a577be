use chrono::NaiveDate;
use glob::glob;
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::PipelineError;
use crate::config::{Config, MaskFile, RasterFile, SeriesConfig};
use crate::error::AnalysisError;
use crate::grid::Grid;
use crate::habitat::{HabitatMasker, HabitatMasks, HabitatTable, depth_contours};
use crate::impact::cumulative_impact;
use crate::indices::{
    AnomalySeries, CellDistance, MEAN_BAND, climate_velocity, spatial_gradient, standardize,
    temporal_trend, time_of_emergence,
};
use crate::mask::Mask;
use crate::readers::{create_reader, read_mask};
use crate::stats::{HabitatSummary, summarize};
use crate::utils::log_grid_statistics;
use crate::writers::{write_geotiff, write_json};

#[derive(Debug, Clone)]
struct ResolvedRaster {
    file: RasterFile,
    path: PathBuf,
}

#[derive(Debug, Clone)]
struct ResolvedPeriod {
    name: String,
    hazards: Vec<ResolvedRaster>,
}

#[derive(Debug, Clone)]
struct ResolvedMask {
    name: &'static str,
    path: PathBuf,
    buffer: f64,
}

#[derive(Debug, Clone)]
struct ResolvedMasks {
    eez: ResolvedMask,
    canyon: Option<ResolvedMask>,
    seamount: Option<ResolvedMask>,
    coral: Option<ResolvedMask>,
}

struct LoadedMasks {
    eez: Mask,
    canyon: Option<Mask>,
    seamount: Option<Mask>,
    coral: Option<Mask>,
}

impl LoadedMasks {
    fn habitat_masks(&self) -> HabitatMasks<'_> {
        let mut masks = HabitatMasks::new(&self.eez);
        if let Some(canyon) = &self.canyon {
            masks = masks.with_canyon(canyon);
        }
        if let Some(seamount) = &self.seamount {
            masks = masks.with_seamount(seamount);
        }
        if let Some(coral) = &self.coral {
            masks = masks.with_coral(coral);
        }
        masks
    }
}

enum Output {
    Raster(Grid),
    Table(HabitatTable),
}

/// Habitat distributions of one period.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub period: String,
    pub habitats: Vec<HabitatSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub summaries: Vec<PeriodSummary>,
}

#[derive(Debug)]
pub struct BatchRunner {
    config: Config,
    bathymetry: ResolvedRaster,
    periods: Vec<ResolvedPeriod>,
    masks: ResolvedMasks,
    series: Vec<PathBuf>,
}

impl BatchRunner {
    /// Resolves every input file of `config`, failing before any processing when one is missing.
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        let base_dir = config.data_directory();

        let bathymetry = Self::resolve_raster(base_dir, config.bathymetry())?;
        let periods = Self::resolve_periods(&config)?;
        let masks = Self::resolve_masks(&config)?;
        let series = match config.series() {
            Some(series) => Self::resolve_series(base_dir, series)?,
            None => Vec::new(),
        };

        Ok(BatchRunner {
            config,
            bathymetry,
            periods,
            masks,
            series,
        })
    }

    fn resolve_raster(base_dir: &Path, file: &RasterFile) -> Result<ResolvedRaster, PipelineError> {
        let path = Self::find_file(base_dir, &file.path)
            .ok_or_else(|| PipelineError::MissingFile(file.path.clone()))?;

        debug!(name = %file.name, path = %path.display(), "resolved raster");
        Ok(ResolvedRaster {
            file: file.clone(),
            path,
        })
    }

    fn resolve_periods(config: &Config) -> Result<Vec<ResolvedPeriod>, PipelineError> {
        let mut periods = Vec::new();

        for period in config.periods() {
            let mut hazards = Vec::new();
            let mut missing = Vec::new();

            for file in &period.hazards {
                match Self::resolve_raster(config.data_directory(), file) {
                    Ok(raster) => hazards.push(raster),
                    Err(_) => missing.push(file.path.as_str()),
                }
            }

            if !missing.is_empty() {
                warn!(period = %period.name, ?missing, "✗ Missing raster files");
                return Err(PipelineError::MissingFile(missing.join(", ")));
            }

            info!(
                period = %period.name,
                "✓ Found all {} raster files",
                hazards.len()
            );
            periods.push(ResolvedPeriod {
                name: period.name.clone(),
                hazards,
            });
        }

        Ok(periods)
    }

    fn resolve_masks(config: &Config) -> Result<ResolvedMasks, PipelineError> {
        let base_dir = config.data_directory();
        let resolve = |name: &'static str, file: &MaskFile| -> Result<ResolvedMask, PipelineError> {
            let path = Self::find_file(base_dir, &file.path)
                .ok_or_else(|| PipelineError::MissingFile(file.path.clone()))?;
            Ok(ResolvedMask {
                name,
                path,
                buffer: file.buffer,
            })
        };

        let masks = config.masks();
        Ok(ResolvedMasks {
            eez: resolve("eez", &masks.eez)?,
            canyon: masks.canyon.as_ref().map(|m| resolve("canyon", m)).transpose()?,
            seamount: masks
                .seamount
                .as_ref()
                .map(|m| resolve("seamount", m))
                .transpose()?,
            coral: masks.coral.as_ref().map(|m| resolve("coral", m)).transpose()?,
        })
    }

    /// Files matching the series pattern in lexicographic order, one per time step.
    fn resolve_series(base_dir: &Path, series: &SeriesConfig) -> Result<Vec<PathBuf>, PipelineError> {
        let pattern = if Path::new(&series.pattern).is_absolute() {
            PathBuf::from(&series.pattern)
        } else {
            base_dir.join(&series.pattern)
        };

        let mut files = glob(&pattern.to_string_lossy())?
            .map(|entry| entry.map_err(|e| e.into_error()))
            .collect::<Result<Vec<_>, _>>()?;
        files.sort();

        let expected = series.axis.dates().len();
        if files.len() != expected {
            return Err(PipelineError::SeriesLength {
                name: series.name.clone(),
                expected,
                found: files.len(),
            });
        }

        info!(
            series = %series.name,
            "✓ Found {} rasters from {} to {}",
            files.len(),
            series.axis.start(),
            series.axis.end()
        );
        Ok(files)
    }

    /// Finds `path` as given, then below the base directory, then by file name anywhere under
    /// the base directory.
    fn find_file(base_dir: &Path, path: &str) -> Option<PathBuf> {
        let direct_path = Path::new(path);
        if direct_path.exists() {
            return Some(direct_path.to_path_buf());
        }

        let joined = base_dir.join(path);
        if joined.exists() {
            return Some(joined);
        }

        Self::search_file_recursively(base_dir, direct_path.file_name()?)
    }

    /// Search for a file (or a directory store such as Zarr) recursively within a directory
    fn search_file_recursively(base_dir: &Path, filename: &OsStr) -> Option<PathBuf> {
        if !base_dir.exists() {
            return None;
        }

        for entry in WalkDir::new(base_dir).into_iter().filter_map(|e| e.ok()) {
            if entry.file_name() == filename {
                return Some(entry.into_path());
            }
        }

        None
    }

    fn read_raster(&self, raster: &ResolvedRaster) -> Result<Grid, PipelineError> {
        self.read_path(&raster.path, &raster.file.name, raster.file.variable.clone())
    }

    fn read_path(
        &self,
        path: &Path,
        name: &str,
        variable: Option<String>,
    ) -> Result<Grid, PipelineError> {
        let reader = create_reader(path.to_string_lossy().to_string(), variable)?;
        let grid = reader.read_band(name)?;

        Ok(match self.config.bbox() {
            Some(bbox) => grid.crop(bbox)?,
            None => grid,
        })
    }

    fn load_masks(&self) -> Result<LoadedMasks, PipelineError> {
        let load = |mask: &ResolvedMask| -> Result<Mask, PipelineError> {
            Ok(read_mask(&mask.path.to_string_lossy(), mask.name, mask.buffer)?)
        };

        Ok(LoadedMasks {
            eez: load(&self.masks.eez)?,
            canyon: self.masks.canyon.as_ref().map(load).transpose()?,
            seamount: self.masks.seamount.as_ref().map(load).transpose()?,
            coral: self.masks.coral.as_ref().map(load).transpose()?,
        })
    }

    /// Runs every period, then the series indices when a series is configured.
    ///
    /// Everything is computed before the first file is written, so a failing period or an
    /// empty mask leaves the output directory untouched. Writes `contours.tif`, then
    /// `impact_<period>.tif` and `habitat_<period>.json` per period, then `toe_<series>.tif`
    /// and `velocity_<series>.tif`.
    pub fn process(&self) -> Result<BatchReport, PipelineError> {
        let mut outputs: Vec<(String, Output)> = Vec::new();
        let mut summaries = Vec::new();

        let bathymetry = self.read_raster(&self.bathymetry)?;
        let depth_band = self.bathymetry.file.name.as_str();

        let contours = depth_contours(&bathymetry, depth_band, &self.config.contour_depths())?;
        outputs.push(("contours.tif".to_string(), Output::Raster(contours)));

        let masks = self.load_masks()?;
        let habitat_masks = masks.habitat_masks();
        let masker = HabitatMasker::new(self.config.habitat_depths())
            .with_empty_policy(self.config.empty_mask_policy());
        let variables: Vec<&str> = self.config.variables().iter().map(String::as_str).collect();

        for period in &self.periods {
            info!(period = %period.name, "Processing period");

            let hazards = period
                .hazards
                .iter()
                .map(|raster| self.read_raster(raster))
                .collect::<Result<Vec<_>, _>>()?;
            let hazards = stack_grids(hazards)?;

            let impact = cumulative_impact(&hazards, &bathymetry)?;
            log_grid_statistics(&period.name, &impact)?;

            let stacked = bathymetry.stack(&hazards)?.stack(&impact)?;
            let table = masker.mask(&stacked, depth_band, &variables, &habitat_masks)?;

            summaries.push(PeriodSummary {
                period: period.name.clone(),
                habitats: summarize(&table),
            });
            outputs.push((format!("impact_{}.tif", period.name), Output::Raster(impact)));
            outputs.push((format!("habitat_{}.json", period.name), Output::Table(table)));
        }

        if let Some(series) = self.config.series() {
            outputs.extend(self.process_series(series)?);
        }

        let output_dir = self.config.output_directory();
        fs::create_dir_all(output_dir)?;

        let mut written = Vec::with_capacity(outputs.len());
        for (name, output) in &outputs {
            let filename = output_dir.join(name);
            match output {
                Output::Raster(grid) => write_geotiff(grid, &filename)?,
                Output::Table(table) => write_json(table, &filename)?,
            }
            written.push(filename);
        }

        Ok(BatchReport { written, summaries })
    }

    fn process_series(&self, series: &SeriesConfig) -> Result<Vec<(String, Output)>, PipelineError> {
        let dates: Vec<NaiveDate> = series.axis.dates();

        let grids = dates
            .iter()
            .zip(&self.series)
            .map(|(date, path)| self.read_path(path, &date.format("%Y-%m-%d").to_string(), None))
            .collect::<Result<Vec<_>, _>>()?;
        let raw = AnomalySeries::new(dates, stack_grids(grids)?)?;

        let standardized = series
            .baseline_end
            .map(|end| standardize(&raw, end))
            .transpose()?;
        let anomalies = standardized.as_ref().unwrap_or(&raw);

        let toe = time_of_emergence(anomalies, series.threshold)?;
        log_grid_statistics(&series.name, &toe)?;

        let distance = if series.geographic {
            CellDistance::Geographic
        } else {
            CellDistance::Projected
        };
        let trend = temporal_trend(&raw)?;
        let gradient = spatial_gradient(&raw.mean()?, MEAN_BAND, distance)?;
        let velocity = climate_velocity(&trend, &gradient)?;
        log_grid_statistics(&series.name, &velocity)?;

        Ok(vec![
            (format!("toe_{}.tif", series.name), Output::Raster(toe)),
            (
                format!("velocity_{}.tif", series.name),
                Output::Raster(trend.stack(&gradient)?.stack(&velocity)?),
            ),
        ])
    }
}

/// Stacks single band grids in order into one grid.
fn stack_grids(grids: Vec<Grid>) -> Result<Grid, AnalysisError> {
    let mut grids = grids.into_iter();
    let first = grids.next().ok_or(AnalysisError::BandCountMismatch {
        expected: 1,
        found: 0,
    })?;

    grids.try_fold(first, |stacked, grid| stacked.stack(&grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Band, Lattice};
    use ndarray::array;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_find_file_searches_recursively() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("cmip6").join("ssp585");
        fs::create_dir_all(&nested).unwrap();
        File::create(nested.join("epc_2041.tif")).unwrap();

        let found = BatchRunner::find_file(dir.path(), "epc_2041.tif").unwrap();
        assert_eq!(found, nested.join("epc_2041.tif"));

        let found = BatchRunner::find_file(dir.path(), "cmip6/ssp585/epc_2041.tif").unwrap();
        assert_eq!(found, dir.path().join("cmip6/ssp585/epc_2041.tif"));

        assert!(BatchRunner::find_file(dir.path(), "o2_2041.tif").is_none());
    }

    #[test]
    fn test_stack_grids_keeps_order() {
        let lattice = Lattice::new(0.0, 1.0, 1.0, 1.0, 1, 1).unwrap();
        let grids = vec![
            Grid::new(lattice, vec![Band::new("epc", array![[1.0]])]).unwrap(),
            Grid::new(lattice, vec![Band::new("o2", array![[2.0]])]).unwrap(),
        ];

        let stacked = stack_grids(grids).unwrap();
        assert_eq!(stacked.band_names(), vec!["epc", "o2"]);
        assert!(stack_grids(Vec::new()).is_err());
    }
}
