use chrono::NaiveDate;

use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::bbox::Bbox;
use crate::date_gen::TimeAxis;
use crate::habitat::{DepthThresholds, EmptyMaskPolicy};
use crate::impact::{NEGATIVE_BAND, POSITIVE_BAND};

pub mod error;
pub use error::ConfigError;

pub mod time_step;
pub use time_step::TimeStep;

/// A single band raster. `variable` picks the NetCDF variable or Zarr array.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RasterFile {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub variable: Option<String>,
}

/// Hazard rasters of one projection period, in the order POC flux, O2, pH, temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub name: String,
    pub hazards: Vec<RasterFile>,
}

/// A vector file of mask geometries. `buffer` is in lattice units.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MaskFile {
    pub path: String,
    #[serde(default)]
    pub buffer: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MaskFiles {
    pub eez: MaskFile,
    #[serde(default)]
    pub canyon: Option<MaskFile>,
    #[serde(default)]
    pub seamount: Option<MaskFile>,
    #[serde(default)]
    pub coral: Option<MaskFile>,
}

/// Yearly (or finer) anomaly rasters used for emergence and velocity indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    pub name: String,
    pub pattern: String,
    pub axis: TimeAxis,
    pub baseline_end: Option<NaiveDate>,
    pub threshold: f64,
    pub geographic: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    data_directory: PathBuf,
    bathymetry: RasterFile,
    periods: Vec<Period>,
    masks: MaskFiles,
    variables: Vec<String>,
    habitat_depths: DepthThresholds,
    contour_depths: DepthThresholds,
    empty_mask_policy: EmptyMaskPolicy,
    series: Option<SeriesConfig>,
    bbox: Option<Bbox>,
    output_directory: PathBuf,
}

fn default_threshold() -> f64 {
    2.0
}

fn default_geographic() -> bool {
    true
}

// Deserializes a Config, parsing the series dates and checking their order, the hazard
// count of every period, the depth thresholds and the bbox.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            #[serde(default)]
            data_directory: Option<String>,
            bathymetry: RasterFile,
            periods: Vec<PeriodHelper>,
            masks: MaskFiles,
            #[serde(default)]
            variables: Option<Vec<String>>,
            #[serde(default)]
            habitat_depths: Option<ThresholdsHelper>,
            #[serde(default)]
            contour_depths: Option<ThresholdsHelper>,
            #[serde(default)]
            empty_mask_policy: EmptyMaskPolicy,
            #[serde(default)]
            series: Option<SeriesHelper>,
            #[serde(default)]
            bbox: Option<BboxHelper>,
            output_directory: String,
        }

        #[derive(Deserialize)]
        struct PeriodHelper {
            name: String,
            hazards: Vec<RasterFile>,
        }

        #[derive(Deserialize)]
        struct ThresholdsHelper {
            shelf: f64,
            slope: f64,
        }

        #[derive(Deserialize)]
        struct SeriesHelper {
            name: String,
            pattern: String,
            start_date: String,
            end_date: String,
            frequency: TimeStep,
            #[serde(default)]
            baseline_end: Option<String>,
            #[serde(default = "default_threshold")]
            threshold: f64,
            #[serde(default = "default_geographic")]
            geographic: bool,
        }

        #[derive(Deserialize)]
        struct BboxHelper {
            xmin: f64,
            xmax: f64,
            ymin: f64,
            ymax: f64,
        }

        fn parse_date<E: Error>(field: &str, value: &str) -> Result<NaiveDate, E> {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|e| E::custom(format!("Invalid {} format: {}", field, ConfigError::from(e))))
        }

        fn thresholds<E: Error>(
            helper: Option<ThresholdsHelper>,
            default: DepthThresholds,
        ) -> Result<DepthThresholds, E> {
            match helper {
                Some(t) => DepthThresholds::new(t.shelf, t.slope)
                    .map_err(|e| E::custom(ConfigError::DepthThresholds(e))),
                None => Ok(default),
            }
        }

        // Deserialize into the helper struct
        let helper = ConfigHelper::deserialize(deserializer)?;

        let periods = helper
            .periods
            .into_iter()
            .map(|p| {
                if p.hazards.len() != 4 {
                    return Err(D::Error::custom(ConfigError::MissingHazards {
                        period: p.name,
                        found: p.hazards.len(),
                    }));
                }
                Ok(Period {
                    name: p.name,
                    hazards: p.hazards,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let habitat_depths = thresholds(helper.habitat_depths, DepthThresholds::habitat())?;
        let contour_depths = thresholds(helper.contour_depths, DepthThresholds::contours())?;

        let series = match helper.series {
            Some(s) => {
                let start_date = parse_date("start_date", &s.start_date)?;
                let end_date = parse_date("end_date", &s.end_date)?;
                let axis = TimeAxis::new(start_date, end_date, s.frequency)
                    .map_err(D::Error::custom)?;

                let baseline_end = s
                    .baseline_end
                    .as_deref()
                    .map(|d| parse_date("baseline_end", d))
                    .transpose()?;

                Some(SeriesConfig {
                    name: s.name,
                    pattern: s.pattern,
                    axis,
                    baseline_end,
                    threshold: s.threshold,
                    geographic: s.geographic,
                })
            }
            None => None,
        };

        // Validate bbox if present
        let bbox = if let Some(bbox_helper) = helper.bbox {
            Some(
                Bbox::new(
                    bbox_helper.xmin,
                    bbox_helper.xmax,
                    bbox_helper.ymin,
                    bbox_helper.ymax,
                )
                .map_err(|e| D::Error::custom(format!("Invalid bbox: {}", e)))?,
            )
        } else {
            None
        };

        Ok(Config {
            data_directory: PathBuf::from(helper.data_directory.unwrap_or_else(|| ".".into())),
            bathymetry: helper.bathymetry,
            periods,
            masks: helper.masks,
            variables: helper
                .variables
                .unwrap_or_else(|| vec![NEGATIVE_BAND.to_string(), POSITIVE_BAND.to_string()]),
            habitat_depths,
            contour_depths,
            empty_mask_policy: helper.empty_mask_policy,
            series,
            bbox,
            output_directory: PathBuf::from(helper.output_directory),
        })
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    pub fn bathymetry(&self) -> &RasterFile {
        &self.bathymetry
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn masks(&self) -> &MaskFiles {
        &self.masks
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn habitat_depths(&self) -> DepthThresholds {
        self.habitat_depths
    }

    pub fn contour_depths(&self) -> DepthThresholds {
        self.contour_depths
    }

    pub fn empty_mask_policy(&self) -> EmptyMaskPolicy {
        self.empty_mask_policy
    }

    pub fn series(&self) -> Option<&SeriesConfig> {
        self.series.as_ref()
    }

    pub fn bbox(&self) -> Option<&Bbox> {
        self.bbox.as_ref()
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const HAZARDS: &str = r#"[
        {"name": "epc", "path": "epc_2041.tif"},
        {"name": "o2", "path": "o2_2041.tif"},
        {"name": "ph", "path": "ph_2041.tif"},
        {"name": "thetao", "path": "thetao_2041.tif"}
    ]"#;

    fn config_json(extra: &str, hazards: &str) -> String {
        format!(
            r#"{{
                "bathymetry": {{"name": "depth", "path": "gebco.tif"}},
                "periods": [{{"name": "2041-2060", "hazards": {}}}],
                "masks": {{"eez": {{"path": "eez.geojson"}}}},
                {}
                "output_directory": "out"
            }}"#,
            hazards, extra
        )
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();

        let config_data = r#"
    {
        "data_directory": "data",
        "bathymetry": {"name": "depth", "path": "gebco.tif"},
        "periods": [
            {
                "name": "2041-2060",
                "hazards": [
                    {"name": "epc", "path": "epc_2041.tif"},
                    {"name": "o2", "path": "o2_2041.tif"},
                    {"name": "ph", "path": "ph_2041.tif"},
                    {"name": "thetao", "path": "thetao_2041.nc", "variable": "thetao"}
                ]
            }
        ],
        "masks": {
            "eez": {"path": "eez.geojson"},
            "canyon": {"path": "canyons.geojson", "buffer": 0.1}
        },
        "habitat_depths": {"shelf": 150, "slope": 3000},
        "empty_mask_policy": "skip",
        "series": {
            "name": "thetao",
            "pattern": "series/thetao_*.tif",
            "start_date": "2000-01-01",
            "end_date": "2009-01-01",
            "frequency": "yearly",
            "baseline_end": "2004-12-31"
        },
        "bbox": {"xmin": -70.0, "xmax": -55.0, "ymin": 40.0, "ymax": 48.0},
        "output_directory": "out"
    }
    "#;

        file.write_all(config_data.as_bytes()).unwrap();

        let config = Config::from_file(file_path).unwrap();

        assert_eq!(config.data_directory(), Path::new("data"));
        assert_eq!(config.periods().len(), 1);
        assert_eq!(
            config.periods()[0].hazards[3].variable.as_deref(),
            Some("thetao")
        );
        assert_eq!(config.masks().canyon.as_ref().unwrap().buffer, 0.1);
        assert_eq!(config.masks().eez.buffer, 0.0);
        assert_eq!(config.habitat_depths(), DepthThresholds::new(150.0, 3000.0).unwrap());
        assert_eq!(config.contour_depths(), DepthThresholds::contours());
        assert_eq!(config.empty_mask_policy(), EmptyMaskPolicy::Skip);
        assert_eq!(config.variables(), ["negative", "positive"]);

        let series = config.series().unwrap();
        assert_eq!(series.axis.dates().len(), 10);
        assert_eq!(series.axis.frequency(), TimeStep::Yearly);
        assert_eq!(
            series.baseline_end,
            Some(NaiveDate::from_ymd_opt(2004, 12, 31).expect("Invalid date"))
        );
        assert_eq!(series.threshold, 2.0);
        assert!(series.geographic);

        assert_eq!(config.bbox().unwrap().xmin, -70.0);
        assert_eq!(config.output_directory(), Path::new("out"));
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str(&config_json("", HAZARDS)).unwrap();

        assert_eq!(config.data_directory(), Path::new("."));
        assert_eq!(config.habitat_depths(), DepthThresholds::habitat());
        assert_eq!(config.empty_mask_policy(), EmptyMaskPolicy::Fail);
        assert!(config.series().is_none());
        assert!(config.bbox().is_none());
        assert!(config.masks().coral.is_none());
    }

    #[test]
    fn test_rejects_incomplete_hazards() {
        let hazards = r#"[{"name": "epc", "path": "epc.tif"}]"#;
        let err = serde_json::from_str::<Config>(&config_json("", hazards)).unwrap_err();
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let extra = r#""contour_depths": {"shelf": 4000, "slope": 200},"#;
        assert!(serde_json::from_str::<Config>(&config_json(extra, HAZARDS)).is_err());
    }

    #[test]
    fn test_rejects_reversed_series_dates() {
        let extra = r#""series": {
            "name": "o2",
            "pattern": "o2_*.tif",
            "start_date": "2010-01-01",
            "end_date": "2000-01-01",
            "frequency": "yearly"
        },"#;
        let err = serde_json::from_str::<Config>(&config_json(extra, HAZARDS)).unwrap_err();
        assert!(err.to_string().contains("end_date cannot be earlier"));
    }

    #[test]
    fn test_rejects_invalid_bbox() {
        let extra = r#""bbox": {"xmin": -50.0, "xmax": -60.0, "ymin": 40.0, "ymax": 48.0},"#;
        assert!(serde_json::from_str::<Config>(&config_json(extra, HAZARDS)).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("does/not/exist.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
