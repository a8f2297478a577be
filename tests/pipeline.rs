use abyssal::config::Config;
use abyssal::error::AnalysisError;
use abyssal::habitat::{HabitatLabel, HabitatTable};
use abyssal::pipeline::{BatchRunner, PipelineError};
use abyssal::readers::{GdalReader, GeoTiffReader, RasterReader};
use serde_json::{Value, json};
use std::fs::{self, File};
use std::path::Path;
use tempfile::{TempDir, tempdir};
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

const COLS: u32 = 4;
const ROWS: u32 = 2;

// 4 x 2 cells of 1 degree, top-left corner at (0, 2)
fn write_tiff(path: &Path, data: &[f32]) {
    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(COLS, ROWS)
        .unwrap();
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &[1.0f64, 1.0, 0.0][..])
        .unwrap();
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &[0.0f64, 0.0, 0.0, 0.0, 2.0, 0.0][..])
        .unwrap();
    image.write_data(data).unwrap();
}

fn write_geojson(path: &Path, geometries: Vec<Value>) {
    let features: Vec<Value> = geometries
        .into_iter()
        .map(|geometry| json!({"type": "Feature", "properties": {}, "geometry": geometry}))
        .collect();
    let collection = json!({"type": "FeatureCollection", "features": features});
    fs::write(path, serde_json::to_string(&collection).unwrap()).unwrap();
}

/// Inputs for a single period: the EEZ covers the three western columns, a coral record sits
/// in the south-west cell and another one outside the EEZ.
fn write_inputs(dir: &Path) {
    let inputs = dir.join("inputs");
    fs::create_dir_all(inputs.join("hazards")).unwrap();

    write_tiff(
        &inputs.join("gebco.tif"),
        &[-100.0, -150.0, -1000.0, -3000.0, -250.0, -4500.0, -6000.0, 10.0],
    );

    for (name, value) in [("epc", -1.0f32), ("o2", 0.5), ("ph", -0.25), ("thetao", 2.0)] {
        write_tiff(
            &inputs.join("hazards").join(format!("{}_2041.tif", name)),
            &[value; (COLS * ROWS) as usize],
        );
    }

    write_geojson(
        &inputs.join("eez.geojson"),
        vec![json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [3.0, 0.0], [3.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
        })],
    );
    write_geojson(
        &inputs.join("coral.geojson"),
        vec![
            json!({"type": "Point", "coordinates": [0.5, 0.5]}),
            json!({"type": "Point", "coordinates": [3.5, 1.5]}),
        ],
    );
}

fn write_series(dir: &Path) {
    let series = dir.join("inputs").join("series");
    fs::create_dir_all(&series).unwrap();

    for (step, year) in [2000, 2001, 2002].into_iter().enumerate() {
        let data: Vec<f32> = (0..ROWS)
            .flat_map(|row| (0..COLS).map(move |col| (step as u32 * (col + 1) + row) as f32))
            .collect();
        write_tiff(&series.join(format!("thetao_{}.tif", year)), &data);
    }
}

fn config(dir: &TempDir, coral: &str, extra: Value) -> Config {
    let mut config = json!({
        "data_directory": dir.path().join("inputs"),
        "bathymetry": {"name": "depth", "path": "gebco.tif"},
        "periods": [{
            "name": "2041-2060",
            "hazards": [
                {"name": "epc", "path": "epc_2041.tif"},
                {"name": "o2", "path": "o2_2041.tif"},
                {"name": "ph", "path": "ph_2041.tif"},
                {"name": "thetao", "path": "hazards/thetao_2041.tif"}
            ]
        }],
        "masks": {
            "eez": {"path": "eez.geojson"},
            "coral": {"path": coral}
        },
        "output_directory": dir.path().join("out")
    });

    if let (Some(config), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
        config.extend(extra.clone());
    }

    let path = dir.path().join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    Config::from_file(path).unwrap()
}

#[test]
fn test_period_outputs() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());

    let runner = BatchRunner::new(config(&dir, "coral.geojson", json!({}))).unwrap();
    let report = runner.process().unwrap();

    let out = dir.path().join("out");
    assert_eq!(
        report.written,
        vec![
            out.join("contours.tif"),
            out.join("impact_2041-2060.tif"),
            out.join("habitat_2041-2060.json"),
        ]
    );

    // Negative band first: 1 (POC flux) + 0.25 (pH) + 2 (temperature)
    let impact = GdalReader {
        file_name: out.join("impact_2041-2060.tif").to_string_lossy().to_string(),
    }
    .read_band("negative")
    .unwrap();
    assert_eq!(impact.value(0, 0, 0), Some(3.25));
    assert_eq!(impact.value(0, 1, 3), Some(3.25));

    let table: HabitatTable = serde_json::from_reader(
        File::open(out.join("habitat_2041-2060.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(table.len(), 12);

    let labels: Vec<HabitatLabel> = table.rows().iter().map(|r| r.habitat).collect();
    assert_eq!(
        labels,
        [
            [HabitatLabel::Shelf; 4].as_slice(),
            [HabitatLabel::Slope; 6].as_slice(),
            [HabitatLabel::Cwc; 2].as_slice(),
        ]
        .concat()
    );

    let first = &table.rows()[0];
    assert_eq!((first.x, first.y), (0.5, 1.5));
    assert_eq!((first.variable.as_str(), first.value), ("negative", 3.25));
    assert_eq!(table.rows()[1].value, 0.5);

    let coral: Vec<_> = table.for_habitat(HabitatLabel::Cwc).collect();
    assert_eq!((coral[0].x, coral[0].y), (0.5, 0.5));

    let summaries = &report.summaries[0].habitats;
    assert_eq!(summaries.len(), 6);
    assert_eq!(summaries[2].habitat, HabitatLabel::Slope);
    assert_eq!(summaries[2].count, 3);
}

#[test]
fn test_contours_use_contour_depths() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());

    let runner = BatchRunner::new(config(&dir, "coral.geojson", json!({}))).unwrap();
    runner.process().unwrap();

    let contours = GeoTiffReader {
        file_name: dir
            .path()
            .join("out/contours.tif")
            .to_string_lossy()
            .to_string(),
    }
    .read_band("contour")
    .unwrap();

    assert_eq!(contours.value(0, 0, 0), Some(1.0));
    assert_eq!(contours.value(0, 0, 3), Some(2.0));
    assert_eq!(contours.value(0, 1, 0), Some(2.0));
    // 4500 m is slope for the habitat table but beyond the 4000 m contour
    assert_eq!(contours.value(0, 1, 1), None);
    assert_eq!(contours.value(0, 1, 3), None);
}

#[test]
fn test_series_indices() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    write_series(dir.path());

    let series = json!({
        "series": {
            "name": "thetao",
            "pattern": "series/thetao_*.tif",
            "start_date": "2000-01-01",
            "end_date": "2002-01-01",
            "frequency": "yearly"
        }
    });
    let runner = BatchRunner::new(config(&dir, "coral.geojson", series)).unwrap();
    let report = runner.process().unwrap();

    let out = dir.path().join("out");
    assert!(report.written.contains(&out.join("toe_thetao.tif")));
    assert!(report.written.contains(&out.join("velocity_thetao.tif")));

    let toe = GeoTiffReader {
        file_name: out.join("toe_thetao.tif").to_string_lossy().to_string(),
    }
    .read_band("toe")
    .unwrap();

    // Values 0, 1, 2 never exceed 2; 0, 2, 4 do so in 2002; 0, 4, 8 in 2001
    assert_eq!(toe.value(0, 0, 0), None);
    assert_eq!(toe.value(0, 0, 1), Some(2002.0));
    assert_eq!(toe.value(0, 0, 3), Some(2001.0));
    assert_eq!(toe.value(0, 1, 0), Some(2002.0));

    let trend = GdalReader {
        file_name: out.join("velocity_thetao.tif").to_string_lossy().to_string(),
    }
    .read_band("trend")
    .unwrap();
    assert!((trend.value(0, 0, 2).unwrap() - 3.0).abs() < 0.01);
}

#[test]
fn test_series_length_must_match_axis() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    write_series(dir.path());

    let series = json!({
        "series": {
            "name": "thetao",
            "pattern": "series/thetao_*.tif",
            "start_date": "2000-01-01",
            "end_date": "2004-01-01",
            "frequency": "yearly"
        }
    });
    let config = config(&dir, "coral.geojson", series);

    assert!(matches!(
        BatchRunner::new(config),
        Err(PipelineError::SeriesLength {
            expected: 5,
            found: 3,
            ..
        })
    ));
}

#[test]
fn test_empty_coral_mask_policy() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    write_geojson(
        &dir.path().join("inputs").join("offshore.geojson"),
        vec![json!({"type": "Point", "coordinates": [3.5, 0.5]})],
    );

    let runner = BatchRunner::new(config(&dir, "offshore.geojson", json!({}))).unwrap();
    match runner.process() {
        Err(PipelineError::Analysis(AnalysisError::EmptyMaskResult(name))) => {
            assert_eq!(name, "coral")
        }
        other => panic!("expected an empty mask error, got {:?}", other),
    }
    // Nothing is written when a period fails, not even the contours
    assert!(!dir.path().join("out").exists());

    let skip = json!({"empty_mask_policy": "skip"});
    let runner = BatchRunner::new(config(&dir, "offshore.geojson", skip)).unwrap();
    let report = runner.process().unwrap();
    assert!(
        report.summaries[0]
            .habitats
            .iter()
            .all(|s| s.habitat != HabitatLabel::Cwc)
    );
}

#[test]
fn test_missing_input_fails_before_processing() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    fs::remove_file(dir.path().join("inputs/hazards/ph_2041.tif")).unwrap();

    let config = config(&dir, "coral.geojson", json!({}));
    assert!(matches!(
        BatchRunner::new(config),
        Err(PipelineError::MissingFile(name)) if name == "ph_2041.tif"
    ));
    assert!(!dir.path().join("out").exists());
}
