use tracing::info;

use crate::error::AnalysisError;
use crate::grid::Grid;
use crate::stats::GridStatistics;

/// Logs valid-cell statistics of every band of `grid`.
pub fn log_grid_statistics(label: &str, grid: &Grid) -> Result<Vec<GridStatistics>, AnalysisError> {
    grid.band_names()
        .into_iter()
        .map(|band| {
            let stats = GridStatistics::from_band(grid, band)?;
            info!(
                grid = label,
                band,
                min = stats.min,
                max = stats.max,
                mean = stats.mean,
                valid = stats.valid,
                total = stats.total,
                "{:.1}% valid cells",
                100.0 * stats.valid_fraction()
            );
            Ok(stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Band, Lattice};
    use ndarray::array;

    #[test]
    fn test_statistics_per_band() {
        let lattice = Lattice::new(0.0, 1.0, 1.0, 1.0, 2, 1).unwrap();
        let grid = Grid::new(
            lattice,
            vec![
                Band::new("negative", array![[1.0, 3.0]]),
                Band::new("positive", array![[f64::NAN, 0.5]]),
            ],
        )
        .unwrap();

        let stats = log_grid_statistics("impact", &grid).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].mean, 2.0);
        assert_eq!(stats[1].valid, 1);
    }
}
