//! Indices derived from time series of anomaly grids.

pub mod emergence;
pub mod velocity;

pub use emergence::{AnomalySeries, MEAN_BAND, TOE_BAND, standardize, time_of_emergence};
pub use velocity::{
    CellDistance, GRADIENT_BAND, TREND_BAND, VELOCITY_BAND, climate_velocity, spatial_gradient,
    temporal_trend,
};
