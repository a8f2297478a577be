use std::fmt;

/// The four seafloor hazards, in the band order expected by the impact calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardBand {
    PocFlux,
    DissolvedOxygen,
    Ph,
    Temperature,
}

impl HazardBand {
    pub const ORDER: [HazardBand; 4] = [
        HazardBand::PocFlux,
        HazardBand::DissolvedOxygen,
        HazardBand::Ph,
        HazardBand::Temperature,
    ];

    /// Food, oxygen and pH are hazardous when they decline; temperature when it rises.
    pub fn hazard_on_increase(self) -> bool {
        matches!(self, HazardBand::Temperature)
    }

    /// Magnitude added to the negative impact band, 0 when the anomaly is not a hazard.
    pub fn negative_contribution(self, anomaly: f64) -> f64 {
        if self.hazard_on_increase() {
            if anomaly >= 0.0 { anomaly.abs() } else { 0.0 }
        } else if anomaly <= 0.0 {
            anomaly.abs()
        } else {
            0.0
        }
    }

    /// Magnitude added to the positive impact band, 0 when the anomaly is not an improvement.
    pub fn positive_contribution(self, anomaly: f64) -> f64 {
        if self.hazard_on_increase() {
            if anomaly <= 0.0 { anomaly.abs() } else { 0.0 }
        } else if anomaly >= 0.0 {
            anomaly.abs()
        } else {
            0.0
        }
    }
}

impl fmt::Display for HazardBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardBand::PocFlux => write!(f, "POC flux"),
            HazardBand::DissolvedOxygen => write!(f, "dissolved oxygen"),
            HazardBand::Ph => write!(f, "pH"),
            HazardBand::Temperature => write!(f, "temperature"),
        }
    }
}

// Hazard anomalies (in historical standard deviations) at a single cell
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HazardCell {
    pub poc_flux: Option<f64>,
    pub oxygen: Option<f64>,
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
}

/// Cumulative negative and positive impact at a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub negative: f64,
    pub positive: f64,
}

impl HazardCell {
    pub fn from_values(values: [Option<f64>; 4]) -> Self {
        let [poc_flux, oxygen, ph, temperature] = values;
        Self {
            poc_flux,
            oxygen,
            ph,
            temperature,
        }
    }

    fn anomalies(&self) -> [(HazardBand, Option<f64>); 4] {
        [
            (HazardBand::PocFlux, self.poc_flux),
            (HazardBand::DissolvedOxygen, self.oxygen),
            (HazardBand::Ph, self.ph),
            (HazardBand::Temperature, self.temperature),
        ]
    }

    /// Sums the per-hazard magnitudes, skipping missing anomalies. `None` only when all four
    /// anomalies are missing.
    pub fn impact(&self) -> Option<Impact> {
        let anomalies = self.anomalies();
        if anomalies.iter().all(|(_, value)| value.is_none()) {
            return None;
        }

        let (negative, positive) = anomalies
            .iter()
            .filter_map(|&(band, value)| value.map(|v| (band, v)))
            .fold((0.0, 0.0), |(neg, pos), (band, v)| {
                (
                    neg + band.negative_contribution(v),
                    pos + band.positive_contribution(v),
                )
            });

        Some(Impact { negative, positive })
    }
}
