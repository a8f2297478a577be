use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    #[serde(rename(deserialize = "daily"))]
    Daily,
    #[serde(rename(deserialize = "weekly"))]
    Weekly,
    #[serde(rename(deserialize = "monthly"))]
    Monthly,
    #[serde(rename(deserialize = "yearly"))]
    Yearly,
}

#[derive(Debug, PartialEq, Eq)]
pub struct TimeStepParseError(pub String);

impl fmt::Display for TimeStepParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid time step `{}`", self.0)
    }
}

impl std::error::Error for TimeStepParseError {}

impl FromStr for TimeStep {
    type Err = TimeStepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(TimeStep::Daily),
            "weekly" => Ok(TimeStep::Weekly),
            "monthly" => Ok(TimeStep::Monthly),
            "yearly" => Ok(TimeStep::Yearly),
            other => Err(TimeStepParseError(other.to_string())),
        }
    }
}
