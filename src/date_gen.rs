use chrono::{Duration, Months, NaiveDate};

use crate::config::{ConfigError, TimeStep};

/// Regularly spaced dates from `start` to `end`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    start: NaiveDate,
    end: NaiveDate,
    frequency: TimeStep,
}

impl TimeAxis {
    pub fn new(start: NaiveDate, end: NaiveDate, frequency: TimeStep) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::DateOrder);
        }

        Ok(Self {
            start,
            end,
            frequency,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn frequency(&self) -> TimeStep {
        self.frequency
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        (*self).collect()
    }

    fn increment_date(&self, current_date: NaiveDate) -> Result<NaiveDate, String> {
        match self.frequency {
            TimeStep::Daily => Ok(current_date + Duration::days(1)),
            TimeStep::Weekly => Ok(current_date + Duration::weeks(1)),
            TimeStep::Monthly => current_date
                .checked_add_months(Months::new(1))
                .ok_or_else(|| format!("Failed to add a month to date: {}", current_date)),
            TimeStep::Yearly => current_date
                .checked_add_months(Months::new(12))
                .ok_or_else(|| format!("Failed to add a year to date: {}", current_date)),
        }
    }
}

impl Iterator for TimeAxis {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start <= self.end {
            let current_date = self.start;
            self.start = self.increment_date(self.start).ok()?;
            Some(current_date)
        } else {
            None
        }
    }
}
