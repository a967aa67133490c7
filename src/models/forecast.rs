use crate::calendar::ForecastDay;
use crate::perturbation::AdjustedPrediction;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// City used when a request does not name one.
pub const DEFAULT_CITY: &str = "default";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Forecast {
    pub date: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub city: String,
}

impl Forecast {
    pub fn assemble(day: ForecastDay, adjusted: AdjustedPrediction, city: &str) -> Forecast {
        Forecast {
            date: day.date,
            temp_max: round_to_hundredths(adjusted.max),
            temp_min: round_to_hundredths(adjusted.min),
            city: city.to_string(),
        }
    }
}

/// Rounds to two decimals, ties to even.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
