use crate::calendar::DateResolver;
use crate::models::forecast::Forecast;
use crate::models::regressor::{ModelError, ModelPair};
use crate::perturbation::perturb;
use chrono::{DateTime, Utc};

/// Everything needed to answer a forecast request. Built once at startup and
/// only read afterwards.
pub struct Forecaster {
    resolver: DateResolver,
    models: ModelPair,
}

impl Forecaster {
    pub fn new(resolver: DateResolver, models: ModelPair) -> Forecaster {
        Forecaster { resolver, models }
    }

    pub fn forecast(&self, city: &str) -> Result<Forecast, ModelError> {
        self.forecast_at(city, Utc::now())
    }

    pub fn forecast_at(&self, city: &str, now: DateTime<Utc>) -> Result<Forecast, ModelError> {
        let day = self.resolver.resolve(now);
        let base = self.models.predict(day.day_offset)?;
        let adjusted = perturb(city, day.day_offset, base);
        log::debug!(
            "forecast for '{}' on {} (day {}): base {:?}, adjusted {:?}",
            city,
            day.date,
            day.day_offset,
            base,
            adjusted
        );
        Ok(Forecast::assemble(day, adjusted, city))
    }
}
