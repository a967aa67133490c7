use crate::calendar::DayOffset;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs::read_to_string;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the single column the regressors were fit against.
pub const DAY_FEATURE: &str = "day_number";

/// Largest temperature magnitude a prediction may have. Within it a repair
/// gap of a few degrees is always representable, so min stays below max.
pub const PREDICTION_LIMIT: f64 = 1.0e6;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("could not read model {path}: {source}")]
    IoError { path: PathBuf, source: io::Error },
    #[error("invalid model format in {path}: {source}")]
    DecodingError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("model expects feature '{0}', only 'day_number' is supported")]
    UnexpectedFeature(String),
    #[error("invalid model parameters: {0}")]
    InvalidParameters(String),
    #[error("model predicted {value} for day {day_offset}")]
    InvalidPrediction { day_offset: DayOffset, value: f64 },
}

/// One row, one column feature table, as the models were trained on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub day_number: DayOffset,
}

impl From<DayOffset> for FeatureRow {
    fn from(day_number: DayOffset) -> Self {
        FeatureRow { day_number }
    }
}

pub trait Regressor: Send + Sync {
    fn predict(&self, features: FeatureRow) -> f64;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Linear {
        coefficient: f64,
        intercept: f64,
    },
    /// Coefficients ordered from the constant term upwards.
    Polynomial { coefficients: Vec<f64> },
    /// Trend plus a Fourier series over `period` days.
    Harmonic {
        intercept: f64,
        trend: f64,
        period: f64,
        sine: Vec<f64>,
        cosine: Vec<f64>,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub feature: String,
    #[serde(flatten)]
    pub model: Model,
}

impl Model {
    fn validate(&self) -> Result<(), ModelError> {
        let parameters: Vec<f64> = match self {
            Model::Linear {
                coefficient,
                intercept,
            } => vec![*coefficient, *intercept],
            Model::Polynomial { coefficients } => {
                if coefficients.is_empty() {
                    return Err(ModelError::InvalidParameters(
                        "polynomial has no coefficients".to_string(),
                    ));
                }
                coefficients.clone()
            }
            Model::Harmonic {
                intercept,
                trend,
                period,
                sine,
                cosine,
            } => {
                if *period <= 0.0 {
                    return Err(ModelError::InvalidParameters(format!(
                        "harmonic period must be positive, got {period}"
                    )));
                }
                if sine.len() != cosine.len() {
                    return Err(ModelError::InvalidParameters(format!(
                        "harmonic has {} sine and {} cosine terms",
                        sine.len(),
                        cosine.len()
                    )));
                }
                [*intercept, *trend, *period]
                    .into_iter()
                    .chain(sine.iter().copied())
                    .chain(cosine.iter().copied())
                    .collect()
            }
        };
        if parameters.iter().all(|value| value.is_finite()) {
            Ok(())
        } else {
            Err(ModelError::InvalidParameters(
                "parameters must be finite".to_string(),
            ))
        }
    }
}

impl Regressor for Model {
    fn predict(&self, features: FeatureRow) -> f64 {
        let x = features.day_number as f64;
        match self {
            Model::Linear {
                coefficient,
                intercept,
            } => intercept + coefficient * x,
            // Horner's scheme, highest power first.
            Model::Polynomial { coefficients } => coefficients
                .iter()
                .rev()
                .fold(0.0, |acc, coefficient| acc * x + coefficient),
            Model::Harmonic {
                intercept,
                trend,
                period,
                sine,
                cosine,
            } => {
                let phase = 2.0 * PI * x / period;
                let seasonal: f64 = sine
                    .iter()
                    .zip(cosine.iter())
                    .enumerate()
                    .map(|(k, (a, b))| {
                        let harmonic = (k + 1) as f64 * phase;
                        a * harmonic.sin() + b * harmonic.cos()
                    })
                    .sum();
                intercept + trend * x + seasonal
            }
        }
    }
}

impl TryFrom<ModelArtifact> for Model {
    type Error = ModelError;

    fn try_from(artifact: ModelArtifact) -> Result<Self, Self::Error> {
        if artifact.feature != DAY_FEATURE {
            return Err(ModelError::UnexpectedFeature(artifact.feature));
        }
        artifact.model.validate()?;
        Ok(artifact.model)
    }
}

pub fn parse_model(contents: &str, path: &Path) -> Result<Model, ModelError> {
    let artifact: ModelArtifact =
        serde_json::from_str(contents).map_err(|source| ModelError::DecodingError {
            path: path.to_path_buf(),
            source,
        })?;
    Model::try_from(artifact)
}

pub fn load_model(file_path: impl AsRef<Path>) -> Result<Model, ModelError> {
    let path = file_path.as_ref();
    let contents = read_to_string(path).map_err(|source| ModelError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    let model = parse_model(&contents, path)?;
    log::info!("loaded model from {}", path.display());
    Ok(model)
}

/// Raw regressor output for one day, before any city adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasePrediction {
    pub max: f64,
    pub min: f64,
}

/// The max and min temperature regressors. Both are fit independently and
/// only share the feature they consume.
pub struct ModelPair {
    max: Box<dyn Regressor>,
    min: Box<dyn Regressor>,
}

impl ModelPair {
    pub fn new(max: impl Regressor + 'static, min: impl Regressor + 'static) -> ModelPair {
        ModelPair {
            max: Box::new(max),
            min: Box::new(min),
        }
    }

    pub fn load(
        max_path: impl AsRef<Path>,
        min_path: impl AsRef<Path>,
    ) -> Result<ModelPair, ModelError> {
        Ok(ModelPair::new(load_model(max_path)?, load_model(min_path)?))
    }

    pub fn predict(&self, day_offset: DayOffset) -> Result<BasePrediction, ModelError> {
        let features = FeatureRow::from(day_offset);
        Ok(BasePrediction {
            max: checked_prediction(self.max.predict(features), day_offset)?,
            min: checked_prediction(self.min.predict(features), day_offset)?,
        })
    }
}

fn checked_prediction(value: f64, day_offset: DayOffset) -> Result<f64, ModelError> {
    if value.is_finite() && value.abs() <= PREDICTION_LIMIT {
        Ok(value)
    } else {
        Err(ModelError::InvalidPrediction { day_offset, value })
    }
}
