use crate::error::ModelError;
use crate::least_squares::LeastSquaresModel;
use crate::mlp::MlpModel;
use configuration::MlpParams;
use core_types::FeatureWindow;
use ml_features::feature_matrix;
use serde::{Deserialize, Serialize};

pub const MIN_POLYNOMIAL_DEGREE: usize = 2;
pub const MAX_POLYNOMIAL_DEGREE: usize = 10;

/// One candidate model family with its hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelConfig {
    Mlp(MlpParams),
    Linear,
    Polynomial { degree: usize },
}

impl ModelConfig {
    pub fn mlp(params: MlpParams) -> Self {
        Self::Mlp(params)
    }

    pub fn polynomial(degree: usize) -> Result<Self, ModelError> {
        if !(MIN_POLYNOMIAL_DEGREE..=MAX_POLYNOMIAL_DEGREE).contains(&degree) {
            return Err(ModelError::InvalidDegree(degree));
        }
        Ok(Self::Polynomial { degree })
    }

    /// The MLP alone, or the MLP followed by Linear and Polynomial 2..=10.
    pub fn comparison_set(params: &MlpParams, compare: bool) -> Vec<Self> {
        let mut configs = vec![Self::mlp(params.clone())];
        if compare {
            configs.push(Self::Linear);
            configs.extend(
                (MIN_POLYNOMIAL_DEGREE..=MAX_POLYNOMIAL_DEGREE).map(|degree| Self::Polynomial { degree }),
            );
        }
        configs
    }

    /// Stable display key: `MLP`, `Linear`, `Poly_<d>`.
    pub fn label(&self) -> String {
        match self {
            Self::Mlp(_) => "MLP".to_string(),
            Self::Linear => "Linear".to_string(),
            Self::Polynomial { degree } => format!("Poly_{degree}"),
        }
    }

    /// Tie-break order among equally accurate models; simpler sorts first.
    pub fn complexity(&self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Polynomial { degree } => *degree,
            Self::Mlp(_) => usize::MAX,
        }
    }

    pub fn is_mlp(&self) -> bool {
        matches!(self, Self::Mlp(_))
    }

    pub fn polynomial_degree(&self) -> Option<usize> {
        match self {
            Self::Polynomial { degree } => Some(*degree),
            _ => None,
        }
    }

    pub fn fit(&self, samples: &[FeatureWindow]) -> Result<FitOutcome, ModelError> {
        match self {
            Self::Mlp(params) => {
                let fit = MlpModel::fit(samples, params)?;
                Ok(FitOutcome {
                    model: TrainedModel::Mlp(fit.model),
                    converged: fit.converged,
                    iterations: fit.iterations,
                })
            }
            Self::Linear => Self::fit_least_squares(samples, 1),
            Self::Polynomial { degree } => {
                // Degree 1 is accepted here and takes the Linear path unchanged.
                if !(1..=MAX_POLYNOMIAL_DEGREE).contains(degree) {
                    return Err(ModelError::InvalidDegree(*degree));
                }
                Self::fit_least_squares(samples, *degree)
            }
        }
    }

    fn fit_least_squares(samples: &[FeatureWindow], degree: usize) -> Result<FitOutcome, ModelError> {
        Ok(FitOutcome {
            model: TrainedModel::LeastSquares(LeastSquaresModel::fit(samples, degree)?),
            converged: true,
            iterations: 1,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub model: TrainedModel,
    pub converged: bool,
    pub iterations: usize,
}

/// A fitted artifact of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainedModel {
    Mlp(MlpModel),
    LeastSquares(LeastSquaresModel),
}

impl TrainedModel {
    pub fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        match self {
            Self::Mlp(model) => model.predict(features),
            Self::LeastSquares(model) => model.predict(features),
        }
    }

    pub fn predict_batch(&self, samples: &[FeatureWindow]) -> Result<Vec<f64>, ModelError> {
        match self {
            Self::Mlp(model) => model.predict_matrix(&feature_matrix(samples)?),
            Self::LeastSquares(model) => samples.iter().map(|s| model.predict(&s.features)).collect(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
