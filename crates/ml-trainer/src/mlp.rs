use crate::error::ModelError;
use configuration::{Activation, MlpParams};
use core_types::FeatureWindow;
use ml_features::{feature_matrix, labels, FeatureScaler};
use ndarray::{Array1, Array2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const BETA_1: f64 = 0.9;
const BETA_2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

/// A fully connected regressor: hidden layers with a shared activation and
/// a single identity output unit.
///
/// Inputs and the target are standardised on the training set; predictions
/// are mapped back to price units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpModel {
    x_scaler: FeatureScaler,
    y_scaler: FeatureScaler,
    activation: Activation,
    layers: Vec<DenseLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DenseLayer {
    /// `fan_in x fan_out`
    weights: Array2<f64>,
    biases: Array1<f64>,
}

/// Result of one training run.
#[derive(Debug, Clone)]
pub struct MlpFit {
    pub model: MlpModel,
    pub converged: bool,
    pub iterations: usize,
}

impl MlpModel {
    pub fn fit(samples: &[FeatureWindow], params: &MlpParams) -> Result<MlpFit, ModelError> {
        if samples.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        params
            .validate()
            .map_err(|e| ModelError::InvalidParameters(e.to_string()))?;

        let raw_x = feature_matrix(samples)?;
        let raw_y = labels(samples);

        let mut x_scaler = FeatureScaler::new();
        x_scaler.fit(&raw_x)?;
        let y_scaler = FeatureScaler::fit_values(&raw_y);
        let x = x_scaler.transform(&raw_x)?;
        let y = Array1::from_iter(raw_y.iter().map(|&v| y_scaler.scale_value(0, v)));

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut sizes = Vec::with_capacity(params.hidden_layer_sizes.len() + 2);
        sizes.push(x.ncols());
        sizes.extend_from_slice(&params.hidden_layer_sizes);
        sizes.push(1);
        let layers: Vec<DenseLayer> = sizes
            .windows(2)
            .map(|pair| DenseLayer::glorot(pair[0], pair[1], params.activation, &mut rng))
            .collect();

        let mut model = Self {
            x_scaler,
            y_scaler,
            activation: params.activation,
            layers,
        };
        let (converged, iterations) = model.train(&x, &y, params, &mut rng)?;

        if !converged {
            tracing::warn!(
                max_iter = params.max_iter,
                "MLP reached the iteration cap before the loss stopped improving."
            );
        }
        tracing::debug!(samples = samples.len(), iterations, converged, "Fitted MLP.");

        Ok(MlpFit {
            model,
            converged,
            iterations,
        })
    }

    /// Mini-batch Adam. Returns whether the stopping rule fired and the number of epochs run.
    fn train(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        params: &MlpParams,
        rng: &mut StdRng,
    ) -> Result<(bool, usize), ModelError> {
        let n = x.nrows();
        let batch_size = params.batch_size.min(n);
        let mut indices: Vec<usize> = (0..n).collect();
        let mut optimizer = Adam::new(&self.layers, params.learning_rate_init);
        let mut stopping = EarlyStopping::new(params.tol, params.n_iter_no_change);

        for epoch in 1..=params.max_iter {
            indices.shuffle(rng);
            let mut accumulated = 0.0;

            for batch in indices.chunks(batch_size) {
                let xb = x.select(Axis(0), batch);
                let yb = y.select(Axis(0), batch);
                let (loss, grads) = self.backprop(&xb, &yb, params.alpha);
                accumulated += loss * batch.len() as f64;
                optimizer.step(&mut self.layers, &grads);
            }

            let epoch_loss = accumulated / n as f64;
            if !epoch_loss.is_finite() {
                return Err(ModelError::Diverged(format!(
                    "MLP loss became {epoch_loss} at epoch {epoch}"
                )));
            }
            if stopping.update(epoch_loss) {
                return Ok((true, epoch));
            }
        }
        Ok((false, params.max_iter))
    }

    /// Loss and per-layer gradients for one mini-batch.
    fn backprop(&self, x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> (f64, Vec<Gradient>) {
        let m = x.nrows() as f64;
        let activations = self.forward(x);
        let output = activations.last().map(|a| a.column(0).to_owned()).unwrap_or_default();

        let residual = &output - y;
        let penalty: f64 = self.layers.iter().map(|l| l.weights.iter().map(|w| w * w).sum::<f64>()).sum();
        let loss = residual.mapv(|r| r * r).sum() / (2.0 * m) + 0.5 * alpha * penalty / m;

        let mut delta = residual.insert_axis(Axis(1));
        let mut grads = Vec::with_capacity(self.layers.len());
        for (i, layer) in self.layers.iter().enumerate().rev() {
            let input = &activations[i];
            let weights = (input.t().dot(&delta) + &layer.weights * alpha) / m;
            let biases = delta.sum_axis(Axis(0)) / m;
            grads.push(Gradient { weights, biases });
            if i > 0 {
                delta = delta.dot(&layer.weights.t()) * derivative(self.activation, input);
            }
        }
        grads.reverse();
        (loss, grads)
    }

    /// Layer outputs, starting with the input itself.
    fn forward(&self, x: &Array2<f64>) -> Vec<Array2<f64>> {
        let last = self.layers.len().saturating_sub(1);
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(x.clone());
        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = activations[i].dot(&layer.weights) + &layer.biases;
            if i < last {
                activate(self.activation, &mut z);
            }
            activations.push(z);
        }
        activations
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        let row = self.x_scaler.transform_row(features)?;
        let x = Array2::from_shape_vec((1, row.len()), row).map_err(|e| {
            ModelError::InvalidParameters(format!("cannot shape feature row: {e}"))
        })?;
        let scaled = self
            .forward(&x)
            .last()
            .map(|a| a[[0, 0]])
            .unwrap_or(f64::NAN);
        Ok(self.y_scaler.unscale_value(0, scaled))
    }

    pub fn predict_matrix(&self, x: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        let scaled = self.x_scaler.transform(x)?;
        let out = self.forward(&scaled);
        Ok(out
            .last()
            .map(|a| a.column(0).iter().map(|&v| self.y_scaler.unscale_value(0, v)).collect())
            .unwrap_or_default())
    }
}

impl DenseLayer {
    /// Weights and biases drawn uniformly from the Glorot bound.
    fn glorot(fan_in: usize, fan_out: usize, activation: Activation, rng: &mut StdRng) -> Self {
        let factor = if activation == Activation::Logistic { 2.0 } else { 6.0 };
        let bound = (factor / (fan_in + fan_out) as f64).sqrt();
        let weights = Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-bound..bound));
        let biases = Array1::from_shape_fn(fan_out, |_| rng.gen_range(-bound..bound));
        Self { weights, biases }
    }
}

fn activate(activation: Activation, z: &mut Array2<f64>) {
    match activation {
        Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
        Activation::Tanh => z.mapv_inplace(f64::tanh),
        Activation::Logistic => z.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Identity => {}
    }
}

/// Derivative expressed through the activation's output `a`.
fn derivative(activation: Activation, a: &Array2<f64>) -> Array2<f64> {
    match activation {
        Activation::Relu => a.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
        Activation::Tanh => a.mapv(|v| 1.0 - v * v),
        Activation::Logistic => a.mapv(|v| v * (1.0 - v)),
        Activation::Identity => Array2::ones(a.raw_dim()),
    }
}

struct Gradient {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

/// First and second moment estimates for every trainable array.
struct Adam {
    learning_rate: f64,
    t: i32,
    moments: Vec<Moments>,
}

struct Moments {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

impl Adam {
    fn new(layers: &[DenseLayer], learning_rate: f64) -> Self {
        let moments = layers
            .iter()
            .map(|l| Moments {
                m_w: Array2::zeros(l.weights.raw_dim()),
                v_w: Array2::zeros(l.weights.raw_dim()),
                m_b: Array1::zeros(l.biases.raw_dim()),
                v_b: Array1::zeros(l.biases.raw_dim()),
            })
            .collect();
        Self {
            learning_rate,
            t: 0,
            moments,
        }
    }

    fn step(&mut self, layers: &mut [DenseLayer], grads: &[Gradient]) {
        self.t += 1;
        let lr_t = self.learning_rate * (1.0 - BETA_2.powi(self.t)).sqrt() / (1.0 - BETA_1.powi(self.t));
        for ((layer, grad), mo) in layers.iter_mut().zip(grads).zip(self.moments.iter_mut()) {
            adam_update(&mut layer.weights, &grad.weights, &mut mo.m_w, &mut mo.v_w, lr_t);
            adam_update(&mut layer.biases, &grad.biases, &mut mo.m_b, &mut mo.v_b, lr_t);
        }
    }
}

fn adam_update<D: Dimension>(
    param: &mut ndarray::Array<f64, D>,
    grad: &ndarray::Array<f64, D>,
    m: &mut ndarray::Array<f64, D>,
    v: &mut ndarray::Array<f64, D>,
    lr_t: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = BETA_1 * *m + (1.0 - BETA_1) * g;
            *v = BETA_2 * *v + (1.0 - BETA_2) * g * g;
            *p -= lr_t * *m / (v.sqrt() + EPSILON);
        });
}

/// Stops once the loss has failed to improve by `tol` for more than
/// `patience` consecutive epochs.
#[derive(Debug)]
struct EarlyStopping {
    tol: f64,
    patience: usize,
    best: f64,
    no_improvement: usize,
}

impl EarlyStopping {
    fn new(tol: f64, patience: usize) -> Self {
        Self {
            tol,
            patience,
            best: f64::INFINITY,
            no_improvement: 0,
        }
    }

    /// Records an epoch loss and reports whether training should stop.
    fn update(&mut self, loss: f64) -> bool {
        if loss > self.best - self.tol {
            self.no_improvement += 1;
        } else {
            self.no_improvement = 0;
        }
        if loss < self.best {
            self.best = loss;
        }
        self.no_improvement > self.patience
    }
}
