mod linear;
mod logistic;

use std::str::FromStr;

pub use linear::LinearRegression;
pub use logistic::LogisticRegression;

use crate::ConfigErr;

/// A pluggable hypothesis together with its per example cost.
pub trait RegressionModel: Send + Sync {
    /// The cost of predicting example `(x, y)` with parameters `theta`.
    fn cost(&self, x: &[f64], y: f64, theta: &[f64]) -> f64;

    /// The model's prediction for `x` with parameters `theta`.
    fn hypothesis(&self, theta: &[f64], x: &[f64]) -> f64;
}

impl<T: RegressionModel + ?Sized> RegressionModel for Box<T> {
    fn cost(&self, x: &[f64], y: f64, theta: &[f64]) -> f64 {
        (**self).cost(x, y, theta)
    }

    fn hypothesis(&self, theta: &[f64], x: &[f64]) -> f64 {
        (**self).hypothesis(theta, x)
    }
}

/// The closed set of models a job can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Linear,
    Logistic,
}

impl ModelKind {
    /// Instanciates the model.
    pub fn build(self) -> Box<dyn RegressionModel> {
        match self {
            ModelKind::Linear => Box::new(LinearRegression),
            ModelKind::Logistic => Box::new(LogisticRegression),
        }
    }
}

impl FromStr for ModelKind {
    type Err = ConfigErr;

    /// Accepts short names (`linear`) as well as class style names
    /// (`org.example.LinearRegressionModel`), case insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s
            .rsplit('.')
            .next()
            .unwrap_or(s)
            .to_ascii_lowercase()
            .replace(['_', '-'], "");

        let stem = name.strip_suffix("model").unwrap_or(&name);
        let stem = stem.strip_suffix("regression").unwrap_or(stem);

        match stem {
            "linear" => Ok(ModelKind::Linear),
            "logistic" => Ok(ModelKind::Logistic),
            _ => Err(ConfigErr::UnknownModel(s.to_string())),
        }
    }
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}
