use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{ConfigErr, LeaderPolicy, ModelKind};

/// Initial value repeated across every feature of theta.
pub const INITIAL_THETA_VALUES: &str = "initial.theta.values";
/// Learning rate.
pub const ALPHA: &str = "alpha";
/// Convergence threshold on the mean cost.
pub const THRESHOLD: &str = "threshold";
pub const REGRESSION_MODEL_CLASS: &str = "regression.model.class";
/// `middle` or `smallest`.
pub const LEADER_POLICY: &str = "leader.policy";
/// Explicit leader name, takes precedence over `leader.policy`.
pub const LEADER_PEER: &str = "leader.peer";

const DEFAULT_INITIAL_THETA: i64 = 10;
const DEFAULT_ALPHA: f64 = 0.003;
const DEFAULT_THRESHOLD: f64 = 0.1;

/// A string keyed, string valued bag of job options.
///
/// When deserialized from JSON, non string values are kept as their JSON text
/// so `{"alpha": 0.1}` and `{"alpha": "0.1"}` are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "HashMap<String, Value>")]
pub struct Configuration {
    values: HashMap<String, String>,
}

impl From<HashMap<String, Value>> for Configuration {
    fn from(value: HashMap<String, Value>) -> Self {
        let values = value
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect();

        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, returning the updated configuration.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.values.insert(key.into(), value.to_string());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).map(str::trim)
    }

    /// Reads `key` as an integer.
    ///
    /// # Returns
    /// `default` if the key is absent, or an error if it can't be parsed.
    pub fn get_int(&self, key: &'static str, default: i64) -> Result<i64, ConfigErr> {
        self.parse(key, default)
    }

    /// Reads `key` as a float.
    ///
    /// # Returns
    /// `default` if the key is absent, or an error if it can't be parsed.
    pub fn get_float(&self, key: &'static str, default: f64) -> Result<f64, ConfigErr> {
        self.parse(key, default)
    }

    fn parse<T: std::str::FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigErr> {
        match self.get_str(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| ConfigErr::InvalidValue {
                key,
                value: raw.to_string(),
            }),
        }
    }
}

/// The validated hyperparameters of a gradient descent job.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientDescentConfig {
    initial_theta: f64,
    alpha: f64,
    threshold: f64,
    model: ModelKind,
    leader: LeaderPolicy,
}

impl Default for GradientDescentConfig {
    fn default() -> Self {
        Self {
            initial_theta: DEFAULT_INITIAL_THETA as f64,
            alpha: DEFAULT_ALPHA,
            threshold: DEFAULT_THRESHOLD,
            model: ModelKind::Linear,
            leader: LeaderPolicy::MiddleIndex,
        }
    }
}

impl GradientDescentConfig {
    /// Creates a new `GradientDescentConfig` holding the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and validates every recognized option of `conf`.
    ///
    /// # Arguments
    /// * `conf` - The job options.
    ///
    /// # Returns
    /// The hyperparameters, or the first option that is malformed or out of range.
    pub fn from_conf(conf: &Configuration) -> Result<Self, ConfigErr> {
        let initial_theta = conf.get_int(INITIAL_THETA_VALUES, DEFAULT_INITIAL_THETA)? as f64;
        let alpha = conf.get_float(ALPHA, DEFAULT_ALPHA)?;
        let threshold = conf.get_float(THRESHOLD, DEFAULT_THRESHOLD)?;

        let model = match conf.get_str(REGRESSION_MODEL_CLASS) {
            Some(name) => name.parse()?,
            None => ModelKind::Linear,
        };

        let leader = match (conf.get_str(LEADER_PEER), conf.get_str(LEADER_POLICY)) {
            (Some(name), _) => LeaderPolicy::Fixed(bsp::PeerId::new(name)),
            (None, Some(policy)) => policy.parse()?,
            (None, None) => LeaderPolicy::MiddleIndex,
        };

        Self {
            initial_theta,
            alpha,
            threshold,
            model,
            leader,
        }
        .validated()
    }

    /// Checks the numeric ranges.
    ///
    /// # Returns
    /// `self` if alpha is finite and positive and the threshold finite and non negative.
    pub fn validated(self) -> Result<Self, ConfigErr> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(ConfigErr::OutOfRange {
                key: ALPHA,
                value: self.alpha,
            });
        }

        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigErr::OutOfRange {
                key: THRESHOLD,
                value: self.threshold,
            });
        }

        Ok(self)
    }

    pub fn with_initial_theta(mut self, value: f64) -> Self {
        self.initial_theta = value;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_model(mut self, model: ModelKind) -> Self {
        self.model = model;
        self
    }

    pub fn with_leader(mut self, leader: LeaderPolicy) -> Self {
        self.leader = leader;
        self
    }

    pub fn initial_theta(&self) -> f64 {
        self.initial_theta
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn leader(&self) -> &LeaderPolicy {
        &self.leader
    }
}
