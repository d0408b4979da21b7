//! Distributed batch gradient descent over a bulk synchronous parallel job.
//!
//! Each peer runs [`GradientDescentBsp`] over its own partition. An iteration
//! is four supersteps: local cost, global cost and convergence check, local
//! gradient, global gradient and parameter update.

pub mod config;
pub mod error;
pub mod leader;
pub mod model;
pub mod msg;
pub mod optimization;
pub mod state;
pub mod training;

pub use config::{Configuration, GradientDescentConfig};
pub use error::{ConfigErr, Result, Superstep, TrainingErr};
pub use leader::LeaderPolicy;
pub use model::{LinearRegression, LogisticRegression, ModelKind, RegressionModel};
pub use msg::Payload;
pub use optimization::GradientDescent;
pub use state::{Role, RunState};
pub use training::{GradientDescentBsp, TrainingSummary};
