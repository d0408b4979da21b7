use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use bsp::BspErr;

/// The result type used in the entire regression crate.
pub type Result<T> = std::result::Result<T, TrainingErr>;

/// The superstep a message was received in, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Superstep {
    Bootstrap,
    Cost,
    Gradient,
}

impl Display for Superstep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Superstep::Bootstrap => "bootstrap",
            Superstep::Cost => "cost",
            Superstep::Gradient => "gradient",
        };

        f.write_str(s)
    }
}

/// Errors while reading or validating the job configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigErr {
    InvalidValue { key: &'static str, value: String },
    OutOfRange { key: &'static str, value: f64 },
    UnknownModel(String),
    UnknownLeaderPolicy(String),
    UnknownLeader(String),
}

impl Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::InvalidValue { key, value } => {
                write!(f, "invalid value {value:?} for option {key}")
            }
            ConfigErr::OutOfRange { key, value } => {
                write!(f, "value {value} is out of range for option {key}")
            }
            ConfigErr::UnknownModel(name) => write!(f, "unknown regression model {name:?}"),
            ConfigErr::UnknownLeaderPolicy(name) => write!(f, "unknown leader policy {name:?}"),
            ConfigErr::UnknownLeader(name) => {
                write!(f, "the configured leader {name:?} is not a peer of this job")
            }
        }
    }
}

impl Error for ConfigErr {}

/// Fatal training failures, each one aborts the peer that raised it.
#[derive(Debug)]
pub enum TrainingErr {
    Config(ConfigErr),
    Peer(BspErr),
    Diverged {
        alpha: f64,
        iteration: u64,
        cost: f64,
        previous: f64,
    },
    DimensionProbe,
    DimensionMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    UnexpectedMessage {
        superstep: Superstep,
        got: &'static str,
    },
    MissingTheta,
    EmptyDataset,
}

impl Display for TrainingErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingErr::Config(e) => write!(f, "configuration error: {e}"),
            TrainingErr::Peer(e) => write!(f, "peer error: {e}"),
            TrainingErr::Diverged {
                alpha,
                iteration,
                cost,
                previous,
            } => write!(
                f,
                "gradient descent failed to converge with alpha {alpha}: cost went from {previous} to {cost} at iteration {iteration}"
            ),
            TrainingErr::DimensionProbe => f.write_str("cannot read input vector size"),
            TrainingErr::DimensionMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "{what} length mismatch: got {got}, expected {expected}"
            ),
            TrainingErr::UnexpectedMessage { superstep, got } => {
                write!(f, "unexpected message in the {superstep} superstep: got {got}")
            }
            TrainingErr::MissingTheta => f.write_str("no theta was received from the leader"),
            TrainingErr::EmptyDataset => f.write_str("no peer holds any training example"),
        }
    }
}

impl Error for TrainingErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainingErr::Config(e) => Some(e),
            TrainingErr::Peer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigErr> for TrainingErr {
    fn from(value: ConfigErr) -> Self {
        Self::Config(value)
    }
}

impl From<BspErr> for TrainingErr {
    fn from(value: BspErr) -> Self {
        Self::Peer(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<TrainingErr> for io::Error {
    fn from(value: TrainingErr) -> Self {
        match value {
            TrainingErr::Peer(e) => e.into(),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
