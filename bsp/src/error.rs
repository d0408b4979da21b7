use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use crate::PeerId;

/// The substrate's result type.
pub type Result<T> = std::result::Result<T, BspErr>;

/// Failures raised by the peer substrate.
#[derive(Debug)]
pub enum BspErr {
    Io(io::Error),
    UnknownPeer(PeerId),
    Disconnected(PeerId),
    InvalidDataset(String),
    InvalidCluster(String),
    PeerPanicked(PeerId),
}

impl Display for BspErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BspErr::Io(e) => write!(f, "io error: {e}"),
            BspErr::UnknownPeer(id) => write!(f, "there is no peer named {id} in this job"),
            BspErr::Disconnected(id) => {
                write!(f, "peer {id} is no longer receiving messages")
            }
            BspErr::InvalidDataset(detail) => write!(f, "invalid dataset: {detail}"),
            BspErr::InvalidCluster(detail) => write!(f, "invalid cluster: {detail}"),
            BspErr::PeerPanicked(id) => write!(f, "peer {id} panicked"),
        }
    }
}

impl Error for BspErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BspErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BspErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<BspErr> for io::Error {
    fn from(value: BspErr) -> Self {
        match value {
            BspErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
