use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::Result;

/// The name of a peer taking part in a job.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Creates a new `PeerId`.
    ///
    /// # Arguments
    /// * `name` - The peer's name, unique within a job.
    ///
    /// # Returns
    /// A new `PeerId` instance.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message delivered by a barrier, tagged with whoever sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<M> {
    pub from: PeerId,
    pub msg: M,
}

/// A borrowed training example read from a partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a> {
    pub x: &'a [f64],
    pub y: f64,
}

/// The capabilities a participant of a bulk synchronous job gets from its runtime.
///
/// Every call except `sync` is local to the peer and never blocks. Messages
/// handed to `send` during a superstep only become visible to their receiver
/// through `drain` once the barrier ending that superstep has returned.
pub trait Peer: Send {
    /// The type of the messages exchanged between peers.
    type Msg: Send + 'static;

    /// This peer's name.
    fn id(&self) -> &PeerId;

    /// This peer's position in `peers`.
    fn index(&self) -> usize;

    /// Every peer in the job, in enumeration order.
    fn peers(&self) -> &[PeerId];

    fn num_peers(&self) -> usize {
        self.peers().len()
    }

    /// The amount of barriers this peer has gone through.
    fn superstep(&self) -> u64;

    /// Advances the partition cursor.
    ///
    /// # Returns
    /// The next local example, `None` once the partition is exhausted or an
    /// error if the partition couldn't be read.
    fn read_next(&mut self) -> Result<Option<Sample<'_>>>;

    /// Moves the partition cursor back to the first example.
    fn reopen_input(&mut self) -> Result<()>;

    /// Queues `msg` for delivery to `to` at the end of the current superstep.
    ///
    /// # Arguments
    /// * `to` - The receiving peer, which may be this peer itself.
    /// * `msg` - The message to deliver.
    ///
    /// # Returns
    /// An error if `to` is not part of the job or can no longer receive.
    fn send(&mut self, to: &PeerId, msg: Self::Msg) -> Result<()>;

    /// Blocks until every peer has reached this barrier.
    fn sync(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Takes every message delivered by the last barrier.
    fn drain(&mut self) -> Vec<Envelope<Self::Msg>>;

    /// Appends a `(theta, cost)` record to the job's output.
    fn write(&mut self, theta: &[f64], cost: f64) -> Result<()>;
}
