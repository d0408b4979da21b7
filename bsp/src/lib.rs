//! A small bulk synchronous parallel substrate.
//!
//! Peers compute locally, exchange messages and meet at barriers. The
//! [`Peer`] trait is what training code programs against; [`LocalCluster`]
//! runs a fixed set of peers as tokio tasks inside one process.

mod cluster;
mod data;
mod error;
mod output;
mod peer;

pub use cluster::{LocalCluster, LocalPeer};
pub use data::{Dataset, Partition};
pub use error::{BspErr, Result};
pub use output::{OutputLog, OutputRecord};
pub use peer::{Envelope, Peer, PeerId, Sample};
