use bsp::{Envelope, Peer, PeerId};
use log::{info, warn};

use super::broadcast;
use crate::{Payload, Result, Role, Superstep, TrainingErr};

/// Reads the feature count off the first local example.
///
/// The partition cursor is moved back to the start whatever the outcome.
///
/// # Returns
/// The dimensionality, or `DimensionProbe` if the partition has no usable example.
pub fn probe_dimension<P: Peer>(peer: &mut P) -> Result<usize> {
    let size = peer.read_next()?.map(|sample| sample.x.len());
    peer.reopen_input()?;

    size.filter(|&n| n > 0).ok_or(TrainingErr::DimensionProbe)
}

/// Agrees on the initial parameters, spending exactly one barrier.
///
/// The leader probes the dimensionality, fills theta with `initial` and sends
/// it to every other peer. Followers wait for the barrier and adopt it.
///
/// # Arguments
/// * `peer` - This peer.
/// * `role` - Whether this peer leads the job.
/// * `initial` - The value every parameter starts from.
///
/// # Returns
/// The initial theta, identical on every peer.
pub async fn bootstrap<P>(peer: &mut P, role: Role, initial: f64) -> Result<Vec<f64>>
where
    P: Peer<Msg = Payload>,
{
    match role {
        Role::Leader => {
            let size = probe_dimension(peer)?;
            let theta = vec![initial; size];

            info!(peer = peer.id().as_str(), dim = size; "sending theta");
            broadcast(peer, || Payload::Theta(theta.clone()))?;
            peer.sync().await?;

            Ok(theta)
        }
        Role::Follower => {
            info!(peer = peer.id().as_str(); "getting theta");
            peer.sync().await?;

            let drained = peer.drain();
            adopt_theta(peer.id(), drained)
        }
    }
}

fn adopt_theta(me: &PeerId, drained: Vec<Envelope<Payload>>) -> Result<Vec<f64>> {
    let mut theta = None;

    for Envelope { from, msg } in drained {
        match msg {
            Payload::Theta(received) if &from != me => {
                if theta.is_some() {
                    warn!(peer = me.as_str(), from = from.as_str(); "ignoring a second theta");
                    continue;
                }
                theta = Some(received);
            }
            Payload::Theta(_) => {}
            other => {
                return Err(TrainingErr::UnexpectedMessage {
                    superstep: Superstep::Bootstrap,
                    got: other.kind(),
                });
            }
        }
    }

    theta
        .filter(|t| !t.is_empty())
        .ok_or(TrainingErr::MissingTheta)
}
