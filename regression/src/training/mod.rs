//! The phases of a training run.
//!
//! `bootstrap` runs once, then every iteration goes through
//! `evaluate_cost` -> `aggregate_cost` + `check_convergence` ->
//! `evaluate_gradient` -> `aggregate_gradient` + update, each arrow being a
//! barrier. The local and aggregation steps are plain functions so they can be
//! exercised without a running job.

mod bootstrap;
mod coordinator;
mod cost;
mod gradient;

use bsp::{Peer, PeerId};

pub use bootstrap::{bootstrap, probe_dimension};
pub use coordinator::{GradientDescentBsp, TrainingSummary};
pub use cost::{Convergence, PartialCost, aggregate_cost, check_convergence, evaluate_cost};
pub use gradient::{aggregate_gradient, evaluate_gradient};

use crate::{Payload, Result, TrainingErr};

/// Sends a fresh `make()` to every peer but the sender.
fn broadcast<P, F>(peer: &mut P, make: F) -> Result<()>
where
    P: Peer<Msg = Payload>,
    F: Fn() -> Payload,
{
    let others: Vec<PeerId> = peer
        .peers()
        .iter()
        .filter(|id| *id != peer.id())
        .cloned()
        .collect();

    for to in &others {
        peer.send(to, make())?;
    }

    Ok(())
}

fn check_features(got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(TrainingErr::DimensionMismatch {
            what: "features",
            got,
            expected,
        });
    }

    Ok(())
}
