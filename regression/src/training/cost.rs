use bsp::{Envelope, Peer, PeerId};
use log::debug;

use super::check_features;
use crate::{
    GradientDescentConfig, Payload, RegressionModel, Result, RunState, Superstep, TrainingErr,
};

/// A cost sum together with the amount of examples it covers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialCost {
    pub sum: f64,
    pub count: u64,
}

impl PartialCost {
    pub fn new(sum: f64, count: u64) -> Self {
        Self { sum, count }
    }

    #[inline]
    fn add(&mut self, cost: f64) {
        self.sum += cost;
        self.count += 1;
    }

    #[inline]
    fn merge(&mut self, other: PartialCost) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// The mean cost, `None` when no example was seen.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub(super) fn into_payload(self) -> Payload {
        Payload::Cost {
            sum: self.sum,
            count: self.count,
        }
    }
}

/// The outcome of a convergence check that didn't diverge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Convergence {
    /// The cost reached the threshold, training is over.
    Converged(f64),
    /// The cost decreased but is still above the threshold.
    Continue(f64),
}

/// Scores every local example once.
///
/// # Arguments
/// * `peer` - This peer, whose partition cursor must be at the start.
/// * `model` - The cost model.
/// * `theta` - The current parameters.
///
/// # Returns
/// The local cost sum and example count, or an error if the partition
/// can't be read or an example has the wrong dimensionality.
pub fn evaluate_cost<P: Peer>(
    peer: &mut P,
    model: &dyn RegressionModel,
    theta: &[f64],
) -> Result<PartialCost> {
    let mut local = PartialCost::default();

    while let Some(sample) = peer.read_next()? {
        check_features(sample.x.len(), theta.len())?;
        local.add(model.cost(sample.x, sample.y, theta));
    }

    Ok(local)
}

/// Adds every remote partial cost to the local one.
///
/// Envelopes sent by `me` are skipped so the local contribution is counted once.
/// Contributions are summed in peer name order, so every peer computes a bit
/// identical total and takes the same convergence decision.
pub fn aggregate_cost(
    me: &PeerId,
    local: PartialCost,
    drained: Vec<Envelope<Payload>>,
) -> Result<PartialCost> {
    let mut parts = vec![(me.clone(), local)];

    for Envelope { from, msg } in drained {
        if &from == me {
            debug!(peer = me.as_str(); "skipping own cost");
            continue;
        }

        match msg {
            Payload::Cost { sum, count } => parts.push((from, PartialCost::new(sum, count))),
            other => {
                return Err(TrainingErr::UnexpectedMessage {
                    superstep: Superstep::Cost,
                    got: other.kind(),
                });
            }
        }
    }

    parts.sort_by(|a, b| a.0.cmp(&b.0));

    let mut total = PartialCost::default();
    for (_, part) in parts {
        total.merge(part);
    }

    Ok(total)
}

/// Decides whether training goes on, given this iteration's mean cost.
///
/// A cost that increased over the last accepted one, or that isn't finite,
/// means the learning rate is too large and is reported as `Diverged`.
pub fn check_convergence(
    state: &RunState,
    mean: f64,
    config: &GradientDescentConfig,
) -> Result<Convergence> {
    if !mean.is_finite() || mean > state.cost {
        return Err(TrainingErr::Diverged {
            alpha: config.alpha(),
            iteration: state.iteration + 1,
            cost: mean,
            previous: state.cost,
        });
    }

    if mean == 0.0 || mean < config.threshold() {
        Ok(Convergence::Converged(mean))
    } else {
        Ok(Convergence::Continue(mean))
    }
}
