use bsp::{Envelope, Peer, PeerId};
use log::debug;

use super::check_features;
use crate::{Payload, RegressionModel, Result, Superstep, TrainingErr};

/// Sums `(h(theta, x) - y) * x[j]` over every local example.
///
/// # Arguments
/// * `peer` - This peer, whose partition cursor must be at the start.
/// * `model` - The hypothesis.
/// * `theta` - The current parameters.
///
/// # Returns
/// The local partial gradient, one entry per parameter.
pub fn evaluate_gradient<P: Peer>(
    peer: &mut P,
    model: &dyn RegressionModel,
    theta: &[f64],
) -> Result<Vec<f64>> {
    let mut grad = vec![0.0; theta.len()];

    while let Some(sample) = peer.read_next()? {
        check_features(sample.x.len(), theta.len())?;

        let difference = model.hypothesis(theta, sample.x) - sample.y;
        for (g, x) in grad.iter_mut().zip(sample.x) {
            *g += difference * x;
        }
    }

    Ok(grad)
}

/// Adds every remote partial gradient to the local one, feature wise.
///
/// Only accumulates: the caller applies the update once on the result.
/// Envelopes sent by `me` are skipped so the local contribution is counted once,
/// and contributions are summed in peer name order so every peer ends up with
/// the same bits.
pub fn aggregate_gradient(
    me: &PeerId,
    local: Vec<f64>,
    drained: Vec<Envelope<Payload>>,
) -> Result<Vec<f64>> {
    let dim = local.len();
    let mut parts = vec![(me.clone(), local)];

    for Envelope { from, msg } in drained {
        if &from == me {
            debug!(peer = me.as_str(); "skipping own gradient");
            continue;
        }

        let part = match msg {
            Payload::Gradient(part) => part,
            other => {
                return Err(TrainingErr::UnexpectedMessage {
                    superstep: Superstep::Gradient,
                    got: other.kind(),
                });
            }
        };

        if part.len() != dim {
            return Err(TrainingErr::DimensionMismatch {
                what: "gradient",
                got: part.len(),
                expected: dim,
            });
        }

        parts.push((from, part));
    }

    parts.sort_by(|a, b| a.0.cmp(&b.0));

    let mut total = vec![0.0; dim];
    for (_, part) in &parts {
        for (t, p) in total.iter_mut().zip(part) {
            *t += p;
        }
    }

    Ok(total)
}
