use bsp::Peer;
use log::{debug, info};

use super::{
    Convergence, aggregate_cost, aggregate_gradient, bootstrap, broadcast, check_convergence,
    evaluate_cost, evaluate_gradient,
};
use crate::{
    Configuration, GradientDescent, GradientDescentConfig, Payload, RegressionModel, Result,
    Role, RunState, TrainingErr,
};

/// What a peer knows once its run is over.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub theta: Vec<f64>,
    pub cost: f64,
    pub iterations: u64,
    pub examples: u64,
    pub role: Role,
}

enum Step {
    Next(RunState),
    Converged(RunState),
}

/// Drives one peer through a distributed batch gradient descent.
pub struct GradientDescentBsp {
    config: GradientDescentConfig,
    model: Box<dyn RegressionModel>,
    optimizer: GradientDescent,
    role: Role,
}

impl GradientDescentBsp {
    /// Reads the job options and decides this peer's role.
    ///
    /// # Arguments
    /// * `conf` - The job options.
    /// * `peer` - The peer this coordinator will drive.
    ///
    /// # Returns
    /// A new `GradientDescentBsp`, or a configuration error.
    pub fn setup<P: Peer>(conf: &Configuration, peer: &P) -> Result<Self> {
        let config = GradientDescentConfig::from_conf(conf)?;
        Self::with_config(config, peer)
    }

    /// Same as `setup` but with already validated hyperparameters.
    pub fn with_config<P: Peer>(config: GradientDescentConfig, peer: &P) -> Result<Self> {
        let config = config.validated()?;
        let leader = config.leader().elect(peer.peers())?;

        let role = if &leader == peer.id() {
            Role::Leader
        } else {
            Role::Follower
        };

        debug!(peer = peer.id().as_str(), leader = leader.as_str(); "elected leader");

        Ok(Self {
            model: config.model().build(),
            optimizer: GradientDescent::new(config.alpha()),
            config,
            role,
        })
    }

    /// Replaces the configured model with a custom one.
    pub fn with_model(mut self, model: Box<dyn RegressionModel>) -> Self {
        self.model = model;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Trains until convergence.
    ///
    /// The leader writes one `(theta, cost)` record per iteration plus a final
    /// one, also when the run diverges.
    ///
    /// # Returns
    /// The final parameters and cost, or the fatal error that ended the run.
    pub async fn run<P>(&self, peer: &mut P) -> Result<TrainingSummary>
    where
        P: Peer<Msg = Payload>,
    {
        let theta = bootstrap(peer, self.role, self.config.initial_theta()).await?;
        let mut state = RunState::new(theta);

        let outcome = loop {
            match self.iterate(peer, &state).await {
                Ok(Step::Next(next)) => state = next,
                Ok(Step::Converged(last)) => {
                    state = last;
                    break Ok(());
                }
                Err(e) => break Err(e),
            }
        };

        match outcome {
            Ok(()) => {
                self.cleanup(peer, &state)?;
                Ok(TrainingSummary {
                    theta: state.theta,
                    cost: state.cost,
                    iterations: state.iteration,
                    examples: state.examples,
                    role: self.role,
                })
            }
            Err(e @ TrainingErr::Diverged { .. }) => {
                self.cleanup(peer, &state)?;
                // Every peer diverges together, none may leave before the
                // leader's final record is in the output.
                peer.sync().await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the four supersteps of one iteration.
    ///
    /// `state` is left untouched, the caller keeps it as the last accepted
    /// state if the iteration fails.
    async fn iterate<P>(&self, peer: &mut P, state: &RunState) -> Result<Step>
    where
        P: Peer<Msg = Payload>,
    {
        let iteration = state.iteration + 1;

        // first superstep: local cost
        let local = evaluate_cost(peer, self.model.as_ref(), &state.theta)?;
        broadcast(peer, || local.into_payload())?;
        peer.sync().await?;

        // second superstep: global cost and convergence check
        let drained = peer.drain();
        let total = aggregate_cost(peer.id(), local, drained)?;
        let mean = total.mean().ok_or(TrainingErr::EmptyDataset)?;

        debug!(
            peer = peer.id().as_str(),
            iteration = iteration,
            examples = total.count;
            "aggregated cost"
        );

        let cost = match check_convergence(state, mean, &self.config)? {
            Convergence::Converged(cost) => {
                info!(peer = peer.id().as_str(), iteration = iteration; "finishing!");
                return Ok(Step::Converged(RunState {
                    theta: state.theta.clone(),
                    cost,
                    iteration,
                    examples: total.count,
                }));
            }
            Convergence::Continue(cost) => cost,
        };

        info!(peer = peer.id().as_str(), iteration = iteration; "cost is {cost}");

        peer.reopen_input()?;
        peer.sync().await?;

        // third superstep: local gradient
        let local = evaluate_gradient(peer, self.model.as_ref(), &state.theta)?;
        broadcast(peer, || Payload::Gradient(local.clone()))?;
        peer.sync().await?;

        // fourth superstep: global gradient and a single update
        let drained = peer.drain();
        let grad = aggregate_gradient(peer.id(), local, drained)?;

        let mut theta = state.theta.clone();
        self.optimizer.update_params(&mut theta, &grad)?;

        debug!(peer = peer.id().as_str(); "new theta for cost {cost} is {theta:?}");

        if self.role.is_leader() {
            peer.write(&theta, cost)?;
        }

        peer.reopen_input()?;
        peer.sync().await?;

        Ok(Step::Next(RunState {
            theta,
            cost,
            iteration,
            examples: total.count,
        }))
    }

    fn cleanup<P: Peer>(&self, peer: &mut P, state: &RunState) -> Result<()> {
        info!(
            peer = peer.id().as_str();
            "computation finished with cost {} for theta {:?}",
            state.cost,
            state.theta
        );

        if self.role.is_leader() {
            peer.write(&state.theta, state.cost)?;
        }

        Ok(())
    }
}
