/// What a peer does besides training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Bootstraps theta and writes the job output.
    Leader,
    Follower,
}

impl Role {
    #[inline]
    pub fn is_leader(self) -> bool {
        matches!(self, Role::Leader)
    }
}

/// The value carried from one iteration to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    /// This peer's replica of the parameters.
    pub theta: Vec<f64>,

    /// The last accepted mean cost.
    pub cost: f64,

    /// Completed iterations.
    pub iteration: u64,

    /// The global example count seen by the last cost aggregation.
    pub examples: u64,
}

impl RunState {
    /// Creates the state of a run that hasn't evaluated any cost yet.
    ///
    /// The cost is seeded with the largest representable value so the first
    /// convergence check can never report a divergence.
    pub fn new(theta: Vec<f64>) -> Self {
        Self {
            theta,
            cost: f64::MAX,
            iteration: 0,
            examples: 0,
        }
    }
}
