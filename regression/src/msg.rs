/// The messages peers exchange during training.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The initial parameters, sent once by the leader.
    Theta(Vec<f64>),
    /// A peer's local cost sum and how many examples it covers.
    Cost { sum: f64, count: u64 },
    /// A peer's local partial gradient.
    Gradient(Vec<f64>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Theta(_) => "theta",
            Payload::Cost { .. } => "cost",
            Payload::Gradient(_) => "gradient",
        }
    }
}
