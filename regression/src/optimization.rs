use crate::{Result, TrainingErr};

/// Batch gradient descent update rule.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    /// Creates a new `GradientDescent` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    ///
    /// # Returns
    /// A new `GradientDescent` instance.
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    /// Takes one step against the fully aggregated gradient.
    ///
    /// # Arguments
    /// * `theta` - The parameters to update in place.
    /// * `grad` - The global gradient, one entry per parameter.
    ///
    /// # Returns
    /// An error if the lengths differ, in which case `theta` is left untouched.
    pub fn update_params(&self, theta: &mut [f64], grad: &[f64]) -> Result<()> {
        if grad.len() != theta.len() {
            return Err(TrainingErr::DimensionMismatch {
                what: "gradient",
                got: grad.len(),
                expected: theta.len(),
            });
        }

        let lr = self.learning_rate;

        for (t, g) in theta.iter_mut().zip(grad) {
            *t -= lr * g;
        }

        Ok(())
    }
}
