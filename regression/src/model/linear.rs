use super::{RegressionModel, dot};

/// Ordinary least squares: `h = theta . x`, cost `(h - y)^2 / 2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearRegression;

impl RegressionModel for LinearRegression {
    fn cost(&self, x: &[f64], y: f64, theta: &[f64]) -> f64 {
        (self.hypothesis(theta, x) - y).powi(2) / 2.0
    }

    fn hypothesis(&self, theta: &[f64], x: &[f64]) -> f64 {
        dot(theta, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit_has_no_cost() {
        let m = LinearRegression;
        assert_eq!(m.cost(&[1.0, 2.0], 5.0, &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cost_is_half_the_squared_error() {
        let m = LinearRegression;
        assert_eq!(m.cost(&[1.0], 1.0, &[10.0]), 40.5);
    }
}
