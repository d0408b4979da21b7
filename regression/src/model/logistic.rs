use super::{RegressionModel, dot};

const EPS: f64 = 1e-12;

fn sigmoid(z: f64) -> f64 {
    1. / (1. + (-z).exp())
}

/// Logistic regression: `h = sigmoid(theta . x)` with the cross entropy cost.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogisticRegression;

impl RegressionModel for LogisticRegression {
    fn cost(&self, x: &[f64], y: f64, theta: &[f64]) -> f64 {
        // Clamped so a saturated hypothesis yields a large but finite cost.
        let h = self.hypothesis(theta, x).clamp(EPS, 1. - EPS);
        -y * h.ln() - (1. - y) * (1. - h).ln()
    }

    fn hypothesis(&self, theta: &[f64], x: &[f64]) -> f64 {
        sigmoid(dot(theta, x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weights_predict_one_half() {
        let m = LogisticRegression;
        assert_eq!(m.hypothesis(&[0.0, 0.0], &[3.0, -4.0]), 0.5);
        assert!((m.cost(&[1.0], 1.0, &[0.0]) - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn confident_mistakes_stay_finite() {
        let m = LogisticRegression;
        let cost = m.cost(&[1.0], 0.0, &[1000.0]);
        assert!(cost.is_finite());
        assert!(cost > 20.0);
    }

    #[test]
    fn confident_hits_are_cheap() {
        let m = LogisticRegression;
        assert!(m.cost(&[1.0], 1.0, &[20.0]) < 1e-6);
    }
}
