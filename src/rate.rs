use serde::Serialize;

/// Logistic probability of an adverse regime transition over the horizon.
///
/// `1 / (1 + exp(-(γ·friction − θ)))`. Strictly inside (0, 1) for finite
/// inputs of ordinary magnitude; callers clamp friction to `[0, ∞)` first.
pub fn collapse_probability(avg_friction: f64, gamma: f64, theta: f64) -> f64 {
    1.0 / (1.0 + (-(gamma * avg_friction - theta)).exp())
}

/// Net compounding rate `α·momentum − β·friction`. May be negative.
pub fn effective_rate(avg_momentum: f64, avg_friction: f64, alpha: f64, beta: f64) -> f64 {
    alpha * avg_momentum - beta * avg_friction
}

/// Categorical risk level for a collapse probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Normal,   // < 30%
    Elevated, // 30–50%
    Warning,  // 50–70%
    Critical, // ≥ 70%
}

impl RiskLevel {
    pub fn from_probability(prob: f64) -> Self {
        match prob {
            p if p < 0.30 => RiskLevel::Normal,
            p if p < 0.50 => RiskLevel::Elevated,
            p if p < 0.70 => RiskLevel::Warning,
            _ => RiskLevel::Critical,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "#22c55e",
            RiskLevel::Elevated => "#eab308",
            RiskLevel::Warning => "#f97316",
            RiskLevel::Critical => "#ef4444",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "Normal",
            RiskLevel::Elevated => "Elevated",
            RiskLevel::Warning => "Warning",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn collapse_probability_worked_example() {
        // 1 / (1 + exp(-(3.5·0.02 − 0.15))) = 1 / (1 + e^0.08)
        let p = collapse_probability(0.02, 3.5, 0.15);
        assert!((p - 0.4800).abs() < 1e-4, "p = {p}");
    }

    #[test]
    fn collapse_probability_is_half_at_threshold() {
        assert!((collapse_probability(0.1, 2.0, 0.2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn effective_rate_worked_example() {
        let r = effective_rate(0.05, 0.02, 1.1, 0.8);
        assert!((r - 0.039).abs() < 1e-12);
        assert!(effective_rate(0.0, 0.1, 1.1, 0.8) < 0.0, "net decompounding allowed");
    }

    #[test]
    fn risk_levels() {
        assert_eq!(RiskLevel::from_probability(0.2), RiskLevel::Normal);
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_probability(0.6), RiskLevel::Warning);
        assert_eq!(RiskLevel::from_probability(0.7), RiskLevel::Critical);
        assert_eq!(RiskLevel::Critical.label(), "CRITICAL");
        assert_eq!(RiskLevel::Normal.color(), "#22c55e");
    }

    proptest! {
        #[test]
        fn collapse_probability_strictly_inside_unit_interval(
            friction in 0.0f64..5.0,
            gamma in 0.0f64..5.0,
            theta in -10.0f64..10.0,
        ) {
            let p = collapse_probability(friction, gamma, theta);
            prop_assert!(p > 0.0 && p < 1.0, "p = {}", p);
        }

        #[test]
        fn collapse_probability_monotone_in_friction(
            f1 in 0.0f64..2.0,
            df in 0.001f64..1.0,
            gamma in 0.1f64..10.0,
        ) {
            prop_assert!(collapse_probability(f1 + df, gamma, 0.15) > collapse_probability(f1, gamma, 0.15));
        }
    }
}
