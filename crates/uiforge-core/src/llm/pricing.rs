//! LLM pricing lookup for cost estimation.
//!
//! Provides per-token pricing for known models and computes estimated costs.
//! Prices are in USD per million tokens; unknown models default to the
//! cheapest multimodal tier so estimates stay conservative but non-zero.

/// Per-token pricing for a model.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    /// USD per million input tokens.
    pub input_per_million: f64,
    /// USD per million output tokens.
    pub output_per_million: f64,
}

impl ModelPricing {
    /// Compute the estimated cost for the given token counts.
    pub fn compute_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let input_cost = (f64::from(input_tokens) / 1_000_000.0) * self.input_per_million;
        let output_cost = (f64::from(output_tokens) / 1_000_000.0) * self.output_per_million;
        input_cost + output_cost
    }
}

/// Look up pricing for a model identifier.
pub fn lookup(model: &str) -> ModelPricing {
    if model.starts_with("gpt-4o-mini") {
        ModelPricing {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    } else if model.starts_with("gpt-4o") {
        ModelPricing {
            input_per_million: 2.50,
            output_per_million: 10.0,
        }
    } else if model.starts_with("gpt-4-turbo") || model.starts_with("gpt-4-vision") {
        ModelPricing {
            input_per_million: 10.0,
            output_per_million: 30.0,
        }
    } else if model.starts_with("gpt-4.1-mini") {
        ModelPricing {
            input_per_million: 0.40,
            output_per_million: 1.60,
        }
    } else if model.starts_with("gpt-4.1") {
        ModelPricing {
            input_per_million: 2.00,
            output_per_million: 8.00,
        }
    } else if model.starts_with("o1") || model.starts_with("o3") {
        ModelPricing {
            input_per_million: 15.0,
            output_per_million: 60.0,
        }
    } else {
        // Unknown model — assume the gpt-4o-mini tier.
        ModelPricing {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt4o_pricing() {
        let p = lookup("gpt-4o");
        assert!((p.input_per_million - 2.5).abs() < f64::EPSILON);
        assert!((p.output_per_million - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gpt4o_mini_not_shadowed_by_gpt4o() {
        let p = lookup("gpt-4o-mini-2024-07-18");
        assert!((p.input_per_million - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn gpt41_family() {
        assert!((lookup("gpt-4.1").input_per_million - 2.0).abs() < f64::EPSILON);
        assert!((lookup("gpt-4.1-mini").input_per_million - 0.40).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_model_uses_cheap_tier() {
        let p = lookup("some-future-model");
        assert!((p.input_per_million - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn compute_cost_basic() {
        let p = ModelPricing {
            input_per_million: 2.5,
            output_per_million: 10.0,
        };
        let cost = p.compute_cost(10_000, 2_000);
        let expected = (10_000.0 / 1_000_000.0) * 2.5 + (2_000.0 / 1_000_000.0) * 10.0;
        assert!((cost - expected).abs() < 1e-12);
    }
}
