use super::Usage;

/// Per-million-token USD pricing for known models.
struct ModelPricing {
    input_per_million: f64,
    output_per_million: f64,
}

const fn price(input_per_million: f64, output_per_million: f64) -> ModelPricing {
    ModelPricing {
        input_per_million,
        output_per_million,
    }
}

static PRICING: &[(&str, ModelPricing)] = &[
    // Claude 3 family
    ("claude-3-opus-20240229", price(15.0, 75.0)),
    ("claude-3-sonnet-20240229", price(3.0, 15.0)),
    ("claude-3-haiku-20240307", price(0.25, 1.25)),
    // Claude 3.5 family
    ("claude-3-5-sonnet-20241022", price(3.0, 15.0)),
    ("claude-3-5-haiku-20241022", price(0.80, 4.0)),
    // Claude 4 family
    ("claude-sonnet-4-5-20250929", price(3.0, 15.0)),
    ("claude-opus-4-1", price(15.0, 75.0)),
    // OpenAI GPT-4o family
    ("gpt-4o", price(2.50, 10.0)),
    ("gpt-4o-mini", price(0.15, 0.60)),
    // OpenAI GPT-4 family
    ("gpt-4-turbo", price(10.0, 30.0)),
    ("gpt-4", price(30.0, 60.0)),
    // OpenAI o-series
    ("o1", price(15.0, 60.0)),
    ("o1-mini", price(3.0, 12.0)),
    ("o3-mini", price(1.10, 4.40)),
];

/// Estimated USD cost for the given model and usage; 0 for unknown models.
pub fn estimate_cost(model: &str, usage: Usage) -> f64 {
    let Some((_, p)) = PRICING.iter().find(|(m, _)| *m == model) else {
        return 0.0;
    };
    let input_cost = usage.input_tokens as f64 / 1_000_000.0 * p.input_per_million;
    let output_cost = usage.output_tokens as f64 / 1_000_000.0 * p.output_per_million;
    input_cost + output_cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_costs_sum_input_and_output() {
        let usage = Usage {
            input_tokens: 1_000_000,
            output_tokens: 500_000,
        };
        let cost = estimate_cost("gpt-4o", usage);
        assert!((cost - (2.50 + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_costs_zero() {
        let usage = Usage {
            input_tokens: 1_000_000,
            output_tokens: 1_000_000,
        };
        assert_eq!(estimate_cost("mystery-model", usage), 0.0);
    }
}
