use dealwise_core::domain::recommendation::RecommendationResult;

/// `Widget` + `apparel` gives `Widget-A`; an empty industry leaves the product name alone.
pub fn recommended_label(product: &str, industry: &str) -> String {
    match industry.chars().next() {
        Some(initial) => format!("{product}-{}", initial.to_uppercase()),
        None => product.to_string(),
    }
}

pub fn render_deal_prompt(recommendation: &RecommendationResult) -> String {
    let product = recommendation.product.as_str();
    let industry = recommendation.industry.as_str();

    format!(
        "Product: {product}
Industry: {industry}
Recommended Product: {label}
Minimum Order Quantity: {moq}
Payment Terms: {terms}

Based on this context, answer the following:

1. What is the probability (0-100%) of closing this deal?
2. What is the profitability rating? (Low / Medium / High)
3. What should be the next best step for the sales rep to close this deal?

Format the response as:
Deal Probability: <percent>
Profitability: <rating>
Next Step: <action>
",
        label = recommended_label(product, industry),
        moq = recommendation.moq,
        terms = recommendation.payment_terms,
    )
}
