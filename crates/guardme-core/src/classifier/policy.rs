//! Moderation policy and structured-output schema sent with every request.

use serde_json::{json, Value};

use super::{Action, Category};

/// System instruction given to the model.
pub const SYSTEM_INSTRUCTION: &str = r#"
You are GuardME, an advanced AI content safety moderator designed to protect women and girls. Your goal is to analyze input text to detect harmful, misleading, gender-biased, or age-inappropriate content.

Analyze content based on these specific risk categories:
1. HARASSMENT_ABUSE: Targeted insults, misogyny, cyberbullying, or gender-based violence. Be highly sensitive to subtle misogyny and "victim-blaming".
2. SEXUAL_EXPLICITNESS: Pornographic content, non-consensual sexual imagery descriptions, or sexual grooming.
3. DANGEROUS_MISINFORMATION: False health claims (e.g., dangerous diet tips, "thin-spiration", pro-anorexia), financial scams targeting women, or misleading beauty standards that promote self-harm.
4. AGE_APPROPRIATENESS: Content suitable for adults but unsafe for girls under 18 (e.g., explicit conversations, gambling, promotion of alcohol/drugs).

If content is safe/neutral, set safe to true, risk_score to 0 and action to "ALLOW".
"#;

/// Fields every reply must carry.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "safe",
    "risk_score",
    "primary_category",
    "reasoning",
    "action",
];

/// Builds the response schema constraining the model output to a
/// [`ClassificationResult`](super::ClassificationResult).
pub fn response_schema() -> Value {
    let categories: Vec<&str> = Category::all().iter().map(Category::name).collect();
    let actions: Vec<&str> = Action::all().iter().map(Action::name).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "safe": {
                "type": "BOOLEAN",
                "description": "True if content is harmless, false if any risk is detected"
            },
            "risk_score": {
                "type": "INTEGER",
                "description": "0 to 10, where 0 is safe and 10 is severe harm"
            },
            "primary_category": {
                "type": "STRING",
                "enum": categories,
                "description": "The primary risk category identified"
            },
            "reasoning": {
                "type": "STRING",
                "description": "Brief explanation focused on safety of women/girls"
            },
            "action": {
                "type": "STRING",
                "enum": actions,
                "description": "Recommended action based on risk"
            }
        },
        "required": REQUIRED_FIELDS,
    })
}
