//! Safety categories and classification verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Risk categories the classification service can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Targeted insults, misogyny, cyberbullying, gender-based violence.
    Harassment,
    /// Sexually explicit content or grooming.
    Sexual,
    /// Dangerous health claims, scams, self-harm-adjacent content.
    Misinformation,
    /// Content unsuitable for under-18s.
    #[serde(rename = "Age-Inappropriate")]
    AgeInappropriate,
    /// No risk found.
    None,
}

impl Category {
    /// Returns all categories in display order.
    pub fn all() -> &'static [Category] {
        &[
            Category::None,
            Category::Harassment,
            Category::Sexual,
            Category::Misinformation,
            Category::AgeInappropriate,
        ]
    }

    /// Returns the wire name used by the classification service.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Harassment => "Harassment",
            Category::Sexual => "Sexual",
            Category::Misinformation => "Misinformation",
            Category::AgeInappropriate => "Age-Inappropriate",
            Category::None => "None",
        }
    }

    /// Returns the label used in the session distribution.
    ///
    /// `None` is shown as "Safe"; everything else keeps its own name.
    pub fn label(&self) -> &'static str {
        match self {
            Category::None => "Safe",
            other => other.name(),
        }
    }

    /// Returns true if this category denotes a risk.
    pub fn is_risk(&self) -> bool {
        !matches!(self, Category::None)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Recommended disposition for submitted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Block the content.
    Block,
    /// Allow with a warning.
    Warn,
    /// Allow the content.
    #[default]
    Allow,
}

impl Action {
    /// Returns all actions.
    pub fn all() -> &'static [Action] {
        &[Action::Block, Action::Warn, Action::Allow]
    }

    /// Returns the wire name (`BLOCK`, `WARN`, `ALLOW`).
    pub fn name(&self) -> &'static str {
        match self {
            Action::Block => "BLOCK",
            Action::Warn => "WARN",
            Action::Allow => "ALLOW",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Highest risk score the service may report.
pub const MAX_RISK_SCORE: u8 = 10;

/// Risk score in the inclusive range 0..=10.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct RiskScore(u8);

impl RiskScore {
    /// A score of zero.
    pub const SAFE: RiskScore = RiskScore(0);

    /// Creates a score, returning `None` when out of range.
    pub fn new(value: u8) -> Option<Self> {
        (value <= MAX_RISK_SCORE).then_some(Self(value))
    }

    /// Returns the raw value.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RiskScore {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(RiskScore::new)
            .ok_or_else(|| format!("risk_score {} outside 0..={}", value, MAX_RISK_SCORE))
    }
}

impl From<RiskScore> for u8 {
    fn from(score: RiskScore) -> Self {
        score.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A safe verdict that does not carry `ALLOW` and a zero score.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("safe verdict must be ALLOW with risk 0, got {action} with risk {risk_score}")]
pub struct ContractViolation {
    /// The reported action.
    pub action: Action,
    /// The reported risk score.
    pub risk_score: RiskScore,
}

/// Verdict returned by the classification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// True if no risk was detected.
    pub safe: bool,
    /// Severity from 0 (safe) to 10 (severe).
    pub risk_score: RiskScore,
    /// Dominant risk category.
    pub primary_category: Category,
    /// Short justification.
    pub reasoning: String,
    /// Recommended action.
    pub action: Action,
}

impl ClassificationResult {
    /// Creates a safe verdict.
    pub fn safe(reasoning: impl Into<String>) -> Self {
        Self {
            safe: true,
            risk_score: RiskScore::SAFE,
            primary_category: Category::None,
            reasoning: reasoning.into(),
            action: Action::Allow,
        }
    }

    /// Creates an unsafe verdict.
    pub fn flagged(
        category: Category,
        risk_score: RiskScore,
        action: Action,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            safe: false,
            risk_score,
            primary_category: category,
            reasoning: reasoning.into(),
            action,
        }
    }

    /// Checks that a safe verdict is `ALLOW` with a zero score.
    ///
    /// The service is trusted to uphold this; the check exists so drift can
    /// be logged and tested.
    pub fn check_contract(&self) -> Result<(), ContractViolation> {
        if self.safe && (self.action != Action::Allow || self.risk_score != RiskScore::SAFE) {
            return Err(ContractViolation {
                action: self.action,
                risk_score: self.risk_score,
            });
        }
        Ok(())
    }

    /// Returns true if the recommended action is Block.
    pub fn is_blocked(&self) -> bool {
        self.action == Action::Block
    }
}
