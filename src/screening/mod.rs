//! Emergency keyword screening over free-text patient input.
//!
//! Pure substring matching against two severity tiers. False positives are an
//! accepted safety trade-off: "severe bleeding disorder" matches "severe
//! bleeding" on purpose.

use crate::config::ScreeningConfig;
use serde::Serialize;

/// Severity classification driving which warning is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    None,
    Urgent,
    Critical,
}

impl Tier {
    /// Recommended action line surfaced alongside the warning message.
    pub fn action(self) -> &'static str {
        match self {
            Self::Critical => "CALL 911 OR GO TO ER",
            Self::Urgent => "SEEK MEDICAL CARE TODAY",
            Self::None => "",
        }
    }
}

/// Derived screening result. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyVerdict {
    pub is_emergency: bool,
    pub tier: Tier,
    pub matched_keyword: Option<String>,
    pub message: String,
}

impl EmergencyVerdict {
    fn none() -> Self {
        Self {
            is_emergency: false,
            tier: Tier::None,
            matched_keyword: None,
            message: String::new(),
        }
    }
}

pub const CRITICAL_MESSAGE: &str =
    "🚨 CALL 911 IMMEDIATELY - This could be a medical emergency!";
pub const URGENT_MESSAGE: &str = "⚠️ URGENT: Seek immediate medical care today";

/// Canonical keyword set: the union of the two historical lists, with the
/// urgent tier kept separate. Scanned in priority order, critical first.
const CRITICAL_KEYWORDS: &[&str] = &[
    "chest pain",
    "heart attack",
    "stroke",
    "can't breathe",
    "cant breathe",
    "cannot breathe",
    "difficulty breathing",
    "severe bleeding",
    "bleeding heavily",
    "unconscious",
    "passed out",
    "loss of consciousness",
    "seizure",
    "suicidal",
    "suicide",
    "kill myself",
    "want to die",
    "overdose",
    "poisoning",
    "severe allergic",
    "anaphylaxis",
    "choking",
    "drowning",
    "severe head injury",
    "paralysis",
    "coughing blood",
];

const URGENT_KEYWORDS: &[&str] = &[
    "high fever",
    "severe pain",
    "persistent vomiting",
    "vomiting blood",
    "blood in stool",
    "severe headache",
    "vision loss",
    "confused",
    "severe abdominal pain",
    "deep cut",
    "broken bone",
    "can't walk",
];

/// Keyword phrases per tier, in fixed scan priority order.
#[derive(Debug, Clone)]
pub struct TierDefinitions {
    critical: Vec<String>,
    urgent: Vec<String>,
}

impl Default for TierDefinitions {
    fn default() -> Self {
        Self {
            critical: CRITICAL_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
            urgent: URGENT_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}

impl TierDefinitions {
    /// Build tier definitions from config, falling back to the canonical
    /// built-in set for any tier the config leaves empty.
    pub fn from_config(config: &ScreeningConfig) -> Self {
        let mut defs = Self::default();
        if !config.critical_keywords.is_empty() {
            defs.critical = config
                .critical_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect();
        }
        if !config.urgent_keywords.is_empty() {
            defs.urgent = config
                .urgent_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect();
        }
        defs
    }
}

/// Screen free text for emergency-indicating keywords.
///
/// Case-insensitive substring scan, critical tier before urgent, first match
/// wins. Pure: identical input always yields an identical verdict.
pub fn screen(text: &str, tiers: &TierDefinitions) -> EmergencyVerdict {
    let lowered = text.to_lowercase();
    if lowered.trim().is_empty() {
        return EmergencyVerdict::none();
    }

    for keyword in &tiers.critical {
        if lowered.contains(keyword.as_str()) {
            return EmergencyVerdict {
                is_emergency: true,
                tier: Tier::Critical,
                matched_keyword: Some(keyword.clone()),
                message: CRITICAL_MESSAGE.to_string(),
            };
        }
    }

    for keyword in &tiers.urgent {
        if lowered.contains(keyword.as_str()) {
            return EmergencyVerdict {
                is_emergency: true,
                tier: Tier::Urgent,
                matched_keyword: Some(keyword.clone()),
                message: URGENT_MESSAGE.to_string(),
            };
        }
    }

    EmergencyVerdict::none()
}
