//! Wire types for the legal classification service.
//!
//! Every field beyond `category` and `confidence` is optional on the wire;
//! missing lists deserialise as empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /chat` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// `POST /chat` response body, kept verbatim on assistant messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Underscore-separated label, e.g. `sexual_harassment`, or `unknown`.
    pub category: String,
    /// 0..1
    pub confidence: f64,
    /// Why the service chose this category (`classified`, `low_confidence`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_categories: Vec<MatchedCategory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legal_frameworks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub laws: Vec<Law>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<CaseContext>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub case_references: Vec<String>,
}

impl ChatResponse {
    pub fn is_unknown(&self) -> bool {
        self.category.is_empty() || self.category == "unknown"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedCategory {
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Law {
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub act: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Resources arrive either as bare strings or as `{ "name": ... }` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    Name(String),
    Named {
        name: String,
        #[serde(flatten)]
        extra: serde_json::Map<String, Value>,
    },
}

impl Resource {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Named { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_framework: Option<String>,
    /// `"minor"`, `"adult"`, or absent. Kept loose: the service may also send
    /// booleans or nulls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_indicator: Option<Value>,
}

impl CaseContext {
    /// JavaScript-style truthiness of `age_indicator`.
    pub fn has_age_indicator(&self) -> bool {
        match &self.age_indicator {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    /// Whether the minor-protection (POCSO) advisory applies.
    pub fn requires_minor_protection(&self) -> bool {
        self.legal_framework.as_deref() == Some("POCSO") && self.has_age_indicator()
    }
}

/// `GET /health` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_response_parses() {
        let resp: ChatResponse =
            serde_json::from_value(json!({"category": "stalking", "confidence": 0.41})).unwrap();
        assert_eq!(resp.category, "stalking");
        assert!(resp.laws.is_empty());
        assert!(resp.context.is_none());
        assert!(!resp.is_unknown());
    }

    #[test]
    fn full_response_parses() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "category": "sexual_harassment",
            "confidence": 0.82,
            "reason": "classified",
            "matched_categories": [
                {"category": "sexual_harassment", "confidence": 0.82},
                {"category": "cyber_harassment", "confidence": 0.31}
            ],
            "legal_frameworks": ["POCSO Act, 2012"],
            "laws": [{"section": "354A", "act": "IPC", "title": "Sexual harassment"}],
            "steps": ["Tell a trusted adult"],
            "resources": ["CHILDLINE 1098", {"name": "NCW", "url": "http://ncw.nic.in"}],
            "warnings": ["Do not delete messages"],
            "context": {"authority": "faculty", "legal_framework": "POCSO", "age_indicator": "minor"},
            "case_references": ["Vishaka v. State of Rajasthan (1997)"]
        }))
        .unwrap();
        assert_eq!(resp.matched_categories.len(), 2);
        assert_eq!(resp.laws[0].description, None);
        assert_eq!(resp.resources[0].name(), "CHILDLINE 1098");
        assert_eq!(resp.resources[1].name(), "NCW");
        assert!(resp.context.as_ref().unwrap().requires_minor_protection());
    }

    #[test]
    fn age_indicator_truthiness() {
        let ctx = |v: Value| CaseContext {
            legal_framework: Some("POCSO".into()),
            age_indicator: Some(v),
            ..Default::default()
        };
        assert!(ctx(json!("minor")).has_age_indicator());
        assert!(ctx(json!(true)).has_age_indicator());
        assert!(ctx(json!(16)).has_age_indicator());
        assert!(!ctx(json!("")).has_age_indicator());
        assert!(!ctx(json!(false)).has_age_indicator());
        assert!(!ctx(json!(0)).has_age_indicator());
        assert!(!ctx(Value::Null).has_age_indicator());
    }

    #[test]
    fn pocso_requires_both_fields() {
        let no_age = CaseContext {
            legal_framework: Some("POCSO".into()),
            ..Default::default()
        };
        assert!(!no_age.requires_minor_protection());

        let other_framework = CaseContext {
            legal_framework: Some("IPC".into()),
            age_indicator: Some(json!("minor")),
            ..Default::default()
        };
        assert!(!other_framework.requires_minor_protection());
    }

    #[test]
    fn unknown_category_detected() {
        let resp: ChatResponse = serde_json::from_value(
            json!({"category": "unknown", "confidence": 0.0, "reason": "low_confidence"}),
        )
        .unwrap();
        assert!(resp.is_unknown());
    }
}
