//! The architecture plan produced by stage 1 and consumed by stages 2–5.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::envelope::extract_json;

/// Feature flags detected from the mockup and description.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlanFeatures {
    /// The app needs user authentication.
    #[serde(default)]
    pub auth: bool,
    /// The app needs real-time updates (websockets/polling).
    #[serde(default, alias = "real_time")]
    pub realtime: bool,
    /// The app needs file upload handling.
    #[serde(default)]
    pub file_upload: bool,
}

/// The stage-1 output: what to build, before any code is written.
///
/// Every table referenced by later stages must appear in `database_tables`;
/// every endpoint later implemented must appear in `api_endpoints`. The
/// stage prompts restate this so the model keeps the plan authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchitecturePlan {
    /// One-phrase application category, e.g. "task management app".
    #[serde(default)]
    pub app_type: String,
    /// Ordered page names.
    #[serde(default)]
    pub pages: Vec<String>,
    /// Ordered component names.
    #[serde(default)]
    pub components: Vec<String>,
    /// Detected feature flags.
    #[serde(default)]
    pub features: PlanFeatures,
    /// API endpoints as "METHOD /path" strings.
    #[serde(default)]
    pub api_endpoints: Vec<String>,
    /// Database table (or collection) names.
    #[serde(default)]
    pub database_tables: Vec<String>,
}

impl ArchitecturePlan {
    /// Parse a plan out of raw stage-1 model text.
    ///
    /// Applies the same extraction/recovery chain as the file envelope. A
    /// plan with no pages and no endpoints is rejected — nothing downstream
    /// could be built from it.
    pub fn from_text(text: &str) -> Result<Self, LlmError> {
        let value = extract_json(text)?;
        let plan: Self =
            serde_json::from_value(value).map_err(|e| LlmError::Envelope(e.to_string()))?;

        if plan.pages.is_empty() && plan.api_endpoints.is_empty() {
            return Err(LlmError::Envelope(
                "plan names no pages and no endpoints".to_string(),
            ));
        }
        Ok(plan)
    }

    /// Compact rendering injected into every later stage's user prompt.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if !self.app_type.is_empty() {
            out.push_str(&format!("Application type: {}\n", self.app_type));
        }
        out.push_str(&format!("Pages: {}\n", join_or_none(&self.pages)));
        out.push_str(&format!("Components: {}\n", join_or_none(&self.components)));
        out.push_str(&format!(
            "Features: auth={}, realtime={}, file_upload={}\n",
            self.features.auth, self.features.realtime, self.features.file_upload,
        ));
        out.push_str(&format!(
            "API endpoints: {}\n",
            join_or_none(&self.api_endpoints)
        ));
        out.push_str(&format!(
            "Database tables: {}",
            join_or_none(&self.database_tables)
        ));
        out
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PLAN: &str = r#"{
        "app_type": "task management app",
        "pages": ["Login", "Dashboard", "TaskDetail"],
        "components": ["TaskCard", "NavBar"],
        "features": {"auth": true, "realtime": false, "file_upload": false},
        "api_endpoints": ["POST /api/auth/login", "GET /api/tasks"],
        "database_tables": ["users", "tasks"]
    }"#;

    #[test]
    fn full_plan_parses() {
        let plan = ArchitecturePlan::from_text(FULL_PLAN).unwrap();
        assert_eq!(plan.pages.len(), 3);
        assert!(plan.features.auth);
        assert!(!plan.features.realtime);
        assert_eq!(plan.database_tables, vec!["users", "tasks"]);
    }

    #[test]
    fn fenced_plan_parses() {
        let fenced = format!("```json\n{FULL_PLAN}\n```");
        assert!(ArchitecturePlan::from_text(&fenced).is_ok());
    }

    #[test]
    fn missing_fields_default() {
        let plan = ArchitecturePlan::from_text(r#"{"pages": ["Home"]}"#).unwrap();
        assert!(plan.components.is_empty());
        assert!(!plan.features.auth);
    }

    #[test]
    fn real_time_alias_accepted() {
        let plan = ArchitecturePlan::from_text(
            r#"{"pages":["Chat"],"features":{"real_time":true}}"#,
        )
        .unwrap();
        assert!(plan.features.realtime);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let err = ArchitecturePlan::from_text(r#"{"components":["Card"]}"#).unwrap_err();
        assert!(matches!(err, LlmError::Envelope(_)));
    }

    #[test]
    fn non_json_is_rejected() {
        assert!(ArchitecturePlan::from_text("no plan, sorry").is_err());
    }

    #[test]
    fn summary_mentions_every_section() {
        let plan = ArchitecturePlan::from_text(FULL_PLAN).unwrap();
        let summary = plan.summary();
        assert!(summary.contains("Pages: Login, Dashboard, TaskDetail"));
        assert!(summary.contains("auth=true"));
        assert!(summary.contains("Database tables: users, tasks"));
    }
}
