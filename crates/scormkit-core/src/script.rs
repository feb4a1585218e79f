//! TOML session script parser.
//!
//! A session script is a recorded (or hand-written) sequence of runtime API
//! calls, used by the replay tooling to drive an adapter without a live
//! training package. Loads single files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::LearnerIdentity;
use crate::vars::SCORE_RAW;

/// One runtime API call in a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ApiCall {
    Initialize,
    GetValue { element: String },
    SetValue { element: String, value: String },
    Commit,
    Finish,
}

/// A recorded runtime session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScript {
    /// Human-readable name.
    pub name: String,
    /// Description of the session.
    #[serde(default)]
    pub description: String,
    /// Learner seed data for the runtime variable store.
    #[serde(default)]
    pub learner: LearnerIdentity,
    /// The API calls, in order.
    #[serde(default)]
    pub calls: Vec<ApiCall>,
}

/// Intermediate TOML structure for parsing script files.
#[derive(Debug, Deserialize)]
struct TomlScriptFile {
    session: TomlSessionHeader,
    #[serde(default)]
    calls: Vec<ApiCall>,
}

#[derive(Debug, Deserialize)]
struct TomlSessionHeader {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    learner: LearnerIdentity,
}

/// Parse a single session script file.
pub fn parse_script(path: &Path) -> Result<SessionScript> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let file: TomlScriptFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse script {}", path.display()))?;
    Ok(SessionScript {
        name: file.session.name,
        description: file.session.description,
        learner: file.session.learner,
        calls: file.calls,
    })
}

/// Load every `.toml` script in a directory (non-recursive).
pub fn load_script_directory(dir: &Path) -> Result<Vec<SessionScript>> {
    let mut scripts = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            scripts.push(parse_script(&path)?);
        }
    }
    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scripts)
}

/// A non-fatal problem found in a script.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Index of the offending call, when the warning is call-specific.
    pub call_index: Option<usize>,
    /// What is wrong.
    pub message: String,
}

/// Validate a script, returning warnings. Scripts with warnings still
/// replay; the runtime contract is permissive by design.
pub fn validate_script(script: &SessionScript) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if script.calls.is_empty() {
        warnings.push(ValidationWarning {
            call_index: None,
            message: "script has no calls".to_string(),
        });
    }

    let mut initialized = false;
    let mut finished = false;
    for (index, call) in script.calls.iter().enumerate() {
        match call {
            ApiCall::Initialize => initialized = true,
            ApiCall::SetValue { element, value } => {
                if element.is_empty() {
                    warnings.push(ValidationWarning {
                        call_index: Some(index),
                        message: "set_value with empty element".to_string(),
                    });
                }
                if element == SCORE_RAW && value.trim().parse::<f64>().is_err() {
                    warnings.push(ValidationWarning {
                        call_index: Some(index),
                        message: format!(
                            "score value {value:?} is not numeric and will be recorded as 0"
                        ),
                    });
                }
            }
            ApiCall::Commit if !initialized => {
                warnings.push(ValidationWarning {
                    call_index: Some(index),
                    message: "commit before initialize".to_string(),
                });
            }
            ApiCall::Finish => finished = true,
            _ => {}
        }
        if finished && !matches!(call, ApiCall::Finish) {
            warnings.push(ValidationWarning {
                call_index: Some(index),
                message: "call after finish".to_string(),
            });
        }
    }

    warnings
}
