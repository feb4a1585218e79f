//! Runtime variable store for one loaded training package.
//!
//! A flat string→string map, scoped to a single adapter instance and a
//! single enrollment attempt. All values are strings per the runtime
//! contract; the only numeric interpretation happens at checkpoint time
//! when the raw score is parsed for the activity log.

use std::collections::HashMap;

use crate::model::LearnerIdentity;

/// Element name for the learner identifier.
pub const STUDENT_ID: &str = "cmi.core.student_id";
/// Element name for the learner display name.
pub const STUDENT_NAME: &str = "cmi.core.student_name";
/// Element name for the lesson status string.
pub const LESSON_STATUS: &str = "cmi.core.lesson_status";
/// Element name for the raw score.
pub const SCORE_RAW: &str = "cmi.core.score.raw";
/// Element name for package suspend data.
pub const SUSPEND_DATA: &str = "cmi.suspend_data";
/// Element name for the entry mode.
pub const ENTRY: &str = "cmi.core.entry";

/// In-memory runtime variable map, pre-seeded with the standard defaults.
#[derive(Debug, Clone)]
pub struct RuntimeVars {
    values: HashMap<String, String>,
}

impl RuntimeVars {
    /// Create a store seeded for the given learner.
    ///
    /// Defaults: lesson status "not attempted", raw score "0", empty
    /// suspend data, entry mode "ab-initio".
    pub fn seeded(learner: &LearnerIdentity) -> Self {
        let mut values = HashMap::new();
        values.insert(STUDENT_ID.to_string(), learner.learner_id());
        values.insert(STUDENT_NAME.to_string(), learner.display_name());
        values.insert(LESSON_STATUS.to_string(), "not attempted".to_string());
        values.insert(SCORE_RAW.to_string(), "0".to_string());
        values.insert(SUSPEND_DATA.to_string(), String::new());
        values.insert(ENTRY.to_string(), "ab-initio".to_string());
        Self { values }
    }

    /// Read an element, returning the empty string for unknown keys.
    pub fn get(&self, element: &str) -> String {
        self.values.get(element).cloned().unwrap_or_default()
    }

    /// Overwrite an element. No validation of the value shape is performed;
    /// validation, if any, happens downstream at persistence time.
    pub fn set(&mut self, element: &str, value: &str) {
        self.values
            .insert(element.to_string(), value.to_string());
    }

    /// The lesson status string, verbatim.
    pub fn lesson_status(&self) -> String {
        self.get(LESSON_STATUS)
    }

    /// The raw score parsed as a float; non-numeric or empty parses as 0.
    pub fn parsed_score(&self) -> f64 {
        self.get(SCORE_RAW).trim().parse::<f64>().unwrap_or(0.0)
    }

    /// Snapshot of the full map, for activity log rows.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn learner() -> LearnerIdentity {
        LearnerIdentity {
            id: Uuid::new_v4(),
            student_number: Some("S-7".into()),
            email: None,
            first_name: Some("Grace".into()),
            last_name: Some("Hopper".into()),
        }
    }

    #[test]
    fn seeded_defaults() {
        let vars = RuntimeVars::seeded(&learner());
        assert_eq!(vars.get(STUDENT_ID), "S-7");
        assert_eq!(vars.get(STUDENT_NAME), "Grace Hopper");
        assert_eq!(vars.get(LESSON_STATUS), "not attempted");
        assert_eq!(vars.get(SCORE_RAW), "0");
        assert_eq!(vars.get(SUSPEND_DATA), "");
        assert_eq!(vars.get(ENTRY), "ab-initio");
    }

    #[test]
    fn unknown_key_reads_empty() {
        let vars = RuntimeVars::seeded(&learner());
        assert_eq!(vars.get("cmi.core.session_time"), "");
    }

    #[test]
    fn set_overwrites() {
        let mut vars = RuntimeVars::seeded(&learner());
        vars.set(SCORE_RAW, "85");
        assert_eq!(vars.get(SCORE_RAW), "85");
        vars.set(SCORE_RAW, "92.5");
        assert_eq!(vars.get(SCORE_RAW), "92.5");
    }

    #[test]
    fn parsed_score_defaults_to_zero() {
        let mut vars = RuntimeVars::seeded(&learner());
        assert_eq!(vars.parsed_score(), 0.0);
        vars.set(SCORE_RAW, "85");
        assert_eq!(vars.parsed_score(), 85.0);
        vars.set(SCORE_RAW, "abc");
        assert_eq!(vars.parsed_score(), 0.0);
        vars.set(SCORE_RAW, "");
        assert_eq!(vars.parsed_score(), 0.0);
        vars.set(SCORE_RAW, " 73.5 ");
        assert_eq!(vars.parsed_score(), 73.5);
    }

    #[test]
    fn snapshot_captures_current_state() {
        let mut vars = RuntimeVars::seeded(&learner());
        vars.set("cmi.suspend_data", "page=4");
        let snap = vars.snapshot();
        assert_eq!(snap.get(SUSPEND_DATA).unwrap(), "page=4");
        assert_eq!(snap.get(LESSON_STATUS).unwrap(), "not attempted");
    }
}
