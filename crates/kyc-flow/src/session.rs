//! # Session State
//!
//! Ephemeral wizard state that never reaches the backend.
//!
//! - [`FlowSessionData`] holds flow-level flags (owners section done, the
//!   section currently shown as verifying). Updates merge field by field.
//! - [`FormSessionStore`] holds in-progress form values per step id so
//!   edits survive navigating away and back. Each wizard instance owns its
//!   own store; nothing is process-global.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use kyc_core::FormValues;

// ─── Flow session data ───────────────────────────────────────────────

/// Flow-level flags, reset when the wizard is rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSessionData {
    /// The user confirmed the owners list is complete.
    #[serde(default)]
    pub owners_section_done: bool,
    /// Section that was just re-submitted and is shown as verifying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_section_id: Option<String>,
    /// KYC finished locally; data-collection sections are hidden.
    #[serde(default)]
    pub kyc_completed: bool,
}

/// A partial update to [`FlowSessionData`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowSessionUpdate {
    pub owners_section_done: Option<bool>,
    /// `Some(None)` clears the verifying section.
    pub verifying_section_id: Option<Option<String>>,
    pub kyc_completed: Option<bool>,
}

impl FlowSessionUpdate {
    pub fn verifying(section_id: impl Into<String>) -> Self {
        Self {
            verifying_section_id: Some(Some(section_id.into())),
            ..Self::default()
        }
    }

    pub fn clear_verifying() -> Self {
        Self {
            verifying_section_id: Some(None),
            ..Self::default()
        }
    }

    pub fn owners_done(done: bool) -> Self {
        Self {
            owners_section_done: Some(done),
            ..Self::default()
        }
    }
}

impl FlowSessionData {
    /// Apply `update` over the current flags.
    pub fn merge(&mut self, update: FlowSessionUpdate) {
        if let Some(done) = update.owners_section_done {
            self.owners_section_done = done;
        }
        if let Some(verifying) = update.verifying_section_id {
            self.verifying_section_id = verifying;
        }
        if let Some(completed) = update.kyc_completed {
            self.kyc_completed = completed;
        }
    }

    pub fn is_verifying(&self, section_id: &str) -> bool {
        self.verifying_section_id.as_deref() == Some(section_id)
    }
}

// ─── Form session store ──────────────────────────────────────────────

/// In-progress form values keyed by step id.
///
/// Cloning shares the underlying map. The lock is never held across an
/// `.await`.
#[derive(Debug, Clone, Default)]
pub struct FormSessionStore {
    forms: Arc<RwLock<HashMap<String, FormValues>>>,
}

impl FormSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `values` over whatever is saved for `step_id`.
    pub fn save(&self, step_id: &str, values: FormValues) {
        let mut forms = self.forms.write();
        let entry = forms.entry(step_id.to_string()).or_default();
        for (key, value) in values {
            entry.insert(key, value);
        }
    }

    pub fn get(&self, step_id: &str) -> Option<FormValues> {
        self.forms.read().get(step_id).cloned()
    }

    pub fn remove(&self, step_id: &str) -> Option<FormValues> {
        self.forms.write().remove(step_id)
    }

    /// Every saved value across steps. On a key clash the step id that
    /// sorts last wins.
    pub fn merged(&self) -> FormValues {
        let forms = self.forms.read();
        let mut ids: Vec<&String> = forms.keys().collect();
        ids.sort();
        let mut out = FormValues::new();
        for id in ids {
            for (key, value) in &forms[id] {
                out.insert(key.clone(), value.clone());
            }
        }
        out
    }

    /// Drop everything, e.g. when the organization type changes.
    pub fn clear(&self) {
        self.forms.write().clear();
    }

    pub fn len(&self) -> usize {
        self.forms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(v: serde_json::Value) -> FormValues {
        match v {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn session_updates_merge_field_by_field() {
        let mut session = FlowSessionData::default();
        session.merge(FlowSessionUpdate::owners_done(true));
        session.merge(FlowSessionUpdate::verifying("business-section"));
        assert!(session.owners_section_done);
        assert!(session.is_verifying("business-section"));

        session.merge(FlowSessionUpdate::clear_verifying());
        assert!(session.owners_section_done);
        assert_eq!(session.verifying_section_id, None);
    }

    #[test]
    fn store_merges_saves_per_step() {
        let store = FormSessionStore::new();
        store.save("industry", values(json!({ "industry": "541511" })));
        store.save("industry", values(json!({ "organizationDescription": "Consulting" })));
        let saved = store.get("industry").unwrap();
        assert_eq!(saved.len(), 2);
        assert!(store.get("contact-info").is_none());
    }

    #[test]
    fn clones_share_state_and_instances_do_not() {
        let store = FormSessionStore::new();
        let alias = store.clone();
        alias.save("gateway", values(json!({ "organizationType": "LIMITED_LIABILITY_COMPANY" })));
        assert_eq!(store.len(), 1);

        let other = FormSessionStore::new();
        assert!(other.is_empty());
    }

    #[test]
    fn merged_is_deterministic() {
        let store = FormSessionStore::new();
        store.save("b-step", values(json!({ "dbaName": "later" })));
        store.save("a-step", values(json!({ "dbaName": "earlier", "website": "" })));
        let merged = store.merged();
        assert_eq!(merged["dbaName"], json!("later"));
        assert_eq!(merged.len(), 2);

        store.clear();
        assert!(store.merged().is_empty());
    }
}
