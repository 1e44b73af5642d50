//! # Screen Navigation
//!
//! A history stack of screen ids plus side channels the next screen reads
//! on arrival.
//!
//! ## Invariants
//!
//! - The history is never empty; [`Navigator::go_back`] at the root is a
//!   no-op.
//! - `editing_party_id` and `previously_completed` are kept per screen id
//!   and snapshotted on every [`Navigator::go_to`].
//! - `review_screen_opened_section_id`, `initial_stepper_step_id` and
//!   `short_label_override` are single values reset on every navigation.
//! - The origin screen is the history entry below the current one.

use std::collections::HashMap;

use kyc_core::PartyId;

/// Options for [`Navigator::go_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoToConfig {
    /// Replace the whole history with the target screen.
    pub reset_history: bool,
    /// Party the target screen edits.
    pub editing_party_id: Option<PartyId>,
    /// The target stepper was completed before; open on its last step.
    pub previously_completed: bool,
    /// Section the review screen should expand on arrival.
    pub review_screen_opened_section_id: Option<String>,
    /// Step the target stepper opens on.
    pub initial_stepper_step_id: Option<String>,
    /// Replaces the section's short label in the stepper header.
    pub short_label_override: Option<String>,
}

impl GoToConfig {
    pub fn reset() -> Self {
        Self {
            reset_history: true,
            ..Self::default()
        }
    }

    pub fn editing(party_id: Option<PartyId>) -> Self {
        Self {
            editing_party_id: party_id,
            ..Self::default()
        }
    }
}

/// Navigation state of one wizard instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    history: Vec<String>,
    editing_party_ids: HashMap<String, Option<PartyId>>,
    previously_completed: HashMap<String, bool>,
    review_screen_opened_section_id: Option<String>,
    initial_stepper_step_id: Option<String>,
    short_label_override: Option<String>,
}

impl Navigator {
    pub fn new(initial_screen: impl Into<String>) -> Self {
        Self {
            history: vec![initial_screen.into()],
            editing_party_ids: HashMap::new(),
            previously_completed: HashMap::new(),
            review_screen_opened_section_id: None,
            initial_stepper_step_id: None,
            short_label_override: None,
        }
    }

    /// Move to `id`, pushing it onto the history (or replacing the history
    /// when `reset_history` is set).
    pub fn go_to(&mut self, id: impl Into<String>, config: GoToConfig) {
        let id = id.into();
        tracing::debug!(
            screen = %id,
            from = %self.current(),
            reset = config.reset_history,
            "navigate"
        );
        self.editing_party_ids
            .insert(id.clone(), config.editing_party_id);
        self.previously_completed
            .insert(id.clone(), config.previously_completed);
        self.review_screen_opened_section_id = config.review_screen_opened_section_id;
        self.initial_stepper_step_id = config.initial_stepper_step_id;
        self.short_label_override = config.short_label_override;
        if config.reset_history {
            self.history.clear();
        }
        self.history.push(id);
    }

    /// Pop the current screen. Does nothing at the root.
    pub fn go_back(&mut self) {
        if self.history.len() <= 1 {
            return;
        }
        let left = self.history.pop();
        self.review_screen_opened_section_id = None;
        self.initial_stepper_step_id = None;
        self.short_label_override = None;
        tracing::debug!(left = ?left, screen = %self.current(), "navigate back");
    }

    pub fn current(&self) -> &str {
        // `history` always holds at least the initial screen.
        self.history.last().map(String::as_str).unwrap_or_default()
    }

    /// The screen the user came from, if any.
    pub fn origin(&self) -> Option<&str> {
        let len = self.history.len();
        if len > 1 {
            Some(self.history[len - 2].as_str())
        } else {
            None
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Party edited on `screen_id`.
    pub fn editing_party_id(&self, screen_id: &str) -> Option<&PartyId> {
        self.editing_party_ids.get(screen_id).and_then(Option::as_ref)
    }

    /// Record the party a screen edits, e.g. after creating it.
    pub fn set_editing_party_id(&mut self, screen_id: &str, party_id: Option<PartyId>) {
        self.editing_party_ids.insert(screen_id.to_string(), party_id);
    }

    pub fn previously_completed(&self, screen_id: &str) -> bool {
        self.previously_completed
            .get(screen_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn review_screen_opened_section_id(&self) -> Option<&str> {
        self.review_screen_opened_section_id.as_deref()
    }

    pub fn initial_stepper_step_id(&self) -> Option<&str> {
        self.initial_stepper_step_id.as_deref()
    }

    pub fn short_label_override(&self) -> Option<&str> {
        self.short_label_override.as_deref()
    }
}
