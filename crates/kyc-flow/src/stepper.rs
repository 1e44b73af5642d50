//! # Section Stepper
//!
//! The step cursor inside a stepper screen, and the rules for what
//! "next" and "previous" mean at each position.
//!
//! ## Next
//!
//! In order of precedence:
//!
//! 1. editing from check-answers: return to the check-answers step;
//! 2. opened from the review section: return there with this section
//!    expanded;
//! 3. not on the last step: advance the cursor;
//! 4. on a check-answers step of a previously completed stepper: go to the
//!    overview and mark the section as verifying;
//! 5. opened from the owners list: return to it;
//! 6. on the final review step: go to the overview;
//! 7. otherwise go to the next section (editing its party), or the
//!    overview after the last section.
//!
//! ## Previous
//!
//! 1. editing from check-answers: return to the check-answers step;
//! 2. opened from the review section: return there;
//! 3. opened from the owners list, on the first or check-answers step:
//!    go back;
//! 4. on a check-answers step of a previously completed stepper: go to the
//!    overview;
//! 5. on the first step, arrived from the previous section: go to it;
//! 6. in the review section: go to the overview;
//! 7. otherwise move the cursor back.

use kyc_core::{ClientContext, ClientResponse};

use crate::config::{FlowConfig, ScreenConfig, StepConfig, StepType, StepperConfig};
use crate::error::FlowError;
use crate::navigation::{GoToConfig, Navigator};
use crate::session::{FlowSessionData, FlowSessionUpdate};

/// What a stepper action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The cursor moved within the stepper.
    Step(String),
    /// The navigator moved to another screen. The stepper is stale.
    Screen(String),
    /// The navigator went back one screen. The stepper is stale.
    Back,
}

/// Step cursor of the stepper on the navigator's current screen.
#[derive(Debug, Clone)]
pub struct SectionStepper<'f> {
    flow: &'f FlowConfig,
    screen: &'f ScreenConfig,
    stepper: &'f StepperConfig,
    cursor: usize,
    /// Check-answers step to return to after an edit.
    return_to: Option<usize>,
}

impl<'f> SectionStepper<'f> {
    /// Open the stepper of the navigator's current screen.
    ///
    /// The cursor starts on the last step when the screen was previously
    /// completed, else on the requested initial step, else on the first.
    ///
    /// # Errors
    ///
    /// [`FlowError::NotAStepper`] when the current screen has no steps, and
    /// [`FlowError::UnknownStep`] for an initial step it does not contain.
    pub fn open(flow: &'f FlowConfig, nav: &Navigator) -> Result<Self, FlowError> {
        let screen_id = nav.current();
        let not_a_stepper = || FlowError::NotAStepper {
            screen_id: screen_id.to_string(),
        };
        let screen = flow.get(screen_id).ok_or_else(not_a_stepper)?;
        let stepper = screen.stepper.as_ref().ok_or_else(not_a_stepper)?;
        if stepper.steps.is_empty() {
            return Err(not_a_stepper());
        }

        let cursor = if nav.previously_completed(screen_id) {
            stepper.steps.len() - 1
        } else if let Some(step_id) = nav.initial_stepper_step_id() {
            stepper
                .step_index(step_id)
                .ok_or_else(|| FlowError::UnknownStep {
                    screen_id: screen_id.to_string(),
                    step_id: step_id.to_string(),
                })?
        } else {
            0
        };
        Ok(Self {
            flow,
            screen,
            stepper,
            cursor,
            return_to: None,
        })
    }

    pub fn screen_id(&self) -> &'f str {
        &self.screen.id
    }

    pub fn steps(&self) -> &'f [StepConfig] {
        &self.stepper.steps
    }

    pub fn current(&self) -> &'f StepConfig {
        &self.stepper.steps[self.cursor]
    }

    /// One-based position of the current step.
    pub fn step_number(&self) -> usize {
        self.cursor + 1
    }

    pub fn is_last_step(&self) -> bool {
        self.cursor + 1 == self.stepper.steps.len()
    }

    /// Whether an edit was started from the check-answers step.
    pub fn in_check_answers_mode(&self) -> bool {
        self.return_to.is_some()
    }

    /// Whether the stepper was opened from the review section.
    pub fn in_review_mode(&self, nav: &Navigator) -> bool {
        nav.origin() == Some(self.flow.landmarks().review_section.as_str())
    }

    /// Move the cursor to `step_id`, e.g. from a sidebar.
    pub fn go_to_step(&mut self, step_id: &str) -> Result<Transition, FlowError> {
        self.cursor = self.index_of(step_id)?;
        Ok(Transition::Step(step_id.to_string()))
    }

    /// Edit `step_id` from the current check-answers step. The next save
    /// or cancel returns here.
    pub fn edit(&mut self, step_id: &str) -> Result<Transition, FlowError> {
        let target = self.index_of(step_id)?;
        if self.current().step_type == StepType::CheckAnswers {
            self.return_to = Some(self.cursor);
        }
        self.cursor = target;
        Ok(Transition::Step(step_id.to_string()))
    }

    pub fn handle_next(
        &mut self,
        nav: &mut Navigator,
        session: &mut FlowSessionData,
        client: Option<&ClientResponse>,
    ) -> Transition {
        let landmarks = self.flow.landmarks();
        if let Some(transition) = self.leave_check_answers_mode() {
            return transition;
        }
        if self.in_review_mode(nav) {
            return self.back_to_review(nav);
        }
        if !self.is_last_step() {
            self.cursor += 1;
            return Transition::Step(self.current().id.clone());
        }
        let screen_id = self.screen_id();
        if self.current().step_type == StepType::CheckAnswers && nav.previously_completed(screen_id) {
            session.merge(FlowSessionUpdate::verifying(screen_id));
            return go(nav, &landmarks.overview, GoToConfig::default());
        }
        if nav.origin() == Some(landmarks.owners_section.as_str()) {
            return go(nav, &landmarks.owners_section, GoToConfig::default());
        }
        if screen_id == landmarks.review_section && self.current().id == landmarks.final_review_step {
            return go(nav, &landmarks.overview, GoToConfig::default());
        }

        let target = self.neighbor_section(client, 1);
        self.cursor = 0;
        match target {
            Some(section) => {
                let party = section
                    .stepper
                    .as_ref()
                    .and_then(|s| s.associated_party(client))
                    .cloned();
                go(nav, &section.id, GoToConfig::editing(party))
            }
            None => go(nav, &landmarks.overview, GoToConfig::default()),
        }
    }

    pub fn handle_prev(&mut self, nav: &mut Navigator, client: Option<&ClientResponse>) -> Transition {
        let landmarks = self.flow.landmarks();
        if let Some(transition) = self.leave_check_answers_mode() {
            return transition;
        }
        if self.in_review_mode(nav) {
            return self.back_to_review(nav);
        }
        let screen_id = self.screen_id();
        let step_type = self.current().step_type;
        if nav.origin() == Some(landmarks.owners_section.as_str())
            && screen_id != landmarks.review_section
            && (self.cursor == 0 || step_type == StepType::CheckAnswers)
        {
            nav.go_back();
            return Transition::Back;
        }
        if step_type == StepType::CheckAnswers && nav.previously_completed(screen_id) {
            return go(nav, &landmarks.overview, GoToConfig::default());
        }
        if self.can_navigate_to_prev_section(nav, client) {
            if let Some(section) = self.neighbor_section(client, -1) {
                let party = section
                    .stepper
                    .as_ref()
                    .and_then(|s| s.associated_party(client))
                    .cloned();
                return go(nav, &section.id, GoToConfig::editing(party));
            }
        }
        if screen_id == landmarks.review_section {
            return go(nav, &landmarks.overview, GoToConfig::default());
        }
        self.cursor = self.cursor.saturating_sub(1);
        Transition::Step(self.current().id.clone())
    }

    /// On the first step, having arrived from the previous section.
    pub fn can_navigate_to_prev_section(&self, nav: &Navigator, client: Option<&ClientResponse>) -> bool {
        if self.cursor != 0 || self.in_check_answers_mode() || self.in_review_mode(nav) {
            return false;
        }
        match self.neighbor_section(client, -1) {
            Some(prev) => nav.origin() == Some(prev.id.as_str()),
            None => false,
        }
    }

    /// Whether "previous" would do nothing.
    pub fn prev_disabled(&self, nav: &Navigator, client: Option<&ClientResponse>) -> bool {
        self.cursor == 0
            && !self.in_check_answers_mode()
            && !self.in_review_mode(nav)
            && nav.origin() != Some(self.flow.landmarks().owners_section.as_str())
            && !self.can_navigate_to_prev_section(nav, client)
    }

    fn leave_check_answers_mode(&mut self) -> Option<Transition> {
        let back = self.return_to.take()?;
        self.cursor = back;
        Some(Transition::Step(self.current().id.clone()))
    }

    fn back_to_review(&self, nav: &mut Navigator) -> Transition {
        let review = &self.flow.landmarks().review_section;
        let opened = self.screen.is_section().then(|| self.screen.id.clone());
        go(
            nav,
            review,
            GoToConfig {
                review_screen_opened_section_id: opened,
                ..GoToConfig::default()
            },
        )
    }

    /// The visible section `offset` positions away from this screen.
    fn neighbor_section(&self, client: Option<&ClientResponse>, offset: isize) -> Option<&'f ScreenConfig> {
        let ctx = ClientContext::resolve(client);
        let sections = self.flow.sections(ctx.entity_type.as_deref());
        let index = sections.iter().position(|s| s.id == self.screen.id)?;
        let target = index.checked_add_signed(offset)?;
        sections.get(target).copied()
    }

    fn index_of(&self, step_id: &str) -> Result<usize, FlowError> {
        self.stepper
            .step_index(step_id)
            .ok_or_else(|| FlowError::UnknownStep {
                screen_id: self.screen.id.clone(),
                step_id: step_id.to_string(),
            })
    }
}

fn go(nav: &mut Navigator, screen_id: &str, config: GoToConfig) -> Transition {
    nav.go_to(screen_id, config);
    Transition::Screen(screen_id.to_string())
}
