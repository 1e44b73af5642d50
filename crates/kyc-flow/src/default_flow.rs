//! # Default Onboarding Flow
//!
//! The standard wizard: a gateway that asks for the organization type, an
//! overview, and six sections.
//!
//! ```text
//! gateway ──▶ overview ──▶ personal-section ──▶ business-section ──▶ owners-section
//!                              │                                        │
//!                              │                               owner-stepper (per owner)
//!                              ▼
//!           additional-questions-section ──▶ review-attest-section ──▶ upload-documents-section
//! ```
//!
//! The owners section is left out for sole proprietorships, whose single
//! controller is also the beneficial owner.

use kyc_core::{PartyFilter, PartyRole, PartyType};
use kyc_mapping::PreSubmitHook;

use crate::config::{
    FlowConfig, Landmarks, PartyTemplate, ScreenConfig, SectionConfig, StepConfig, StepperConfig,
};
use crate::status::StatusStrategy;

const SOLE_PROPRIETORSHIP: &str = "SOLE_PROPRIETORSHIP";

fn individual_steps(personal_title: &str, identity_title: &str, contact_title: &str) -> Vec<StepConfig> {
    vec![
        StepConfig::form("personal-details", personal_title, "personal-details"),
        StepConfig::form("identity-document", identity_title, "identity-document"),
        StepConfig::form("contact-details", contact_title, "contact-details"),
        StepConfig::check_answers(),
    ]
}

/// Steps used for each beneficial owner.
pub fn owner_steps() -> Vec<StepConfig> {
    individual_steps("Personal details", "Identity document", "Contact details")
}

fn business_steps() -> Vec<StepConfig> {
    vec![
        StepConfig::form("industry", "Industry classification", "industry"),
        StepConfig::form("company-identification", "Business identity", "company-identification")
            .with_pre_submit(PreSubmitHook::drop_ein_without_ein()),
        StepConfig::form(
            "customer-facing-details",
            "Description & website",
            "customer-facing-details",
        ),
        StepConfig::form("contact-info", "Contact information", "contact-info"),
        StepConfig::check_answers(),
    ]
}

/// The standard onboarding flow.
pub fn default_flow() -> FlowConfig {
    let owner_filter = PartyFilter::new(PartyType::Individual, [PartyRole::BeneficialOwner]);
    let controller_filter = PartyFilter::new(PartyType::Individual, [PartyRole::Controller]);
    let organization_filter = PartyFilter::new(PartyType::Organization, [PartyRole::Client]);

    let screens = vec![
        ScreenConfig::component("gateway"),
        ScreenConfig::component("overview"),
        ScreenConfig::stepper(
            "owner-stepper",
            StepperConfig::new(owner_steps()).for_party(
                owner_filter,
                PartyTemplate::new(PartyType::Individual, [PartyRole::BeneficialOwner]),
            ),
        ),
        ScreenConfig::component("document-upload-form"),
        ScreenConfig::stepper(
            "personal-section",
            StepperConfig::new(individual_steps(
                "Your personal details",
                "Your ID details",
                "Your contact details",
            ))
            .for_party(
                controller_filter,
                PartyTemplate::new(PartyType::Individual, [PartyRole::Controller]).with_roles_for(
                    SOLE_PROPRIETORSHIP,
                    [PartyRole::Controller, PartyRole::BeneficialOwner],
                ),
            ),
        )
        .as_section(SectionConfig {
            short_label: Some("Personal details".into()),
            ..SectionConfig::new("Your personal details", StatusStrategy::PartyDetails)
        }),
        ScreenConfig::stepper(
            "business-section",
            StepperConfig::new(business_steps()).for_party(
                organization_filter,
                PartyTemplate::new(PartyType::Organization, [PartyRole::Client]),
            ),
        )
        .as_section(SectionConfig::new("Business details", StatusStrategy::PartyDetails)),
        ScreenConfig::component("owners-section").as_section(SectionConfig {
            excluded_for_entity_types: vec![SOLE_PROPRIETORSHIP.into()],
            member_stepper: Some("owner-stepper".into()),
            ..SectionConfig::new("Owners and key roles", StatusStrategy::Owners)
        }),
        ScreenConfig::component("additional-questions-section").as_section(SectionConfig::new(
            "Operational details",
            StatusStrategy::AdditionalQuestions,
        )),
        ScreenConfig::stepper(
            "review-attest-section",
            StepperConfig::new(vec![
                StepConfig::static_step("review", "Review your details"),
                StepConfig::static_step("documents", "Terms and conditions"),
            ]),
        )
        .as_section(SectionConfig::new("Review and attest", StatusStrategy::ReviewAttest)),
        ScreenConfig::component("upload-documents-section").as_section(SectionConfig::new(
            "Supporting documents",
            StatusStrategy::UploadDocuments,
        )),
    ];

    FlowConfig {
        screens,
        landmarks: Landmarks {
            upload_screens: vec!["document-upload-form".into()],
            ..Landmarks::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_schema::SchemaRegistry;

    #[test]
    fn screen_ids_are_unique() {
        let flow = default_flow();
        assert!(FlowConfig::new(flow.screens().to_vec(), flow.landmarks().clone()).is_ok());
    }

    #[test]
    fn landmarks_exist() {
        let flow = default_flow();
        let l = flow.landmarks();
        for id in [&l.gateway, &l.overview, &l.owners_section, &l.review_section, &l.upload_section] {
            assert!(flow.get(id).is_some(), "{id}");
        }
        let review = flow.get(&l.review_section).unwrap();
        assert!(review.steps().iter().any(|s| s.id == l.final_review_step));
    }

    #[test]
    fn every_form_step_names_a_builtin_schema() {
        let flow = default_flow();
        let schemas = SchemaRegistry::builtin().unwrap();
        for screen in flow.screens() {
            for step in screen.steps() {
                if let Some(schema) = &step.schema {
                    assert!(schemas.get(schema).is_ok(), "{}/{}", screen.id, step.id);
                }
            }
        }
    }

    #[test]
    fn owners_section_is_dropped_for_sole_proprietors() {
        let flow = default_flow();
        let ids: Vec<_> = flow
            .sections(Some(SOLE_PROPRIETORSHIP))
            .into_iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(
            ids,
            [
                "personal-section",
                "business-section",
                "additional-questions-section",
                "review-attest-section",
                "upload-documents-section"
            ]
        );
        assert_eq!(flow.sections(Some("LIMITED_LIABILITY_COMPANY")).len(), 6);
    }
}
