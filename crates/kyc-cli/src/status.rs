//! # Status Subcommand
//!
//! Prints the overview: every section of the default flow with its status
//! and the steps that do not yet validate.
//!
//! ```bash
//! kyc status client.json
//! kyc status client.json --session session.json --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use kyc_core::FormValues;
use kyc_fields::FieldRegistry;
use kyc_flow::{default_flow, FlowProgress, FlowSessionData, StepValidator};
use kyc_schema::SchemaRegistry;

use crate::fixture::{load_client, read_json};

/// Arguments for the status subcommand.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Client response JSON file.
    pub client: PathBuf,

    /// Flow session JSON (`ownersSectionDone`, `verifyingSectionId`, ...).
    #[arg(long)]
    pub session: Option<PathBuf>,

    /// Saved in-progress form values JSON, merged under the client's data.
    #[arg(long)]
    pub saved: Option<PathBuf>,

    /// Print the full progress as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the status subcommand.
pub fn run_status(args: &StatusArgs, fields: &FieldRegistry, schemas: &SchemaRegistry) -> Result<u8> {
    let client = load_client(&args.client)?;
    let session: FlowSessionData = match &args.session {
        Some(path) => read_json(path)?,
        None => FlowSessionData::default(),
    };
    let saved: FormValues = match &args.saved {
        Some(path) => read_json(path)?,
        None => FormValues::new(),
    };

    let validator = StepValidator::new(fields, schemas);
    let progress = FlowProgress::compute(&validator, &default_flow(), &session, Some(&client), &saved)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
    } else {
        print!("{}", render(&progress));
    }
    Ok(0)
}

/// One line per visible section, followed by its invalid steps.
pub fn render(progress: &FlowProgress) -> String {
    let mut out = String::new();
    for section in progress.sections().iter().filter(|s| s.status.is_visible()) {
        out.push_str(&format!("{:<32} {}\n", section.label, section.status));
        for step in section.validation.invalid_steps() {
            out.push_str(&format!("  - {step}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_core::ClientResponse;
    use serde_json::json;

    #[test]
    fn render_lists_visible_sections_with_invalid_steps() {
        let fields = FieldRegistry::builtin().unwrap();
        let schemas = SchemaRegistry::builtin().unwrap();
        let validator = StepValidator::new(&fields, &schemas);
        let client: ClientResponse = serde_json::from_value(json!({
            "id": "c-1",
            "status": "NEW",
            "parties": [{
                "id": "org-1",
                "partyType": "ORGANIZATION",
                "roles": ["CLIENT"],
                "organizationDetails": { "organizationType": "SOLE_PROPRIETORSHIP" }
            }]
        }))
        .unwrap();

        let progress = FlowProgress::compute(
            &validator,
            &default_flow(),
            &FlowSessionData::default(),
            Some(&client),
            &FormValues::new(),
        )
        .unwrap();
        let text = render(&progress);

        assert!(text.contains("Business details"));
        assert!(text.contains("  - industry"));
        assert!(!text.contains("Owners"));
        assert!(text.contains("on_hold"));
    }
}
