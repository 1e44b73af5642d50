//! # Rules Subcommand
//!
//! Prints the effective rule of registry fields for a given context.
//!
//! ```bash
//! kyc rules --product MERCHANT_SERVICES --jurisdiction CA --entity-type LIMITED_LIABILITY_COMPANY dbaName
//! kyc rules --jurisdiction US controllerIds.0.idType
//! ```

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};

use kyc_core::{ClientContext, FieldPath};
use kyc_fields::FieldRegistry;

/// Arguments for the rules subcommand.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Product, e.g. EMBEDDED_PAYMENTS.
    #[arg(long)]
    pub product: Option<String>,

    /// Jurisdiction, e.g. US or CA.
    #[arg(long)]
    pub jurisdiction: Option<String>,

    /// Organization type, e.g. SOLE_PROPRIETORSHIP.
    #[arg(long)]
    pub entity_type: Option<String>,

    /// Active screen id.
    #[arg(long)]
    pub screen: Option<String>,

    /// Field names or nested form paths. All fields when empty.
    pub fields: Vec<String>,
}

impl RulesArgs {
    fn context(&self) -> ClientContext {
        ClientContext {
            product: self.product.clone(),
            jurisdiction: self.jurisdiction.clone(),
            entity_type: self.entity_type.clone(),
            screen_id: self.screen.clone(),
        }
    }
}

/// Execute the rules subcommand.
pub fn run_rules(args: &RulesArgs, registry: &FieldRegistry) -> Result<u8> {
    let rules = effective_rules(args, registry)?;
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(0)
}

/// Effective rules keyed by the requested name, in request order.
pub fn effective_rules(args: &RulesArgs, registry: &FieldRegistry) -> Result<Map<String, Value>> {
    let ctx = args.context();
    let names: Vec<String> = if args.fields.is_empty() {
        registry.iter().map(|f| f.name.clone()).collect()
    } else {
        args.fields.clone()
    };

    let mut out = Map::new();
    for name in names {
        let rule = if name.contains('.') {
            registry.rule_for_path(&FieldPath::parse(&name)?, &ctx)?
        } else {
            registry.rule(&name, &ctx)?
        };
        tracing::debug!(field = %name, visibility = ?rule.visibility(), "evaluated");
        out.insert(name, serde_json::to_value(rule)?);
    }
    Ok(out)
}
