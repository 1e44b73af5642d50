//! # Map Subcommand
//!
//! Prints the form values the wizard would load for one party of a client
//! fixture. Without `--party` the organization party is used.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use kyc_core::{ClientResponse, FormValues, PartyId};
use kyc_fields::FieldRegistry;
use kyc_mapping::ValueMapper;

use crate::fixture::load_client;

/// Arguments for the map subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    /// Client response JSON file.
    pub client: PathBuf,

    /// Party id. Defaults to the organization party.
    #[arg(long)]
    pub party: Option<String>,
}

/// Execute the map subcommand.
pub fn run_map(args: &MapArgs, registry: &FieldRegistry) -> Result<u8> {
    let client = load_client(&args.client)?;
    let values = party_values(&client, args.party.as_deref(), registry)?;
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(0)
}

/// Form values of `party` (or the organization) within `client`.
pub fn party_values(
    client: &ClientResponse,
    party: Option<&str>,
    registry: &FieldRegistry,
) -> Result<FormValues> {
    let party_id = match party {
        Some(id) => PartyId::new(id),
        None => client
            .organization_party()
            .map(|p| p.id.clone())
            .context("client has no organization party; pass --party")?,
    };
    if client.party(&party_id).is_none() {
        anyhow::bail!("party {party_id} not found on client {}", client.id);
    }
    Ok(ValueMapper::new(registry).to_form_values(client, Some(&party_id))?)
}
