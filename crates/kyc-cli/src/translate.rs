//! # Translate Subcommand
//!
//! Attaches the reasons of a server error response to form fields.
//! Exits with 1 when any reason cannot be attached.
//!
//! ```bash
//! kyc translate error.json --party-index 1
//! kyc translate error.json --array-key add-parties
//! kyc translate error.json --party --field controllerFirstName --field controllerLastName
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Deserialize;

use kyc_core::{ApiErrorBody, ApiErrorReason};
use kyc_fields::FieldRegistry;
use kyc_mapping::{ArrayKey, ErrorTranslator, TranslationReport};

use crate::fixture::read_json;

/// Which party list the rejected request wrote into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArrayKeyArg {
    Parties,
    AddParties,
}

impl From<ArrayKeyArg> for ArrayKey {
    fn from(arg: ArrayKeyArg) -> Self {
        match arg {
            ArrayKeyArg::Parties => ArrayKey::Parties,
            ArrayKeyArg::AddParties => ArrayKey::AddParties,
        }
    }
}

/// Arguments for the translate subcommand.
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Error JSON: an API error body with a `context` array, or a bare
    /// array of reasons.
    pub errors: PathBuf,

    /// Index of the party in the rejected request.
    #[arg(long, default_value_t = 0)]
    pub party_index: usize,

    /// Party list of the rejected request.
    #[arg(long, value_enum, default_value_t = ArrayKeyArg::Parties)]
    pub array_key: ArrayKeyArg,

    /// The request was a direct party update.
    #[arg(long, conflicts_with_all = ["party_index", "array_key"])]
    pub party: bool,

    /// Restrict to these form fields.
    #[arg(long = "field")]
    pub fields: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorFile {
    Body(ApiErrorBody),
    Reasons(Vec<ApiErrorReason>),
}

impl ErrorFile {
    fn into_reasons(self) -> Vec<ApiErrorReason> {
        match self {
            Self::Body(body) => body.context,
            Self::Reasons(reasons) => reasons,
        }
    }
}

/// Execute the translate subcommand.
pub fn run_translate(args: &TranslateArgs, registry: &FieldRegistry) -> Result<u8> {
    let file: ErrorFile = read_json(&args.errors)?;
    let report = translate(args, registry, &file.into_reasons());

    for error in &report.errors {
        println!("{}: {}", error.field, error.display_message());
    }
    match report.unhandled_notice() {
        Some(notice) => {
            eprintln!("{notice}");
            Ok(1)
        }
        None => Ok(0),
    }
}

/// Translate `reasons` as the arguments describe.
pub fn translate(
    args: &TranslateArgs,
    registry: &FieldRegistry,
    reasons: &[ApiErrorReason],
) -> TranslationReport {
    let mut translator = ErrorTranslator::new(registry);
    if !args.fields.is_empty() {
        translator = translator.restrict_to(args.fields.iter().map(String::as_str));
    }
    if args.party {
        translator.translate_party_errors(reasons)
    } else {
        translator.translate_errors(reasons, args.party_index, args.array_key.into())
    }
}
