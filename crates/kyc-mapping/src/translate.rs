//! # Server-Error Translator
//!
//! Attaches server validation errors to the form fields they concern.
//!
//! A server error names a JSON path into the request it rejected, such as
//! `$.parties.0.individualDetails.addresses.0.city`. The translator strips
//! the party prefix, finds the registry field whose path is the longest
//! prefix of the remainder, and re-roots the leftover suffix on the form
//! field name: `individualAddress.0.city`.
//!
//! ## Invariants
//!
//! - When the suffix does not start with an index, both `name.suffix` and
//!   `name.0.suffix` are emitted, since servers do not always echo index 0.
//! - An error whose field is itself a registered field name passes through
//!   unchanged.
//! - Every other error lands in [`TranslationReport::unhandled`] exactly
//!   once. Nothing is dropped.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use kyc_core::{ApiErrorReason, FieldPath, PathSegment};
use kyc_fields::{FieldConfig, FieldRegistry};

use crate::mapper::ArrayKey;

/// Prefix shown in front of server messages attached to form fields.
pub const SERVER_ERROR_PREFIX: &str = "Server Error: ";

/// A server message attached to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    /// Dotted form path, e.g. `controllerIds.0.value`.
    pub field: String,
    /// The server's message, verbatim.
    pub message: String,
}

impl FormError {
    /// Message as displayed next to the field.
    pub fn display_message(&self) -> String {
        format!("{SERVER_ERROR_PREFIX}{}", self.message)
    }
}

/// Outcome of translating one batch of server errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    pub errors: Vec<FormError>,
    pub unhandled: Vec<ApiErrorReason>,
}

impl TranslationReport {
    pub fn is_fully_handled(&self) -> bool {
        self.unhandled.is_empty()
    }

    /// Developer-facing notice listing every unhandled error, one per line
    /// as `path: message`.
    pub fn unhandled_notice(&self) -> Option<String> {
        if self.unhandled.is_empty() {
            return None;
        }
        let mut notice = format!(
            "{} server error(s) could not be attached to a form field:",
            self.unhandled.len()
        );
        for reason in &self.unhandled {
            let _ = write!(
                notice,
                "\n{}: {}",
                reason.field.as_deref().unwrap_or("(no field)"),
                reason.message
            );
        }
        Some(notice)
    }
}

/// Translates server errors using a field registry.
#[derive(Debug, Clone)]
pub struct ErrorTranslator<'r> {
    registry: &'r FieldRegistry,
    restrict: Option<BTreeSet<String>>,
}

impl<'r> ErrorTranslator<'r> {
    pub fn new(registry: &'r FieldRegistry) -> Self {
        Self {
            registry,
            restrict: None,
        }
    }

    /// Only attach errors to `fields`. When two registry fields share a
    /// path, this picks the one present on the active form.
    pub fn restrict_to<'a>(mut self, fields: impl IntoIterator<Item = &'a str>) -> Self {
        self.restrict = Some(fields.into_iter().map(str::to_string).collect());
        self
    }

    /// Translate errors raised by a client update that wrote the party at
    /// `{array_key}.{party_index}`.
    pub fn translate_errors(
        &self,
        errors: &[ApiErrorReason],
        party_index: usize,
        array_key: ArrayKey,
    ) -> TranslationReport {
        let prefixes = [array_key.prefix(party_index)];
        self.translate(errors, &prefixes)
    }

    /// Translate errors raised by a direct party update.
    pub fn translate_party_errors(&self, errors: &[ApiErrorReason]) -> TranslationReport {
        let prefixes = [FieldPath::root().child("party"), FieldPath::root()];
        self.translate(errors, &prefixes)
    }

    fn translate(&self, errors: &[ApiErrorReason], prefixes: &[FieldPath]) -> TranslationReport {
        let mut report = TranslationReport::default();
        for reason in errors {
            match self.translate_one(reason, prefixes) {
                Some(found) => report.errors.extend(found),
                None => {
                    tracing::warn!(
                        field = reason.field.as_deref().unwrap_or(""),
                        message = %reason.message,
                        "unhandled server validation error"
                    );
                    report.unhandled.push(reason.clone());
                }
            }
        }
        report
    }

    fn translate_one(&self, reason: &ApiErrorReason, prefixes: &[FieldPath]) -> Option<Vec<FormError>> {
        let raw = reason.field.as_deref()?;
        let error = |field: String| FormError {
            field,
            message: reason.message.clone(),
        };

        if let Ok(path) = FieldPath::parse(raw) {
            for prefix in prefixes {
                let Some(rest) = path.strip_prefix(prefix) else {
                    continue;
                };
                if let Some((config, suffix)) = self.best_match(&rest) {
                    return Some(form_paths(config, &suffix).into_iter().map(error).collect());
                }
            }
        }

        let bare = raw.strip_prefix("$.").unwrap_or(raw);
        if self.registry.contains(bare) && self.allowed(bare) {
            return Some(vec![error(bare.to_string())]);
        }
        None
    }

    /// The allowed mapped field whose path is the longest prefix of `rest`,
    /// with the remaining suffix. Ties go to the first declared.
    fn best_match(&self, rest: &FieldPath) -> Option<(&'r FieldConfig, FieldPath)> {
        let mut best: Option<(&'r FieldConfig, FieldPath, usize)> = None;
        for config in self.registry.mapped() {
            if !self.allowed(&config.name) {
                continue;
            }
            let Some(path) = &config.path else { continue };
            let Some(suffix) = rest.strip_prefix(path) else {
                continue;
            };
            if best.as_ref().map_or(true, |(_, _, len)| path.len() > *len) {
                best = Some((config, suffix, path.len()));
            }
        }
        best.map(|(config, suffix, _)| (config, suffix))
    }

    fn allowed(&self, name: &str) -> bool {
        self.restrict.as_ref().map_or(true, |r| r.contains(name))
    }
}

/// Form paths for an error `suffix` below `config`'s path.
fn form_paths(config: &FieldConfig, suffix: &FieldPath) -> Vec<String> {
    let suffix = match config.error_rewrite {
        Some(rewrite) => rewrite.apply(suffix),
        None => suffix.clone(),
    };
    let base = FieldPath::root().child(config.name.as_str());
    let direct = base.join(&suffix).to_string();
    match suffix.segments().first() {
        Some(first) if !first.is_index => {
            let indexed = FieldPath::from_segments(
                std::iter::once(PathSegment::key(config.name.as_str()))
                    .chain(std::iter::once(PathSegment::index(0)))
                    .chain(suffix.segments().iter().cloned())
                    .collect(),
            );
            vec![direct, indexed.to_string()]
        }
        _ => vec![direct],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FieldRegistry {
        FieldRegistry::builtin().unwrap()
    }

    fn fields(report: &TranslationReport) -> Vec<&str> {
        report.errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn party_prefix_is_stripped_and_field_renamed() {
        let registry = registry();
        let translator = ErrorTranslator::new(&registry);
        let report = translator.translate_errors(
            &[ApiErrorReason::new("$.parties.1.individualDetails.firstName", "too long")],
            1,
            ArrayKey::Parties,
        );
        assert_eq!(fields(&report), ["controllerFirstName"]);
        assert_eq!(report.errors[0].display_message(), "Server Error: too long");
        assert!(report.is_fully_handled());
    }

    #[test]
    fn missing_index_emits_both_variants() {
        let registry = registry();
        let translator = ErrorTranslator::new(&registry);
        let report = translator.translate_errors(
            &[ApiErrorReason::new("$.addParties.0.organizationDetails.addresses.city", "required")],
            0,
            ArrayKey::AddParties,
        );
        assert_eq!(fields(&report), ["organizationAddress.city", "organizationAddress.0.city"]);
    }

    #[test]
    fn echoed_index_is_kept() {
        let registry = registry();
        let translator = ErrorTranslator::new(&registry).restrict_to(["controllerIds"]);
        let report = translator.translate_errors(
            &[ApiErrorReason::new("$.parties.0.individualDetails.individualIds.0.value", "bad")],
            0,
            ArrayKey::Parties,
        );
        assert_eq!(fields(&report), ["controllerIds.0.value"]);
    }

    #[test]
    fn address_lines_are_renamed() {
        let registry = registry();
        let translator = ErrorTranslator::new(&registry);
        let report = translator.translate_party_errors(&[ApiErrorReason::new(
            "$.party.individualDetails.addresses.0.addressLines.1",
            "too long",
        )]);
        assert_eq!(fields(&report), ["individualAddress.0.secondaryAddressLine"]);
    }

    #[test]
    fn party_variant_accepts_bare_paths() {
        let registry = registry();
        let translator = ErrorTranslator::new(&registry);
        let report = translator
            .translate_party_errors(&[ApiErrorReason::new("$.organizationDetails.dbaName", "x")]);
        assert_eq!(fields(&report), ["dbaName"]);
    }

    #[test]
    fn restriction_selects_the_field_on_the_form() {
        let registry = registry();
        let error = [ApiErrorReason::new("$.party.email", "invalid email")];

        let org = ErrorTranslator::new(&registry).restrict_to(["organizationEmail", "organizationPhone"]);
        assert_eq!(fields(&org.translate_party_errors(&error)), ["organizationEmail"]);

        let person = ErrorTranslator::new(&registry).restrict_to(["controllerEmail"]);
        assert_eq!(fields(&person.translate_party_errors(&error)), ["controllerEmail"]);
    }

    #[test]
    fn registered_names_pass_through() {
        let registry = registry();
        let translator = ErrorTranslator::new(&registry);
        let report = translator.translate_party_errors(&[ApiErrorReason::new("dbaNameNotAvailable", "x")]);
        assert_eq!(fields(&report), ["dbaNameNotAvailable"]);
    }

    #[test]
    fn unmatched_errors_are_reported_once() {
        let registry = registry();
        let translator = ErrorTranslator::new(&registry);
        let report = translator.translate_errors(
            &[
                ApiErrorReason::new("$.parties.0.shoeSize", "unsupported"),
                ApiErrorReason::new("$.parties.0.individualDetails.firstName", "required"),
                ApiErrorReason::new("$.parties.3.individualDetails.firstName", "other party"),
            ],
            0,
            ArrayKey::Parties,
        );
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.unhandled.len(), 2);
        assert_eq!(
            report.unhandled_notice().unwrap(),
            "2 server error(s) could not be attached to a form field:\n\
             $.parties.0.shoeSize: unsupported\n\
             $.parties.3.individualDetails.firstName: other party"
        );
    }

    #[test]
    fn errors_without_a_field_are_unhandled() {
        let registry = registry();
        let translator = ErrorTranslator::new(&registry);
        let reason = ApiErrorReason {
            field: None,
            message: "Client is locked".into(),
            code: None,
        };
        let report = translator.translate_party_errors(&[reason]);
        assert_eq!(report.unhandled.len(), 1);
        assert!(report.errors.is_empty());
    }
}
