//! The validation engine.
//!
//! [`ValidationEngine::attach`] scans a field tree once and subscribes to it:
//!
//! - every edit of a field governed by a rule re-runs that rule against the
//!   new value and writes the result as the field's custom validity message
//!   (an empty message clears a previous error);
//! - every submit attempt runs the host's aggregate validity check, and if it
//!   fails the attempt is cancelled and the form gets the
//!   [`VALIDATED_CLASS`] marker so every current error can be styled at once.
//!
//! Fields are matched by name at attach time. Fields added to the tree later
//! are not validated until the tree is attached again.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use kilnqa_core::logging::form_span;
use kilnqa_core::ValidationSettings;
use kilnqa_signals::Subscription;

use crate::document::Document;
use crate::rules::{FieldRule, RuleSet, ValidityResult};
use crate::tree::{FieldEdit, SharedTree, SubmitAttempt};

/// Class applied to a form whose submission was blocked by invalid fields.
pub const VALIDATED_CLASS: &str = "was-validated";

/// Attaches domain rules to field trees.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    rules: Arc<RuleSet>,
}

impl ValidationEngine {
    /// Creates an engine over the given rules.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Creates an engine with the standard rules and configured bounds.
    pub fn from_settings(settings: &ValidationSettings) -> Self {
        Self::new(RuleSet::standard(settings))
    }

    /// The engine's rules.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Checks a raw value against the rule governing `name`, if any.
    pub fn validate(&self, name: &str, raw: &str) -> ValidityResult {
        self.rules
            .rule_for(name)
            .map_or(ValidityResult::Valid, |rule| rule.check(raw))
    }

    /// Scans `tree` and registers the edit and submit handlers.
    ///
    /// The handlers stay registered until the returned [`Attachment`] is
    /// dropped or detached.
    pub fn attach(&self, tree: &SharedTree) -> Attachment {
        let _span = form_span(tree.form_id()).entered();

        let matched: HashMap<String, FieldRule> = tree
            .fields()
            .into_iter()
            .filter_map(|field| {
                self.rules
                    .rule_for(&field.name)
                    .map(|rule| (field.name, rule.clone()))
            })
            .collect();

        let mut matched_fields: Vec<String> = matched.keys().cloned().collect();
        matched_fields.sort();

        let mut subscriptions = Vec::with_capacity(2);

        if !matched.is_empty() {
            let target = Arc::clone(tree);
            subscriptions.push(tree.on_edit(Box::new(move |edit: &FieldEdit| {
                let Some(rule) = matched.get(&edit.name) else {
                    return;
                };
                let result = rule.check(&edit.value);
                if let Err(err) = target.set_custom_validity(&edit.name, result.message()) {
                    warn!(field = %edit.name, error = %err, "could not set validity message");
                }
            })));
        }

        let target = Arc::clone(tree);
        subscriptions.push(tree.on_submit_attempt(Box::new(move |attempt: &SubmitAttempt| {
            if !target.check_validity() {
                attempt.prevent_default();
                target.add_class(VALIDATED_CLASS);
                debug!(form = %attempt.form_id, "submit cancelled: invalid fields");
            }
        })));

        debug!(
            form = %tree.form_id(),
            matched = matched_fields.len(),
            "validation attached"
        );

        Attachment {
            form_id: tree.form_id().to_string(),
            matched_fields,
            subscriptions,
        }
    }

    /// Attaches to every form of a document.
    pub fn attach_document(&self, document: &Document) -> Vec<Attachment> {
        document
            .forms()
            .iter()
            .map(|form| self.attach(&form.as_tree()))
            .collect()
    }
}

/// The handlers the engine registered on one form.
#[must_use = "dropping the attachment removes the validation handlers"]
#[derive(Debug)]
pub struct Attachment {
    form_id: String,
    matched_fields: Vec<String>,
    subscriptions: Vec<Subscription>,
}

impl Attachment {
    /// The attached form.
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Names of the fields governed by a rule, sorted.
    pub fn matched_fields(&self) -> &[String] {
        &self.matched_fields
    }

    /// Removes every handler now.
    pub fn detach(self) {
        for subscription in self.subscriptions {
            subscription.dispose();
        }
    }
}
