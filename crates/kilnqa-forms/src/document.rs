//! The forms of one rendered page.

use kilnqa_core::{QaError, QaResult};

use crate::form::FormHandle;

/// A rendered page: its path and the forms on it, in document order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    path: String,
    forms: Vec<FormHandle>,
}

impl Document {
    /// Creates an empty document for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            forms: Vec::new(),
        }
    }

    /// Appends a form.
    #[must_use]
    pub fn with_form(mut self, form: FormHandle) -> Self {
        self.forms.push(form);
        self
    }

    /// The page path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All forms in document order.
    pub fn forms(&self) -> &[FormHandle] {
        &self.forms
    }

    /// Looks up a form by id.
    pub fn form(&self, id: &str) -> QaResult<&FormHandle> {
        self.forms
            .iter()
            .find(|f| f.id() == id)
            .ok_or_else(|| QaError::UnknownForm(id.to_string()))
    }

    /// Forms that declare a draft key.
    pub fn draft_forms(&self) -> impl Iterator<Item = &FormHandle> {
        self.forms.iter().filter(|f| f.draft_key().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormBuilder;

    #[test]
    fn test_form_lookup() {
        let doc = Document::new("/quality/create")
            .with_form(FormBuilder::new("search").method("get").build())
            .with_form(FormBuilder::new("test-form").draft_key("quality_create").build());

        assert_eq!(doc.path(), "/quality/create");
        assert_eq!(doc.forms().len(), 2);
        assert_eq!(doc.form("test-form").unwrap().draft_key(), Some("quality_create"));
        assert!(matches!(doc.form("nope"), Err(QaError::UnknownForm(_))));
    }

    #[test]
    fn test_draft_forms_only_lists_marked_forms() {
        let doc = Document::new("/")
            .with_form(FormBuilder::new("search").build())
            .with_form(FormBuilder::new("a").draft_key("k-a").build())
            .with_form(FormBuilder::new("b").draft_key("k-b").build());

        let ids: Vec<&str> = doc.draft_forms().map(FormHandle::id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
