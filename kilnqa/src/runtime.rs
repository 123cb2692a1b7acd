//! The page-ready sequence.
//!
//! A [`QaRuntime`] is built once from [`Settings`] and holds the validation
//! engine and the draft store. [`QaRuntime::ready`] runs for every rendered
//! page: validation is attached to every form first, then every form that
//! declares a draft key is registered (and has its draft restored). The
//! returned [`Page`] owns every handler until it is closed or dropped.

use tracing::{debug, info};

use kilnqa_core::logging::page_span;
use kilnqa_core::{QaResult, Settings};
use kilnqa_drafts::{store_from_settings, DraftRegistration, DraftStore};
use kilnqa_forms::{Attachment, Document, FormHandle, ValidationEngine};

/// The validation engine and draft store shared by every page.
#[derive(Debug, Clone)]
pub struct QaRuntime {
    engine: ValidationEngine,
    drafts: DraftStore,
}

impl QaRuntime {
    /// Builds the runtime from explicit parts.
    pub const fn new(engine: ValidationEngine, drafts: DraftStore) -> Self {
        Self { engine, drafts }
    }

    /// Builds the engine, the storage backend and the draft store.
    ///
    /// # Examples
    ///
    /// ```
    /// use kilnqa::core::Settings;
    /// use kilnqa::QaRuntime;
    ///
    /// let runtime = QaRuntime::from_settings(&Settings::default()).unwrap();
    /// assert!(!runtime.engine().validate("kiln_temperature", "650").is_valid());
    /// ```
    pub fn from_settings(settings: &Settings) -> QaResult<Self> {
        let store = store_from_settings(&settings.drafts)?;
        Ok(Self::new(
            ValidationEngine::from_settings(&settings.validation),
            DraftStore::new(store, &settings.drafts),
        ))
    }

    /// The validation engine.
    pub const fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// The draft store.
    pub const fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    /// Runs the page-ready sequence for `document`.
    ///
    /// Must be called inside a tokio runtime, which runs the flush timers.
    pub fn ready(&self, document: Document) -> QaResult<Page> {
        let span = page_span(document.path());
        let entered = span.enter();

        let attachments = self.engine.attach_document(&document);
        let registrations = self.drafts.register_document(&document)?;

        info!(
            forms = document.forms().len(),
            drafts = registrations.len(),
            restored = registrations
                .iter()
                .map(|r| r.restored_fields().len())
                .sum::<usize>(),
            "page ready"
        );

        drop(entered);
        Ok(Page {
            document,
            attachments,
            registrations,
            span,
        })
    }
}

/// A page after the ready sequence: its forms and every handler attached to
/// them.
#[derive(Debug)]
pub struct Page {
    document: Document,
    attachments: Vec<Attachment>,
    registrations: Vec<DraftRegistration>,
    span: tracing::Span,
}

impl Page {
    /// The page's document.
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Looks up a form by id.
    pub fn form(&self, id: &str) -> QaResult<&FormHandle> {
        self.document.form(id)
    }

    /// One validation attachment per form, in document order.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Draft registrations, in document order.
    pub fn registrations(&self) -> &[DraftRegistration] {
        &self.registrations
    }

    /// The registration for a draft key.
    pub fn registration(&self, draft_key: &str) -> Option<&DraftRegistration> {
        self.registrations
            .iter()
            .find(|r| r.draft_key() == draft_key)
    }

    /// Detaches every handler and cancels armed flushes. Saved drafts stay
    /// in storage.
    pub fn close(self) {
        let _entered = self.span.enter();
        for registration in self.registrations {
            registration.dispose();
        }
        for attachment in self.attachments {
            attachment.detach();
        }
        debug!("page closed");
    }
}
