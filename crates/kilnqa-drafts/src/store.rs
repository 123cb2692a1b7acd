//! The draft store.
//!
//! [`DraftStore::register`] opts one form into draft persistence:
//!
//! 1. **Restore.** A saved draft for the form's key is decoded and every
//!    field present in both the draft and the form (secret fields excepted)
//!    gets its saved value back. A malformed draft is logged and skipped.
//! 2. **Save.** Each edit re-arms the form's flush timer. When the form has
//!    been quiet for the configured delay, the current values are encoded
//!    and written under the form's storage key.
//! 3. **Clear.** An accepted submission cancels any armed flush and deletes
//!    the saved draft.
//!
//! Each flush carries the clear generation current when its edit armed it.
//! Writes and clears of one form are serialized, and a flush whose generation
//! is stale is dropped, so a flush already running when the form is submitted
//! cannot write the draft back.
//!
//! Storage failures never reach the form: they are logged and the cycle is
//! skipped.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, error, warn};

use kilnqa_core::logging::form_span;
use kilnqa_core::{DraftSettings, QaError, QaResult};
use kilnqa_forms::{Document, FieldEdit, FormSubmission, SharedTree};
use kilnqa_signals::Subscription;

use crate::codec::DraftRecord;
use crate::debounce::{debounce, Debounced};
use crate::storage::DurableStore;

/// Persists in-progress forms to a [`DurableStore`].
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn DurableStore>,
    key_prefix: String,
    delay: Duration,
}

impl DraftStore {
    /// Creates a draft store writing through `store`.
    pub fn new(store: Arc<dyn DurableStore>, settings: &DraftSettings) -> Self {
        Self {
            store,
            key_prefix: settings.key_prefix.clone(),
            delay: Duration::from_millis(settings.quiescence_ms),
        }
    }

    /// The storage key for a draft key.
    pub fn storage_key(&self, draft_key: &str) -> String {
        format!("{}{draft_key}", self.key_prefix)
    }

    /// The quiescence delay before a flush.
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Reads and decodes the draft saved under `draft_key`.
    pub fn load(&self, draft_key: &str) -> QaResult<Option<DraftRecord>> {
        self.store
            .get(&self.storage_key(draft_key))?
            .map(|raw| DraftRecord::decode(&raw))
            .transpose()
    }

    /// Deletes the draft saved under `draft_key`. Returns `true` if one
    /// existed.
    pub fn discard(&self, draft_key: &str) -> QaResult<bool> {
        self.store.delete(&self.storage_key(draft_key))
    }

    /// Draft keys with a saved draft, sorted.
    pub fn saved_drafts(&self) -> QaResult<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.key_prefix).map(str::to_string))
            .collect())
    }

    /// Restores the saved draft into `tree` and starts tracking its edits
    /// and submissions.
    ///
    /// Must be called inside a tokio runtime, which runs the flush timers.
    pub fn register(&self, tree: &SharedTree, draft_key: &str) -> QaResult<DraftRegistration> {
        let _span = form_span(tree.form_id()).entered();

        let flusher = Arc::new(Flusher {
            store: Arc::clone(&self.store),
            tree: Arc::clone(tree),
            draft_key: draft_key.to_string(),
            storage_key: self.storage_key(draft_key),
            generation: Mutex::new(0),
        });

        let action = Arc::clone(&flusher);
        let timer = Arc::new(debounce(
            move |armed: u64| action.flush_armed(armed),
            self.delay,
        )?);

        let restored = flusher.restore();

        let on_edit = Arc::clone(&timer);
        let armer = Arc::clone(&flusher);
        let edit_subscription = tree.on_edit(Box::new(move |_: &FieldEdit| {
            on_edit.call(armer.generation());
        }));

        let on_submit = Arc::clone(&timer);
        let clearer = Arc::clone(&flusher);
        let submit_subscription = tree.on_submitted(Box::new(move |_: &FormSubmission| {
            on_submit.cancel();
            clearer.clear();
        }));

        debug!(
            form = %tree.form_id(),
            draft_key,
            restored = restored.len(),
            "draft registered"
        );

        Ok(DraftRegistration {
            flusher,
            timer,
            restored,
            subscriptions: vec![edit_subscription, submit_subscription],
        })
    }

    /// Registers every form of `document` that declares a draft key.
    pub fn register_document(&self, document: &Document) -> QaResult<Vec<DraftRegistration>> {
        document
            .draft_forms()
            .filter_map(|form| form.draft_key().map(|key| (form, key)))
            .map(|(form, key)| self.register(&form.as_tree(), key))
            .collect()
    }
}

impl fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftStore")
            .field("key_prefix", &self.key_prefix)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

/// Reads, writes and clears the draft of one registered form.
struct Flusher {
    store: Arc<dyn DurableStore>,
    tree: SharedTree,
    draft_key: String,
    storage_key: String,
    /// Bumped by every clear. Held for the whole of each write and clear.
    generation: Mutex<u64>,
}

impl Flusher {
    fn restore(&self) -> Vec<String> {
        let raw = match self.store.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                self.report(&err, "could not read draft");
                return Vec::new();
            }
        };
        let record = match DraftRecord::decode(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!(draft_key = %self.draft_key, error = %err, "ignoring malformed draft");
                return Vec::new();
            }
        };

        let mut restored = Vec::new();
        for field in self.tree.fields() {
            if field.input_type.is_secret() || !field.input_type.carries_value() {
                continue;
            }
            if restored.contains(&field.name) {
                continue;
            }
            let Some(value) = record.get(&field.name) else {
                continue;
            };
            match self.tree.set_value(&field.name, value) {
                Ok(()) => restored.push(field.name),
                Err(err) => self.report(&err, "could not restore field"),
            }
        }
        restored
    }

    fn generation(&self) -> u64 {
        *self.generation.lock().expect("draft lock poisoned")
    }

    fn write(&self) -> QaResult<()> {
        let record = DraftRecord::from_fields(&self.tree.fields());
        self.store.set(&self.storage_key, &record.encode()?)?;
        debug!(draft_key = %self.draft_key, fields = record.len(), "draft saved");
        Ok(())
    }

    /// Writes the current values now, whatever the generation.
    fn flush(&self) -> QaResult<()> {
        let _generation = self.generation.lock().expect("draft lock poisoned");
        self.write()
    }

    /// Writes the current values unless the draft was cleared after the
    /// flush was armed.
    fn flush_armed(&self, armed: u64) {
        let generation = self.generation.lock().expect("draft lock poisoned");
        if *generation != armed {
            debug!(draft_key = %self.draft_key, "skipping flush armed before clear");
            return;
        }
        if let Err(err) = self.write() {
            self.report(&err, "could not save draft");
        }
    }

    fn clear(&self) {
        let mut generation = self.generation.lock().expect("draft lock poisoned");
        *generation += 1;
        match self.store.delete(&self.storage_key) {
            Ok(existed) => debug!(draft_key = %self.draft_key, existed, "draft cleared"),
            Err(err) => self.report(&err, "could not clear draft"),
        }
    }

    /// Logs a swallowed failure: expected storage trouble as a warning,
    /// anything else as an error.
    fn report(&self, err: &QaError, message: &str) {
        if err.is_recoverable() {
            warn!(draft_key = %self.draft_key, error = %err, "{message}");
        } else {
            error!(draft_key = %self.draft_key, error = %err, "{message}");
        }
    }
}

/// Draft tracking for one form.
///
/// Dropping the registration, or calling [`dispose`](Self::dispose),
/// detaches its handlers and cancels any armed flush. The saved draft is
/// left in storage.
#[must_use = "dropping the registration stops draft tracking"]
pub struct DraftRegistration {
    flusher: Arc<Flusher>,
    timer: Arc<Debounced<u64>>,
    restored: Vec<String>,
    subscriptions: Vec<Subscription>,
}

impl DraftRegistration {
    /// The form's declared draft key.
    pub fn draft_key(&self) -> &str {
        &self.flusher.draft_key
    }

    /// The key the draft is stored under.
    pub fn storage_key(&self) -> &str {
        &self.flusher.storage_key
    }

    /// Fields that received a saved value at registration, in tree order.
    pub fn restored_fields(&self) -> &[String] {
        &self.restored
    }

    /// Returns `true` while a flush is armed.
    pub fn has_pending_flush(&self) -> bool {
        self.timer.is_pending()
    }

    /// Cancels the armed flush and writes the current values now.
    pub fn flush_now(&self) -> QaResult<()> {
        self.timer.cancel();
        self.flusher.flush()
    }

    /// Stops tracking the form.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for DraftRegistration {
    fn drop(&mut self) {
        self.subscriptions.clear();
        self.timer.cancel();
    }
}

impl fmt::Debug for DraftRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftRegistration")
            .field("draft_key", &self.flusher.draft_key)
            .field("restored", &self.restored)
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DisabledStore, MemoryStore};
    use kilnqa_forms::{Field, FieldTree, FormBuilder, FormHandle, InputType};
    use tokio::time::sleep;

    fn settings() -> DraftSettings {
        DraftSettings::default()
    }

    fn waste_form() -> FormHandle {
        FormBuilder::new("waste-form")
            .draft_key("waste_add")
            .field(Field::new("waste_type", InputType::Select).initial("kiln_dust"))
            .field(Field::new("quantity_kg", InputType::Number))
            .field(Field::new("password", InputType::Password))
            .field(Field::new("save", InputType::Submit).initial("Save"))
            .build()
    }

    #[test]
    fn test_storage_key_uses_prefix() {
        let drafts = DraftStore::new(Arc::new(MemoryStore::new()), &settings());
        assert_eq!(drafts.storage_key("waste_add"), "autosave_waste_add");
        assert_eq!(drafts.delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_load_and_discard() {
        let store = Arc::new(MemoryStore::new());
        store.set("autosave_waste_add", r#"{"quantity_kg":"12"}"#).unwrap();
        let drafts = DraftStore::new(store, &settings());

        let record = drafts.load("waste_add").unwrap().unwrap();
        assert_eq!(record.get("quantity_kg"), Some("12"));
        assert!(drafts.load("energy_add").unwrap().is_none());

        assert!(drafts.discard("waste_add").unwrap());
        assert!(drafts.load("waste_add").unwrap().is_none());
    }

    #[test]
    fn test_saved_drafts_filters_by_prefix() {
        let store = Arc::new(MemoryStore::new());
        store.set("autosave_waste_add", "{}").unwrap();
        store.set("autosave_energy_add", "{}").unwrap();
        store.set("theme", "dark").unwrap();
        let drafts = DraftStore::new(store, &settings());

        assert_eq!(drafts.saved_drafts().unwrap(), vec!["energy_add", "waste_add"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_skips_secret_fields() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                "autosave_waste_add",
                r#"{"quantity_kg":"40","password":"leaked","save":"Go","unknown":"x"}"#,
            )
            .unwrap();
        let drafts = DraftStore::new(store, &settings());
        let form = waste_form();

        let registration = drafts.register(&form.as_tree(), "waste_add").unwrap();

        assert_eq!(registration.restored_fields(), ["quantity_kg".to_string()]);
        assert_eq!(form.value("quantity_kg").as_deref(), Some("40"));
        assert_eq!(form.value("password").as_deref(), Some(""));
        assert_eq!(form.value("save").as_deref(), Some("Save"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_arms_and_flush_writes() {
        let store = Arc::new(MemoryStore::new());
        let drafts = DraftStore::new(store.clone(), &settings());
        let form = waste_form();
        let registration = drafts.register(&form.as_tree(), "waste_add").unwrap();

        form.input("quantity_kg", "75").unwrap();
        assert!(registration.has_pending_flush());
        assert_eq!(store.get("autosave_waste_add").unwrap(), None);

        sleep(Duration::from_millis(1500)).await;
        assert!(!registration.has_pending_flush());
        let record = drafts.load("waste_add").unwrap().unwrap();
        assert_eq!(record.get("quantity_kg"), Some("75"));
        assert_eq!(record.get("waste_type"), Some("kiln_dust"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now() {
        let store = Arc::new(MemoryStore::new());
        let drafts = DraftStore::new(store, &settings());
        let form = waste_form();
        let registration = drafts.register(&form.as_tree(), "waste_add").unwrap();

        form.input("quantity_kg", "5").unwrap();
        registration.flush_now().unwrap();
        assert!(!registration.has_pending_flush());
        assert_eq!(
            drafts.load("waste_add").unwrap().unwrap().get("quantity_kg"),
            Some("5")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_detaches_and_cancels() {
        let store = Arc::new(MemoryStore::new());
        let drafts = DraftStore::new(store.clone(), &settings());
        let form = waste_form();
        let registration = drafts.register(&form.as_tree(), "waste_add").unwrap();
        assert_eq!(form.edit_listener_count(), 1);

        form.input("quantity_kg", "5").unwrap();
        registration.dispose();
        assert_eq!(form.edit_listener_count(), 0);
        assert_eq!(form.submit_listener_count(), 0);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(store.get("autosave_waste_add").unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_storage_is_harmless() {
        let drafts = DraftStore::new(Arc::new(DisabledStore), &settings());
        let form = waste_form();
        let registration = drafts.register(&form.as_tree(), "waste_add").unwrap();
        assert!(registration.restored_fields().is_empty());

        form.input("quantity_kg", "5").unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert!(registration.flush_now().is_err());
        assert!(form.submit().is_submitted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_armed_before_clear_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        let drafts = DraftStore::new(store.clone(), &settings());
        let form = waste_form();
        let registration = drafts.register(&form.as_tree(), "waste_add").unwrap();

        form.input("quantity_kg", "75").unwrap();
        registration.flusher.clear();
        assert!(registration.has_pending_flush());

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(store.get("autosave_waste_add").unwrap(), None);

        // The next edit arms under the new generation.
        form.input("quantity_kg", "76").unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(
            drafts.load("waste_add").unwrap().unwrap().get("quantity_kg"),
            Some("76")
        );
    }

    /// Fails every write with an error outside the storage family.
    struct MisconfiguredStore;

    impl DurableStore for MisconfiguredStore {
        fn get(&self, _key: &str) -> QaResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> QaResult<()> {
            Err(QaError::ConfigurationError("no draft directory".into()))
        }

        fn delete(&self, _key: &str) -> QaResult<bool> {
            Err(QaError::ConfigurationError("no draft directory".into()))
        }

        fn keys(&self) -> QaResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecoverable_failures_are_still_swallowed() {
        let drafts = DraftStore::new(Arc::new(MisconfiguredStore), &settings());
        let form = waste_form();
        let registration = drafts.register(&form.as_tree(), "waste_add").unwrap();

        form.input("quantity_kg", "5").unwrap();
        sleep(Duration::from_millis(1500)).await;
        assert!(!registration.has_pending_flush());

        let err = registration.flush_now().unwrap_err();
        assert!(!err.is_recoverable());
        assert!(form.submit().is_submitted());
    }

    #[test]
    fn test_register_outside_runtime_fails() {
        let drafts = DraftStore::new(Arc::new(MemoryStore::new()), &settings());
        let form = waste_form();
        assert!(drafts.register(&form.as_tree(), "waste_add").is_err());
        assert_eq!(form.edit_listener_count(), 0);
    }
}
