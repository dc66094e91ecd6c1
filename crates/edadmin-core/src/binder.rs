// ── Load/save binder ──
//
// A `Binding` declares how one editable record is loaded and persisted: its
// initial value, the `get` loader, optional `post` / `patch` savers, named
// `extra` loaders for supporting data, and field fix-ups. Mounting a binding
// on a `Location` produces a `Binder` that owns the record state, publishes
// snapshots through a `watch` channel, and reports failures to a `Notifier`.
//
// Concurrency rules:
// - `get` and every extra run concurrently and are joined.
// - Overlapping loads are last-write-wins: each load takes a generation
//   number and only the newest may apply results or clear `is_loading`.
// - At most one save is in flight; a second one is rejected.
// - `unmount` cancels in-flight work and later responses are dropped.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, oneshot, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::location::{Location, Params, RETURN_TO_PARAM, RecordId};
use crate::notify::Notifier;
use crate::patch::Patch;
use crate::viewstate::TABLESTATE_PARAM;

/// Anything a binder can hold.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Entity for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Query parameters that describe navigation, not record fields.
const NAVIGATION_PARAMS: &[&str] = &[TABLESTATE_PARAM, RETURN_TO_PARAM];

type GetFn<T> = Arc<dyn Fn(Params) -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;
type SaveFn = Arc<dyn Fn(SaveRequest) -> BoxFuture<'static, Result<Value, CoreError>> + Send + Sync>;
type ExtraFn = Arc<dyn Fn(Params) -> BoxFuture<'static, Result<Value, CoreError>> + Send + Sync>;
type LoadedFn<T> = Arc<dyn Fn(&BinderState<T>) + Send + Sync>;

/// What a `post` / `patch` saver receives.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub id: RecordId,
    pub params: Params,
    /// The entity as JSON, with any per-save extra fields merged in.
    pub data: Value,
}

/// Server payload returned by a save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveResponse(pub Value);

impl SaveResponse {
    /// The record id in the response (created records echo it back).
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Result of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// False when a newer load superseded this one.
    pub applied: bool,
    /// Extras that failed; their previous values are gone.
    pub extra_failures: Vec<String>,
}

/// Result of [`Binder::form_submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub response: SaveResponse,
    /// The submit asked to leave the screen.
    pub close: bool,
    /// Edit location of a newly created record.
    pub created: Option<Location>,
}

/// Snapshot of a binder's state.
#[derive(Debug, Clone, PartialEq)]
pub struct BinderState<T> {
    pub id: RecordId,
    pub data: T,
    pub extra: IndexMap<String, Value>,
    pub is_loading: bool,
    pub is_saving: bool,
}

// ── Binding (declaration) ────────────────────────────────────────────

/// Declarative load/save configuration for one record type.
pub struct Binding<T> {
    initial: T,
    get: Option<GetFn<T>>,
    post: Option<SaveFn>,
    patch: Option<SaveFn>,
    extras: IndexMap<String, ExtraFn>,
    extra_merge: IndexMap<String, String>,
    merge: Map<String, Value>,
    on_load: Option<LoadedFn<T>>,
}

impl<T> Clone for Binding<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            initial: self.initial.clone(),
            get: self.get.clone(),
            post: self.post.clone(),
            patch: self.patch.clone(),
            extras: self.extras.clone(),
            extra_merge: self.extra_merge.clone(),
            merge: self.merge.clone(),
            on_load: self.on_load.clone(),
        }
    }
}

impl<T: Entity> Binding<T> {
    pub fn new(initial: T) -> Self {
        Self {
            initial,
            get: None,
            post: None,
            patch: None,
            extras: IndexMap::new(),
            extra_merge: IndexMap::new(),
            merge: Map::new(),
            on_load: None,
        }
    }

    /// Loader for the record. Not called in create-mode.
    pub fn get<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        self.get = Some(Arc::new(move |p| f(p).boxed()));
        self
    }

    /// Saver for create-mode (`id=new`).
    pub fn post<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(SaveRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CoreError>> + Send + 'static,
    {
        self.post = Some(Arc::new(move |r| f(r).boxed()));
        self
    }

    /// Saver for existing records and singleton documents.
    pub fn patch<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(SaveRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CoreError>> + Send + 'static,
    {
        self.patch = Some(Arc::new(move |r| f(r).boxed()));
        self
    }

    /// Named supporting data loaded alongside the record.
    pub fn extra<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CoreError>> + Send + 'static,
    {
        self.extras
            .insert(name.into(), Arc::new(move |p| f(p).boxed()));
        self
    }

    /// Runs after every load that was not superseded, once `is_loading`
    /// has cleared, whether the load succeeded or not.
    pub fn on_load<F>(mut self, f: F) -> Self
    where
        F: Fn(&BinderState<T>) + Send + Sync + 'static,
    {
        self.on_load = Some(Arc::new(f));
        self
    }

    /// After each load, point `field` at an id from extra list `list`
    /// when it is empty or stale (first id, or `""` if the list is empty).
    pub fn extra_merge(mut self, field: impl Into<String>, list: impl Into<String>) -> Self {
        self.extra_merge.insert(field.into(), list.into());
        self
    }

    /// Static field values merged into the record on mount and each load.
    pub fn merge(mut self, field: impl Into<String>, value: Value) -> Self {
        self.merge.insert(field.into(), value);
        self
    }

    pub fn has_extra(&self, name: &str) -> bool {
        self.extras.contains_key(name)
    }

    /// Mount on `location` and start the first load.
    ///
    /// Must be called inside a Tokio runtime. Await [`Binder::ready`] for
    /// the outcome of the first load.
    pub fn mount(self, location: &Location, notifier: Notifier) -> Binder<T> {
        let params = location.params();
        let initial = merge_params(&self.initial, &params, &self.merge);

        let (state, _) = watch::channel(BinderState {
            id: params.id.clone(),
            data: initial.clone(),
            extra: IndexMap::new(),
            is_loading: true,
            is_saving: false,
        });

        let (done_tx, done_rx) = oneshot::channel();
        let binder = Binder {
            inner: Arc::new(BinderInner {
                binding: self,
                location: location.clone(),
                params,
                initial,
                state,
                notifier,
                generation: AtomicU64::new(0),
                saving: AtomicBool::new(false),
                close_requested: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                first_load: Mutex::new(Some(done_rx)),
            }),
        };

        let task = binder.clone();
        tokio::spawn(async move {
            let result = task.reload().await;
            // The receiver is gone if nobody waits for `ready`.
            let _ = done_tx.send(result);
        });

        binder
    }
}

// ── Binder (mounted instance) ────────────────────────────────────────

struct BinderInner<T> {
    binding: Binding<T>,
    location: Location,
    params: Params,
    /// `initial` with params and static merge applied.
    initial: T,
    state: watch::Sender<BinderState<T>>,
    notifier: Notifier,
    generation: AtomicU64,
    saving: AtomicBool,
    close_requested: AtomicBool,
    cancel: CancellationToken,
    first_load: Mutex<Option<oneshot::Receiver<Result<LoadOutcome, CoreError>>>>,
}

/// A mounted binding. Clones share state.
pub struct Binder<T> {
    inner: Arc<BinderInner<T>>,
}

impl<T> Clone for Binder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Entity> Binder<T> {
    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> RecordId {
        self.inner.params.id.clone()
    }

    pub fn location(&self) -> &Location {
        &self.inner.location
    }

    pub fn state(&self) -> BinderState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn data(&self) -> T {
        self.inner.state.borrow().data.clone()
    }

    pub fn extra(&self, name: &str) -> Option<Value> {
        self.inner.state.borrow().extra.get(name).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    pub fn is_saving(&self) -> bool {
        self.inner.state.borrow().is_saving
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    pub fn subscribe(&self) -> watch::Receiver<BinderState<T>> {
        self.inner.state.subscribe()
    }

    /// State snapshots as a `Stream`, starting with the current one.
    pub fn stream(&self) -> WatchStream<BinderState<T>> {
        WatchStream::new(self.inner.state.subscribe())
    }

    /// Wait for the load started by [`Binding::mount`].
    ///
    /// Later calls return immediately with an empty outcome.
    pub async fn ready(&self) -> Result<LoadOutcome, CoreError> {
        let pending = self.inner.first_load.lock().await.take();
        match pending {
            Some(rx) => rx.await.unwrap_or(Err(CoreError::Unmounted)),
            None => Ok(LoadOutcome::default()),
        }
    }

    fn ensure_mounted(&self) -> Result<(), CoreError> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(CoreError::Unmounted)
        }
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Re-run `get` and every extra, replacing `data` and `extra`.
    ///
    /// Unsaved edits are discarded; in create-mode `data` goes back to the
    /// initial value.
    pub async fn reload(&self) -> Result<LoadOutcome, CoreError> {
        self.ensure_mounted()?;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.load(generation).await;

        let current = self.inner.generation.load(Ordering::SeqCst) == generation;
        let on_load = self
            .inner
            .binding
            .on_load
            .as_ref()
            .filter(|_| current && self.is_mounted());
        if let Some(on_load) = on_load {
            on_load(&self.state());
        }
        result
    }

    async fn load(&self, generation: u64) -> Result<LoadOutcome, CoreError> {
        let inner = &self.inner;
        inner.state.send_if_modified(|s| !std::mem::replace(&mut s.is_loading, true));
        let _loading = LoadingGuard {
            inner,
            generation,
        };

        let params = inner.params.clone();
        let work = future::join(self.load_primary(&params), self.load_extras(&params));
        let (primary, (extras, extra_failures)) = tokio::select! {
            () = inner.cancel.cancelled() => return Err(CoreError::Unmounted),
            out = work => out,
        };

        if inner.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding superseded load");
            return Ok(LoadOutcome {
                applied: false,
                extra_failures,
            });
        }

        match primary {
            Ok(loaded) => {
                inner.state.send_modify(|s| {
                    let base = loaded.unwrap_or_else(|| s.data.clone());
                    s.data = apply_extra_merge(base, &extras, &inner.binding.extra_merge);
                    s.extra = extras;
                });
                Ok(LoadOutcome {
                    applied: true,
                    extra_failures,
                })
            }
            Err(e) => {
                inner.state.send_modify(|s| s.extra = extras);
                inner.notifier.error(format!("Failed to load: {e}"));
                Err(e)
            }
        }
    }

    /// Re-run only the extra loaders and re-resolve `extra_merge` fields.
    ///
    /// Dropped if a full [`reload`](Self::reload) starts while it runs.
    pub async fn reload_extra(&self) -> Result<LoadOutcome, CoreError> {
        self.ensure_mounted()?;
        let inner = &self.inner;
        let generation = inner.generation.load(Ordering::SeqCst);
        let params = inner.params.clone();
        let (extras, extra_failures) = tokio::select! {
            () = inner.cancel.cancelled() => return Err(CoreError::Unmounted),
            out = self.load_extras(&params) => out,
        };

        if inner.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding extras from before a newer load");
            return Ok(LoadOutcome {
                applied: false,
                extra_failures,
            });
        }
        inner.state.send_modify(|s| {
            s.data = apply_extra_merge(s.data.clone(), &extras, &inner.binding.extra_merge);
            s.extra = extras;
        });
        Ok(LoadOutcome {
            applied: true,
            extra_failures,
        })
    }

    /// `Some(entity)` to replace data, `None` to keep it.
    async fn load_primary(&self, params: &Params) -> Result<Option<T>, CoreError> {
        let inner = &self.inner;
        if params.id.is_new() {
            return Ok(Some(inner.initial.clone()));
        }
        let Some(get) = inner.binding.get.clone() else {
            return Ok(None);
        };
        let loaded = get(params.clone()).await?;
        Ok(Some(merge_params(&loaded, params, &inner.binding.merge)))
    }

    async fn load_extras(&self, params: &Params) -> (IndexMap<String, Value>, Vec<String>) {
        let inner = &self.inner;
        let loads = inner.binding.extras.iter().map(|(name, f)| {
            let fut = f(params.clone());
            async move { (name.clone(), fut.await) }
        });

        let mut values = IndexMap::new();
        let mut failures = Vec::new();
        for (name, result) in future::join_all(loads).await {
            match result {
                Ok(value) => {
                    values.insert(name, value);
                }
                Err(e) => {
                    warn!(extra = %name, error = %e, "extra loader failed");
                    inner.notifier.error(format!("Failed to load {name}: {e}"));
                    failures.push(name);
                }
            }
        }
        (values, failures)
    }

    // ── Editing ──────────────────────────────────────────────────────

    /// Apply a patch to the entity. Nothing changes if the patch fails.
    pub fn update(&self, patch: &Patch) -> Result<(), CoreError> {
        self.update_with(|data| Ok(patch.apply_to(data)?))
    }

    /// [`update`](Self::update), then run `then` with the committed entity.
    pub fn update_then<F>(&self, patch: &Patch, then: F) -> Result<(), CoreError>
    where
        F: FnOnce(&T),
    {
        self.update(patch)?;
        then(&self.data());
        Ok(())
    }

    /// Derive the next entity with a closure.
    pub fn update_with<F>(&self, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&T) -> Result<T, CoreError>,
    {
        self.ensure_mounted()?;
        let mut outcome = Ok(());
        self.inner.state.send_if_modified(|s| match f(&s.data) {
            Ok(next) => {
                s.data = next;
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        if let Err(ref e) = outcome {
            warn!(error = %e, "update rejected");
        }
        outcome
    }

    // ── Saving ───────────────────────────────────────────────────────

    /// Persist the entity: `post` in create-mode, `patch` otherwise.
    ///
    /// `extra_fields` are merged into the outgoing payload only.
    pub async fn save(&self, extra_fields: Option<Map<String, Value>>) -> Result<SaveResponse, CoreError> {
        self.ensure_mounted()?;
        let inner = &self.inner;

        let id = inner.params.id.clone();
        let (saver, operation) = if id.is_new() {
            (inner.binding.post.clone(), "create")
        } else {
            (inner.binding.patch.clone(), "update")
        };
        let saver = saver.ok_or_else(|| CoreError::Unsupported {
            operation: format!("{operation} is not available here"),
        })?;

        if inner
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoreError::SaveInProgress);
        }
        let _saving = SavingGuard::engage(inner);

        let mut data = serde_json::to_value(self.data())?;
        if let (Some(fields), Value::Object(obj)) = (extra_fields, &mut data) {
            obj.extend(fields);
        }
        let request = SaveRequest {
            id,
            params: inner.params.clone(),
            data,
        };

        debug!(operation, "saving");
        let result = tokio::select! {
            () = inner.cancel.cancelled() => return Err(CoreError::Unmounted),
            r = saver(request) => r,
        };

        match result {
            Ok(value) => Ok(SaveResponse(value)),
            Err(e) => {
                inner.notifier.error(format!("Save failed: {e}"));
                Err(e)
            }
        }
    }

    /// Save, remembering whether the caller wants to leave the screen.
    pub async fn form_submit(&self, close: bool) -> Result<SubmitOutcome, CoreError> {
        self.inner.close_requested.store(close, Ordering::SeqCst);
        let response = self.save(None).await?;
        let created = if self.inner.params.id.is_new() {
            response.id().map(|id| self.inner.location.edit_location(&id))
        } else {
            None
        };
        Ok(SubmitOutcome {
            response,
            close,
            created,
        })
    }

    /// Whether the last [`form_submit`](Self::form_submit) asked to close.
    pub fn form_close(&self) -> bool {
        self.inner.close_requested.load(Ordering::SeqCst)
    }

    /// Cancel in-flight work; later responses are not applied.
    pub fn unmount(&self) {
        debug!(location = %self.inner.location, "unmounting binder");
        self.inner.cancel.cancel();
    }
}

// ── Guards ───────────────────────────────────────────────────────────

struct LoadingGuard<'a, T> {
    inner: &'a BinderInner<T>,
    generation: u64,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if self.inner.generation.load(Ordering::SeqCst) == self.generation {
            self.inner
                .state
                .send_if_modified(|s| std::mem::replace(&mut s.is_loading, false));
        }
    }
}

struct SavingGuard<'a, T> {
    inner: &'a BinderInner<T>,
}

impl<'a, T> SavingGuard<'a, T> {
    fn engage(inner: &'a BinderInner<T>) -> Self {
        inner.state.send_if_modified(|s| !std::mem::replace(&mut s.is_saving, true));
        Self { inner }
    }
}

impl<T> Drop for SavingGuard<'_, T> {
    fn drop(&mut self) {
        self.inner
            .state
            .send_if_modified(|s| std::mem::replace(&mut s.is_saving, false));
        self.inner.saving.store(false, Ordering::Release);
    }
}

// ── Field fix-ups ────────────────────────────────────────────────────

/// Copy non-id, non-navigation query params and the static merge map onto
/// the entity. Fields the entity type cannot hold are skipped.
fn merge_params<T: Entity>(entity: &T, params: &Params, merge: &Map<String, Value>) -> T {
    let fields = params
        .non_id()
        .filter(|(k, _)| !NAVIGATION_PARAMS.contains(k))
        .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
        .chain(merge.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut current = entity.clone();
    for (key, value) in fields {
        match with_field(&current, &key, value) {
            Some(next) => current = next,
            None => debug!(field = %key, "parameter does not fit the entity, skipped"),
        }
    }
    current
}

fn with_field<T: Entity>(entity: &T, key: &str, value: Value) -> Option<T> {
    let mut json = serde_json::to_value(entity).ok()?;
    json.as_object_mut()?.insert(key.to_owned(), value);
    serde_json::from_value(json).ok()
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Point each `extra_merge` field at a valid id from its extra list.
///
/// A list that failed to load leaves its field alone.
fn apply_extra_merge<T: Entity>(
    entity: T,
    extras: &IndexMap<String, Value>,
    rules: &IndexMap<String, String>,
) -> T {
    let mut current = entity;
    for (field, list) in rules {
        let Some(loaded) = extras.get(list) else {
            debug!(field = %field, list = %list, "list not loaded, keeping field");
            continue;
        };
        let items = loaded.as_array().map(Vec::as_slice).unwrap_or_default();

        let selected = serde_json::to_value(&current)
            .ok()
            .and_then(|v| v.get(field).and_then(id_text))
            .filter(|s| !s.is_empty());
        let valid = selected.is_some_and(|sel| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(id_text))
                .any(|id| id == sel)
        });
        if valid {
            continue;
        }

        let fallback = items
            .first()
            .and_then(|item| item.get("id"))
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        match with_field(&current, field, fallback) {
            Some(next) => current = next,
            None => warn!(field = %field, list = %list, "cannot apply list default"),
        }
    }
    current
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Item {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        sink: String,
    }

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: id.into(),
            name: name.into(),
            ..Item::default()
        }
    }

    type Saves = Arc<StdMutex<Vec<SaveRequest>>>;

    fn recording_binding(saves: &Saves) -> Binding<Item> {
        let posts = Arc::clone(saves);
        let patches = Arc::clone(saves);
        Binding::new(Item::default())
            .get(|p: Params| async move { Ok(item(p.id.existing().unwrap_or_default(), "Loaded")) })
            .post(move |req| {
                posts.lock().unwrap().push(req);
                async { Ok(json!({"id": "abc123"})) }
            })
            .patch(move |req| {
                let id = req.id.to_string();
                patches.lock().unwrap().push(req);
                async move { Ok(json!({"id": id})) }
            })
    }

    #[tokio::test(start_paused = true)]
    async fn loading_flag_tracks_first_load() {
        let binder = Binding::new(Item::default())
            .get(|_| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(item("1", "Slow"))
            })
            .mount(&Location::parse("/lists/edit?id=1"), Notifier::new());

        assert!(binder.is_loading());
        let outcome = binder.ready().await.unwrap();
        assert!(outcome.applied);
        assert!(!binder.is_loading());
        assert_eq!(binder.data().name, "Slow");

        // Only the first call waits on the mount load.
        assert_eq!(binder.ready().await.unwrap(), LoadOutcome::default());
    }

    #[tokio::test]
    async fn failed_load_clears_flag_and_notifies() {
        let notifier = Notifier::new();
        let binder = Binding::new(item("", "Initial"))
            .get(|_| async {
                Err::<Item, _>(CoreError::NotFound {
                    entity_type: "list".into(),
                    identifier: "9".into(),
                })
            })
            .mount(&Location::parse("/lists/edit?id=9"), notifier.clone());

        assert!(matches!(binder.ready().await, Err(CoreError::NotFound { .. })));
        assert!(!binder.is_loading());
        assert_eq!(binder.data().name, "Initial");
        let note = notifier.current().unwrap();
        assert_eq!(note.level, crate::notify::Level::Error);
        assert!(note.message.contains("Failed to load"));
    }

    #[tokio::test]
    async fn create_mode_posts_once_and_links_to_new_record() {
        let saves = Saves::default();
        let binder = recording_binding(&saves)
            .mount(&Location::parse("/webhooks/edit?id=new"), Notifier::new());
        binder.ready().await.unwrap();
        assert_eq!(binder.data(), Item::default());

        binder.update(&Patch::set_path("name", json!("Hook"))).unwrap();
        let outcome = binder.form_submit(false).await.unwrap();

        assert_eq!(outcome.response.id().as_deref(), Some("abc123"));
        assert!(!outcome.close);
        assert!(!binder.form_close());
        assert_eq!(
            outcome.created.unwrap().to_string(),
            "/webhooks/edit?id=abc123"
        );

        let saves = saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert!(saves[0].id.is_new());
        assert_eq!(saves[0].data["name"], "Hook");
    }

    #[tokio::test]
    async fn existing_record_patches_with_its_id() {
        let saves = Saves::default();
        let binder = recording_binding(&saves)
            .mount(&Location::parse("/policies/edit?id=42"), Notifier::new());
        binder.ready().await.unwrap();
        assert_eq!(binder.data().name, "Loaded");

        let patch: Patch = r#"{"name": {"$set": "Foo"}}"#.parse().unwrap();
        binder.update(&patch).unwrap();
        let outcome = binder.form_submit(true).await.unwrap();
        assert!(outcome.close);
        assert!(outcome.created.is_none());
        assert!(binder.form_close());

        let saves = saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].id, RecordId::Existing("42".into()));
        assert_eq!(saves[0].data["name"], "Foo");
    }

    #[tokio::test]
    async fn reload_discards_unsaved_edits() {
        let saves = Saves::default();
        let binder = recording_binding(&saves)
            .mount(&Location::parse("/lists/edit?id=3"), Notifier::new());
        binder.ready().await.unwrap();

        binder.update(&Patch::set_path("name", json!("Edited"))).unwrap();
        assert_eq!(binder.data().name, "Edited");
        binder.reload().await.unwrap();
        assert_eq!(binder.data().name, "Loaded");
        assert!(saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_mode_reload_resets_to_initial() {
        let binder = Binding::new(item("", "Blank"))
            .mount(&Location::parse("/lists/edit?id=new"), Notifier::new());
        binder.ready().await.unwrap();
        binder.update(&Patch::set_path("name", json!("Typed"))).unwrap();
        binder.reload().await.unwrap();
        assert_eq!(binder.data().name, "Blank");
    }

    #[tokio::test]
    async fn failed_update_leaves_data_alone() {
        let binder = Binding::new(item("", "Same"))
            .mount(&Location::parse("/lists/edit?id=new"), Notifier::new());
        binder.ready().await.unwrap();

        let bad: Patch = r#"{"name": {"$push": [1]}}"#.parse().unwrap();
        assert!(matches!(binder.update(&bad), Err(CoreError::Patch(_))));
        assert_eq!(binder.data().name, "Same");

        let mut seen = None;
        binder
            .update_then(&Patch::set_path("name", json!("Next")), |d| seen = Some(d.name.clone()))
            .unwrap();
        assert_eq!(seen.as_deref(), Some("Next"));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_load_is_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let binder = Binding::new(Item::default())
            .get(move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    // Call 1 is slow and must lose to call 2.
                    let delay = if n == 1 { 100 } else { 10 };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(item("5", &format!("call-{n}")))
                }
            })
            .mount(&Location::parse("/routes/edit?id=5"), Notifier::new());
        binder.ready().await.unwrap();

        let (first, second) = tokio::join!(binder.reload(), binder.reload());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(second.applied);
        assert!(!first.applied);
        assert_eq!(binder.data().name, "call-2");
        assert!(!binder.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn unmounted_binder_ignores_late_response() {
        let binder = Binding::new(item("", "Before"))
            .get(|_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(item("1", "Late"))
            })
            .mount(&Location::parse("/lists/edit?id=1"), Notifier::new());

        tokio::task::yield_now().await;
        binder.unmount();
        assert!(matches!(binder.ready().await, Err(CoreError::Unmounted)));
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!binder.is_mounted());
        assert_eq!(binder.data().name, "Before");
        assert!(matches!(
            binder.update(&Patch::set_path("name", json!("x"))),
            Err(CoreError::Unmounted)
        ));
        assert!(matches!(binder.save(None).await, Err(CoreError::Unmounted)));
    }

    #[tokio::test]
    async fn extras_fail_independently() {
        let notifier = Notifier::new();
        let binder = Binding::new(json!({"name": ""}))
            .get(|_| async { Ok(json!({"name": "Main"})) })
            .extra("lists", |_| async { Ok(json!([{"id": "l1"}])) })
            .extra("segments", |_| async {
                Err(CoreError::Api {
                    message: "boom".into(),
                    title: None,
                    status: Some(500),
                })
            })
            .mount(&Location::parse("/segments/edit?id=2"), notifier.clone());

        let outcome = binder.ready().await.unwrap();
        assert_eq!(outcome.extra_failures, vec!["segments".to_owned()]);
        assert_eq!(binder.data()["name"], "Main");
        assert_eq!(binder.extra("lists"), Some(json!([{"id": "l1"}])));
        assert_eq!(binder.extra("segments"), None);
        assert!(notifier.current().unwrap().message.contains("segments"));
    }

    #[tokio::test]
    async fn extra_merge_picks_valid_id() {
        let stale = Binding::new(Item::default())
            .get(|_| async {
                Ok(Item {
                    sink: "gone".into(),
                    ..item("1", "w")
                })
            })
            .extra("sinks", |_| async { Ok(json!([{"id": "a"}, {"id": "b"}])) })
            .extra_merge("sink", "sinks")
            .mount(&Location::parse("/warmups/edit?id=1"), Notifier::new());
        stale.ready().await.unwrap();
        assert_eq!(stale.data().sink, "a");

        let kept = Binding::new(Item {
            sink: "b".into(),
            ..Item::default()
        })
        .extra("sinks", |_| async { Ok(json!([{"id": "a"}, {"id": "b"}])) })
        .extra_merge("sink", "sinks")
        .mount(&Location::parse("/warmups/edit?id=new"), Notifier::new());
        kept.ready().await.unwrap();
        assert_eq!(kept.data().sink, "b");

        let empty = Binding::new(Item {
            sink: "x".into(),
            ..Item::default()
        })
        .extra("sinks", |_| async { Ok(json!([])) })
        .extra_merge("sink", "sinks")
        .mount(&Location::parse("/warmups/edit?id=new"), Notifier::new());
        empty.ready().await.unwrap();
        assert_eq!(empty.data().sink, "");
    }

    #[tokio::test]
    async fn overlapping_save_is_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let (e, r) = (Arc::clone(&entered), Arc::clone(&release));
        let binder = Binding::new(Item::default())
            .post(move |_| {
                let (e, r) = (Arc::clone(&e), Arc::clone(&r));
                async move {
                    e.notify_one();
                    r.notified().await;
                    Ok(json!({"id": "n1"}))
                }
            })
            .mount(&Location::parse("/lists/edit?id=new"), Notifier::new());
        binder.ready().await.unwrap();

        let first = binder.clone();
        let handle = tokio::spawn(async move { first.save(None).await });
        entered.notified().await;

        assert!(binder.is_saving());
        assert!(matches!(binder.save(None).await, Err(CoreError::SaveInProgress)));

        release.notify_one();
        assert_eq!(handle.await.unwrap().unwrap().id().as_deref(), Some("n1"));
        assert!(!binder.is_saving());
    }

    #[tokio::test]
    async fn params_merge_into_entity_except_navigation() {
        let binder = Binding::new(json!({"name": ""}))
            .merge("type", json!("list"))
            .mount(
                &Location::parse("/segments/edit?id=new&list=7&tablestate=%7B%7D&returnto=%2Fx"),
                Notifier::new(),
            );
        binder.ready().await.unwrap();
        assert_eq!(
            binder.data(),
            json!({"name": "", "list": "7", "type": "list"})
        );
    }

    #[tokio::test]
    async fn extra_fields_only_reach_the_payload() {
        let saves = Saves::default();
        let binder = recording_binding(&saves)
            .mount(&Location::parse("/lists/edit?id=new"), Notifier::new());
        binder.ready().await.unwrap();

        let mut fields = Map::new();
        fields.insert("publish".into(), json!(true));
        binder.save(Some(fields)).await.unwrap();

        assert_eq!(saves.lock().unwrap()[0].data["publish"], true);
        assert!(serde_json::to_value(binder.data()).unwrap().get("publish").is_none());
    }

    #[tokio::test]
    async fn save_without_saver_is_unsupported() {
        let binder = Binding::new(Item::default())
            .get(|_| async { Ok(Item::default()) })
            .mount(&Location::parse("/lists/edit?id=1"), Notifier::new());
        binder.ready().await.unwrap();
        assert!(matches!(
            binder.save(None).await,
            Err(CoreError::Unsupported { .. })
        ));
    }

    #[tokio::test]
    async fn subscribers_see_committed_edits() {
        let binder = Binding::new(item("", "a"))
            .mount(&Location::parse("/lists/edit?id=new"), Notifier::new());
        binder.ready().await.unwrap();

        let mut rx = binder.subscribe();
        rx.mark_unchanged();
        binder.update(&Patch::set_path("name", json!("b"))).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().data.name, "b");
    }

    #[tokio::test]
    async fn failed_list_keeps_stored_reference() {
        let binder = Binding::new(Item::default())
            .get(|_| async {
                Ok(Item {
                    sink: "s1".into(),
                    ..item("7", "w")
                })
            })
            .extra("sinks", |_| async {
                Err(CoreError::Api {
                    message: "down".into(),
                    title: None,
                    status: Some(500),
                })
            })
            .extra_merge("sink", "sinks")
            .mount(&Location::parse("/warmups/edit?id=7"), Notifier::new());

        let outcome = binder.ready().await.unwrap();
        assert_eq!(outcome.extra_failures, vec!["sinks".to_owned()]);
        assert_eq!(binder.data().sink, "s1");
    }

    #[tokio::test(start_paused = true)]
    async fn on_load_sees_settled_state() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let binder = Binding::new(Item::default())
            .get(move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let delay = if n == 1 { 100 } else { 10 };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    if n == 3 {
                        return Err(CoreError::Unsupported {
                            operation: "boom".into(),
                        });
                    }
                    Ok(item("1", &format!("call-{n}")))
                }
            })
            .on_load(move |state: &BinderState<Item>| {
                log.lock().unwrap().push((state.is_loading, state.data.name.clone()));
            })
            .mount(&Location::parse("/lists/edit?id=1"), Notifier::new());
        binder.ready().await.unwrap();

        // The superseded call-1 load does not fire the hook.
        let _ = tokio::join!(binder.reload(), binder.reload());
        // A failed load still fires it, with the previous data.
        assert!(binder.reload().await.is_err());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (false, "call-0".to_owned()),
                (false, "call-2".to_owned()),
                (false, "call-2".to_owned()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn extras_reload_loses_to_newer_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let binder = Binding::new(Item::default())
            .get(|_| async { Ok(item("5", "r")) })
            .extra("sinks", move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    // Call 1 belongs to the slow extras-only reload.
                    let delay = if n == 1 { 100 } else { 10 };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(json!([{"id": format!("s{n}")}]))
                }
            })
            .extra_merge("sink", "sinks")
            .mount(&Location::parse("/warmups/edit?id=5"), Notifier::new());
        binder.ready().await.unwrap();
        assert_eq!(binder.data().sink, "s0");

        let (stale, fresh) = tokio::join!(binder.reload_extra(), binder.reload());
        assert!(!stale.unwrap().applied);
        assert!(fresh.unwrap().applied);
        assert_eq!(binder.extra("sinks"), Some(json!([{"id": "s2"}])));
        assert_eq!(binder.data().sink, "s2");

        // On its own, an extras reload re-resolves the merged field.
        assert!(binder.reload_extra().await.unwrap().applied);
        assert_eq!(binder.data().sink, "s3");
    }
}
