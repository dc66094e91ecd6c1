//! Data-binding layer between `edadmin-api` and the command-line front end.
//!
//! - **[`Binding`] / [`Binder`]**: declarative load/save configuration for
//!   one editable record. [`Binding::mount`] reads the record id from a
//!   [`Location`], loads the record and its named extras concurrently, and
//!   hands back a [`Binder`] that owns the entity state. Edits go through
//!   [`Patch`] descriptors; [`Binder::save`] persists with `post` for new
//!   records and `patch` otherwise.
//!
//! - **[`Patch`]**: typed rendition of the `$set` / `$push` / `$splice` /
//!   `$merge` update notation the backend's web client speaks.
//!
//! - **[`Location`] / [`TableState`]**: URL-shaped navigation state: the
//!   record id, query parameters, and versioned table view-state.
//!
//! - **[`Notifier`]**: injected toast channel; binders publish load and save
//!   failures here instead of to a global.
//!
//! - **[`ResourceKind`]**: catalog of editable screens with ready-made
//!   bindings against an [`ApiClient`](edadmin_api::ApiClient).

pub mod binder;
pub mod config;
pub mod error;
pub mod location;
pub mod notify;
pub mod patch;
pub mod resources;
pub mod table;
pub mod viewstate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use binder::{Binder, BinderState, Binding, Entity, LoadOutcome, SaveRequest, SaveResponse, SubmitOutcome};
pub use config::{AuthCredentials, ClientConfig, TlsVerification};
pub use error::CoreError;
pub use location::{Location, Params, RecordId};
pub use notify::{Level, Notification, Notifier};
pub use patch::{Patch, PatchError};
pub use resources::ResourceKind;
pub use table::{Page, Selection, TableView, pct, ratio_pct};
pub use viewstate::{SortRule, TableState, ViewStateError};
