//! Client-side state for the gameshelf collection service.
//!
//! Sits between `gameshelf-api` and a presentation layer (the CLI):
//!
//! - **[`Shelf`]**: facade that wires the session into the HTTP clients
//!   and vends the hooks below.
//! - **[`SessionStore`]**: reactive, persisted auth session; also the
//!   bearer-token source for every request.
//! - **[`QueryCache`]**: keyed cache of fetch results built on
//!   `tokio::sync::watch`, with in-flight request deduplication and a
//!   freshness window per key.
//! - **[`OptimisticList`]**: create/update/delete against a cached list
//!   that apply locally first and commit or roll back when the server
//!   answers.
//! - **Hooks**: [`CollectionsHandle`], [`EntriesHandle`],
//!   [`LibraryHandle`] (collections joined with game counts),
//!   [`SearchHandle`], and the [`Account`] login/signup/logout flows.

pub mod account;
pub mod cache;
pub mod collections;
pub mod config;
pub mod entries;
pub mod error;
pub mod library;
pub mod model;
pub mod optimistic;
pub mod search;
pub mod session;
pub mod shelf;
pub mod store;
pub mod submit;
pub mod validation;

// ── Primary re-exports ──────────────────────────────────────────────
pub use account::{Account, AuthError, LoginForm, Route, SignupForm};
pub use cache::{CacheEntry, CacheStream, QueryCache};
pub use collections::CollectionsHandle;
pub use config::{CachePolicy, ShelfConfig};
pub use entries::EntriesHandle;
pub use error::CoreError;
pub use library::{LibraryHandle, LibraryView};
pub use model::{CollectionWithCount, CountMap, Resource};
pub use optimistic::{MutationPhase, MutationState, OptimisticList};
pub use search::SearchHandle;
pub use session::{FileStorage, MemoryStorage, PersistedSession, Session, SessionStorage, SessionStore};
pub use shelf::Shelf;
pub use store::ShelfStore;
pub use submit::{SubmitGuard, SubmitOutcome};
pub use validation::FieldErrors;

// Wire types, re-exported so consumers need only this crate.
pub use gameshelf_api::{
    Collection, CollectionEntry, CreateCollectionRequest, CreateEntryRequest, CustomTags, Game,
    UpdateCollectionRequest, UpdateEntryRequest, UserProfile,
};
