// gameshelf-api: Async Rust client for the gameshelf HTTP services
// (auth service, collections service, game search)

pub mod auth;
pub mod client;
pub mod collections;
pub mod entries;
pub mod error;
pub mod games;
pub mod transport;
pub mod types;

pub use auth::{AuthClient, NoToken, StaticToken, TokenProvider};
pub use client::ShelfClient;
pub use error::Error;
pub use games::GameSearchClient;
pub use transport::TransportConfig;
pub use types::{
    Collection, CollectionEntry, CoverImages, CreateCollectionRequest, CreateEntryRequest,
    CustomTags, EntryGame, Game, LoginRequest, SignupRequest, TokenResponse, UpdateCollectionRequest,
    UpdateEntryRequest, UserProfile,
};
