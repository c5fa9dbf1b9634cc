#![allow(clippy::unwrap_used)]
// End-to-end tests for the `Shelf` hooks against wiremock servers.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gameshelf_core::{
    AuthError, CreateCollectionRequest, CreateEntryRequest, LoginForm, MemoryStorage, MutationPhase, Route, Shelf,
    ShelfConfig, SignupForm, SubmitGuard, SubmitOutcome, UpdateCollectionRequest,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> ShelfConfig {
    let url = Url::parse(&server.uri()).unwrap();
    ShelfConfig {
        auth_url: Some(url.clone()),
        search_url: Some(url.clone()),
        ..ShelfConfig::new(url)
    }
}

fn shelf(server: &MockServer) -> Shelf {
    Shelf::new(config(server), Arc::new(MemoryStorage::default())).unwrap()
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

fn login_form() -> LoginForm {
    LoginForm {
        email: "test@example.com".into(),
        password: secret("password123"),
    }
}

fn collection_json(id: i64, name: &str) -> serde_json::Value {
    json!({ "id": id, "user_id": 1, "name": name, "description": null })
}

fn entry_json(id: i64, collection_id: i64) -> serde_json::Value {
    json!({ "id": id, "collection_id": collection_id, "game_id": id * 10 })
}

async fn mount_login(server: &MockServer, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({ "email": "test@example.com", "password": "password123" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "fake-jwt-token", "token_type": "bearer" }))
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer fake-jwt-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "test@example.com" })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_collections(server: &MockServer, collections: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/collections/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collections))
        .mount(server)
        .await;
}

// ── Account ─────────────────────────────────────────────────────────

#[tokio::test]
async fn login_fetches_profile_and_stores_session() {
    let server = MockServer::start().await;
    mount_login(&server, Duration::ZERO).await;
    let shelf = shelf(&server);

    let route = shelf.account().login(&login_form()).await.unwrap();

    assert_eq!(route, Route::Home);
    let session = shelf.session().snapshot();
    assert!(session.is_logged_in);
    assert_eq!(session.token.unwrap().expose_secret(), "fake-jwt-token");
    assert_eq!(session.user.unwrap().email.as_deref(), Some("test@example.com"));
}

#[tokio::test]
async fn session_token_is_sent_after_login() {
    let server = MockServer::start().await;
    mount_login(&server, Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/collections/"))
        .and(header("authorization", "Bearer fake-jwt-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([collection_json(1, "Backlog")])))
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);

    shelf.account().login(&login_form()).await.unwrap();
    let list = shelf.collections().list().await.unwrap();
    assert_eq!(list[0].name, "Backlog");
}

#[tokio::test]
async fn login_rejected_leaves_session_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "bad" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let shelf = shelf(&server);

    let err = shelf.account().login(&login_form()).await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials. Please check your email and password.");
    assert!(!shelf.session().is_logged_in());
}

#[tokio::test]
async fn login_without_token_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "bearer" })))
        .mount(&server)
        .await;
    let shelf = shelf(&server);

    let err = shelf.account().login(&login_form()).await.unwrap_err();
    assert_eq!(err, AuthError::MissingToken);
    assert_eq!(err.to_string(), "Unexpected error: No token received from server.");
}

#[tokio::test]
async fn login_profile_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let shelf = shelf(&server);

    let err = shelf.account().login(&login_form()).await.unwrap_err();
    assert_eq!(err.to_string(), "Unexpected error: Could not get user information.");
    assert!(!shelf.session().is_logged_in());
}

#[tokio::test]
async fn login_without_auth_url_is_a_config_error() {
    let server = MockServer::start().await;
    let config = ShelfConfig {
        auth_url: None,
        ..config(&server)
    };
    let shelf = Shelf::new(config, Arc::new(MemoryStorage::default())).unwrap();

    let err = shelf.account().login(&login_form()).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Auth API URL is not configured. Please set GAMESHELF_AUTH_URL."
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn signup_password_mismatch_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/signup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let shelf = shelf(&server);

    let err = shelf
        .account()
        .signup(&SignupForm {
            username: "player".into(),
            email: "p@example.com".into(),
            password: secret("password123"),
            confirm_password: secret("password124"),
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Passwords do not match.");
}

#[tokio::test]
async fn signup_rejection_shows_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/signup"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "Email already registered" })))
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let form = SignupForm {
        username: "player".into(),
        email: "p@example.com".into(),
        password: secret("password123"),
        confirm_password: secret("password123"),
    };

    let err = shelf.account().signup(&form).await.unwrap_err();
    assert_eq!(err.to_string(), "Email already registered");
}

#[tokio::test]
async fn signup_stores_token_without_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/signup"))
        .and(body_json(json!({ "username": "player", "email": "p@example.com", "password": "password123" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "access_token": "new-token" })))
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let form = SignupForm {
        username: "player".into(),
        email: "p@example.com".into(),
        password: secret("password123"),
        confirm_password: secret("password123"),
    };

    assert_eq!(shelf.account().signup(&form).await.unwrap(), Route::Home);
    let session = shelf.session().snapshot();
    assert!(session.is_logged_in);
    assert!(session.user.is_none());
}

#[tokio::test]
async fn logout_twice_is_harmless() {
    let server = MockServer::start().await;
    mount_login(&server, Duration::ZERO).await;
    let shelf = shelf(&server);
    let account = shelf.account();
    account.login(&login_form()).await.unwrap();

    assert_eq!(account.logout().unwrap(), Route::Login);
    assert_eq!(account.logout().unwrap(), Route::Login);
    assert!(!shelf.session().is_logged_in());
    assert!(shelf.session().snapshot().token.is_none());
}

#[tokio::test]
async fn logout_drops_cached_queries() {
    let server = MockServer::start().await;
    mount_login(&server, Duration::ZERO).await;
    mount_collections(&server, json!([collection_json(1, "Backlog")])).await;
    let shelf = shelf(&server);
    let account = shelf.account();
    account.login(&login_form()).await.unwrap();
    shelf.collections().list().await.unwrap();

    account.logout().unwrap();

    assert!(shelf.collections().snapshot().is_empty());
}

#[tokio::test]
async fn triple_submit_sends_one_login() {
    let server = MockServer::start().await;
    mount_login(&server, Duration::from_millis(100)).await;
    let shelf = shelf(&server);
    let account = shelf.account();
    let guard = SubmitGuard::new();
    let form = login_form();

    let (a, b, c) = futures::join!(
        guard.run(account.login(&form)),
        guard.run(account.login(&form)),
        guard.run(account.login(&form))
    );

    assert_eq!(a, SubmitOutcome::Completed(Ok(Route::Home)));
    assert_eq!(b, SubmitOutcome::Busy);
    assert_eq!(c, SubmitOutcome::Busy);
    assert!(guard.is_enabled());
}

// ── Collections ─────────────────────────────────────────────────────

#[tokio::test]
async fn list_is_served_from_cache_within_dedupe_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([collection_json(1, "Backlog")])))
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);

    shelf.collections().list().await.unwrap();
    let again = shelf.collections().list().await.unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].description, "");
}

#[tokio::test]
async fn create_appends_server_record() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "Backlog")])).await;
    Mock::given(method("POST"))
        .and(path("/collections/"))
        .and(body_json(json!({ "name": "Favorites", "description": "Best ones" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 2, "user_id": 1, "name": "Favorites", "description": "Best ones"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let collections = shelf.collections();
    collections.list().await.unwrap();

    let created = collections
        .create(CreateCollectionRequest {
            name: "Favorites".into(),
            description: Some("Best ones".into()),
        })
        .await
        .unwrap();

    assert_eq!(created.id, 2);
    let ids: Vec<i64> = collections.snapshot().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(collections.mutation_state().phase, MutationPhase::Committed);
}

#[tokio::test]
async fn rejected_create_rolls_back() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "Backlog")])).await;
    Mock::given(method("POST"))
        .and(path("/collections/"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "detail": "name is invalid" })))
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let collections = shelf.collections();
    let before = collections.list().await.unwrap();

    let err = collections
        .create(CreateCollectionRequest {
            name: "Bad".into(),
            description: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Validation error: name is invalid");
    assert_eq!(collections.snapshot(), before);
    assert_eq!(collections.mutation_state().phase, MutationPhase::RolledBack);
}

#[tokio::test]
async fn update_uses_server_response() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "Backlog")])).await;
    Mock::given(method("PUT"))
        .and(path("/collections/1"))
        .and(body_json(json!({ "name": "Queue" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "user_id": 1, "name": "Queue", "description": "set by server"
        })))
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let collections = shelf.collections();
    collections.list().await.unwrap();

    collections
        .update(
            1,
            UpdateCollectionRequest {
                name: Some("Queue".into()),
                description: None,
            },
        )
        .await
        .unwrap();

    let snapshot = collections.snapshot();
    assert_eq!(snapshot[0].name, "Queue");
    assert_eq!(snapshot[0].description, "set by server");
}

#[tokio::test]
async fn failed_delete_restores_collection() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "a"), collection_json(2, "b")])).await;
    Mock::given(method("DELETE"))
        .and(path("/collections/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let collections = shelf.collections();
    let before = collections.list().await.unwrap();

    let err = collections.delete(1).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to delete collection: 500");
    assert_eq!(collections.snapshot(), before);
}

// ── Library counts ──────────────────────────────────────────────────

#[tokio::test]
async fn counts_tolerate_a_failing_collection() {
    let server = MockServer::start().await;
    mount_collections(
        &server,
        json!([collection_json(1, "a"), collection_json(2, "b"), collection_json(3, "c")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(10, 1), entry_json(11, 1)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/2/entries/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/3/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(30, 3)])))
        .mount(&server)
        .await;
    let shelf = shelf(&server);

    let view = shelf.library().load().await;

    let counts: Vec<(i64, usize)> = view
        .collections
        .iter()
        .map(|c| (c.collection.id, c.game_count))
        .collect();
    assert_eq!(counts, vec![(1, 2), (2, 0), (3, 1)]);
    assert!(view.error.is_none());
    assert!(!view.is_loading);
}

#[tokio::test]
async fn counts_skip_empty_library() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([])).await;
    let shelf = shelf(&server);

    let view = shelf.library().load().await;

    assert!(view.collections.is_empty());
    assert!(view.error.is_none());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn list_failure_surfaces_in_view() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let shelf = shelf(&server);

    let view = shelf.library().load().await;

    assert_eq!(
        view.error.map(|e| e.to_string()).as_deref(),
        Some("Failed to fetch collections: 503")
    );
}

#[tokio::test]
async fn adding_an_entry_invalidates_counts() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "a")])).await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(10, 1)])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(entry_json(11, 1)))
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let library = shelf.library();

    library.load().await;
    // Within the counts window: no new entries fetch.
    library.load().await;

    shelf
        .entries(1)
        .add(CreateEntryRequest {
            game_id: 110,
            notes: None,
            status: None,
            rating: Some(8),
            custom_tags: None,
        })
        .await
        .unwrap();
    library.load().await;
}

#[tokio::test]
async fn update_collection_count_patches_one_collection() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "a"), collection_json(2, "b")])).await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(10, 1)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(10, 1), entry_json(12, 1)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/2/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let library = shelf.library();
    library.load().await;

    assert_eq!(library.update_collection_count(1).await, Some(2));

    let counts: Vec<usize> = library.view().collections.iter().map(|c| c.game_count).collect();
    assert_eq!(counts, vec![2, 0]);
}

#[tokio::test]
async fn failed_recount_leaves_counts_untouched() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "a"), collection_json(2, "b")])).await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(10, 1)])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/2/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let library = shelf.library();
    library.load().await;

    assert_eq!(library.update_collection_count(1).await, None);

    let view = library.view();
    let counts: Vec<usize> = view.collections.iter().map(|c| c.game_count).collect();
    assert_eq!(counts, vec![1, 0]);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn removing_an_entry_invalidates_counts() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "a")])).await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(10, 1)])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/collections/1/entries/10"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let library = shelf.library();

    library.load().await;
    library.load().await;

    shelf.entries(1).remove(10).await.unwrap();
    library.load().await;
}

#[tokio::test]
async fn deleting_a_collection_invalidates_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([collection_json(1, "a"), collection_json(2, "b")])))
        .expect(2)
        .mount(&server)
        .await;
    for id in [1, 2] {
        Mock::given(method("GET"))
            .and(path(format!("/collections/{id}/entries/")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(id * 10, id)])))
            .expect(2)
            .mount(&server)
            .await;
    }
    Mock::given(method("DELETE"))
        .and(path("/collections/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let library = shelf.library();
    library.load().await;

    shelf.collections().delete(2).await.unwrap();
    // The server still lists both, so the same counts key comes back
    // and must be refetched rather than served from cache.
    shelf.collections().refresh().await.unwrap();
    let view = library.load().await;

    assert_eq!(view.collections.len(), 2);
}

#[tokio::test]
async fn view_is_loading_while_counts_load_first_time() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "a")])).await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([entry_json(10, 1)]))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let library = shelf.library();
    shelf.collections().list().await.unwrap();

    let (done, during) = futures::join!(library.load(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        library.view()
    });

    assert!(during.is_loading);
    assert_eq!(during.collections.len(), 1);
    assert_eq!(during.collections[0].game_count, 0);
    assert!(!done.is_loading);
    assert_eq!(done.collections[0].game_count, 1);
}

#[tokio::test]
async fn pending_create_is_left_out_of_counts() {
    let server = MockServer::start().await;
    mount_collections(&server, json!([collection_json(1, "a")])).await;
    Mock::given(method("POST"))
        .and(path("/collections/"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(collection_json(2, "New"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/1/entries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry_json(10, 1)])))
        .expect(1)
        .mount(&server)
        .await;
    let shelf = shelf(&server);
    let library = shelf.library();
    shelf.collections().list().await.unwrap();

    let collections = shelf.collections();
    let create = collections.create(CreateCollectionRequest {
        name: "New".into(),
        description: None,
    });
    let (created, view) = futures::join!(create, async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        library.load().await
    });

    assert_eq!(created.unwrap().id, 2);
    let counts: Vec<(bool, usize)> = view
        .collections
        .iter()
        .map(|c| (c.collection.id < 0, c.game_count))
        .collect();
    assert_eq!(counts, vec![(false, 1), (true, 0)]);
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/collections/-")));
}

// ── Search ──────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_search_makes_no_request() {
    let server = MockServer::start().await;
    let shelf = shelf(&server);

    assert!(shelf.search().search("   ").await.unwrap().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
