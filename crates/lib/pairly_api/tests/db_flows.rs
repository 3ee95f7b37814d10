//! End-to-end flows against a live PostgreSQL instance — register, login,
//! refresh rotation through `issue_session`, and the durable notification
//! guarantees.
//!
//! Ignored by default so the suite stays green without a database. Run with
//! one available:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost:5432/pairly_test \
//!     cargo test -p pairly_api -- --ignored
//! ```

use uuid::Uuid;

use pairly_api::AppState;
use pairly_api::config::ApiConfig;
use pairly_api::error::AppError;
use pairly_api::services::{auth, notify};
use pairly_core::federation::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GoogleOAuth};
use pairly_core::models::notify::NotificationKind;

const SECRET: &str = "test-secret";
const PASSWORD: &str = "correct-horse-1";

async fn db_state() -> AppState {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost:5432/pairly_test".into());
    let pool = sqlx::PgPool::connect(&url)
        .await
        .expect("connect to test database");
    pairly_api::migrate(&pool).await.expect("run migrations");

    AppState::new(
        pool,
        ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            database_url: url,
            jwt_secret: SECRET.into(),
            google: GoogleOAuth {
                client_id: "test-client".into(),
                client_secret: "test-secret".into(),
                redirect_uri: "http://localhost/auth/google/callback".into(),
                state: String::new(),
                auth_url: GOOGLE_AUTH_URL.into(),
                token_url: GOOGLE_TOKEN_URL.into(),
            },
            deeplink_url: "pairly://login".into(),
            default_profile_url: String::new(),
        },
    )
}

fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@x.com", Uuid::new_v4().simple())
}

async fn register_user(state: &AppState, tag: &str) -> Uuid {
    let view = auth::register(state, &unique_email(tag), PASSWORD)
        .await
        .expect("register");
    view.id
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn refresh_rotation_invalidates_the_previous_token() {
    let state = db_state().await;
    let email = unique_email("rotate");

    auth::register(&state, &email, PASSWORD).await.expect("register");
    let login = auth::login(&state, &email, PASSWORD).await.expect("login");

    // First use of the login's refresh token succeeds and rotates.
    let rotated = auth::refresh(&state, &login.refresh_token)
        .await
        .expect("first refresh");
    assert_ne!(rotated.refresh_token, login.refresh_token);

    // Reusing the original token after rotation must fail.
    let err = auth::refresh(&state, &login.refresh_token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    // The rotated token is still good for exactly one more use.
    auth::refresh(&state, &rotated.refresh_token)
        .await
        .expect("second refresh");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn login_rotation_invalidates_other_sessions() {
    let state = db_state().await;
    let email = unique_email("relogin");

    auth::register(&state, &email, PASSWORD).await.expect("register");
    let first = auth::login(&state, &email, PASSWORD).await.expect("first login");
    let second = auth::login(&state, &email, PASSWORD).await.expect("second login");

    // A fresh login rotates too, so the earlier session's refresh token
    // is dead and the newer one works.
    let err = auth::refresh(&state, &first.refresh_token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    auth::refresh(&state, &second.refresh_token)
        .await
        .expect("refresh of newest session");
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn dispatch_is_retrievable_even_with_no_subscriber() {
    let state = db_state().await;
    let user = register_user(&state, "offline").await;

    notify::dispatch(
        &state,
        user,
        NotificationKind::ItemDone,
        serde_json::json!({"title": "Bucket list", "body": "done"}),
    )
    .await
    .expect("dispatch without subscriber");

    // The row is there, unread, on the first list call.
    let first = notify::list_and_mark_read(&state, user).await.expect("list");
    assert_eq!(first.len(), 1);
    assert!(!first[0].is_read);
    assert_eq!(first[0].payload["title"], "Bucket list");

    // A second call returns the same set, now read.
    let second = notify::list_and_mark_read(&state, user)
        .await
        .expect("list again");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, first[0].id);
    assert!(second[0].is_read);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn dispatch_pushes_to_a_live_subscriber() {
    let state = db_state().await;
    let user = register_user(&state, "live").await;

    let mut subscription = state.registry.subscribe(user);

    notify::dispatch(
        &state,
        user,
        NotificationKind::ItemDone,
        serde_json::json!({"title": "t"}),
    )
    .await
    .expect("dispatch");

    let event = subscription.receiver.recv().await.expect("live event");
    assert_eq!(event.kind, NotificationKind::ItemDone);

    // Live delivery does not consume the durable record.
    let listed = notify::list_and_mark_read(&state, user).await.expect("list");
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL (set DATABASE_URL)"]
async fn deleting_another_recipients_notification_is_not_found() {
    let state = db_state().await;
    let owner = register_user(&state, "owner").await;
    let intruder = register_user(&state, "intruder").await;

    let saved = notify::dispatch(
        &state,
        owner,
        NotificationKind::ItemDone,
        serde_json::json!({"title": "t"}),
    )
    .await
    .expect("dispatch");

    // A delete against someone else's row reports not-found, never success
    // and never a permission error.
    let err = notify::delete_one(&state, intruder, saved.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // The row survived and the owner can still delete it.
    notify::delete_one(&state, owner, saved.id)
        .await
        .expect("owner delete");
}
