//! CLI command implementations.
//!
//! Each invocation is a fresh process, so the session cookies are persisted
//! to a file between runs; `connect` restores them before any request and
//! `persist` writes them back afterwards.

pub mod auth;
pub mod books;
pub mod cart;
pub mod orders;

use std::path::PathBuf;

use paperback_client::{ApiClient, Config, SessionStore, ShopStore};

/// The wired-up client and stores shared by every command.
pub struct Stores {
    pub api: ApiClient,
    pub session: SessionStore,
    pub shop: ShopStore,
}

/// Build the client and stores, restoring any saved session cookies.
pub async fn connect() -> Result<Stores, Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let api = ApiClient::new(&config)?;

    if let Some(cookies) = read_saved_session() {
        api.import_cookies(&cookies);
    }

    let session = SessionStore::new(api.clone());
    let shop = ShopStore::new(api.clone(), &session);

    Ok(Stores { api, session, shop })
}

/// Write the session cookies back to disk. Best-effort: a failure only
/// costs the user a fresh login next time.
pub fn persist(api: &ApiClient) {
    let path = session_file();
    match api.export_cookies() {
        Some(cookies) => {
            if let Err(err) = std::fs::write(&path, cookies) {
                tracing::warn!(path = %path.display(), error = %err, "could not save session");
            }
        }
        None => {
            // No cookies means no session worth keeping.
            let _ = std::fs::remove_file(&path);
        }
    }
}

fn session_file() -> PathBuf {
    std::env::var_os("PAPERBACK_SESSION_FILE").map_or_else(
        || {
            std::env::var_os("HOME")
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
                .join(".paperback-session")
        },
        PathBuf::from,
    )
}

fn read_saved_session() -> Option<String> {
    let path = session_file();
    let cookies = std::fs::read_to_string(path).ok()?;
    let cookies = cookies.trim().to_string();
    (!cookies.is_empty()).then_some(cookies)
}

/// Resolve the saved session to a signed-in user, or fail with a hint.
pub(crate) async fn require_login(
    stores: &Stores,
) -> Result<paperback_core::User, Box<dyn std::error::Error>> {
    stores
        .session
        .check()
        .await
        .user()
        .cloned()
        .ok_or_else(|| "not signed in (run `paperback auth login` first)".into())
}
