//! Persisted client state: session token, remembered login email, theme.
//!
//! Values live in a flat string key/value store. [`SessionContext`] is
//! created once from the store and passed by reference; there is no global.

use crate::error::SessionError;
use crate::validation::is_email;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Serialized [`Session`]
pub const SESSION_KEY: &str = "ipac-session";
/// Email prefilled on the login form
pub const REMEMBER_KEY: &str = "ipac-remember-me";
/// `light` or `dark`
pub const THEME_KEY: &str = "ipac-theme-preference";

/// Flat string key/value persistence
pub trait KeyValueStore: Send + Sync {
    /// Stored value, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    /// Insert or replace
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    /// Delete; absent keys are fine
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// JSON object on disk; every write replaces the file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Store backed by `path`; the file and its directory are created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<dir>/state.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("state.json"))
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(values)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn modify(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read()?;
        apply(&mut values);
        self.write(&values)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.modify(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.modify(|values| {
            values.remove(key);
        })
    }
}

/// Color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light palette
    #[default]
    Light,
    /// Dark palette
    Dark,
}

impl Theme {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{}', expected light or dark", other)),
        }
    }
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Address used to sign in
    pub email: String,
}

/// Stored session; both fields are null when signed out
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    /// Signed-in user
    pub user: Option<User>,
    /// Opaque token issued at sign-in
    pub token: Option<String>,
}

impl Session {
    /// True when a user and token are present
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

/// Session and theme state loaded from a store
#[derive(Debug)]
pub struct SessionContext<S: KeyValueStore> {
    store: S,
    session: Session,
    theme: Theme,
}

impl<S: KeyValueStore> SessionContext<S> {
    /// Load state from `store`. An unreadable session is treated as signed out.
    pub fn init(store: S) -> Result<Self, SessionError> {
        let session = match store.get(SESSION_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Failed to parse stored session: {}", e);
                Session::default()
            }),
            None => Session::default(),
        };
        let theme = store
            .get(THEME_KEY)?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        Ok(Self { store, session, theme })
    }

    /// Current session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// True when signed in
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Current theme
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Email to prefill on the login form
    pub fn remembered_email(&self) -> Result<Option<String>, SessionError> {
        self.store.get(REMEMBER_KEY)
    }

    /// Sign in with a fresh token; remembers or forgets the email
    pub fn login(&mut self, email: &str, remember_me: bool) -> Result<&Session, SessionError> {
        let email = email.trim();
        if !is_email(email) {
            return Err(SessionError::InvalidEmail(email.to_string()));
        }
        let session = Session {
            user: Some(User {
                email: email.to_string(),
            }),
            token: Some(uuid::Uuid::new_v4().to_string()),
        };
        self.store.set(SESSION_KEY, &serde_json::to_string(&session)?)?;
        if remember_me {
            self.store.set(REMEMBER_KEY, email)?;
        } else {
            self.store.remove(REMEMBER_KEY)?;
        }
        info!("Signed in as {}", email);
        self.session = session;
        Ok(&self.session)
    }

    /// Sign out; the remembered email and theme are kept
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store.remove(SESSION_KEY)?;
        self.session = Session::default();
        info!("Signed out");
        Ok(())
    }

    /// Persist and apply a theme
    pub fn set_theme(&mut self, theme: Theme) -> Result<Theme, SessionError> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(theme)
    }

    /// Switch between light and dark
    pub fn toggle_theme(&mut self) -> Result<Theme, SessionError> {
        self.set_theme(self.theme.toggled())
    }
}
