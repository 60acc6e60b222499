// src/tool/credentials.rs

//! Bearer token for the collaborator, cached per invoker.
//!
//! The token source is read lazily on first use and kept until
//! [`Credentials::invalidate`] is called (e.g. after an HTTP 401).

use std::fmt;
use std::sync::{Arc, Mutex};

type TokenSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub struct Credentials {
    source: Option<TokenSource>,
    cached: Arc<Mutex<Option<String>>>,
}

impl Credentials {
    /// No authentication.
    pub fn none() -> Self {
        Self {
            source: None,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Read the token from the given environment variable.
    pub fn from_env(var: impl Into<String>) -> Self {
        let var = var.into();
        Self::from_source(move || std::env::var(&var).ok())
    }

    /// Read the token from an arbitrary source.
    pub fn from_source<F>(source: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        Self {
            source: Some(Arc::new(source)),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Current token, consulting the source only when nothing is cached.
    pub fn token(&self) -> Option<String> {
        let source = self.source.as_ref()?;
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(token) = cached.as_ref() {
            return Some(token.clone());
        }

        let token = source().map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        *cached = Some(token.clone());
        Some(token)
    }

    /// Drop the cached token so the next call re-reads the source.
    pub fn invalidate(&self) {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        *cached = None;
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("configured", &self.source.is_some())
            .finish_non_exhaustive()
    }
}
