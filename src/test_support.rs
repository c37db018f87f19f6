use std::ffi::OsString;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

/// Process-wide lock for tests that mutate environment variables.
static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Holds `ENV_LOCK` and puts every touched variable back on drop.
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    /// For sync tests only; blocks the current thread on the lock.
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.blocking_lock(),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.remember(key);
        std::env::set_var(key, value);
        self
    }

    pub fn unset(&mut self, key: &str) -> &mut Self {
        self.remember(key);
        std::env::remove_var(key);
        self
    }

    fn remember(&mut self, key: &str) {
        if !self.saved.iter().any(|(saved, _)| saved == key) {
            self.saved.push((key.to_string(), std::env::var_os(key)));
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}
