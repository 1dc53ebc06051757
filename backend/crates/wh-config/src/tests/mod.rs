mod config;

use std::env;

use tempfile::TempDir;

/// Variables read as lower-priority fallbacks; cleared so the host
/// environment cannot leak into assertions.
const CONVENTIONAL_VARS: [&str; 4] = ["PORT", "SERVER_URL", "NODE_ENV", "GITHUB_WEBHOOK_SECRET"];

/// RAII guard for environment variables - automatically restores on drop
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self { key, original }
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(val) => env::set_var(self.key, val),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Create a temp config directory and set WH_CONFIG_DIR
pub(crate) fn setup_config_dir() -> (TempDir, Vec<EnvGuard>) {
    let temp = TempDir::new().unwrap();
    let mut guards = vec![EnvGuard::set("WH_CONFIG_DIR", temp.path().to_str().unwrap())];
    guards.extend(CONVENTIONAL_VARS.into_iter().map(EnvGuard::remove));
    (temp, guards)
}
