use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("preferences lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub username: Option<String>,
    pub theme_mode: ThemeMode,
    pub onboarding_complete: bool,
}

/// Key-value settings kept beside, never inside, the history database. The
/// API key lives in its own file so clearing it and reading it stay separate
/// from ordinary preferences.
pub struct PreferencesStore {
    prefs_path: PathBuf,
    api_key_path: PathBuf,
    lock: Mutex<()>,
}

impl PreferencesStore {
    pub fn new(dir: &Path, config: &AppConfig) -> Self {
        Self {
            prefs_path: dir.join(&config.preferences_file_name),
            api_key_path: dir.join(&config.api_key_file_name),
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, PreferencesError> {
        self.lock.lock().map_err(|_| PreferencesError::LockPoisoned)
    }

    pub fn load(&self) -> Result<Preferences, PreferencesError> {
        let _guard = self.guard()?;
        self.read_prefs()
    }

    pub fn username(&self) -> Result<Option<String>, PreferencesError> {
        Ok(self.load()?.username)
    }

    pub fn set_username(&self, username: &str) -> Result<(), PreferencesError> {
        self.update(|prefs| prefs.username = Some(username.to_string()))
    }

    pub fn theme_mode(&self) -> Result<ThemeMode, PreferencesError> {
        Ok(self.load()?.theme_mode)
    }

    pub fn set_theme_mode(&self, theme_mode: ThemeMode) -> Result<(), PreferencesError> {
        self.update(|prefs| prefs.theme_mode = theme_mode)
    }

    pub fn is_onboarding_complete(&self) -> Result<bool, PreferencesError> {
        Ok(self.load()?.onboarding_complete)
    }

    pub fn set_onboarding_complete(&self, complete: bool) -> Result<(), PreferencesError> {
        self.update(|prefs| prefs.onboarding_complete = complete)
    }

    pub fn api_key(&self) -> Result<Option<String>, PreferencesError> {
        let _guard = self.guard()?;
        match fs::read_to_string(&self.api_key_path) {
            Ok(raw) => Ok(Some(raw.trim().to_string()).filter(|key| !key.is_empty())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn set_api_key(&self, api_key: &str) -> Result<(), PreferencesError> {
        let _guard = self.guard()?;
        write_file(&self.api_key_path, api_key.trim().as_bytes())?;
        restrict_permissions(&self.api_key_path)?;
        info!("api key saved");
        Ok(())
    }

    /// Removes the API key and every preference.
    pub fn clear(&self) -> Result<(), PreferencesError> {
        let _guard = self.guard()?;
        remove_file_if_exists(&self.api_key_path)?;
        remove_file_if_exists(&self.prefs_path)?;
        info!("preferences cleared");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Preferences)) -> Result<(), PreferencesError> {
        let _guard = self.guard()?;
        let mut prefs = self.read_prefs()?;
        apply(&mut prefs);
        write_file(&self.prefs_path, &serde_json::to_vec_pretty(&prefs)?)
    }

    fn read_prefs(&self) -> Result<Preferences, PreferencesError> {
        let raw = match fs::read(&self.prefs_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_slice(&raw) {
            Ok(prefs) => Ok(prefs),
            Err(err) => {
                warn!("unreadable preferences file, using defaults: {err}");
                Ok(Preferences::default())
            }
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PreferencesError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_file_if_exists(path: &Path) -> Result<(), PreferencesError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), PreferencesError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), PreferencesError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;

    use uuid::Uuid;

    use super::*;

    fn temp_dir() -> PathBuf {
        env::temp_dir().join(format!("funbox-prefs-{}", Uuid::new_v4()))
    }

    #[test]
    fn defaults_when_nothing_saved() {
        let dir = temp_dir();
        let store = PreferencesStore::new(&dir, &AppConfig::default());
        assert_eq!(store.load().expect("load"), Preferences::default());
        assert_eq!(store.theme_mode().expect("theme"), ThemeMode::Light);
        assert_eq!(store.api_key().expect("api key"), None);
    }

    #[test]
    fn values_persist_across_instances() {
        let dir = temp_dir();
        let config = AppConfig::default();
        {
            let store = PreferencesStore::new(&dir, &config);
            store.set_username("ada").expect("username");
            store.set_theme_mode(ThemeMode::Dark).expect("theme");
            store.set_onboarding_complete(true).expect("onboarding");
            store.set_api_key(" secret-key \n").expect("api key");
        }

        let store = PreferencesStore::new(&dir, &config);
        assert_eq!(store.username().expect("username").as_deref(), Some("ada"));
        assert_eq!(store.theme_mode().expect("theme"), ThemeMode::Dark);
        assert!(store.is_onboarding_complete().expect("onboarding"));
        assert_eq!(store.api_key().expect("api key").as_deref(), Some("secret-key"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn clear_removes_everything_and_is_repeatable() {
        let dir = temp_dir();
        let store = PreferencesStore::new(&dir, &AppConfig::default());
        store.set_username("ada").expect("username");
        store.set_api_key("secret").expect("api key");

        store.clear().expect("clear");
        store.clear().expect("clear again");
        assert_eq!(store.load().expect("load"), Preferences::default());
        assert_eq!(store.api_key().expect("api key"), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = temp_dir();
        let config = AppConfig::default();
        fs::create_dir_all(&dir).expect("dir");
        fs::write(dir.join(&config.preferences_file_name), b"{not json").expect("seed");

        let store = PreferencesStore::new(&dir, &config);
        assert_eq!(store.load().expect("load"), Preferences::default());

        let _ = fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn api_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir();
        let config = AppConfig::default();
        let store = PreferencesStore::new(&dir, &config);
        store.set_api_key("secret").expect("api key");

        let mode = fs::metadata(dir.join(&config.api_key_file_name))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);

        let _ = fs::remove_dir_all(&dir);
    }
}
