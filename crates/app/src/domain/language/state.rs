//! Persisted language state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    domain::language::{Direction, Language},
    storage::{KeyValueStore, LANGUAGE_KEY, load_json, save_json},
};

/// The persisted language/direction pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSettings {
    pub language: Language,

    #[serde(default)]
    pub direction: Direction,
}

impl From<Language> for LanguageSettings {
    fn from(language: Language) -> Self {
        Self {
            language,
            direction: language.direction(),
        }
    }
}

/// Current interface language.
///
/// Every change is persisted and published to subscribers, which is where
/// presentation code applies `lang`/`dir` attributes.
pub struct LanguageState {
    storage: Arc<dyn KeyValueStore>,
    settings: watch::Sender<LanguageSettings>,
}

impl LanguageState {
    /// Hydrate from storage, falling back to English when nothing usable is
    /// stored.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let settings = match load_json::<LanguageSettings>(storage.as_ref(), LANGUAGE_KEY) {
            // Direction is always derived, never trusted from storage.
            Ok(Some(stored)) => LanguageSettings::from(stored.language),
            Ok(None) => LanguageSettings::default(),
            Err(error) => {
                warn!(%error, "ignoring unreadable language preference");
                LanguageSettings::default()
            }
        };

        Self {
            storage,
            settings: watch::Sender::new(settings),
        }
    }

    #[must_use]
    pub fn settings(&self) -> LanguageSettings {
        *self.settings.borrow()
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.settings().language
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.settings().direction
    }

    /// Subscribe to language changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LanguageSettings> {
        self.settings.subscribe()
    }

    /// Switch language. Returns the new settings.
    ///
    /// Persistence failures are logged; the in-memory language still changes.
    pub fn set_language(&self, language: Language) -> LanguageSettings {
        let settings = LanguageSettings::from(language);

        if let Err(error) = save_json(self.storage.as_ref(), LANGUAGE_KEY, &settings) {
            warn!(%error, %language, "failed to persist language preference");
        }

        self.settings.send_if_modified(|current| {
            if *current == settings {
                return false;
            }

            *current = settings;

            true
        });

        debug!(%language, direction = %settings.direction, "language set");

        settings
    }
}
