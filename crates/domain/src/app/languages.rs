//! Languages configured for an app.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::validation::Validator;

/// A language code such as `en` or `de-CH`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The master language of every new app.
    pub fn en() -> Self {
        Self::new("en")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Settings of one configured language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    language: Language,
    is_optional: bool,
    fallback: Vec<Language>,
}

impl LanguageConfig {
    /// A required language without fallbacks.
    pub fn new(language: impl Into<Language>) -> Self {
        Self {
            language: language.into(),
            is_optional: false,
            fallback: Vec::new(),
        }
    }

    pub fn optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }

    pub fn fallback<I, L>(mut self, fallback: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Language>,
    {
        self.fallback = fallback.into_iter().map(Into::into).collect();
        self
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn fallbacks(&self) -> &[Language] {
        &self.fallback
    }
}

/// The ordered set of languages of an app, with exactly one master.
///
/// Values are immutable: every transition returns a new config. The master
/// is never optional, fallbacks always name configured languages and no
/// language falls back to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagesConfig {
    configs: Vec<LanguageConfig>,
    master: Language,
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self::new(Language::en())
    }
}

impl LanguagesConfig {
    /// A config containing only `master`.
    pub fn new(master: Language) -> Self {
        Self {
            configs: vec![LanguageConfig::new(master.clone())],
            master,
        }
    }

    pub fn builder(master: impl Into<Language>) -> LanguagesConfigBuilder {
        LanguagesConfigBuilder {
            master: master.into(),
            configs: Vec::new(),
        }
    }

    pub fn master(&self) -> &Language {
        &self.master
    }

    pub fn is_master(&self, language: &Language) -> bool {
        &self.master == language
    }

    pub fn contains(&self, language: &Language) -> bool {
        self.get(language).is_some()
    }

    pub fn get(&self, language: &Language) -> Option<&LanguageConfig> {
        self.configs.iter().find(|c| &c.language == language)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.configs.iter()
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.configs.iter().map(|c| &c.language)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Adds a required language without fallbacks.
    #[must_use]
    pub fn with_language(&self, language: Language) -> Self {
        let mut next = self.clone();
        if !next.contains(&language) {
            next.configs.push(LanguageConfig::new(language));
        }
        next
    }

    /// Removes a language and every fallback pointing at it. The master
    /// cannot be removed.
    #[must_use]
    pub fn without_language(&self, language: &Language) -> Self {
        if self.is_master(language) {
            return self.clone();
        }

        let configs = self
            .configs
            .iter()
            .filter(|c| &c.language != language)
            .map(|c| LanguageConfig {
                fallback: c.fallback.iter().filter(|f| *f != language).cloned().collect(),
                ..c.clone()
            })
            .collect();

        Self {
            configs,
            master: self.master.clone(),
        }
    }

    /// Replaces the settings of a configured language.
    #[must_use]
    pub fn with_updated(&self, config: LanguageConfig) -> Self {
        if !self.contains(&config.language) {
            return self.clone();
        }

        let config = self.sanitize(config);
        let configs = self
            .configs
            .iter()
            .map(|c| {
                if c.language == config.language {
                    config.clone()
                } else {
                    c.clone()
                }
            })
            .collect();

        Self {
            configs,
            master: self.master.clone(),
        }
    }

    /// Makes a configured language the master, which also makes it required.
    #[must_use]
    pub fn with_master(&self, language: &Language) -> Self {
        if !self.contains(language) {
            return self.clone();
        }

        let configs = self
            .configs
            .iter()
            .map(|c| {
                if &c.language == language {
                    LanguageConfig {
                        is_optional: false,
                        ..c.clone()
                    }
                } else {
                    c.clone()
                }
            })
            .collect();

        Self {
            configs,
            master: language.clone(),
        }
    }

    fn sanitize(&self, mut config: LanguageConfig) -> LanguageConfig {
        if self.is_master(&config.language) {
            config.is_optional = false;
        }
        let own = config.language.clone();
        config
            .fallback
            .retain(|f| f != &own && self.contains(f));
        config
    }
}

/// Builds a [`LanguagesConfig`], checking its invariants once at the end.
#[derive(Debug)]
pub struct LanguagesConfigBuilder {
    master: Language,
    configs: Vec<LanguageConfig>,
}

impl LanguagesConfigBuilder {
    pub fn language(mut self, config: LanguageConfig) -> Self {
        self.configs.push(config);
        self
    }

    pub fn build(mut self) -> Result<LanguagesConfig, DomainError> {
        if !self.configs.iter().any(|c| c.language == self.master) {
            self.configs.insert(0, LanguageConfig::new(self.master.clone()));
        }

        let mut validator = Validator::new();

        for (i, config) in self.configs.iter().enumerate() {
            if self.configs[..i].iter().any(|c| c.language == config.language) {
                validator.error(
                    format!("Language {} is configured twice.", config.language),
                    ["Languages"],
                );
            }

            if config.language == self.master && config.is_optional {
                validator.error("Cannot make master language optional.", ["IsMaster"]);
            }

            for fallback in &config.fallback {
                if fallback == &config.language {
                    validator.error(
                        format!("Language {} cannot fall back to itself.", config.language),
                        ["Fallback"],
                    );
                } else if !self.configs.iter().any(|c| &c.language == fallback) {
                    validator.error(
                        format!("Config does not contain fallback language {fallback}."),
                        ["Fallback"],
                    );
                }
            }
        }

        validator.finish("Invalid languages config.")?;

        Ok(LanguagesConfig {
            configs: self.configs,
            master: self.master,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn de() -> Language {
        Language::new("de")
    }

    #[test]
    fn test_default_has_english_master() {
        let config = LanguagesConfig::default();
        assert_eq!(config.master(), &Language::en());
        assert_eq!(config.len(), 1);
        assert!(!config.get(&Language::en()).unwrap().is_optional());
    }

    #[test]
    fn test_transitions_return_new_values() {
        let original = LanguagesConfig::default();
        let added = original.with_language(de());

        assert_eq!(original.len(), 1);
        assert_eq!(added.len(), 2);
        assert!(added.contains(&de()));
    }

    #[test]
    fn test_removing_a_language_strips_fallbacks() {
        let config = LanguagesConfig::default()
            .with_language(de())
            .with_language(Language::new("fr"));
        let config = config.with_updated(LanguageConfig::new("fr").fallback([de()]));
        assert_eq!(config.get(&"fr".into()).unwrap().fallbacks(), &[de()]);

        let config = config.without_language(&de());
        assert!(!config.contains(&de()));
        assert!(config.get(&"fr".into()).unwrap().fallbacks().is_empty());
    }

    #[test]
    fn test_master_cannot_be_removed() {
        let config = LanguagesConfig::default().without_language(&Language::en());
        assert!(config.contains(&Language::en()));
    }

    #[test]
    fn test_new_master_becomes_required() {
        let config = LanguagesConfig::default()
            .with_language(de())
            .with_updated(LanguageConfig::new(de()).optional(true));
        assert!(config.get(&de()).unwrap().is_optional());

        let config = config.with_master(&de());
        assert!(config.is_master(&de()));
        assert!(!config.get(&de()).unwrap().is_optional());
    }

    #[test]
    fn test_update_drops_self_and_unknown_fallbacks() {
        let config = LanguagesConfig::default()
            .with_language(de())
            .with_updated(LanguageConfig::new(de()).fallback(["de", "en", "it"]));
        assert_eq!(config.get(&de()).unwrap().fallbacks(), &[Language::en()]);
    }

    #[test]
    fn test_builder_validates_all_invariants() {
        let result = LanguagesConfig::builder("en")
            .language(LanguageConfig::new("en").optional(true))
            .language(LanguageConfig::new("de").fallback(["de", "it"]))
            .build();

        match result {
            Err(DomainError::Validation { errors, .. }) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_builder_adds_missing_master() {
        let config = LanguagesConfig::builder("de")
            .language(LanguageConfig::new("en").fallback(["de"]))
            .build()
            .unwrap();

        assert_eq!(config.master(), &de());
        assert_eq!(config.languages().next(), Some(&de()));
        assert_eq!(config.len(), 2);
    }
}
