// Language configuration management for the execution provider
use anyhow::{Context, Result, bail};
use codepanel_common::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    /// Runtime name understood by the execution provider
    pub runtime: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub file_name: String,
}

fn default_version() -> String {
    "*".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageConfig>,
}

/// Language configuration manager
#[derive(Debug, Clone)]
pub struct LanguageConfigManager {
    configs: HashMap<Language, LanguageConfig>,
}

impl LanguageConfigManager {
    /// Load language configurations from languages.json
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Language config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .context("Failed to read languages.json")?;

        let languages_json: LanguagesJson = serde_json::from_str(&content)
            .context("Failed to parse languages.json")?;

        Self::from_configs(languages_json.languages)
            .with_context(|| format!("Invalid language config in {}", config_path.display()))
    }

    /// Build from explicit entries; every entry must name a supported language
    pub fn from_configs(entries: Vec<LanguageConfig>) -> Result<Self> {
        let mut configs = HashMap::new();
        for lang in entries {
            let language: Language = lang.name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            configs.insert(language, lang);
        }

        if configs.is_empty() {
            bail!("No languages configured");
        }

        Ok(Self { configs })
    }

    /// Load from `path`, falling back to built-in defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "Language config not found, using built-in defaults");
            Ok(Self::default())
        }
    }

    /// Get configuration for a specific language
    pub fn get_config(&self, language: Language) -> Result<&LanguageConfig> {
        self.configs
            .get(&language)
            .ok_or_else(|| anyhow::anyhow!("No configuration found for language: {}", language))
    }

    /// Whether solutions in `language` can be executed at all
    pub fn is_enabled(&self, language: Language) -> bool {
        self.configs.contains_key(&language)
    }

    /// List all configured languages
    pub fn list_languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.configs.keys().copied().collect();
        languages.sort();
        languages
    }
}

impl Default for LanguageConfigManager {
    fn default() -> Self {
        let configs = Language::ALL
            .into_iter()
            .map(|language| {
                let file_name = match language {
                    Language::JavaScript => "main.js",
                    Language::Python => "main.py",
                    Language::Java => "Main.java",
                };
                let config = LanguageConfig {
                    name: language.to_string(),
                    runtime: language.to_string(),
                    version: default_version(),
                    file_name: file_name.to_string(),
                };
                (language, config)
            })
            .collect();

        Self { configs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_cover_every_language() {
        let manager = LanguageConfigManager::default();
        for language in Language::ALL {
            let config = manager.get_config(language).unwrap();
            assert_eq!(config.version, "*");
        }
        assert_eq!(manager.get_config(Language::Java).unwrap().file_name, "Main.java");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"languages": [{{"name": "python", "runtime": "python3", "file_name": "a.py"}}]}}"#
        )
        .unwrap();

        let manager = LanguageConfigManager::load(file.path()).unwrap();

        assert!(manager.is_enabled(Language::Python));
        assert!(!manager.is_enabled(Language::Java));
        assert_eq!(manager.get_config(Language::Python).unwrap().runtime, "python3");
        assert!(manager.get_config(Language::Java).is_err());
    }

    #[test]
    fn test_unknown_language_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"languages": [{{"name": "cobol", "runtime": "cobol", "file_name": "a.cob"}}]}}"#
        )
        .unwrap();

        assert!(LanguageConfigManager::load(file.path()).is_err());
    }

    #[test]
    fn test_from_configs_subset() {
        let manager = LanguageConfigManager::from_configs(vec![LanguageConfig {
            name: "js".to_string(),
            runtime: "node".to_string(),
            version: default_version(),
            file_name: "main.js".to_string(),
        }])
        .unwrap();

        assert_eq!(manager.list_languages(), vec![Language::JavaScript]);
        assert!(!manager.is_enabled(Language::Python));
        assert!(LanguageConfigManager::from_configs(Vec::new()).is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let manager =
            LanguageConfigManager::load_or_default(Path::new("does/not/exist.json")).unwrap();
        assert_eq!(manager.list_languages().len(), 3);
    }
}
