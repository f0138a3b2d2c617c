use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".tweelocrc.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root of the source tree to extract from.
    #[serde(default = "default_source_root")]
    pub source_root: String,
    /// Root directory for all dictionary stages.
    #[serde(default = "default_dicts_root")]
    pub dicts_root: String,
    /// Target language tag; also the per-language subdirectory name.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Source file extensions, without the dot.
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    /// Token budget per translation batch.
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,
    /// Expected output tokens per input token.
    #[serde(default = "default_output_amplification")]
    pub output_amplification: f64,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_source_root() -> String {
    "./game".to_string()
}

fn default_dicts_root() -> String {
    "./dicts".to_string()
}

fn default_language() -> String {
    "zh-Hans".to_string()
}

fn default_source_extensions() -> Vec<String> {
    ["twee", "js"].map(String::from).to_vec()
}

fn default_token_budget() -> usize {
    32_000
}

fn default_output_amplification() -> f64 {
    2.0
}

fn default_model() -> String {
    "qwen3:8b".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            dicts_root: default_dicts_root(),
            language: default_language(),
            includes: Vec::new(),
            ignores: Vec::new(),
            source_extensions: default_source_extensions(),
            token_budget: default_token_budget(),
            output_amplification: default_output_amplification(),
            model: default_model(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob patterns in `ignores` or `includes` are
    /// invalid, or if numeric settings are out of range.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }
        for pattern in &self.includes {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'includes': \"{}\"", pattern))?;
        }
        if self.output_amplification < 1.0 {
            anyhow::bail!(
                "'outputAmplification' must be at least 1.0, got {}",
                self.output_amplification
            );
        }
        if self.source_extensions.is_empty() {
            anyhow::bail!("'sourceExtensions' must not be empty");
        }
        Ok(())
    }

    // Stage roots under dicts_root. Raw dictionaries and the extraction
    // cache are language-independent; diff and output trees are per
    // language.

    pub fn raw_root(&self) -> PathBuf {
        Path::new(&self.dicts_root).join("raw")
    }

    pub fn cache_root(&self) -> PathBuf {
        Path::new(&self.dicts_root).join("cache")
    }

    pub fn translated_root(&self) -> PathBuf {
        Path::new(&self.dicts_root)
            .join(&self.language)
            .join("translated")
    }

    pub fn diff_root(&self) -> PathBuf {
        Path::new(&self.dicts_root).join(&self.language).join("diff")
    }

    pub fn diff_translated_root(&self) -> PathBuf {
        Path::new(&self.dicts_root)
            .join(&self.language)
            .join("diff-translated")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.diff_translated_root().join("state.json")
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::tempdir;

    use crate::config::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.ignores.is_empty());
        assert_eq!(config.source_extensions, vec!["twee", "js"]);
        assert_eq!(config.token_budget, 32_000);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "sourceRoot": "./lib/game",
            "language": "zh-Hans",
            "ignores": ["**/generated/**"],
            "tokenBudget": 8000
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.source_root, "./lib/game");
        assert_eq!(config.token_budget, 8000);
        assert_eq!(config.ignores, vec!["**/generated/**"]);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.model, "qwen3:8b");
    }

    #[test]
    fn test_validate_rejects_bad_glob() {
        let config = Config {
            ignores: vec!["[".to_string()],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_low_amplification() {
        let config = Config {
            output_amplification: 0.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stage_roots() {
        let config = Config {
            dicts_root: "dicts".to_string(),
            language: "zh-Hans".to_string(),
            ..Config::default()
        };
        assert_eq!(config.raw_root(), Path::new("dicts/raw"));
        assert_eq!(config.diff_root(), Path::new("dicts/zh-Hans/diff"));
        assert_eq!(
            config.checkpoint_path(),
            Path::new("dicts/zh-Hans/diff-translated/state.json")
        );
    }

    #[test]
    fn test_find_config_file_stops_at_git() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();

        assert!(find_config_file(&nested).is_none());

        File::create(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        let result = load_config(dir.path()).unwrap();
        assert!(!result.from_file);
        assert_eq!(result.config.language, "zh-Hans");
    }
}
