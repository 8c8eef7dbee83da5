use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use windlint_bridge::BridgeConfig;
use windlint_linter::{
    DiagnosticLevel, EnforceCanonicalClassesRule, NoConflictingClassesRule, PropertyTable,
    RuleRegistry,
};

pub const DEFAULT_CONFIG_NAME: &str = "windlint.config.json";

/// windlint configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// File extensions to lint
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns, relative to the config directory, to skip
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Per-rule severity
    #[serde(default)]
    pub rules: RulesConfig,

    /// Diagnostics server consulted for canonical suggestions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeOptions>,

    /// JSON map of class → declared CSS properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_table: Option<String>,
}

fn default_include() -> Vec<String> {
    [
        "html", "htm", "jsx", "tsx", "js", "ts", "vue", "svelte", "astro", "php", "erb", "hbs",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/dist/**".to_string()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleLevel {
    Off,
    Warning,
    Error,
}

impl RuleLevel {
    pub fn diagnostic_level(self) -> Option<DiagnosticLevel> {
        match self {
            RuleLevel::Off => None,
            RuleLevel::Warning => Some(DiagnosticLevel::Warning),
            RuleLevel::Error => Some(DiagnosticLevel::Error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RulesConfig {
    #[serde(default = "error_level")]
    pub no_conflicting_classes: RuleLevel,

    #[serde(default = "warning_level")]
    pub enforce_canonical_classes: RuleLevel,
}

fn error_level() -> RuleLevel {
    RuleLevel::Error
}

fn warning_level() -> RuleLevel {
    RuleLevel::Warning
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            no_conflicting_classes: error_level(),
            enforce_canonical_classes: warning_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeOptions {
    /// Server executable
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Language id sent for every document instead of the one derived
    /// from the file extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,

    /// Answer to the server's `workspace/configuration` requests
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub settings: Value,
}

fn default_timeout_ms() -> u64 {
    1000
}

impl Default for BridgeOptions {
    fn default() -> Self {
        let defaults = BridgeConfig::default();
        Self {
            command: defaults.command,
            args: defaults.args,
            timeout_ms: default_timeout_ms(),
            language_id: None,
            settings: Value::Null,
        }
    }
}

impl BridgeOptions {
    pub fn to_bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            command: self.command.clone(),
            args: self.args.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            language_id: self.language_id.clone(),
            settings: if self.settings.is_null() {
                json!({})
            } else {
                self.settings.clone()
            },
        }
    }
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid {}", config_path.display()))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Build the rule registry for the configured levels
    pub fn registry(&self, cwd: &str) -> anyhow::Result<RuleRegistry> {
        let mut registry = RuleRegistry::empty();

        if let Some(level) = self.rules.no_conflicting_classes.diagnostic_level() {
            let mut rule = NoConflictingClassesRule::new().with_level(level);
            if let Some(table_path) = &self.property_table {
                let path = PathBuf::from(cwd).join(table_path);
                let table = PropertyTable::load(&path)
                    .with_context(|| format!("Cannot load property table {}", path.display()))?;
                rule = rule.with_lookup(Arc::new(table));
            }
            registry.add_rule(Box::new(rule));
        }

        if let Some(level) = self.rules.enforce_canonical_classes.diagnostic_level() {
            registry.add_rule(Box::new(EnforceCanonicalClassesRule::new().with_level(level)));
        }

        Ok(registry)
    }

    /// Whether a file should be linted
    pub fn includes(&self, path: &Path, cwd: &str) -> bool {
        let has_extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                self.include
                    .iter()
                    .any(|included| included.eq_ignore_ascii_case(extension))
            });
        if !has_extension {
            return false;
        }

        let relative = path.strip_prefix(cwd).unwrap_or(path);
        !self.exclude.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|pattern| pattern.matches_path(relative) || pattern.matches_path(path))
                .unwrap_or(false)
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            rules: RulesConfig::default(),
            bridge: None,
            property_table: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "include": ["html", "tsx"],
            "rules": { "enforce-canonical-classes": "off" },
            "bridge": { "command": "tailwindcss-language-server", "args": ["--stdio"], "timeoutMs": 250 },
            "propertyTable": "classes.json"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.include, vec!["html", "tsx"]);
        assert_eq!(config.rules.no_conflicting_classes, RuleLevel::Error);
        assert_eq!(config.rules.enforce_canonical_classes, RuleLevel::Off);
        assert_eq!(config.property_table.as_deref(), Some("classes.json"));

        let bridge = config.bridge.unwrap().to_bridge_config();
        assert_eq!(bridge.timeout, Duration::from_millis(250));
        assert_eq!(bridge.args, vec!["--stdio"]);
        assert_eq!(bridge.settings, json!({}));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.include.contains(&"tsx".to_string()));
        assert!(config.bridge.is_none());
        assert_eq!(config.registry(".").unwrap().rules().len(), 2);
    }

    #[test]
    fn test_rules_can_be_turned_off() {
        let mut config = Config::default();
        config.rules.no_conflicting_classes = RuleLevel::Off;
        let registry = config.registry(".").unwrap();
        let names: Vec<_> = registry.rules().iter().map(|rule| rule.name()).collect();
        assert_eq!(names, ["enforce-canonical-classes"]);
    }

    #[test]
    fn test_missing_property_table_is_an_error() {
        let config = Config {
            property_table: Some("does-not-exist.json".to_string()),
            ..Config::default()
        };
        assert!(config.registry("/nonexistent-dir").is_err());
    }

    #[test]
    fn test_includes() {
        let config = Config::default();
        assert!(config.includes(Path::new("/app/src/page.tsx"), "/app"));
        assert!(config.includes(Path::new("/app/index.HTML"), "/app"));
        assert!(!config.includes(Path::new("/app/styles.css"), "/app"));
        assert!(!config.includes(Path::new("/app/node_modules/x/a.html"), "/app"));
        assert!(!config.includes(Path::new("/app/README"), "/app"));
    }
}
