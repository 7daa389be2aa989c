//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::dataset::DEFAULT_SUMMARY_MAX_LEN;
use crate::domain::model::{ExampleFields, TemplateConfig};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".fewshot/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub template: Option<TemplateConfig>,
    #[serde(default)]
    pub export: Export,
    #[serde(default)]
    pub display: Display,
}

/// Initial form values for a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    system: Option<String>,
    #[serde(default)]
    apis: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl Defaults {
    fn default_system() -> &'static str {
        "You are a helpful radiology assistant. Here I have one image, and please answer me the \
question by first providing your step by step thoughts in natural language using the supported \
actions provided in the Python code APIs, and then output the corresponding consistent code that \
use the APIs provided step by step. Finally, you execute the code, show me the intermediate \
results and the final answer, and then give me the response."
    }

    fn default_apis() -> &'static str {
        r#"# Example API doc
def classify_image(img_array: np.array) -> str:
    """classify the image into one of the 14 modalities and return the class"""

def read_rgb(img_path: str) -> np.array:
    """read the rgb image from the file path and return a 3d array"""
"#
    }

    fn default_question() -> &'static str {
        "What modality is this image?"
    }

    fn default_code() -> &'static str {
        "def answer_code():\n    cls = classify_image(img_array)\n    return cls\n"
    }

    pub fn system(&self) -> String {
        self.system
            .clone()
            .unwrap_or_else(|| Self::default_system().to_owned())
    }

    pub fn apis(&self) -> String {
        self.apis
            .clone()
            .unwrap_or_else(|| Self::default_apis().to_owned())
    }

    pub fn question(&self) -> String {
        self.question
            .clone()
            .unwrap_or_else(|| Self::default_question().to_owned())
    }

    pub fn code(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| Self::default_code().to_owned())
    }

    /// Form values a fresh session starts with. The API doc block seeds both the global and the
    /// per-example editors; thought and answer start empty.
    pub fn fields(&self) -> ExampleFields {
        let apis = self.apis();
        ExampleFields {
            system: self.system(),
            global_apis: apis.clone(),
            apis,
            question: self.question(),
            thought: String::new(),
            code: self.code(),
            answer: String::new(),
        }
    }
}

/// Unset values fall back to built-in defaults, so a layer only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Export {
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    keep_system: Option<bool>,
}

impl Export {
    fn default_output_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_keep_system() -> bool {
        true
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(Self::default_output_dir)
    }

    pub fn keep_system(&self) -> bool {
        self.keep_system
            .unwrap_or_else(Self::default_keep_system)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    #[serde(default = "Display::default_summary_max_len")]
    pub summary_max_len: usize,
}

impl Display {
    fn default_summary_max_len() -> usize {
        DEFAULT_SUMMARY_MAX_LEN
    }
}

impl Default for Display {
    fn default() -> Self {
        Self {
            summary_max_len: Self::default_summary_max_len(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    export_dir: Option<String>,
    keep_system: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            export_dir: env::var("FEWSHOT_EXPORT_DIR").ok(),
            keep_system: env::var("FEWSHOT_KEEP_SYSTEM").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(export_dir: &str, keep_system: &str) -> Self {
        Self {
            export_dir: Some(export_dir.to_owned()),
            keep_system: Some(keep_system.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    /// Template a new session starts with.
    pub fn initial_template(&self) -> TemplateConfig {
        self.template.clone().unwrap_or_default()
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            template: other.template.or(self.template),
            export: merge_export(self.export, other.export),
            display: merge_display(self.display, other.display),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        system: overlay.system.or(base.system),
        apis: overlay.apis.or(base.apis),
        question: overlay.question.or(base.question),
        code: overlay.code.or(base.code),
    }
}

fn merge_export(mut base: Export, overlay: Export) -> Export {
    if let Some(value) = overlay.output_dir {
        base.output_dir = Some(value);
    }
    if let Some(value) = overlay.keep_system {
        base.keep_system = Some(value);
    }
    base
}

fn merge_display(base: Display, overlay: Display) -> Display {
    Display {
        summary_max_len: if overlay.summary_max_len != Display::default_summary_max_len() {
            overlay.summary_max_len
        } else {
            base.summary_max_len
        },
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("fewshot/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(dir) = env.export_dir.filter(|dir| !dir.trim().is_empty()) {
        config.export.output_dir = Some(PathBuf::from(dir));
    }
    if let Some(flag) = env.keep_system {
        match parse_flag(&flag) {
            Some(value) => config.export.keep_system = Some(value),
            None => tracing::warn!(value = %flag, "ignoring invalid FEWSHOT_KEEP_SYSTEM"),
        }
    }
    config
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
