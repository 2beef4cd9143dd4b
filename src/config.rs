use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::{
    search::{SuggestionLimits, TagId},
    storage::{self, StorageManager},
};

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_BOARD_PATH: &str = "board.json";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_SUGGESTIONS: usize = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Board file, relative paths resolve against the base dir.
    #[serde(default = "default_board_path")]
    pub board_path: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_max_suggestions")]
    pub max_tag_suggestions: usize,

    #[serde(default = "default_max_suggestions")]
    pub max_alias_suggestions: usize,

    /// Suggest filter names alongside tags.
    #[serde(default = "default_show_filters")]
    pub show_filters: bool,

    /// Tags always excluded from search results and suggestions.
    #[serde(default)]
    pub filter_tags: Vec<TagId>,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board_path: default_board_path(),
            listen_addr: default_listen_addr(),
            max_tag_suggestions: DEFAULT_MAX_SUGGESTIONS,
            max_alias_suggestions: DEFAULT_MAX_SUGGESTIONS,
            show_filters: default_show_filters(),
            filter_tags: Vec::new(),
            base_path: PathBuf::new(),
        }
    }
}

fn default_board_path() -> String {
    DEFAULT_BOARD_PATH.to_string()
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_max_suggestions() -> usize {
    DEFAULT_MAX_SUGGESTIONS
}

fn default_show_filters() -> bool {
    true
}

impl Config {
    fn validate(&mut self) -> anyhow::Result<()> {
        if self.board_path.trim().is_empty() {
            bail!("board_path cannot be empty");
        }

        if let Err(err) = self.listen_addr.parse::<std::net::SocketAddr>() {
            bail!("listen_addr {:?} is invalid: {err}", self.listen_addr);
        }

        if self.max_tag_suggestions == 0 {
            self.max_tag_suggestions = 1
        }
        if self.max_alias_suggestions == 0 {
            self.max_alias_suggestions = 1
        }

        self.filter_tags.sort_unstable();
        self.filter_tags.dedup();

        Ok(())
    }

    pub fn load_with(base_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let base_path = base_path.as_ref();
        let store = storage::BackendLocal::new(base_path)
            .with_context(|| format!("failed to create {}", base_path.display()))?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store
                .write(CONFIG_FILE, serde_yml::to_string(&Self::default())?.as_bytes())
                .context("failed to write default config")?;
            log::info!("created {}", store.path(CONFIG_FILE).display());
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)
            .context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store
            .write(CONFIG_FILE, config_str.as_bytes())
            .context("failed to save config")
    }

    pub fn board_path(&self) -> PathBuf {
        self.base_path.join(&self.board_path)
    }

    pub fn suggestion_limits(&self) -> SuggestionLimits {
        SuggestionLimits {
            max_tags: self.max_tag_suggestions,
            max_aliases: self.max_alias_suggestions,
        }
    }
}
