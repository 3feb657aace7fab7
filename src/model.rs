use serde::Deserialize;

use crate::format::{human_bytes, relative_time};

/// The three picker tabs. A session runs with a configurable ordered subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Tab {
    Install,
    Manage,
    Monitor,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Tab::Install => "Install",
            Tab::Manage => "Manage",
            Tab::Monitor => "Monitor",
        }
    }

    pub fn list_title(self) -> &'static str {
        match self {
            Tab::Install => "Pick a model to install",
            Tab::Manage => "Pick an installed model",
            Tab::Monitor => "Pick a running model",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Actions available on the Manage tab, gated by the session's approved set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ManageAction {
    Update,
    Delete,
    Chat,
}

impl ManageAction {
    pub fn label(self) -> &'static str {
        match self {
            ManageAction::Update => "Update",
            ManageAction::Delete => "Delete",
            ManageAction::Chat => "Chat",
        }
    }

    /// Single-letter picker shortcut, valid on the Manage tab only.
    pub fn shortcut(self) -> char {
        match self {
            ManageAction::Update => 'u',
            ManageAction::Delete => 'd',
            ManageAction::Chat => 'c',
        }
    }
}

impl std::fmt::Display for ManageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry scraped from the remote library catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogModel {
    pub name: String,
    pub description: String,
    /// Display strings as shown on the catalog page ("5.2M", "93").
    pub pulls: String,
    pub tag_count: String,
    pub updated: String,
    /// Capability / parameter-size badges ("vision", "8b", ...).
    pub badges: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub families: Option<Vec<String>>,
    #[serde(default)]
    pub parameter_size: String,
    #[serde(default)]
    pub quantization_level: String,
}

impl ModelDetails {
    /// Models with a clip projector alongside the base family take images.
    pub fn is_multimodal(&self) -> bool {
        self.families
            .as_deref()
            .is_some_and(|f| f.iter().any(|fam| fam == "clip"))
    }
}

/// A model present on the daemon's disk, as reported by `GET /api/tags`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InstalledModel {
    pub name: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub details: ModelDetails,
}

/// A model resident in memory, as reported by `GET /api/ps`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunningModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub size_vram: u64,
    #[serde(default)]
    pub expires_at: String,
    #[serde(default)]
    pub details: ModelDetails,
}

impl RunningModel {
    /// Share of the model resident in accelerator memory, in percent.
    pub fn vram_percent(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.size_vram as f64 * 100.0 / self.size as f64
    }

    pub fn cpu_percent(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        100.0 - self.vram_percent()
    }
}

/// The common capability the selector lists operate on. Only the detail
/// pane looks past this at concrete variant fields.
pub trait Listable {
    fn title(&self) -> &str;
    fn description(&self) -> String;
    fn filter_value(&self) -> &str;
}

impl Listable for CatalogModel {
    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!(
            "↓ {} • {} tags • {}",
            self.pulls, self.tag_count, self.updated
        )
    }

    fn filter_value(&self) -> &str {
        &self.name
    }
}

impl Listable for InstalledModel {
    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        let mut desc = format!(
            "{} • {} • {}",
            human_bytes(self.size),
            self.details.parameter_size,
            relative_time(&self.modified_at),
        );
        if self.details.is_multimodal() {
            desc.push_str(" • vision");
        }
        desc
    }

    fn filter_value(&self) -> &str {
        &self.name
    }
}

impl Listable for RunningModel {
    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!(
            "{} • expires {}",
            self.details.parameter_size,
            relative_time(&self.expires_at),
        )
    }

    fn filter_value(&self) -> &str {
        &self.name
    }
}

/// What the picker session resolved to. Created once the selector
/// terminates, consumed exactly once downstream. At most one of the three
/// model slots is non-empty.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    pub action: Option<Tab>,
    pub manage_action: Option<ManageAction>,
    pub installable: Option<CatalogModel>,
    pub installed: Option<InstalledModel>,
    pub running: Option<RunningModel>,
    /// The session's approved manage actions, carried along so downstream
    /// steps can re-establish the approved-action invariant.
    pub approved_actions: Vec<ManageAction>,
}

impl Selection {
    /// Name of whichever model was picked, if any.
    pub fn model_name(&self) -> Option<&str> {
        self.installable
            .as_ref()
            .map(|m| m.name.as_str())
            .or_else(|| self.installed.as_ref().map(|m| m.name.as_str()))
            .or_else(|| self.running.as_ref().map(|m| m.name.as_str()))
            .filter(|n| !n.is_empty())
    }

    pub fn filled_slots(&self) -> usize {
        usize::from(self.installable.is_some())
            + usize::from(self.installed.is_some())
            + usize::from(self.running.is_some())
    }
}

/// One record of the daemon's chunked pull stream.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ProgressUpdate {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
}

impl ProgressUpdate {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// What the user chose to do with a running model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunningChoice {
    KeepLoaded,
    Free,
    Nothing,
}

impl RunningChoice {
    /// The `keep_alive` value the daemon expects, or `None` when no request
    /// should be made at all.
    pub fn keep_alive_seconds(self) -> Option<i64> {
        match self {
            RunningChoice::KeepLoaded => Some(-1),
            RunningChoice::Free => Some(0),
            RunningChoice::Nothing => None,
        }
    }
}
