//! Typed run configuration for seqgen.
//!
//! Uses `figment` for layered configuration: built-in defaults -> user config
//! file -> workspace config file -> extra file -> environment. CLI overrides
//! are applied on top by the resolver (`crate::resolve`), which works on the
//! serialized tree so unknown keys can be rejected.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Execution mode for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Train,
    Test,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Train => write!(f, "train"),
            RunMode::Test => write!(f, "test"),
        }
    }
}

/// Active default selections, one per category.
///
/// Recorded in the resolved configuration so a persisted `config.toml` is
/// self-describing about which presets produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSelections {
    pub model: String,
    pub optim: String,
    pub schedule: String,
    pub dataset: String,
}

impl Default for DefaultSelections {
    fn default() -> Self {
        Self {
            model: "vaecl".to_string(),
            optim: "adam".to_string(),
            schedule: "exp".to_string(),
            dataset: "west".to_string(),
        }
    }
}

/// Top-level configuration for a training or evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed for all random number generators in a run.
    pub random_seed: u64,
    /// Whether to place model and data on a CUDA device.
    pub use_cuda: bool,
    /// Train or test mode.
    pub mode: RunMode,
    /// Length of the conditioning history window.
    pub history_length: usize,
    /// Length of the prediction window.
    pub forward_length: usize,
    /// Name of the save directory segment under the dataset root.
    pub save_dir: String,
    /// Active default selections.
    pub defaults: DefaultSelections,
    pub model: ModelConfig,
    pub train: TrainConfig,
    pub test: TestConfig,
    pub dataset: DatasetConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            random_seed: 0,
            use_cuda: false,
            mode: RunMode::Train,
            history_length: 64,
            forward_length: 32,
            save_dir: "default".to_string(),
            defaults: DefaultSelections::default(),
            model: ModelConfig::default(),
            train: TrainConfig::default(),
            test: TestConfig::default(),
            dataset: DatasetConfig::default(),
        }
    }
}

/// Model variant and hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Variant name: "vaecl", "vrnn", "srnn", "deepar".
    pub r#type: String,
    /// Latent state dimension.
    pub d: usize,
    /// Hidden size of the recurrent network.
    pub k: usize,
    /// Number of stacked recurrent layers.
    pub num_layers: usize,
    /// Dropout probability between recurrent layers.
    pub dropout: f64,
    /// Recurrent cell type: "lstm", "gru", "rnn".
    pub net_type: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            r#type: "vaecl".to_string(),
            d: 10,
            k: 64,
            num_layers: 1,
            dropout: 0.1,
            net_type: "lstm".to_string(),
        }
    }
}

/// Training loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub batch_size: usize,
    pub epochs: usize,
    /// Evaluate on held-out data every this many epochs.
    pub eval_epochs: usize,
    pub optim: OptimConfig,
    pub schedule: ScheduleConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 128,
            epochs: 200,
            eval_epochs: 10,
            optim: OptimConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

/// Optimizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimConfig {
    /// Optimizer name: "adam", "sgd", "rmsprop".
    pub r#type: String,
    pub lr: f64,
    pub weight_decay: f64,
    /// First moment coefficient (momentum for sgd, alpha for rmsprop).
    pub beta1: f64,
    /// Second moment coefficient (adam only; 0.0 otherwise).
    pub beta2: f64,
}

impl Default for OptimConfig {
    fn default() -> Self {
        Self {
            r#type: "adam".to_string(),
            lr: 0.001,
            weight_decay: 0.0,
            beta1: 0.9,
            beta2: 0.999,
        }
    }
}

/// Learning-rate schedule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Schedule name: "exp", "step", "constant".
    pub r#type: String,
    /// Multiplicative decay factor.
    pub gamma: f64,
    /// Epochs between decay steps.
    pub step_size: usize,
    /// Floor for the decayed learning rate.
    pub min_lr: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            r#type: "exp".to_string(),
            gamma: 0.95,
            step_size: 1,
            min_lr: 0.00001,
        }
    }
}

/// Evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    pub batch_size: usize,
    /// Sampled trajectories per evaluated sequence.
    pub n_traj: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            batch_size: 128,
            n_traj: 16,
        }
    }
}

/// Dataset selection and shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset name: "west", "east", "winding", "actuator".
    pub r#type: String,
    pub data_dir: String,
    /// Dimension of the external input sequence.
    pub input_size: usize,
    /// Dimension of the observation sequence.
    pub observation_size: usize,
    /// Fraction of sequences used for training.
    pub train_ratio: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            r#type: "west".to_string(),
            data_dir: "data/west".to_string(),
            input_size: 5,
            observation_size: 1,
            train_ratio: 0.8,
        }
    }
}

impl RunConfig {
    /// Validate this configuration and return any warnings.
    ///
    /// Returns an empty Vec if the config is unremarkable. Returns
    /// human-readable warning messages for suspicious values; none of these
    /// stop a run.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.history_length == 0 {
            warnings.push("history_length is 0 — the model conditions on nothing".to_string());
        }
        if self.forward_length == 0 {
            warnings.push("forward_length is 0 — nothing will be predicted".to_string());
        }
        if self.train.batch_size == 0 {
            warnings.push("train.batch_size is 0 — training will see no data".to_string());
        }
        if !(0.0..1.0).contains(&self.model.dropout) {
            warnings.push(format!(
                "model.dropout ({}) is outside the range [0.0, 1.0)",
                self.model.dropout
            ));
        }
        if self.train.optim.lr <= 0.0 || self.train.optim.lr > 1.0 {
            warnings.push(format!(
                "train.optim.lr ({}) is outside the typical range (0.0, 1.0]",
                self.train.optim.lr
            ));
        }
        if !(0.0..=1.0).contains(&self.dataset.train_ratio) || self.dataset.train_ratio == 0.0 {
            warnings.push(format!(
                "dataset.train_ratio ({}) is outside the range (0.0, 1.0]",
                self.dataset.train_ratio
            ));
        }

        warnings
    }
}

/// Load the base configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `SEQGEN_`)
/// 2. Extra config file (passed as argument, e.g. `--config`)
/// 3. Workspace config (`<workspace>/seqgen.toml`)
/// 4. User config (`~/.config/seqgen/seqgen.toml`)
/// 5. Built-in defaults
///
/// CLI overrides and default-selection presets are applied later by the
/// resolver, on top of the configuration returned here.
pub fn load_base(
    workspace: Option<&Path>,
    extra: Option<&Path>,
) -> Result<RunConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(RunConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "seqgen", "seqgen") {
        let user_config = config_dir.config_dir().join("seqgen.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join("seqgen.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = extra {
        figment = figment.merge(Toml::file(path));
    }

    // Environment variables (SEQGEN_TRAIN__BATCH_SIZE, SEQGEN_RANDOM_SEED, ...)
    figment = figment.merge(Env::prefixed("SEQGEN_").split("__"));

    figment.extract().map_err(Box::new)
}

/// Check whether any seqgen configuration file exists (user or workspace).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "seqgen", "seqgen") {
        if config_dir.config_dir().join("seqgen.toml").exists() {
            return true;
        }
    }

    if let Some(ws) = workspace {
        if ws.join("seqgen.toml").exists() {
            return true;
        }
    }

    false
}
