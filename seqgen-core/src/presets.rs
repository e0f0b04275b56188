//! Built-in default-selection documents.
//!
//! Each category (model, optimizer, schedule, dataset) carries a set of named
//! preset documents. The active selection per category is merged into the
//! base configuration at the category's target path before CLI overrides are
//! applied. Selections may themselves be overridden on the command line via
//! the category's selector key (e.g. `dataset=winding`, `train/optim=sgd`).

use toml::Table;

/// A default-selection category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Model,
    Optim,
    Schedule,
    Dataset,
}

/// Category order used when layering presets into the base configuration.
///
/// Category namespaces are disjoint, so later categories never overwrite
/// earlier categories' keys.
pub const CATEGORIES: [Category; 4] = [
    Category::Model,
    Category::Optim,
    Category::Schedule,
    Category::Dataset,
];

impl Category {
    /// The CLI selector key that switches this category's selection.
    pub fn selector(&self) -> &'static str {
        match self {
            Category::Model => "model",
            Category::Optim => "train/optim",
            Category::Schedule => "train/schedule",
            Category::Dataset => "dataset",
        }
    }

    /// Human-readable category name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Model => "model",
            Category::Optim => "optimizer",
            Category::Schedule => "schedule",
            Category::Dataset => "dataset",
        }
    }

    /// Dotted path of the table this category's preset merges into.
    pub fn target(&self) -> &'static [&'static str] {
        match self {
            Category::Model => &["model"],
            Category::Optim => &["train", "optim"],
            Category::Schedule => &["train", "schedule"],
            Category::Dataset => &["dataset"],
        }
    }

    /// Field under `defaults` recording this category's active selection.
    pub fn defaults_field(&self) -> &'static str {
        match self {
            Category::Model => "model",
            Category::Optim => "optim",
            Category::Schedule => "schedule",
            Category::Dataset => "dataset",
        }
    }

    /// Map a CLI override key to a category if it is a selector key.
    pub fn from_selector(key: &str) -> Option<Category> {
        CATEGORIES.into_iter().find(|c| c.selector() == key)
    }

    /// Names of the built-in presets for this category.
    pub fn preset_names(&self) -> &'static [&'static str] {
        match self {
            Category::Model => &["vaecl", "vrnn", "srnn", "deepar"],
            Category::Optim => &["adam", "sgd", "rmsprop"],
            Category::Schedule => &["exp", "step", "constant"],
            Category::Dataset => &["west", "east", "winding", "actuator"],
        }
    }

    /// Look up a built-in preset document by name.
    pub fn preset(&self, name: &str) -> Option<Table> {
        match self {
            Category::Model => model_preset(name),
            Category::Optim => optim_preset(name),
            Category::Schedule => schedule_preset(name),
            Category::Dataset => dataset_preset(name),
        }
    }
}

fn model_preset(name: &str) -> Option<Table> {
    let table = match name {
        "vaecl" => toml::toml! {
            type = "vaecl"
            d = 10
            k = 64
            num_layers = 1
            dropout = 0.1
            net_type = "lstm"
        },
        "vrnn" => toml::toml! {
            type = "vrnn"
            d = 8
            k = 50
            num_layers = 1
            dropout = 0.0
            net_type = "gru"
        },
        "srnn" => toml::toml! {
            type = "srnn"
            d = 8
            k = 50
            num_layers = 2
            dropout = 0.1
            net_type = "gru"
        },
        "deepar" => toml::toml! {
            type = "deepar"
            d = 16
            k = 16
            num_layers = 1
            dropout = 0.1
            net_type = "lstm"
        },
        _ => return None,
    };
    Some(table)
}

fn optim_preset(name: &str) -> Option<Table> {
    let table = match name {
        "adam" => toml::toml! {
            type = "adam"
            lr = 0.001
            weight_decay = 0.0
            beta1 = 0.9
            beta2 = 0.999
        },
        "sgd" => toml::toml! {
            type = "sgd"
            lr = 0.01
            weight_decay = 0.0
            beta1 = 0.9
            beta2 = 0.0
        },
        "rmsprop" => toml::toml! {
            type = "rmsprop"
            lr = 0.001
            weight_decay = 0.0
            beta1 = 0.99
            beta2 = 0.0
        },
        _ => return None,
    };
    Some(table)
}

fn schedule_preset(name: &str) -> Option<Table> {
    let table = match name {
        "exp" => toml::toml! {
            type = "exp"
            gamma = 0.95
            step_size = 1
            min_lr = 0.00001
        },
        "step" => toml::toml! {
            type = "step"
            gamma = 0.5
            step_size = 30
            min_lr = 0.00001
        },
        "constant" => toml::toml! {
            type = "constant"
            gamma = 1.0
            step_size = 1
            min_lr = 0.0
        },
        _ => return None,
    };
    Some(table)
}

fn dataset_preset(name: &str) -> Option<Table> {
    let table = match name {
        "west" => toml::toml! {
            type = "west"
            data_dir = "data/west"
            input_size = 5
            observation_size = 1
            train_ratio = 0.8
        },
        "east" => toml::toml! {
            type = "east"
            data_dir = "data/east"
            input_size = 4
            observation_size = 1
            train_ratio = 0.8
        },
        "winding" => toml::toml! {
            type = "winding"
            data_dir = "data/winding"
            input_size = 5
            observation_size = 2
            train_ratio = 0.7
        },
        "actuator" => toml::toml! {
            type = "actuator"
            data_dir = "data/actuator"
            input_size = 1
            observation_size = 1
            train_ratio = 0.75
        },
        _ => return None,
    };
    Some(table)
}
