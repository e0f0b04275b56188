//! Layered configuration resolution.
//!
//! A resolution layers, in order: the base configuration, the selected preset
//! document per category, fixed CLI overrides, and finally one sweep
//! combination per run. Each layer is merged into an immutable snapshot of a
//! `toml::Value` tree; the typed [`RunConfig`] is extracted once per resolved
//! run. Override keys that do not name an existing path in the merged tree
//! are rejected before any run directory is created.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use toml::Value;

use crate::config::RunConfig;
use crate::error::{ConfigError, Result};
use crate::overrides::OverrideSet;
use crate::presets::{Category, CATEGORIES};
use crate::rundir::{self, ResolvedRun};
use crate::sweep::Cartesian;

/// Resolves CLI overrides against a base configuration into runs.
#[derive(Debug, Clone)]
pub struct Resolver {
    base: RunConfig,
    root: PathBuf,
}

impl Resolver {
    pub fn new(base: RunConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            base,
            root: root.into(),
        }
    }

    /// Resolve overrides into a run plan.
    ///
    /// All fatal configuration errors (unknown keys, bad coercions, unknown
    /// presets, sweep lists without `multirun`) surface here; iterating the
    /// returned plan cannot discover new override errors.
    pub fn plan(&self, overrides: &OverrideSet, multirun: bool) -> Result<RunPlan> {
        let mut tree = Value::try_from(&self.base)?;

        // Default selections: base values, then CLI selector overrides.
        let mut selections: Vec<(Category, String)> = CATEGORIES
            .into_iter()
            .map(|c| {
                let name = match c {
                    Category::Model => self.base.defaults.model.clone(),
                    Category::Optim => self.base.defaults.optim.clone(),
                    Category::Schedule => self.base.defaults.schedule.clone(),
                    Category::Dataset => self.base.defaults.dataset.clone(),
                };
                (c, name)
            })
            .collect();
        for ov in overrides {
            if let Some(category) = Category::from_selector(&ov.key) {
                if ov.is_sweep() {
                    return Err(ConfigError::SweepOnSelector {
                        key: ov.key.clone(),
                    }
                    .into());
                }
                for (c, name) in &mut selections {
                    if *c == category {
                        *name = ov.value().to_string();
                    }
                }
            }
        }

        // Merge each category's preset at its target path. Categories own
        // disjoint namespaces, so the merge order carries no precedence.
        for (category, name) in &selections {
            let preset =
                category
                    .preset(name)
                    .ok_or_else(|| ConfigError::UnknownPreset {
                        category: category.name(),
                        name: name.clone(),
                    })?;
            merge_preset(&mut tree, category.target(), preset)?;
            apply_override(
                &mut tree,
                &format!("defaults.{}", category.defaults_field()),
                name,
            )?;
            tracing::debug!(category = category.name(), preset = %name, "selected preset");
        }

        // Fixed overrides mutate the tree; sweep overrides become axes after
        // their path and every listed value have been checked.
        let mut axes: Vec<(String, Vec<String>)> = Vec::new();
        for ov in overrides {
            if Category::from_selector(&ov.key).is_some() {
                continue;
            }
            if ov.is_sweep() {
                let existing = lookup(&tree, &ov.key)?;
                for value in &ov.values {
                    coerce(existing, value, &ov.key)?;
                }
                axes.push((ov.key.clone(), ov.values.clone()));
            } else {
                apply_override(&mut tree, &ov.key, ov.value())?;
            }
        }

        if !multirun {
            if let Some((key, _)) = axes.first() {
                return Err(ConfigError::SweepWithoutMultirun { key: key.clone() }.into());
            }
        }

        let plan = RunPlan {
            tree,
            overrides: overrides.clone(),
            axes,
            root: self.root.clone(),
            multirun,
            started: Local::now(),
        };
        tracing::debug!(runs = plan.total_runs(), multirun, "resolved run plan");
        Ok(plan)
    }
}

/// A resolved plan: one configuration per sweep combination.
///
/// The plan is immutable; [`RunPlan::runs`] is a lazy, restartable iterator
/// with no shared state between members, so sweep members are independently
/// executable.
#[derive(Debug, Clone)]
pub struct RunPlan {
    tree: Value,
    overrides: OverrideSet,
    axes: Vec<(String, Vec<String>)>,
    root: PathBuf,
    multirun: bool,
    started: DateTime<Local>,
}

impl RunPlan {
    /// Number of runs this plan will produce.
    pub fn total_runs(&self) -> usize {
        Cartesian::new(self.axes.clone()).total()
    }

    /// Whether the plan was resolved in cartesian-product mode.
    pub fn is_multirun(&self) -> bool {
        self.multirun
    }

    /// The shared sweep root for a multirun plan.
    pub fn sweep_root(&self) -> PathBuf {
        self.root.join(rundir::timestamp(self.started))
    }

    /// Iterate the resolved runs in sweep order.
    pub fn runs(&self) -> impl Iterator<Item = Result<ResolvedRun>> + '_ {
        Cartesian::new(self.axes.clone()).map(move |combo| self.member(&combo))
    }

    fn member(&self, combo: &[(String, String)]) -> Result<ResolvedRun> {
        let mut tree = self.tree.clone();
        for (key, value) in combo {
            apply_override(&mut tree, key, value)?;
        }
        let config: RunConfig = tree.try_into().map_err(|e: toml::de::Error| {
            ConfigError::Extract {
                message: e.to_string(),
            }
        })?;

        let summary = rundir::override_summary(&self.overrides, combo);
        let run_dir = if self.multirun {
            rundir::sweep_run_dir(&self.root, self.started, &config, &summary, self.started)
        } else {
            rundir::single_run_dir(&self.root, &config, &summary, self.started)
        };

        Ok(ResolvedRun {
            config,
            summary,
            run_dir,
        })
    }
}

/// Merge a preset document into the table at `target`, overwriting any keys
/// the preset names.
fn merge_preset(tree: &mut Value, target: &[&str], preset: toml::Table) -> Result<()> {
    let mut node = &mut *tree;
    for segment in target {
        node = node
            .get_mut(*segment)
            .ok_or_else(|| ConfigError::Extract {
                message: format!("base configuration has no '{}' table", segment),
            })?;
    }
    let table = node.as_table_mut().ok_or_else(|| ConfigError::Extract {
        message: format!("'{}' is not a table", target.join(".")),
    })?;
    for (key, value) in preset {
        table.insert(key, value);
    }
    Ok(())
}

/// Set `key` (a dotted path) to `raw` coerced to the existing value's type.
fn apply_override(tree: &mut Value, key: &str, raw: &str) -> Result<()> {
    let new = coerce(lookup(tree, key)?, raw, key)?;

    let segments: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
        }
        .into());
    };
    let mut node = &mut *tree;
    for segment in parents {
        node = node
            .get_mut(*segment)
            .ok_or_else(|| ConfigError::UnknownKey {
                key: key.to_string(),
            })?;
    }
    let table = node.as_table_mut().ok_or_else(|| ConfigError::UnknownKey {
        key: key.to_string(),
    })?;
    table.insert(last.to_string(), new);
    Ok(())
}

/// Walk a dotted path through the tree; the path must already exist.
fn lookup<'a>(tree: &'a Value, key: &str) -> Result<&'a Value> {
    let mut node = tree;
    for segment in key.split('.') {
        node = node.get(segment).ok_or_else(|| ConfigError::UnknownKey {
            key: key.to_string(),
        })?;
    }
    Ok(node)
}

/// Coerce a raw override string to the type of the value it replaces.
fn coerce(existing: &Value, raw: &str, key: &str) -> Result<Value> {
    let value = match existing {
        Value::Boolean(_) => Value::Boolean(raw.parse().map_err(|_| mismatch(key, "boolean", raw))?),
        Value::Integer(_) => Value::Integer(raw.parse().map_err(|_| mismatch(key, "integer", raw))?),
        Value::Float(_) => Value::Float(raw.parse().map_err(|_| mismatch(key, "float", raw))?),
        Value::String(_) => Value::String(raw.to_string()),
        _ => return Err(mismatch(key, "scalar", raw).into()),
    };
    Ok(value)
}

fn mismatch(key: &str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::TypeMismatch {
        key: key.to_string(),
        expected,
        value: value.to_string(),
    }
}

/// Convenience used by tests and tooling: resolve a plan from the default
/// base configuration under the given output root.
pub fn plan_with_defaults(
    root: impl Into<PathBuf>,
    overrides: &OverrideSet,
    multirun: bool,
) -> Result<RunPlan> {
    Resolver::new(RunConfig::default(), root).plan(overrides, multirun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeqgenError;
    use pretty_assertions::assert_eq;

    fn plan(tokens: &[&str], multirun: bool) -> Result<RunPlan> {
        let overrides = OverrideSet::parse(tokens).unwrap();
        plan_with_defaults("outputs", &overrides, multirun)
    }

    fn single_run(tokens: &[&str]) -> ResolvedRun {
        let plan = plan(tokens, false).unwrap();
        let mut runs = plan.runs();
        let run = runs.next().unwrap().unwrap();
        assert!(runs.next().is_none());
        run
    }

    #[test]
    fn test_fixed_override_sets_value() {
        let run = single_run(&["train.batch_size=256"]);
        assert_eq!(run.config.train.batch_size, 256);
    }

    #[test]
    fn test_no_overrides_resolves_base() {
        let run = single_run(&[]);
        assert_eq!(run.config, RunConfig::default());
        assert_eq!(run.summary, "");
    }

    #[test]
    fn test_selector_switches_preset() {
        let run = single_run(&["dataset=winding", "model=srnn"]);
        assert_eq!(run.config.dataset.r#type, "winding");
        assert_eq!(run.config.dataset.observation_size, 2);
        assert_eq!(run.config.model.r#type, "srnn");
        assert_eq!(run.config.model.num_layers, 2);
        // Selections are recorded in the resolved configuration.
        assert_eq!(run.config.defaults.dataset, "winding");
        assert_eq!(run.config.defaults.model, "srnn");
    }

    #[test]
    fn test_slash_selector_switches_optimizer() {
        let run = single_run(&["train/optim=sgd", "train/schedule=constant"]);
        assert_eq!(run.config.train.optim.r#type, "sgd");
        assert!((run.config.train.optim.lr - 0.01).abs() < f64::EPSILON);
        assert_eq!(run.config.train.schedule.r#type, "constant");
    }

    #[test]
    fn test_override_applies_after_preset() {
        let run = single_run(&["train/optim=sgd", "train.optim.lr=0.1"]);
        assert_eq!(run.config.train.optim.r#type, "sgd");
        assert!((run.config.train.optim.lr - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_key_is_fatal() {
        let err = plan(&["train.bacth_size=64"], false).unwrap_err();
        assert!(matches!(
            err,
            SeqgenError::Config(ConfigError::UnknownKey { ref key }) if key == "train.bacth_size"
        ));
    }

    #[test]
    fn test_unknown_preset_is_fatal() {
        let err = plan(&["model=transformer"], false).unwrap_err();
        assert!(matches!(
            err,
            SeqgenError::Config(ConfigError::UnknownPreset { category: "model", ref name })
                if name == "transformer"
        ));
    }

    #[test]
    fn test_type_mismatch_is_fatal() {
        let err = plan(&["train.batch_size=large"], false).unwrap_err();
        assert!(matches!(
            err,
            SeqgenError::Config(ConfigError::TypeMismatch { expected: "integer", .. })
        ));
    }

    #[test]
    fn test_sweep_value_type_checked_up_front() {
        let err = plan(&["model.d=1,two,3"], true).unwrap_err();
        assert!(matches!(
            err,
            SeqgenError::Config(ConfigError::TypeMismatch { expected: "integer", .. })
        ));
    }

    #[test]
    fn test_sweep_without_multirun_is_fatal() {
        let err = plan(&["model.d=1,5"], false).unwrap_err();
        assert!(matches!(
            err,
            SeqgenError::Config(ConfigError::SweepWithoutMultirun { ref key }) if key == "model.d"
        ));
    }

    #[test]
    fn test_selector_cannot_sweep() {
        let err = plan(&["dataset=west,winding"], true).unwrap_err();
        assert!(matches!(
            err,
            SeqgenError::Config(ConfigError::SweepOnSelector { ref key }) if key == "dataset"
        ));
    }

    #[test]
    fn test_float_override_accepts_integer_literal() {
        let run = single_run(&["train.optim.lr=1"]);
        assert!((run.config.train.optim.lr - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bool_override() {
        let run = single_run(&["use_cuda=true"]);
        assert!(run.config.use_cuda);
    }

    #[test]
    fn test_override_on_table_is_mismatch() {
        let err = plan(&["train=fast"], false).unwrap_err();
        // "train" is not a selector key; it names a table, not a scalar.
        assert!(matches!(
            err,
            SeqgenError::Config(ConfigError::TypeMismatch { expected: "scalar", .. })
        ));
    }

    #[test]
    fn test_multirun_member_count_and_order() {
        let plan = plan(&["model.d=1,5,10,15,20"], true).unwrap();
        assert_eq!(plan.total_runs(), 5);
        let ds: Vec<usize> = plan
            .runs()
            .map(|run| run.unwrap().config.model.d)
            .collect();
        assert_eq!(ds, vec![1, 5, 10, 15, 20]);
    }

    #[test]
    fn test_multirun_members_identical_except_swept_key() {
        let plan = plan(&["model.d=1,5"], true).unwrap();
        let runs: Vec<ResolvedRun> = plan.runs().map(|r| r.unwrap()).collect();
        let mut a = runs[0].config.clone();
        let b = &runs[1].config;
        assert_ne!(a.model.d, b.model.d);
        a.model.d = b.model.d;
        assert_eq!(&a, b);
    }

    #[test]
    fn test_two_sweep_keys_product() {
        let plan = plan(&["model.d=1,2,3", "train.optim.lr=0.1,0.01"], true).unwrap();
        assert_eq!(plan.total_runs(), 6);
        let mut seen = std::collections::HashSet::new();
        for run in plan.runs() {
            let config = run.unwrap().config;
            seen.insert((config.model.d, config.train.optim.lr.to_bits()));
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_plan_iteration_is_restartable() {
        let plan = plan(&["model.d=1,5"], true).unwrap();
        let first: Vec<usize> = plan.runs().map(|r| r.unwrap().config.model.d).collect();
        let second: Vec<usize> = plan.runs().map(|r| r.unwrap().config.model.d).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_escaped_save_dir_value() {
        let run = single_run(&[r"save_dir=prev\=run\,1"]);
        assert_eq!(run.config.save_dir, "prev=run,1");
    }
}
