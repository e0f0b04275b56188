//! CLI subcommand handlers and the default launch path.

use crate::Commands;
use crate::ConfigAction;
use std::path::Path;

use seqgen_core::overrides::OverrideSet;
use seqgen_core::resolve::Resolver;

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    root: &Path,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => handle_config(action, workspace, config),
        Commands::Resolve {
            overrides,
            multirun,
        } => handle_resolve(&overrides, multirun, workspace, root, config),
    }
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace.join("seqgen.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let default_config = seqgen_core::RunConfig::default();
            let toml_str = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let base = load_base(workspace, config)?;
            let toml_str = toml::to_string_pretty(&base)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

/// Dry run: resolve overrides and print the run directories without creating
/// anything on disk.
fn handle_resolve(
    overrides: &[String],
    multirun: bool,
    workspace: &Path,
    root: &Path,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    let plan = build_plan(overrides, multirun, workspace, root, config)?;
    println!("Resolved {} run(s):", plan.total_runs());
    for run in plan.runs() {
        let run = run?;
        println!("  {}", run.run_dir.display());
    }
    Ok(())
}

/// Default action: resolve overrides, prepare every run directory, and
/// persist each resolved configuration into it.
pub fn launch(
    overrides: &[String],
    multirun: bool,
    workspace: &Path,
    root: &Path,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    let plan = build_plan(overrides, multirun, workspace, root, config)?;

    if plan.is_multirun() {
        tracing::info!(
            runs = plan.total_runs(),
            sweep_root = %plan.sweep_root().display(),
            "launching sweep"
        );
    }

    for run in plan.runs() {
        let run = run?;
        for warning in run.config.validate() {
            tracing::warn!("{}", warning);
        }
        let dir = run.prepare()?;
        println!("{}", dir.display());
    }
    Ok(())
}

fn build_plan(
    overrides: &[String],
    multirun: bool,
    workspace: &Path,
    root: &Path,
    config: Option<&Path>,
) -> anyhow::Result<seqgen_core::RunPlan> {
    let overrides = OverrideSet::parse(overrides)?;
    let base = load_base(workspace, config)?;
    let plan = Resolver::new(base, root).plan(&overrides, multirun)?;
    Ok(plan)
}

fn load_base(workspace: &Path, config: Option<&Path>) -> anyhow::Result<seqgen_core::RunConfig> {
    seqgen_core::load_base(Some(workspace), config)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        handle_config(ConfigAction::Init, dir.path(), None).unwrap();

        let written = std::fs::read_to_string(dir.path().join("seqgen.toml")).unwrap();
        let parsed: seqgen_core::RunConfig = toml::from_str(&written).unwrap();
        assert_eq!(parsed, seqgen_core::RunConfig::default());
    }

    #[test]
    fn test_config_init_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("seqgen.toml"), "random_seed = 9\n").unwrap();
        handle_config(ConfigAction::Init, dir.path(), None).unwrap();

        let kept = std::fs::read_to_string(dir.path().join("seqgen.toml")).unwrap();
        assert_eq!(kept, "random_seed = 9\n");
    }

    #[test]
    fn test_launch_creates_run_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("outputs");
        launch(
            &["train.batch_size=64".to_string()],
            false,
            dir.path(),
            &root,
            None,
        )
        .unwrap();

        // outputs/<dataset.type>/<save_dir>/<model.type>_<summary>/<timestamp>
        let leaf = root.join("west").join("default");
        let named: Vec<_> = std::fs::read_dir(&leaf).unwrap().collect();
        assert_eq!(named.len(), 1);
        let run_parent = named[0].as_ref().unwrap().path();
        assert_eq!(
            run_parent.file_name().unwrap().to_str().unwrap(),
            "vaecl_train.batch_size=64"
        );
        let runs: Vec<_> = std::fs::read_dir(&run_parent).unwrap().collect();
        assert_eq!(runs.len(), 1);
        let run_dir = runs[0].as_ref().unwrap().path();
        assert!(run_dir.join("config.toml").exists());
        assert!(run_dir.join("train.log").exists());
    }

    #[test]
    fn test_launch_rejects_sweep_without_multirun() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("outputs");
        let err = launch(
            &["model.d=1,5".to_string()],
            false,
            dir.path(),
            &root,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("--multirun"));
        assert!(!root.exists());
    }

    #[test]
    fn test_multirun_creates_one_directory_per_member() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("outputs");
        launch(
            &["model.d=1,5,10".to_string()],
            true,
            dir.path(),
            &root,
            None,
        )
        .unwrap();

        let sweep_roots: Vec<_> = std::fs::read_dir(&root).unwrap().collect();
        assert_eq!(sweep_roots.len(), 1);
        let sweep_root = sweep_roots[0].as_ref().unwrap().path();
        let mut members: Vec<String> = std::fs::read_dir(&sweep_root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        members.sort();
        assert_eq!(
            members,
            vec!["vaecl_model.d=1", "vaecl_model.d=10", "vaecl_model.d=5"]
        );
    }
}
