//! CLI subcommands: init, validate, render.

use crate::core::{parser, render};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter app.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate app.yaml by running a full render pass
    Validate {
        /// Path to app.yaml
        #[arg(short, long, default_value = "app.yaml")]
        file: PathBuf,
    },

    /// Render devices, top-level volumes, and service mounts
    Render {
        /// Path to app.yaml
        #[arg(short, long, default_value = "app.yaml")]
        file: PathBuf,

        /// Emit JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Render { file, json } => {
            let out = cmd_render(&file, json)?;
            print!("{}", out);
            Ok(())
        }
    }
}

const TEMPLATE: &str = r#"values:
  resources:
    gpus:
      use_all_gpus: false
  ix_volumes: {}

devices: []

volumes:
  data:
    type: host_path
    read_only: false
    host_path_config:
      path: /mnt/data

mounts:
  - volume: data
    target: /data
"#;

fn cmd_init(path: &Path) -> Result<(), String> {
    let config_path = path.join("app.yaml");
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }

    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    std::fs::write(&config_path, TEMPLATE)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    println!("Initialized app descriptor at {}", config_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let config = parser::parse_config_file(file)?;
    let manifest = render::render_app(&config)?;

    println!(
        "OK: {} ({} devices, {} volumes, {} mounts)",
        file.display(),
        manifest.devices.len(),
        config.volumes.len(),
        manifest.mounts.len()
    );
    Ok(())
}

fn cmd_render(file: &Path, json: bool) -> Result<String, String> {
    let config = parser::parse_config_file(file)?;
    let manifest = render::render_app(&config)?;

    if json {
        serde_json::to_string_pretty(&manifest)
            .map(|s| s + "\n")
            .map_err(|e| format!("JSON serialize error: {}", e))
    } else {
        serde_yaml_ng::to_string(&manifest).map_err(|e| format!("YAML serialize error: {}", e))
    }
}
