use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use seg_editor::{Command, Editor, EditorConfig};
use seg_persist::ProjectStore;
use seg_scene::{ObjectAttribute, ObjectSnapshot};
use seg_tools::{HistoryInspector, SceneInspector};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seg-cli", about = "Scene editor command engine: demo, inspect and replay projects")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Editor configuration (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective configuration
    Info,
    /// Build a small scene through commands, drag an object and undo/redo
    Demo {
        /// Number of drag steps applied to the cube
        #[arg(short, long, default_value = "10")]
        steps: u32,
        /// Save the resulting project to this directory
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Verify a saved project and print its scene and history
    Inspect {
        /// Project directory
        dir: PathBuf,
    },
    /// Load a saved project and move its history to entry ID (0 = initial state)
    Replay {
        /// Project directory
        dir: PathBuf,
        /// Target history entry
        #[arg(long)]
        to: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("seg-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("project: {}", config.project_name);
            println!("merge window: {}ms", config.history.merge_window_ms);
            match config.history.max_undos {
                Some(max) => println!("max undos: {max}"),
                None => println!("max undos: unlimited"),
            }
        }
        Commands::Demo { steps, save } => {
            let editor = run_demo(config, steps)?;
            print_editor(&editor);
            if let Some(dir) = save {
                let mut store = ProjectStore::open(&dir)
                    .with_context(|| format!("opening project store {}", dir.display()))?;
                let index = store.save(&editor)?;
                println!("Saved snapshot #{index} to {}", dir.display());
            }
        }
        Commands::Inspect { dir } => {
            let (store, editor) = open_project(&dir, config)?;
            println!(
                "Project '{}': {} snapshot(s), integrity OK",
                store.meta().project_name,
                store.meta().snapshot_count
            );
            print_editor(&editor);
        }
        Commands::Replay { dir, to } => {
            let (_, mut editor) = open_project(&dir, config)?;
            let from = editor.history().current_id();
            editor
                .go_to_state(to)
                .with_context(|| format!("moving history to entry {to}"))?;
            println!("Replayed from #{from} to #{to}");
            print_editor(&editor);
        }
    }

    Ok(())
}

fn open_project(dir: &Path, config: EditorConfig) -> anyhow::Result<(ProjectStore, Editor)> {
    let store = ProjectStore::open(dir)
        .with_context(|| format!("opening project store {}", dir.display()))?;
    store.verify_integrity().context("verifying integrity manifest")?;
    let editor = store.load_latest(config)?;
    Ok((store, editor))
}

fn run_demo(config: EditorConfig, steps: u32) -> anyhow::Result<Editor> {
    let mut editor = Editor::new(config);

    let cube = ObjectSnapshot::new("Mesh", "cube");
    let group = ObjectSnapshot::new("Group", "assembly").with_child(cube.clone());
    editor.execute(Command::add_object(&group, None, None), None)?;

    // Consecutive position updates coalesce while inside the merge window.
    for step in 1..=steps {
        let target = Vec3::new(step as f32 * 0.5, 0.0, 0.0);
        let cmd = Command::set_position(editor.scene(), cube.id, target)?;
        editor.execute(cmd, None)?;
    }
    info!(steps, entries = editor.history().undo_len(), "drag finished");

    let cmd = Command::set_value(editor.scene(), cube.id, ObjectAttribute::Name, "bracket")?;
    editor.execute(cmd, None)?;

    let left = ObjectSnapshot::new("Mesh", "bolt-left").with_position(Vec3::new(-1.0, 0.0, 0.0));
    let right = ObjectSnapshot::new("Mesh", "bolt-right").with_position(Vec3::new(1.0, 0.0, 0.0));
    let batch = Command::multi(vec![
        Command::add_object(&left, Some(group.id), None),
        Command::add_object(&right, Some(group.id), None),
    ]);
    editor.execute(batch, Some("Add Bolts"))?;

    let cmd = Command::move_object(editor.scene(), right.id, None, None)?;
    editor.execute(cmd, None)?;

    let cmd = Command::set_value(editor.scene(), left.id, ObjectAttribute::Visible, false)?;
    editor.execute(cmd, None)?;
    editor.undo()?;

    Ok(editor)
}

fn print_editor(editor: &Editor) {
    println!("{}", SceneInspector::summary(editor.scene()));
    for object in SceneInspector::list_objects(editor.scene()) {
        println!("  {object}");
    }
    println!("{}", HistoryInspector::summary(editor));
    for row in HistoryInspector::entries(editor.history()) {
        println!("  {row}");
    }
}
