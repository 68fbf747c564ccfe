use std::path::PathBuf;

use clap::{Parser, Subcommand};
use permalink::{FRAGMENT_MARKER, ViewState, decode, encode};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tools::{describe, load_manifest, load_script, replay};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and replay shareable map view URLs")]
struct Args {
    /// Viewer manifest (JSON). Defaults to the built-in NGI Belgium manifest.
    #[arg(long, env = "PERMALINK_MANIFEST")]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the fragment for a view
    Encode {
        #[arg(long)]
        zoom: f64,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        #[arg(long, default_value_t = 0)]
        basemap: usize,
    },

    /// Parse a fragment and show the view it yields against the manifest
    Decode {
        /// e.g. "#map=12/680000/630000/1"
        fragment: String,
    },

    /// Print the effective manifest
    Manifest,

    /// Run a scripted session and print every history transition
    Replay {
        script: PathBuf,

        /// Page-load fragment, overriding the script's
        #[arg(long)]
        fragment: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let manifest = load_manifest(args.manifest.as_deref())?;
    info!(title = %manifest.title, basemaps = manifest.basemaps.len(), "manifest loaded");

    match args.command {
        Command::Encode {
            zoom,
            x,
            y,
            basemap,
        } => {
            let state = ViewState::new(zoom, [x, y], basemap);
            if let Err(e) = state.validate(manifest.zoom_range(), manifest.basemaps.len()) {
                eprintln!("warning: {e}");
            }
            println!("{}", encode(&state));
            Ok(())
        }
        Command::Decode { fragment } => cmd_decode(&manifest, &fragment),
        Command::Manifest => {
            println!("{}", manifest.to_json_pretty().map_err(|e| e.to_string())?);
            Ok(())
        }
        Command::Replay { script, fragment } => {
            let mut script = load_script(&script)?;
            if fragment.is_some() {
                script.fragment = fragment;
            }
            let report = replay(&manifest, &script)?;

            println!(
                "start  {} ({:?})",
                encode(&report.startup.state),
                report.startup.source
            );
            for s in &report.steps {
                let step = serde_json::to_string(&s.step).map_err(|e| e.to_string())?;
                if s.transitions.is_empty() {
                    println!("{step:<32} -");
                }
                for t in &s.transitions {
                    println!("{step:<32} {}", describe(t));
                }
            }
            println!("final  {}", encode(&report.final_state));
            println!("pushes {}", report.push_count());
            for (i, e) in report.entries.iter().enumerate() {
                let marker = if i == report.cursor { '>' } else { ' ' };
                println!("{marker} [{i}] {}", e.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
    }
}

fn cmd_decode(manifest: &formats::ViewerManifest, fragment: &str) -> Result<(), String> {
    let defaults = manifest.default_view_state();
    let state = match decode(fragment) {
        Ok(s) => s,
        Err(e) => {
            println!("unparseable ({e}); defaults apply: {}", encode(&defaults));
            return Ok(());
        }
    };
    if let Err(e) = state.validate(manifest.zoom_range(), manifest.basemaps.len()) {
        println!("{e}; defaults apply: {}", encode(&defaults));
        return Ok(());
    }

    let title = manifest
        .basemaps
        .get(state.basemap)
        .map(|b| b.title.as_str())
        .unwrap_or("?");
    let out = serde_json::json!({
        "zoom": state.zoom,
        "center": state.center,
        "basemap": state.basemap,
        "basemap_title": title,
        "canonical": encode(&state),
    });
    println!("{out}");
    if !fragment.starts_with(FRAGMENT_MARKER) {
        info!("fragment had no {FRAGMENT_MARKER} marker");
    }
    Ok(())
}
