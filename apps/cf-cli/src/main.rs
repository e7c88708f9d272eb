use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cf_model::{Forcing, RunOptions};
use cf_project::{assemble, load_model, ProjectResult};

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(about = "Catchflow CLI - Semi-distributed rainfall-runoff simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model file and report its structure
    Validate {
        /// Path to the model YAML/JSON file
        model_path: PathBuf,
    },
    /// List nodes in a model
    Nodes {
        /// Path to the model YAML/JSON file
        model_path: PathBuf,
    },
    /// Run a simulation against a forcing file
    Run {
        /// Path to the model YAML/JSON file
        model_path: PathBuf,
        /// Path to the forcing JSON file: node id -> list of [P, T, PET]
        forcing_path: PathBuf,
        /// Timestep length
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
        /// Record per-element storage trajectories
        #[arg(long)]
        record_states: bool,
        /// Output JSON file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ProjectResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { model_path } => cmd_validate(&model_path),
        Commands::Nodes { model_path } => cmd_nodes(&model_path),
        Commands::Run {
            model_path,
            forcing_path,
            dt,
            record_states,
            output,
        } => cmd_run(&model_path, &forcing_path, dt, record_states, output.as_deref()),
    }
}

fn cmd_validate(model_path: &Path) -> ProjectResult<()> {
    println!("Validating model: {}", model_path.display());
    let def = load_model(model_path)?;
    let network = assemble(&def)?;
    println!("✓ Model is valid");
    println!(
        "  {} ({} elements, {} units, {} nodes, outlets: {})",
        def.name,
        def.elements.len(),
        def.units.len(),
        network.nodes().len(),
        network.outlet_ids().join(", ")
    );
    Ok(())
}

fn cmd_nodes(model_path: &Path) -> ProjectResult<()> {
    let def = load_model(model_path)?;
    let network = assemble(&def)?;

    if network.nodes().is_empty() {
        println!("No nodes found in model");
    } else {
        println!("Nodes in model:");
        for node in network.nodes() {
            let units: Vec<&str> = node.units().iter().map(|u| u.id()).collect();
            println!(
                "  {} - area {} ({} units: {})",
                node.id(),
                node.area(),
                units.len(),
                units.join(", ")
            );
        }
    }
    Ok(())
}

fn cmd_run(
    model_path: &Path,
    forcing_path: &Path,
    dt: f64,
    record_states: bool,
    output_path: Option<&Path>,
) -> ProjectResult<()> {
    let def = load_model(model_path)?;
    let mut network = assemble(&def)?;

    let forcing = load_forcing(forcing_path)?;
    let timesteps = forcing.values().map(Forcing::len).next().unwrap_or(0);
    println!(
        "Running model '{}': {} timesteps, dt = {}",
        def.name, timesteps, dt
    );

    let options = RunOptions { dt, record_states };
    let started = std::time::Instant::now();
    let output = network.run(&forcing, &options)?;
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "run finished");
    println!("✓ Simulation completed");
    for (outlet, discharge) in &output.outlets {
        let total: f64 = discharge.iter().sum();
        println!("  {outlet}: total discharge {total:.4}");
    }

    let rendered = serde_json::to_string_pretty(&output)?;
    match output_path {
        Some(path) => {
            std::fs::write(path, rendered)?;
            println!("  Results written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Forcing files map node ids to `[P, T, PET]` triples per timestep.
fn load_forcing(path: &Path) -> ProjectResult<BTreeMap<String, Forcing>> {
    let text = std::fs::read_to_string(path)?;
    let raw: BTreeMap<String, Vec<[f64; 3]>> = serde_json::from_str(&text)?;
    Ok(raw
        .into_iter()
        .map(|(node, triples)| (node, Forcing::from_triples(triples)))
        .collect())
}
