//! Inverse-design command-line interface.
//!
//! Check configurations and inspect results without running a solver:
//! ```sh
//! invdes-cli validate-optimizer optimise.toml
//! invdes-cli validate-design sweep.toml
//! invdes-cli history history.json
//! invdes-cli mesh ring.obj --element-size 0.05 --scale 2,2,1 --rotate 0,0,1,45
//! ```

mod inspect;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use invdes_geometry::Placement;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "invdes-cli")]
#[command(about = "Adjoint inverse design: configuration and checkpoint tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an optimiser configuration file.
    ValidateOptimizer {
        /// Path to the optimiser TOML file.
        config: PathBuf,
    },
    /// Validate a design-space configuration file.
    ValidateDesign {
        /// Path to the design-space TOML file.
        config: PathBuf,
    },
    /// Summarise an optimisation history checkpoint.
    History {
        /// Path to the JSON checkpoint.
        path: PathBuf,
        /// Treat lower objective values as better.
        #[arg(long)]
        minimize: bool,
    },
    /// Discretise an OBJ boundary mesh into surface elements.
    Mesh {
        /// Path to the OBJ file.
        path: PathBuf,
        /// Target element edge length.
        #[arg(short, long, default_value_t = 0.1)]
        element_size: f64,
        #[command(flatten)]
        placement: PlacementArgs,
    },
}

/// Placement applied to the mesh before it is discretised.
#[derive(Args)]
struct PlacementArgs {
    /// Per-axis scale factors, e.g. `2,2,1`.
    #[arg(long, value_delimiter = ',', num_args = 3, allow_negative_numbers = true)]
    scale: Option<Vec<f64>>,
    /// Rotation axis and angle in degrees, e.g. `0,0,1,90`.
    #[arg(long, value_delimiter = ',', num_args = 4, allow_negative_numbers = true)]
    rotate: Option<Vec<f64>>,
    /// Offset added after scaling and rotation, e.g. `0,0,1.5`.
    #[arg(long, value_delimiter = ',', num_args = 3, allow_negative_numbers = true)]
    translate: Option<Vec<f64>>,
}

impl PlacementArgs {
    fn placement(&self) -> anyhow::Result<Placement> {
        let rotate = match self.rotate.as_deref() {
            None => None,
            Some(&[x, y, z, degrees]) => Some(([x, y, z], degrees)),
            Some(other) => return Err(anyhow!("--rotate takes 4 values, got {}", other.len())),
        };
        Ok(Placement {
            scale: self.scale.as_deref().map(|v| triple("--scale", v)).transpose()?,
            rotate,
            translate: self.translate.as_deref().map(|v| triple("--translate", v)).transpose()?,
        })
    }
}

fn triple(flag: &str, values: &[f64]) -> anyhow::Result<[f64; 3]> {
    <[f64; 3]>::try_from(values).map_err(|_| anyhow!("{flag} takes 3 values, got {}", values.len()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::ValidateOptimizer { config } => {
            let summary = inspect::optimizer_summary(&config)?;
            println!("Configuration is valid: {}", config.display());
            println!("{summary}");
            Ok(())
        }
        Commands::ValidateDesign { config } => {
            let summary = inspect::design_summary(&config)?;
            println!("Configuration is valid: {}", config.display());
            println!("{summary}");
            Ok(())
        }
        Commands::History { path, minimize } => {
            println!("{}", inspect::history_summary(&path, minimize)?);
            Ok(())
        }
        Commands::Mesh {
            path,
            element_size,
            placement,
        } => {
            let placement = placement.placement()?;
            println!("{}", inspect::mesh_summary(&path, element_size, &placement)?);
            Ok(())
        }
    }
}
