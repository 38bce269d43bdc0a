//! Summaries printed by each subcommand.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use invdes_core::Differentiable;
use invdes_design::config as design_config;
use invdes_design::{Method, SweepMethod};
use invdes_geometry::parsers::load_mesh;
use invdes_geometry::{Placement, TriangleMesh};
use invdes_optim::{Direction, OptimizationHistory};

#[derive(Debug)]
pub struct OptimizerSummary {
    rule: String,
    num_steps: usize,
    learning_rate: f64,
    direction: Direction,
    history_path: Option<String>,
}

pub fn optimizer_summary(path: &Path) -> Result<OptimizerSummary> {
    let config = invdes_optim::load_config(path)
        .with_context(|| format!("Failed to load optimiser config {}", path.display()))?;
    log::debug!("Loaded optimiser config: {config:?}");
    Ok(OptimizerSummary {
        rule: config.transform().name().to_string(),
        num_steps: config.num_steps,
        learning_rate: config.learning_rate,
        direction: config.direction,
        history_path: config.history_path.map(|p| p.display().to_string()),
    })
}

impl fmt::Display for OptimizerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Rule:          {} (lr = {})", self.rule, self.learning_rate)?;
        writeln!(f, "  Steps:         {}", self.num_steps)?;
        writeln!(f, "  Direction:     {:?}", self.direction)?;
        write!(f, "  Checkpoint:    {}", self.history_path.as_deref().unwrap_or("none"))
    }
}

pub struct DesignSummary {
    name: Option<String>,
    method: &'static str,
    dims: Vec<String>,
    grid_points: Option<usize>,
}

pub fn design_summary(path: &Path) -> Result<DesignSummary> {
    let space = design_config::load_config(path)
        .and_then(|c| c.build())
        .with_context(|| format!("Failed to load design config {}", path.display()))?;
    let grid_points = match space.method() {
        Method::Grid(grid) => Some(grid.size(space.parameters())?),
        _ => None,
    };
    Ok(DesignSummary {
        name: space.name().map(str::to_string),
        method: space.method().name(),
        dims: space.dims(),
        grid_points,
    })
}

impl fmt::Display for DesignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Name:          {}", self.name.as_deref().unwrap_or("(unnamed)"))?;
        writeln!(f, "  Method:        {}", self.method)?;
        write!(f, "  Parameters:    {}", self.dims.join(", "))?;
        if let Some(n) = self.grid_points {
            write!(f, "\n  Grid points:   {n}")?;
        }
        Ok(())
    }
}

pub struct HistorySummary {
    steps: usize,
    best: Option<(usize, f64)>,
    final_gradient_norm: Option<f64>,
    tasks_issued: usize,
}

pub fn history_summary(path: &Path, minimize: bool) -> Result<HistorySummary> {
    let history = OptimizationHistory::load(path)
        .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
    let direction = if minimize { Direction::Minimize } else { Direction::Maximize };
    Ok(HistorySummary {
        steps: history.len(),
        best: history.best(direction).map(|r| (r.step, r.objective)),
        final_gradient_norm: history.last().map(|r| r.gradient.dot(&r.gradient).sqrt()),
        tasks_issued: history.tasks_issued(),
    })
}

impl fmt::Display for HistorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Steps:         {}", self.steps)?;
        match self.best {
            Some((step, objective)) => writeln!(f, "  Best:          {objective:.6e} (step {step})")?,
            None => writeln!(f, "  Best:          -")?,
        }
        match self.final_gradient_norm {
            Some(norm) => writeln!(f, "  |grad| final:  {norm:.6e}")?,
            None => writeln!(f, "  |grad| final:  -")?,
        }
        write!(f, "  Tasks issued:  {}", self.tasks_issued)
    }
}

pub struct MeshSummary {
    faces: usize,
    elements: usize,
    total_area: f64,
    volume: f64,
    bounds: ([f64; 3], [f64; 3]),
}

pub fn mesh_summary(path: &Path, element_size: f64, placement: &Placement) -> Result<MeshSummary> {
    let mut mesh: TriangleMesh = load_mesh(path)
        .with_context(|| format!("Failed to load mesh {}", path.display()))?
        .into();
    if !placement.is_identity() {
        log::debug!("Placing mesh with {placement:?}");
        mesh = mesh.placed(placement).context("Failed to place mesh")?;
    }
    let surface = mesh
        .surface_mesh(element_size)
        .context("Failed to discretise mesh")?;
    surface.validate().context("Degenerate surface elements")?;
    Ok(MeshSummary {
        faces: mesh.faces.len(),
        elements: surface.len(),
        total_area: surface.total_area(),
        volume: mesh.signed_volume(),
        bounds: mesh.bounding_box(),
    })
}

impl fmt::Display for MeshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Faces:         {}", self.faces)?;
        writeln!(f, "  Elements:      {}", self.elements)?;
        writeln!(f, "  Total area:    {:.6}", self.total_area)?;
        writeln!(f, "  Volume:        {:.6}", self.volume)?;
        let (min, max) = self.bounds;
        write!(f, "  Bounds:        {min:.4?} to {max:.4?}")
    }
}
