//! Command line interface.
//!
//! Every command loads a design file, applies one kind of change or query
//! and writes the result back, so a joint can be developed step by step
//! from the shell.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use timberjoint_camtools::{component_letter, Exporter};
use timberjoint_core::{
    Axis, DesignParameters, Direction, ExportFormat, FabricationSettings, FixedSide, HeightField,
    JointDesign,
};
use timberjoint_settings::{load_design, save_design, AppConfig};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "timberjoint")]
#[command(version, about = "Voxel timber joint designer with CNC export", long_about = None)]
pub struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a design with random height fields
    New {
        /// Design file to write
        output: PathBuf,
        /// Seed for the height fields
        #[arg(long)]
        seed: Option<u64>,
        /// Number of timber components (2-6)
        #[arg(long)]
        components: Option<usize>,
        /// Voxels per cube edge
        #[arg(long)]
        res: Option<usize>,
        /// Sliding axis (x, y or z)
        #[arg(long, value_parser = parse_axis)]
        sliding_axis: Option<Axis>,
        /// Deviation from a square joint (degrees)
        #[arg(long, allow_hyphen_values = true)]
        angle: Option<f64>,
    },
    /// Show a design and its evaluation
    Info {
        /// Design file
        file: PathBuf,
    },
    /// Change a design
    Edit(EditArgs),
    /// List or apply repair suggestions
    Suggest {
        /// Design file
        file: PathBuf,
        /// Apply suggestion N
        #[arg(long)]
        apply: Option<usize>,
        /// Where to write the repaired design (default: in place)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write one machine file per component
    Export {
        /// Design file
        file: PathBuf,
        /// Output directory (default: from the config)
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
        /// Override the file format (gcode, nc, sbp)
        #[arg(long, value_parser = parse_format)]
        format: Option<ExportFormat>,
    },
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Design file
    pub file: PathBuf,

    /// Where to write the result (default: in place)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seed used when height fields are regenerated
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_parser = parse_axis)]
    pub sliding_axis: Option<Axis>,

    /// Voxels per cube edge (height fields are regenerated)
    #[arg(long)]
    pub res: Option<usize>,

    #[arg(long, allow_hyphen_values = true)]
    pub angle: Option<f64>,

    /// Number of components (height fields are regenerated)
    #[arg(long)]
    pub components: Option<usize>,

    /// Timber dimension in mm, applied to --dim-axes
    #[arg(long)]
    pub dim: Option<f64>,

    #[arg(long, default_value = "xyz")]
    pub dim_axes: String,

    /// Move a component: N=ax,dir[.ax,dir]
    #[arg(long)]
    pub relocate: Option<String>,

    /// Component whose face is pulled to --height
    #[arg(long, requires = "height")]
    pub component: Option<usize>,

    /// Which face of the component: pos or neg along the sliding axis
    #[arg(long, value_parser = parse_end, default_value = "pos")]
    pub end: Direction,

    /// Cells to edit: i,j[;i,j...]
    #[arg(long, requires = "component")]
    pub cells: Option<String>,

    /// Extend the first cell to its same-height neighbours
    #[arg(long)]
    pub flood: bool,

    #[arg(long)]
    pub height: Option<usize>,

    /// Regenerate all height fields
    #[arg(long)]
    pub randomize: bool,

    /// Ramp into each layer (true/false)
    #[arg(long)]
    pub incremental: Option<bool>,

    /// Milling bit diameter (mm)
    #[arg(long)]
    pub tool_diameter: Option<f64>,

    /// Machine file format (gcode, nc, sbp)
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ExportFormat>,
}

fn parse_axis(s: &str) -> Result<Axis, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "x" | "0" => Ok(Axis::X),
        "y" | "1" => Ok(Axis::Y),
        "z" | "2" => Ok(Axis::Z),
        other => Err(format!("unknown axis '{}' (use x, y or z)", other)),
    }
}

fn parse_end(s: &str) -> Result<Direction, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "pos" | "+" | "1" => Ok(Direction::Positive),
        "neg" | "-" | "0" => Ok(Direction::Negative),
        other => Err(format!("unknown end '{}' (use pos or neg)", other)),
    }
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse::<ExportFormat>().map_err(|e| e.to_string())
}

fn parse_cells(s: &str) -> Result<Vec<(usize, usize)>> {
    s.split(';')
        .filter(|c| !c.trim().is_empty())
        .map(|cell| -> Result<(usize, usize)> {
            let (i, j) = cell
                .split_once(',')
                .with_context(|| format!("cell '{}' is not i,j", cell))?;
            Ok((i.trim().parse()?, j.trim().parse()?))
        })
        .collect()
}

fn parse_relocation(s: &str) -> Result<(usize, Vec<FixedSide>)> {
    let (n, sides) = s
        .split_once('=')
        .with_context(|| format!("relocation '{}' is not N=ax,dir", s))?;
    let sides = sides
        .split('.')
        .map(str::parse::<FixedSide>)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((n.trim().parse()?, sides))
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => AppConfig::default_path()?,
    };
    debug!("Using config {}", path.display());
    AppConfig::load_or_default(&path).with_context(|| format!("loading config {}", path.display()))
}

fn open(path: &Path) -> Result<JointDesign> {
    load_design(path).with_context(|| format!("opening {}", path.display()))
}

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::New {
            output,
            seed,
            components,
            res,
            sliding_axis,
            angle,
        } => {
            let mut params = config.design.clone();
            if let Some(axis) = sliding_axis {
                params.sliding_axis = axis;
            }
            if let Some(res) = res {
                params.voxel_res = res;
            }
            if let Some(angle) = angle {
                params.angle = angle;
            }
            let design = new_design(&config, params, components, seed)?;
            save_design(&design, &output)?;
            println!("Created {}", output.display());
        }
        Commands::Info { file } => {
            print!("{}", describe(&open(&file)?)?);
        }
        Commands::Edit(args) => {
            let mut design = open(&args.file)?;
            apply_edits(&mut design, &args)?;
            let output = args.output.as_ref().unwrap_or(&args.file);
            save_design(&design, output)?;
            println!(
                "Saved {} ({})",
                output.display(),
                if design.evaluation().valid { "valid" } else { "invalid" }
            );
        }
        Commands::Suggest {
            file,
            apply,
            output,
        } => {
            let mut design = open(&file)?;
            match apply {
                Some(index) => {
                    design.apply_suggestion(index)?;
                    let output = output.unwrap_or(file);
                    save_design(&design, &output)?;
                    println!("Applied suggestion {} to {}", index, output.display());
                }
                None => print!("{}", describe_suggestions(&design)?),
            }
        }
        Commands::Export {
            file,
            output_dir,
            format,
        } => {
            let mut design = open(&file)?;
            if let Some(format) = format {
                design.set_fabrication(FabricationSettings {
                    export_format: format,
                    ..design.fabrication().clone()
                })?;
            }
            let dir = output_dir.unwrap_or_else(|| config.output_directory.clone());
            let name = file.file_name().context("design path has no file name")?;
            let written = Exporter::new(&design).export(&dir.join(name))?;
            for path in &written {
                println!("{}", path.display());
            }
            info!("Exported {} file(s)", written.len());
        }
    }
    Ok(())
}

/// Random design from config defaults, fixed on both ends of the sliding axis.
pub fn new_design(
    config: &AppConfig,
    params: DesignParameters,
    components: Option<usize>,
    seed: Option<u64>,
) -> Result<JointDesign> {
    let mut rng = make_rng(seed);
    let axis = params.sliding_axis;
    let sides = vec![
        vec![FixedSide::new(axis, Direction::Negative)],
        vec![FixedSide::new(axis, Direction::Positive)],
    ];
    let mut design = JointDesign::random(&mut rng, params, sides, config.fabrication.clone())?;
    if let Some(count) = components {
        design.update_component_count(&mut rng, count)?;
    }
    Ok(design)
}

/// Apply every requested change in a fixed order; stops at the first rejection.
pub fn apply_edits(design: &mut JointDesign, args: &EditArgs) -> Result<()> {
    let mut rng = make_rng(args.seed);

    if let Some(axis) = args.sliding_axis {
        design.update_sliding_axis(axis)?;
    }
    if let Some(count) = args.components {
        design.update_component_count(&mut rng, count)?;
    }
    if let Some(res) = args.res {
        design.update_voxel_resolution(&mut rng, res)?;
    }
    if let Some(angle) = args.angle {
        design.update_angle(angle)?;
    }
    if let Some(dim) = args.dim {
        let axes = args
            .dim_axes
            .chars()
            .map(|c| parse_axis(&c.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(anyhow::Error::msg)?;
        design.update_timber_dimensions(&axes, dim)?;
    }
    if let Some(relocation) = &args.relocate {
        let (n, sides) = parse_relocation(relocation)?;
        design.update_component_position(n, sides)?;
    }
    if let (Some(n), Some(height)) = (args.component, args.height) {
        let Some(cells) = &args.cells else {
            bail!("--cells is required to edit a height field");
        };
        let mut cells = parse_cells(cells)?;
        if args.flood {
            let field = match args.end {
                Direction::Positive => Some(n),
                Direction::Negative => n.checked_sub(1),
            }
            .and_then(|index| design.height_fields().get(index));
            if let (Some(field), Some(&seed)) = (field, cells.first()) {
                cells = field.same_height_neighbors(seed);
            }
        }
        design.edit_height_fields(&cells, height, n, args.end)?;
    }
    if args.randomize {
        design.randomize_height_fields(&mut rng);
    }
    if let Some(enabled) = args.incremental {
        design.set_incremental_depth(enabled);
    }
    if args.tool_diameter.is_some() || args.format.is_some() {
        let mut fab = design.fabrication().clone();
        if let Some(diameter) = args.tool_diameter {
            fab.tool_diameter = diameter;
        }
        if let Some(format) = args.format {
            fab.export_format = format;
        }
        design.set_fabrication(fab)?;
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn write_field(out: &mut String, field: &HeightField) -> std::fmt::Result {
    for row in field.rows() {
        let row: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "    {}", row.join(" "))?;
    }
    Ok(())
}

/// Human readable summary of a design.
pub fn describe(design: &JointDesign) -> Result<String> {
    let eval = design.evaluation();
    let dims = design.timber_dims();
    let mut out = String::new();

    writeln!(out, "Sliding axis:     {}", design.sliding_axis())?;
    writeln!(out, "Components:       {}", design.component_count())?;
    writeln!(out, "Voxel resolution: {}", design.voxel_res())?;
    writeln!(out, "Angle:            {}", design.angle())?;
    writeln!(out, "Timber (mm):      {} x {} x {}", dims[0], dims[1], dims[2])?;
    writeln!(out, "Fixed sides:      {}", design.fixed_sides())?;
    writeln!(out, "Valid:            {}", yes_no(eval.valid))?;
    writeln!(out, "Checkerboard:     {}", yes_no(eval.checker))?;
    for n in 0..design.component_count() {
        let face = match eval.fab_directions[n] {
            Direction::Negative => "positive",
            Direction::Positive => "negative",
        };
        writeln!(
            out,
            "Component {}: {} voxels, milled from the {} face, connected {}, bridged {}, millable {}, fragile {}",
            component_letter(n),
            design.voxels().count(n),
            face,
            yes_no(eval.connected[n]),
            yes_no(eval.bridged[n]),
            yes_no(eval.fab_ok[n]),
            yes_no(eval.fragile[n]),
        )?;
    }
    for (n, field) in design.height_fields().iter().enumerate() {
        writeln!(out, "Height field {}:", n)?;
        write_field(&mut out, field)?;
    }
    writeln!(out, "Suggestions:      {}", design.suggestions().len())?;
    Ok(out)
}

/// List the cells each suggestion changes.
pub fn describe_suggestions(design: &JointDesign) -> Result<String> {
    let mut out = String::new();
    if design.suggestions().is_empty() {
        writeln!(
            out,
            "No suggestions ({})",
            if design.evaluation().valid { "design is valid" } else { "none found" }
        )?;
        return Ok(out);
    }
    for (index, fields) in design.suggestions().iter().enumerate() {
        writeln!(out, "Suggestion {}:", index)?;
        for (n, (field, current)) in fields.iter().zip(design.height_fields()).enumerate() {
            if field == current {
                continue;
            }
            writeln!(out, "  height field {}:", n)?;
            write_field(&mut out, field)?;
        }
    }
    Ok(out)
}
