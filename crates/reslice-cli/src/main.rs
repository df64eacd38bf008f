use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reslice_core::coordinate::{CoordinateMap, ShiftUnits};
use reslice_core::image::{Dimensions, Orientation};
use reslice_core::session::{SessionConfig, ViewerSession};
use reslice_core::slicer::DataSlicer;
use reslice_core::spatial::{combine_affine_matrices, AffineMatrix, Axis, Vector3};
use reslice_core::voxel::VoxelType;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "reslice")]
#[command(about = "Inspect coordinate maps and reslicing geometry")]
struct Cli {
    /// Session configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a coordinate map and its matrix
    ShowMap {
        /// Linear map text file, or a `.json` coordinate map script
        file: PathBuf,

        /// Resolutions used to express pixel origins in millimetres
        #[arg(short, long, value_delimiter = ',')]
        resolution: Option<Vec<f64>>,
    },

    /// Map a voxel location into space
    ToSpace {
        x: f64,
        y: f64,
        z: f64,

        /// Coordinate map file; the session default is used otherwise
        #[arg(short, long)]
        map: Option<PathBuf>,

        #[arg(short, long, value_delimiter = ',')]
        resolution: Option<Vec<f64>>,
    },

    /// Map a location in space back to voxel indices
    FromSpace {
        x: f64,
        y: f64,
        z: f64,

        #[arg(short, long)]
        map: Option<PathBuf>,

        #[arg(short, long, value_delimiter = ',')]
        resolution: Option<Vec<f64>>,
    },

    /// Output geometry of a volume resliced through a rotation
    Bounds {
        /// Input sizes, e.g. 256,256,40
        #[arg(short, long, value_delimiter = ',', required = true)]
        sizes: Vec<usize>,

        /// Input resolutions
        #[arg(short, long, value_delimiter = ',')]
        resolution: Option<Vec<f64>>,

        /// Rotation about x, y and z in degrees, applied in that order
        #[arg(long, value_delimiter = ',', default_value = "0,0,0")]
        rotate: Vec<f64>,

        /// View mode; overrides the session's
        #[arg(long)]
        view: Option<Orientation>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => reslice_io::read_session_config(path)?,
        None => SessionConfig::default(),
    };

    match cli.command {
        Commands::ShowMap { file, resolution } => {
            show_map(&file, resolution.as_deref())?;
        }
        Commands::ToSpace { x, y, z, map, resolution } => {
            let session = ViewerSession::new(config);
            let map = resolve_map(&session, map.as_deref())?;
            let res = resolution.as_deref().map(|r| Vector3::from_slice_or(r, 1.0));
            let out = map.to_space(&Vector3::new(x, y, z), res.as_ref());
            println!("{}", out);
        }
        Commands::FromSpace { x, y, z, map, resolution } => {
            let session = ViewerSession::new(config);
            let map = resolve_map(&session, map.as_deref())?;
            if !map.has_inverse() {
                tracing::warn!(map = map.name(), "map is singular, location is returned unchanged");
            }
            let res = resolution.as_deref().map(|r| Vector3::from_slice_or(r, 1.0));
            let out = map.from_space(&Vector3::new(x, y, z), res.as_ref());
            println!("{}", out);
        }
        Commands::Bounds {
            sizes,
            resolution,
            rotate,
            view,
        } => {
            let config = match view {
                Some(view) => config.with_view_mode(view),
                None => config,
            };
            bounds(ViewerSession::new(config), &sizes, resolution.as_deref(), &rotate)?;
        }
    }

    Ok(())
}

fn load_map(path: &Path) -> Result<CoordinateMap> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        reslice_io::read_coordinate_map(path)
    } else {
        Ok(CoordinateMap::linear(reslice_io::read_linear_map(path)?))
    }
}

fn resolve_map(session: &ViewerSession, path: Option<&Path>) -> Result<CoordinateMap> {
    match path {
        Some(path) => load_map(path),
        None => Ok(CoordinateMap::clone(&session.coordinate_map())),
    }
}

fn show_map(path: &Path, resolution: Option<&[f64]>) -> Result<()> {
    let map = load_map(path)?;
    info!("Loaded {} map from {}", map.name(), path.display());

    println!("kind:        {}", map.name());
    println!(
        "shift units: {}",
        match map.shift_units() {
            ShiftUnits::Pixels => "pixels",
            ShiftUnits::Physical => "physical",
        }
    );
    println!("invertible:  {}", map.has_inverse());
    println!("matrix:\n{}", map.matrix());

    if let reslice_core::coordinate::CoordinateMapKind::Linear(linear) = map.kind() {
        let res = resolution.map(|r| Vector3::from_slice_or(r, 1.0));
        println!("\n{}", linear.to_text(res.as_ref()).trim_end());
    }
    Ok(())
}

fn bounds(
    session: ViewerSession,
    sizes: &[usize],
    resolution: Option<&[f64]>,
    rotate: &[f64],
) -> Result<()> {
    if rotate.len() != 3 {
        bail!("--rotate takes three angles, got {}", rotate.len());
    }

    let mut dims = Dimensions::new(sizes, VoxelType::Short).context("Invalid --sizes")?;
    if let Some(res) = resolution {
        dims.set_resolutions(res).context("Invalid --resolution")?;
    }

    let transform = combine_affine_matrices(&[
        AffineMatrix::build_axis_rotation(Axis::X, rotate[0].to_radians()),
        AffineMatrix::build_axis_rotation(Axis::Y, rotate[1].to_radians()),
        AffineMatrix::build_axis_rotation(Axis::Z, rotate[2].to_radians()),
    ]);
    let slicer = session.affine_slicer(&dims, transform)?;
    let bounds = slicer.bounds();
    let output = slicer.output_dimensions();

    info!("Resliced {:?} through rotation {:?} degrees", sizes, rotate);
    println!("view:         {}", session.config().view_mode);
    println!("output sizes: {:?}", bounds.sizes);
    println!("origin:       {}", bounds.origin);
    if let Some(res) = output.resolutions() {
        println!("resolutions:  {:?}", res);
    }
    println!("slices:       {}", slicer.number_of_slices());
    println!("slice sizes:  {:?}", slicer.slice_dimensions().sizes());
    Ok(())
}
