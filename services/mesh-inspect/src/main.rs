//! Mesh inspector.
//!
//! Loads a mesh from a netCDF file or a chunked store directory and prints
//! what the loader made of it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mesh_common::{LoaderConfig, Mesh, Topology};
use mesh_loader::{load_from_chunked_store_with_config, load_from_structured_source_with_config};
use netcdf_parser::{silence_hdf5_errors, NetCdfSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Directory: chunked store, file: netCDF
    Auto,
    Netcdf,
    Zarr,
}

#[derive(Parser, Debug)]
#[command(name = "mesh-inspect")]
#[command(about = "Load a geographic mesh and print a summary")]
struct Args {
    /// netCDF file or chunked store directory
    path: PathBuf,

    /// Separate grid file holding the coordinates (netCDF only)
    #[arg(long)]
    side_file: Option<PathBuf>,

    /// Which reader to use
    #[arg(long, value_enum, default_value = "auto")]
    backend: BackendArg,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    silence_hdf5_errors();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let config = LoaderConfig::from_env();
    if let Err(e) = config.validate() {
        bail!("invalid loader configuration: {}", e);
    }

    let backend = match args.backend {
        BackendArg::Auto if args.path.is_dir() => BackendArg::Zarr,
        BackendArg::Auto => BackendArg::Netcdf,
        other => other,
    };
    info!(path = %args.path.display(), backend = ?backend, "Loading mesh");

    let mesh = match backend {
        BackendArg::Zarr => {
            if args.side_file.is_some() {
                bail!("--side-file is only supported for netCDF input");
            }
            load_from_chunked_store_with_config(&args.path, &config)
                .with_context(|| format!("loading chunked store {}", args.path.display()))?
        }
        _ => load_netcdf(&args.path, args.side_file.as_deref(), &config)?,
    };

    print_summary(&mesh);
    Ok(())
}

fn load_netcdf(path: &Path, side_file: Option<&Path>, config: &LoaderConfig) -> Result<Mesh> {
    let source = NetCdfSource::open_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mesh = load_from_structured_source_with_config(&source, side_file, config)
        .with_context(|| format!("loading mesh from {}", path.display()))?;
    Ok(mesh)
}

fn print_summary(mesh: &Mesh) {
    let source = mesh.source();
    println!("backend:      {:?}", source.backend);
    if let Some(location) = &source.location {
        println!("location:     {}", location.display());
    }
    if let Some(side_file) = &source.side_file {
        println!("side file:    {}", side_file.display());
    }
    println!("topology:     {}", mesh.topology());
    println!("points:       {}", mesh.point_count());

    if mesh.topology() != Topology::Unstructured {
        let extent = mesh.grid_extent();
        println!("extent:       {} x {}", extent.nx, extent.ny);
    }

    if let Some((min_lon, min_lat, max_lon, max_lat)) = mesh.bounds() {
        println!(
            "bounds:       lon [{:.4}, {:.4}]  lat [{:.4}, {:.4}]",
            min_lon, max_lon, min_lat, max_lat
        );
    }

    match mesh.connectivity() {
        Some(conn) => println!(
            "connectivity: {} elements x {} vertices",
            conn.element_count, conn.vertices_per_element
        ),
        None => println!("connectivity: none"),
    }
}
