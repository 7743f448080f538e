//! tallyview CLI
//!
//! Reduces tallies from a JSON statepoint onto a slice of a voxel geometry,
//! and exports stacks of slices as volumes.
#![allow(
    clippy::uninlined_format_args,
    clippy::too_many_lines
)]

use clap::{Args, Parser, Subcommand, ValueEnum};

use log::info;
use tallyview_algorithms::{
    create_tally_image, export_volume, ExportOptions, ExportRegion, TallyImageOutcome,
};
use tallyview_core::{
    resolve_units, AppliedFilters, Basis, FilterSelection, GeometryEngine, PlotView, Selection,
    StatePoint, Statistic, TallyImage, UnitWarnings,
};
use tallyview_io::{read_geometry, read_statepoint, write_volume_json};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    TallyviewIo(#[from] tallyview_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] tallyview_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No image: {0}")]
    NoImage(String),

    #[error("Unsupported output '{0}': rebuild with the hdf5 feature for HDF5 volumes")]
    UnsupportedOutput(String),
}

/// Slice plane.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlaneArg {
    /// x horizontal, y vertical
    Xy,
    /// x horizontal, z vertical
    Xz,
    /// y horizontal, z vertical
    Yz,
}

impl From<PlaneArg> for Basis {
    fn from(plane: PlaneArg) -> Self {
        match plane {
            PlaneArg::Xy => Basis::Xy,
            PlaneArg::Xz => Basis::Xz,
            PlaneArg::Yz => Basis::Yz,
        }
    }
}

/// Statistic to plot.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatisticArg {
    /// Sample mean
    Mean,
    /// Standard deviation
    StdDev,
    /// Relative error in percent
    RelError,
}

impl From<StatisticArg> for Statistic {
    fn from(statistic: StatisticArg) -> Self {
        match statistic {
            StatisticArg::Mean => Statistic::Mean,
            StatisticArg::StdDev => Statistic::StdDev,
            StatisticArg::RelError => Statistic::RelError,
        }
    }
}

/// Volume layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Layer {
    /// Tally values
    Tally,
    /// Cell ids
    Cells,
    /// Material ids
    Materials,
    /// Temperatures
    Temperature,
    /// Densities
    Density,
}

/// Tally reduction and slice projection for reactor simulation results.
#[derive(Parser)]
#[command(name = "tallyview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Tally and selection shared by `reduce` and `export`.
#[derive(Args, Debug)]
struct TallyArgs {
    /// Statepoint JSON file
    #[arg(short, long)]
    statepoint: PathBuf,

    /// Voxel geometry JSON file
    #[arg(short, long)]
    geometry: PathBuf,

    /// Tally id
    #[arg(short, long)]
    tally: u32,

    /// Filter selection as ID (all bins) or ID=i,j,.. (bin indices); every
    /// filter is fully selected when omitted
    #[arg(short, long = "filter", value_parser = parse_filter_selection)]
    filters: Vec<(u32, FilterSelection)>,

    /// Scores to sum; every score of the tally when omitted
    #[arg(long = "score")]
    scores: Vec<String>,

    /// Nuclides to sum; every nuclide of the tally when omitted
    #[arg(long = "nuclide")]
    nuclides: Vec<String>,

    /// Statistic to plot
    #[arg(long, value_enum, default_value = "mean")]
    statistic: StatisticArg,

    /// Divide mesh tallies by voxel volume
    #[arg(long)]
    volume_norm: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the unit label shared by a set of scores
    Units {
        /// Score names
        #[arg(required = true)]
        scores: Vec<String>,
    },

    /// List the tallies of a statepoint
    Info {
        /// Statepoint JSON file
        statepoint: PathBuf,
    },

    /// Reduce a tally onto one slice of the geometry
    Reduce {
        #[command(flatten)]
        tally: TallyArgs,

        /// Slice plane
        #[arg(long, value_enum, default_value = "xy")]
        basis: PlaneArg,

        /// View center x,y,z; the geometry center when omitted
        #[arg(long, value_delimiter = ',', num_args = 3, allow_hyphen_values = true)]
        origin: Option<Vec<f64>>,

        /// View width; the geometry width when omitted
        #[arg(long)]
        width: Option<f64>,

        /// View height; the geometry height when omitted
        #[arg(long)]
        height: Option<f64>,

        /// Horizontal and vertical pixel counts
        #[arg(long, value_delimiter = ',', num_args = 2, default_values_t = [200, 200])]
        resolution: Vec<usize>,

        /// Write the image as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a stack of xy slices through a box
    Export {
        #[command(flatten)]
        tally: TallyArgs,

        /// Lower-left corner x,y,z; the geometry corner when omitted
        #[arg(long, value_delimiter = ',', num_args = 3, allow_hyphen_values = true)]
        lower_left: Option<Vec<f64>>,

        /// Upper-right corner x,y,z; the geometry corner when omitted
        #[arg(long, value_delimiter = ',', num_args = 3, allow_hyphen_values = true)]
        upper_right: Option<Vec<f64>>,

        /// Voxel counts nx,ny,nz
        #[arg(long, value_delimiter = ',', num_args = 3, default_values_t = [50, 50, 50])]
        resolution: Vec<usize>,

        /// Layers to export
        #[arg(long, value_enum, value_delimiter = ',', default_values_t = [Layer::Tally])]
        layers: Vec<Layer>,

        /// Output file (.json, or .h5 with the hdf5 feature)
        #[arg(short, long)]
        output: PathBuf,

        /// Deflate level for HDF5 output
        #[arg(long)]
        compression: Option<u8>,
    },
}

fn parse_filter_selection(arg: &str) -> std::result::Result<(u32, FilterSelection), String> {
    let (id, bins) = match arg.split_once('=') {
        Some((id, bins)) => (id, Some(bins)),
        None => (arg, None),
    };
    let id: u32 = id
        .trim()
        .parse()
        .map_err(|e| format!("invalid filter id '{id}': {e}"))?;
    let selection = match bins {
        None => FilterSelection::All,
        Some(bins) if bins.trim().is_empty() => FilterSelection::None,
        Some(bins) => FilterSelection::Partial(
            bins.split(',')
                .map(|bin| {
                    bin.trim()
                        .parse::<usize>()
                        .map_err(|e| format!("invalid bin index '{bin}': {e}"))
                })
                .collect::<std::result::Result<_, _>>()?,
        ),
    };
    Ok((id, selection))
}

/// Builds the selection for `args`, defaulting to every filter, score and
/// nuclide of the tally.
fn selection(statepoint: &StatePoint, args: &TallyArgs) -> Result<Selection> {
    let tally = statepoint.tally(args.tally)?;
    let filters = if args.filters.is_empty() {
        AppliedFilters::all(tally.filters())
    } else {
        args.filters
            .iter()
            .fold(AppliedFilters::new(), |applied, (id, selection)| {
                applied.with(*id, selection.clone())
            })
    };

    let mut selection = Selection::new().with_filters(filters);
    let scores = if args.scores.is_empty() {
        tally.scores()
    } else {
        &args.scores
    };
    for score in scores {
        selection.select_score(score);
    }
    let nuclides = if args.nuclides.is_empty() {
        tally.nuclides()
    } else {
        &args.nuclides
    };
    for nuclide in nuclides {
        selection.select_nuclide(nuclide);
    }
    Ok(selection)
}

/// Unit label shared by `scores`.
fn units_label(scores: &[String]) -> Result<&'static str> {
    let mut warnings = UnitWarnings::new();
    resolve_units(scores.iter().map(String::as_str), &mut warnings)
        .map(|unit| unit.label())
        .map_err(|err| CliError::NoImage(err.to_string()))
}

fn corner(values: Option<&[f64]>, fallback: [f64; 3]) -> [f64; 3] {
    match values {
        Some(&[x, y, z]) => [x, y, z],
        _ => fallback,
    }
}

fn image_json(image: &TallyImage) -> serde_json::Value {
    let (rows, cols) = image.image.dim();
    let values: Vec<Vec<Option<f64>>> = (0..rows)
        .map(|r| (0..cols).map(|c| image.image.get(r, c)).collect())
        .collect();
    serde_json::json!({
        "units": image.units,
        "extents": image.extents,
        "data_min": image.data_min,
        "data_max": image.data_max,
        "values": values,
    })
}

fn is_hdf5(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "h5" | "hdf5"))
}

#[cfg(feature = "hdf5")]
fn write_hdf5(
    path: &Path,
    volume: &tallyview_algorithms::VolumeData,
    compression: Option<u8>,
) -> Result<()> {
    let options = tallyview_io::hdf5::VolumeWriteOptions { compression };
    tallyview_io::hdf5::write_volume_hdf5(path, volume, &options)?;
    Ok(())
}

#[cfg(not(feature = "hdf5"))]
fn write_hdf5(
    path: &Path,
    _volume: &tallyview_algorithms::VolumeData,
    _compression: Option<u8>,
) -> Result<()> {
    Err(CliError::UnsupportedOutput(path.display().to_string()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Units { scores } => {
            println!("{}", units_label(&scores)?);
        }

        Commands::Info { statepoint } => {
            let statepoint = read_statepoint(&statepoint)?;
            println!("Tallies: {}", statepoint.len());
            for tally in statepoint.tallies() {
                match &tally.name {
                    Some(name) => println!("Tally {} ({})", tally.id, name),
                    None => println!("Tally {}", tally.id),
                }
                for filter in tally.filters() {
                    println!(
                        "  filter {}: {} with {} bins",
                        filter.id,
                        filter.type_name(),
                        filter.num_bins()
                    );
                }
                println!("  scores: {}", tally.scores().join(", "));
                println!("  nuclides: {}", tally.nuclides().join(", "));
            }
        }

        Commands::Reduce {
            tally,
            basis,
            origin,
            width,
            height,
            resolution,
            output,
        } => {
            let statepoint = read_statepoint(&tally.statepoint)?;
            let mut geometry = read_geometry(&tally.geometry)?;
            let (lower_left, upper_right) = geometry.bounding_box();

            let mut view = PlotView::from_bounding_box(lower_left, upper_right);
            view.basis = basis.into();
            let (h, v, _) = view.basis.axes();
            view.origin = corner(origin.as_deref(), view.origin);
            view.width = width.unwrap_or(upper_right[h] - lower_left[h]);
            view.height = height.unwrap_or(upper_right[v] - lower_left[v]);
            if let [h_res, v_res] = resolution[..] {
                view.h_res = h_res;
                view.v_res = v_res;
            }
            view.selected_tally = Some(tally.tally);
            view.statistic = tally.statistic.into();
            view.volume_norm = tally.volume_norm;
            view.selection = selection(&statepoint, &tally)?;
            view.validate()?;

            let ids = geometry.id_map(&view)?;
            let mut warnings = UnitWarnings::new();
            let image = match create_tally_image(&statepoint, &view, &ids, &mut warnings)? {
                TallyImageOutcome::Image(image) => image,
                TallyImageOutcome::NoImage(reason) => {
                    return Err(CliError::NoImage(reason.to_string()))
                }
            };

            println!("Tally {} ({}, {})", tally.tally, view.statistic, view.basis);
            println!("Units: {}", image.units);
            println!("Range: {} - {}", image.data_min, image.data_max);
            let (rows, cols) = image.image.dim();
            println!(
                "Pixels with data: {} of {}",
                image.image.count_valid(),
                rows * cols
            );
            if let Some(extents) = image.extents {
                println!("Extents: {:?}", extents);
            }

            if let Some(output) = output {
                std::fs::write(&output, serde_json::to_string(&image_json(&image))?)?;
                info!("wrote image to {}", output.display());
            }
        }

        Commands::Export {
            tally,
            lower_left,
            upper_right,
            resolution,
            layers,
            output,
            compression,
        } => {
            let statepoint = read_statepoint(&tally.statepoint)?;
            let mut geometry = read_geometry(&tally.geometry)?;
            let (ll, ur) = geometry.bounding_box();
            let resolution = match resolution[..] {
                [nx, ny, nz] => [nx, ny, nz],
                _ => [50, 50, 50],
            };
            let region = ExportRegion::new(
                corner(lower_left.as_deref(), ll),
                corner(upper_right.as_deref(), ur),
                resolution,
            )?;

            let mut base = PlotView::default();
            base.selected_tally = Some(tally.tally);
            base.statistic = tally.statistic.into();
            base.volume_norm = tally.volume_norm;
            base.selection = selection(&statepoint, &tally)?;

            let options = ExportOptions {
                tally: layers.contains(&Layer::Tally),
                cells: layers.contains(&Layer::Cells),
                materials: layers.contains(&Layer::Materials),
                temperature: layers.contains(&Layer::Temperature),
                density: layers.contains(&Layer::Density),
            };

            let mut warnings = UnitWarnings::new();
            let volume = export_volume(
                &region,
                &base,
                &statepoint,
                &mut geometry,
                &options,
                &mut warnings,
            )?;

            if is_hdf5(&output) {
                write_hdf5(&output, &volume, compression)?;
            } else {
                write_volume_json(&output, &volume)?;
            }
            println!(
                "Exported {} x {} x {} voxels to {}",
                resolution[0],
                resolution[1],
                resolution[2],
                output.display()
            );
        }
    }

    Ok(())
}
