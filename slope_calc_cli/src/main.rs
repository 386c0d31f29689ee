use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use serde::Serialize;
use slope_calc::io::{
    load_project_path, read_basic_csv_path, read_profile_csv_path, save_project_path,
    write_profile_csv_path,
};
use slope_calc::slope::display_ratio;
use slope_calc::{
    convert_units, profile_segments, profile_totals, EditOutcome, Field, Preferences, Profile,
    QuantitySet, SlopeEditor, UnitPreferences, UnitSystem,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Slope conversion and terrain profile CLI", long_about = None)]
struct Cli {
    /// Preferences JSON (unit system, status precision)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Display unit system (overrides the preferences file)
    #[arg(long, global = true, value_enum)]
    units: Option<UnitsOpt>,

    /// Verbose logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Edit one slope quantity and print the resulting consistent set
    Convert(ConvertArgs),
    /// Convert a length between metric and imperial
    Units(UnitsArgs),
    /// Read a distance,h1,h2 CSV and print its quantities
    Basic(BasicArgs),
    /// Inspect a profile CSV or project document
    Profile(ProfileArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Quantity being edited
    #[arg(long, value_enum)]
    field: FieldOpt,

    /// New value of the edited quantity
    #[arg(long, allow_hyphen_values = true)]
    value: f64,

    /// Starting horizontal distance
    #[arg(long, default_value_t = 100.0, allow_hyphen_values = true)]
    distance: f64,

    /// Starting height at the origin
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    h1: f64,

    /// Starting height at the far end
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    h2: f64,

    /// Print JSON instead of a table
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Parser, Debug)]
struct UnitsArgs {
    #[arg(long, allow_hyphen_values = true)]
    value: f64,

    #[arg(long, value_enum)]
    from: UnitsOpt,

    #[arg(long, value_enum)]
    to: UnitsOpt,
}

#[derive(Parser, Debug)]
struct BasicArgs {
    /// CSV with distance,h1,h2 columns
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Print JSON instead of a table
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ProfileArgs {
    /// Profile CSV (x,z) or project document (.json)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Segment table output (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Export the profile with per-point slopes as CSV
    #[arg(long, value_hint = ValueHint::FilePath)]
    export: Option<PathBuf>,

    /// Save the profile as a project document
    #[arg(long, value_hint = ValueHint::FilePath)]
    save: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum UnitsOpt {
    Metric,
    Imperial,
}

impl From<UnitsOpt> for UnitSystem {
    fn from(value: UnitsOpt) -> Self {
        match value {
            UnitsOpt::Metric => UnitSystem::Metric,
            UnitsOpt::Imperial => UnitSystem::Imperial,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FieldOpt {
    Distance,
    H1,
    H2,
    Rise,
    Run,
    Percent,
    Angle,
    Ratio,
}

impl From<FieldOpt> for Field {
    fn from(value: FieldOpt) -> Self {
        match value {
            FieldOpt::Distance => Field::Distance,
            FieldOpt::H1 => Field::H1,
            FieldOpt::H2 => Field::H2,
            FieldOpt::Rise => Field::Rise,
            FieldOpt::Run => Field::Run,
            FieldOpt::Percent => Field::Percent,
            FieldOpt::Angle => Field::Angle,
            FieldOpt::Ratio => Field::Ratio,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let prefs = load_preferences(cli.config.as_deref(), cli.units)?;

    match cli.command {
        Command::Convert(args) => handle_convert(args, &prefs),
        Command::Units(args) => handle_units(args),
        Command::Basic(args) => handle_basic(args, &prefs),
        Command::Profile(args) => handle_profile(args, &prefs),
    }
}

fn load_preferences(path: Option<&Path>, units: Option<UnitsOpt>) -> Result<Preferences> {
    let mut prefs = match path {
        Some(path) => Preferences::load(path)
            .with_context(|| format!("failed to load preferences {}", path.display()))?,
        None => Preferences::default(),
    };
    if let Some(units) = units {
        prefs.units = units.into();
    }
    debug!(units = %prefs.units, "preferences resolved");
    Ok(prefs)
}

#[derive(Serialize)]
struct QuantityReport<'a> {
    units: &'a str,
    #[serde(flatten)]
    quantities: QuantitySet,
    ratio_label: String,
}

fn print_quantities(set: &QuantitySet, units: UnitSystem, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let report = QuantityReport {
            units: units.length_label(),
            quantities: *set,
            ratio_label: set.ratio_label(),
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
        return Ok(());
    }
    let label = units.length_label();
    writeln!(out, "distance  {:>12.3} {}", set.distance, label)?;
    writeln!(out, "h1        {:>12.3} {}", set.h1, label)?;
    writeln!(out, "h2        {:>12.3} {}", set.h2, label)?;
    writeln!(out, "rise      {:>12.3} {}", set.rise, label)?;
    writeln!(out, "run       {:>12.3} {}", set.run, label)?;
    writeln!(out, "percent   {:>12.4} %", set.percent)?;
    writeln!(out, "angle     {:>12.4} deg", set.angle)?;
    writeln!(out, "ratio     {:>12.4} ({})", set.ratio, set.ratio_label())?;
    Ok(())
}

fn seed_editor(editor: &SlopeEditor, distance: f64, h1: f64, h2: f64) -> Result<()> {
    for (field, value) in [(Field::Distance, distance), (Field::H1, h1), (Field::H2, h2)] {
        if editor.edit(field, value) != EditOutcome::Applied {
            return Err(anyhow!("--{} {} is not a usable starting value", field, value));
        }
    }
    Ok(())
}

fn handle_convert(args: ConvertArgs, prefs: &Preferences) -> Result<()> {
    let mut editor = SlopeEditor::new(prefs);
    editor.subscribe(|session, _| debug!("{}", session.status_line()));
    seed_editor(&editor, args.distance, args.h1, args.h2)?;

    let field: Field = args.field.into();
    match editor.edit(field, args.value) {
        EditOutcome::Applied => info!("{} set to {}", field, args.value),
        EditOutcome::Rejected => warn!(
            "{} = {} does not describe a slope; quantities left unchanged",
            field, args.value
        ),
        EditOutcome::Suppressed => return Err(anyhow!("edit of {} was suppressed", field)),
    }
    print_quantities(&editor.quantities(), editor.units(), args.json)
}

fn handle_units(args: UnitsArgs) -> Result<()> {
    let from: UnitSystem = args.from.into();
    let to: UnitSystem = args.to.into();
    let converted = convert_units(args.value, from, to);
    println!(
        "{} {} = {} {}",
        args.value,
        from.length_label(),
        converted,
        to.length_label()
    );
    Ok(())
}

fn handle_basic(args: BasicArgs, prefs: &Preferences) -> Result<()> {
    let input = read_basic_csv_path(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let profile = input.to_profile();
    info!(
        "Basic profile: ({}, {}) -> ({}, {})",
        profile.points[0].x, profile.points[0].z, profile.points[1].x, profile.points[1].z
    );

    let editor = SlopeEditor::new(prefs);
    editor
        .load_profile(profile)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    print_quantities(&editor.quantities(), editor.units(), args.json)
}

fn read_any_profile(path: &Path) -> Result<Profile> {
    let is_project = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let profile = if is_project {
        load_project_path(path)
    } else {
        read_profile_csv_path(path)
    }
    .with_context(|| format!("failed to read {}", path.display()))?;
    if profile.is_empty() {
        return Err(anyhow!("{} contains no profile points", path.display()));
    }
    Ok(profile)
}

fn handle_profile(args: ProfileArgs, prefs: &Preferences) -> Result<()> {
    let profile = read_any_profile(&args.input)?;
    let units = UnitPreferences::new(prefs.units);
    let totals = profile_totals(&profile);
    info!(
        "Profile: {} points, distance {:.3} {}, rise {:.3} {}",
        profile.len(),
        units.from_metric(totals.distance),
        units.length_label(),
        units.from_metric(totals.rise),
        units.length_label()
    );
    if let Some(stats) = profile.slope_stats() {
        info!(
            "Grade range {:.2}% .. {:.2}%, steepest segment #{}",
            stats.min_percent, stats.max_percent, stats.steepest_segment
        );
    }

    if args.output.as_os_str() == "-" {
        let stdout = io::stdout();
        write_segment_rows(&profile, &units, &mut csv::Writer::from_writer(stdout.lock()))?;
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        write_segment_rows(&profile, &units, &mut csv::Writer::from_writer(file))?;
        info!("Wrote segment table: {}", args.output.display());
    }

    if let Some(path) = args.export.as_ref() {
        write_profile_csv_path(path, &profile)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Exported profile CSV: {}", path.display());
    }
    if let Some(path) = args.save.as_ref() {
        save_project_path(path, &profile)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Saved project: {}", path.display());
    }
    Ok(())
}

fn write_segment_rows<W: Write>(
    profile: &Profile,
    units: &UnitPreferences,
    writer: &mut csv::Writer<W>,
) -> Result<()> {
    writer.write_record([
        "segment",
        "start_x",
        "start_z",
        "end_x",
        "end_z",
        "slope_percent",
        "angle_degrees",
        "ratio",
    ])?;
    for (idx, seg) in profile_segments(profile).iter().enumerate() {
        let ratio = slope_calc::slope::ratio_from_rise_run(seg.rise(), seg.run());
        writer.write_record([
            idx.to_string(),
            format!("{:.3}", units.from_metric(seg.start.x)),
            format!("{:.3}", units.from_metric(seg.start.z)),
            format!("{:.3}", units.from_metric(seg.end.x)),
            format!("{:.3}", units.from_metric(seg.end.z)),
            format!("{:.3}", seg.slope_percent),
            format!("{:.3}", seg.angle_degrees),
            display_ratio(ratio),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
