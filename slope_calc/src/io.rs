//! CSV and project-document adapters for profiles.
//!
//! Readers take any [`Read`], writers any [`Write`]; the `*_path` variants
//! open the file and delegate. All lengths on disk are metric.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::QuantitySet;
use crate::profile::{Point, Profile};
use crate::SlopeError;

const BASIC_COLUMNS: [&str; 3] = ["distance", "h1", "h2"];
const PROFILE_COLUMNS: [&str; 2] = ["x", "z"];
const EXPORT_HEADER: [&str; 4] = ["x", "z", "slope_percent", "angle_degrees"];

/// The single row of a basic CSV: horizontal distance and two heights.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BasicInput {
    pub distance: f64,
    pub h1: f64,
    pub h2: f64,
}

impl BasicInput {
    pub fn to_profile(&self) -> Profile {
        Profile::from_endpoints(self.distance, self.h1, self.h2)
    }

    pub fn to_quantities(&self) -> QuantitySet {
        QuantitySet::from_basic(self.distance, self.h1, self.h2)
    }
}

/// On-disk project layout: `{ "points": [[x, z], ...] }`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectDocument {
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
}

impl From<&Profile> for ProjectDocument {
    fn from(profile: &Profile) -> Self {
        Self {
            points: profile.pairs(),
        }
    }
}

impl From<ProjectDocument> for Profile {
    fn from(doc: ProjectDocument) -> Self {
        Profile::new(doc.points.into_iter().map(|[x, z]| Point::new(x, z)).collect())
    }
}

fn locate_columns<const N: usize>(
    headers: &csv::StringRecord,
    required: [&str; N],
) -> Result<[usize; N], SlopeError> {
    let mut idx = [0usize; N];
    for (slot, name) in idx.iter_mut().zip(required) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SlopeError::Schema(format!("missing required columns {}", required.join(","))))?;
    }
    Ok(idx)
}

fn parse_field(
    record: &csv::StringRecord,
    column: usize,
    field: &str,
    row: usize,
) -> Result<f64, SlopeError> {
    let raw = record.get(column).unwrap_or("");
    raw.trim().parse::<f64>().map_err(|_| SlopeError::Parse {
        row,
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}

/// Read `distance,h1,h2` from the first data row; further rows are ignored.
pub fn read_basic_csv<R: Read>(reader: R) -> Result<BasicInput, SlopeError> {
    let mut rdr = csv_reader(reader);
    let [distance, h1, h2] = locate_columns(rdr.headers()?, BASIC_COLUMNS)?;
    let record = match rdr.records().next() {
        Some(record) => record?,
        None => return Err(SlopeError::EmptyInput("file has no data rows".into())),
    };
    // Header is row 1.
    let row = 2;
    Ok(BasicInput {
        distance: parse_field(&record, distance, "distance", row)?,
        h1: parse_field(&record, h1, "h1", row)?,
        h2: parse_field(&record, h2, "h2", row)?,
    })
}

/// Read an `x,z` polyline; every data row becomes a point in file order.
pub fn read_profile_csv<R: Read>(reader: R) -> Result<Profile, SlopeError> {
    let mut rdr = csv_reader(reader);
    let [x_col, z_col] = locate_columns(rdr.headers()?, PROFILE_COLUMNS)?;
    let mut points = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 2;
        let x = parse_field(&record, x_col, "x", row)?;
        let z = parse_field(&record, z_col, "z", row)?;
        points.push(Point::new(x, z));
    }
    if points.is_empty() {
        return Err(SlopeError::EmptyInput(
            "profile must contain at least one point".into(),
        ));
    }
    Ok(Profile::new(points))
}

fn fmt3(value: f64) -> String {
    format!("{:.3}", value)
}

/// Write one row per point with the slope of its outgoing segment; the last
/// point has none, so its slope columns are blank.
pub fn write_profile_csv<W: Write>(writer: W, profile: &Profile) -> Result<(), SlopeError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADER)?;
    let segments = profile.segments();
    for (idx, point) in profile.points.iter().enumerate() {
        let (slope, angle) = match segments.get(idx) {
            Some(seg) => (fmt3(seg.slope_percent), fmt3(seg.angle_degrees)),
            None => (String::new(), String::new()),
        };
        wtr.write_record([fmt3(point.x), fmt3(point.z), slope, angle])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Load a project document. A document without `points` gives an empty
/// profile; rejecting it is up to the caller.
pub fn load_project<R: Read>(reader: R) -> Result<Profile, SlopeError> {
    let doc: ProjectDocument = serde_json::from_reader(reader)?;
    Ok(doc.into())
}

pub fn save_project<W: Write>(mut writer: W, profile: &Profile) -> Result<(), SlopeError> {
    serde_json::to_writer_pretty(&mut writer, &ProjectDocument::from(profile))?;
    writer.flush()?;
    Ok(())
}

pub fn read_basic_csv_path(path: &Path) -> Result<BasicInput, SlopeError> {
    let input = read_basic_csv(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), ?input, "basic csv read");
    Ok(input)
}

pub fn read_profile_csv_path(path: &Path) -> Result<Profile, SlopeError> {
    let profile = read_profile_csv(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), points = profile.len(), "profile csv read");
    Ok(profile)
}

pub fn write_profile_csv_path(path: &Path, profile: &Profile) -> Result<(), SlopeError> {
    write_profile_csv(BufWriter::new(File::create(path)?), profile)?;
    debug!(path = %path.display(), points = profile.len(), "profile csv written");
    Ok(())
}

pub fn load_project_path(path: &Path) -> Result<Profile, SlopeError> {
    let profile = load_project(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), points = profile.len(), "project loaded");
    Ok(profile)
}

pub fn save_project_path(path: &Path, profile: &Profile) -> Result<(), SlopeError> {
    save_project(BufWriter::new(File::create(path)?), profile)?;
    debug!(path = %path.display(), points = profile.len(), "project saved");
    Ok(())
}
