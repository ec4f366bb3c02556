//! Flattening a population snapshot to CSV, one row per agent.
//!
//! The column set is `index` followed by the sorted union of every agent's
//! attribute names; agents missing a column get an empty cell.  Values are
//! rendered with their `Display` form.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::{PopulationSnapshot, SnapshotResult};

/// The sorted union of attribute names across all agents of `record`.
fn columns(record: &PopulationSnapshot) -> Vec<&str> {
    let names: BTreeSet<&str> = record
        .agents
        .iter()
        .flat_map(|a| a.attrs.keys().map(String::as_str))
        .collect();
    names.into_iter().collect()
}

/// Write `record` as CSV to any sink.
pub fn write_population_csv<W: Write>(record: &PopulationSnapshot, sink: W) -> SnapshotResult<()> {
    let mut writer = Writer::from_writer(sink);
    let columns = columns(record);

    let mut header = vec!["index".to_owned()];
    header.extend(columns.iter().map(|c| (*c).to_owned()));
    writer.write_record(&header)?;

    for agent in &record.agents {
        let mut row = vec![agent.index.0.to_string()];
        for column in &columns {
            row.push(agent.attrs.get(*column).map(ToString::to_string).unwrap_or_default());
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `record` as CSV to a file at `path`.
pub fn export_population_csv(record: &PopulationSnapshot, path: &Path) -> SnapshotResult<()> {
    write_population_csv(record, File::create(path)?)
}
