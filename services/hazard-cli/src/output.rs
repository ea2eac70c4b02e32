//! CSV output of aggregated rows.

use std::io::Write;

use anyhow::{Context, Result};
use hazard_common::{HazardQuery, QueryKind};
use hazard_engine::{AggregatedRow, Provenance, RegridSpec};

/// Column set of an output table.
///
/// Chosen once per run so that every row has the same columns, whatever
/// provenance an individual row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
    location_ids: bool,
    halo: bool,
    resolution: bool,
    full_history: bool,
    converted: bool,
}

impl OutputLayout {
    pub fn new(spec: &RegridSpec, query: &HazardQuery, rows: &[AggregatedRow]) -> Self {
        Self {
            location_ids: rows.iter().any(|r| r.location_id.is_some()),
            halo: matches!(spec, RegridSpec::Halo { .. }),
            resolution: matches!(spec, RegridSpec::Resolution { .. }),
            full_history: query.kind() == QueryKind::FullHistory,
            converted: query.needs_ten_minute_conversion(),
        }
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut columns = Vec::with_capacity(24);
        if self.location_ids {
            columns.push("location_id");
        }
        columns.extend(["lat", "lon"]);
        columns.push(if self.resolution { "center_cell_id" } else { "cell_id" });
        if self.halo {
            columns.extend(["halo_row", "halo_col"]);
        }
        if self.resolution {
            columns.extend(["resolution_deg", "reducer", "cells_used"]);
        }
        columns.extend(["min_lon", "min_lat", "max_lon", "max_lat"]);
        columns.extend(["wind_speed", "status"]);
        if self.full_history {
            columns.extend(["event_id", "storm_name", "storm_year"]);
        } else {
            columns.push("return_period");
        }
        columns.extend([
            "terrain_correction",
            "wind_speed_averaging_period",
            "scenario",
            "time_horizon",
            "wind_speed_units",
        ]);
        if self.converted {
            columns.push("conversion");
        }
        columns
    }

    pub fn record(&self, row: &AggregatedRow, query: &HazardQuery) -> Vec<String> {
        let feature = &row.feature;
        let mut fields = Vec::with_capacity(24);

        if self.location_ids {
            fields.push(row.location_id.clone().unwrap_or_default());
        }
        fields.push(row.lat.to_string());
        fields.push(row.lon.to_string());
        fields.push(feature.cell_id.to_string());

        if self.halo {
            let (dr, dc) = match row.provenance {
                Provenance::Halo {
                    row_offset,
                    col_offset,
                } => (row_offset, col_offset),
                _ => (0, 0),
            };
            fields.push(dr.to_string());
            fields.push(dc.to_string());
        }
        if self.resolution {
            match row.provenance {
                Provenance::Regrid {
                    resolution_deg,
                    reducer,
                    cells_used,
                } => {
                    fields.push(resolution_deg.to_string());
                    fields.push(reducer.as_str().to_string());
                    fields.push(cells_used.to_string());
                }
                _ => fields.extend([String::new(), String::new(), String::new()]),
            }
        }

        let bounds = feature.bounds;
        fields.extend([
            bounds.min_lon.to_string(),
            bounds.min_lat.to_string(),
            bounds.max_lon.to_string(),
            bounds.max_lat.to_string(),
        ]);

        fields.push(feature.wind_speed.map(|v| v.to_string()).unwrap_or_default());
        fields.push(feature.status.as_str().to_string());

        if self.full_history {
            fields.push(feature.event_id.clone().unwrap_or_default());
            fields.push(feature.storm_name.clone().unwrap_or_default());
            fields.push(feature.storm_year.map(|y| y.to_string()).unwrap_or_default());
        } else {
            fields.push(feature.return_period.map(|rp| rp.to_string()).unwrap_or_default());
        }

        fields.push(feature.echo.terrain_correction.as_str().to_string());
        fields.push(feature.echo.averaging_period.as_str().to_string());
        fields.push(feature.echo.scenario.clone());
        fields.push(feature.echo.time_horizon.clone());
        fields.push(query.wind_speed_units.as_str().to_string());

        if self.converted {
            fields.push(row.conversion.map(|c| c.as_str().to_string()).unwrap_or_default());
        }

        fields
    }
}

/// Write `rows` as CSV, returning the number of data rows written.
pub fn write_rows<W: Write>(
    writer: W,
    rows: &[AggregatedRow],
    spec: &RegridSpec,
    query: &HazardQuery,
    include_header: bool,
) -> Result<usize> {
    let layout = OutputLayout::new(spec, query, rows);
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    if include_header {
        writer
            .write_record(layout.header())
            .context("Failed to write CSV header")?;
    }

    for row in rows {
        writer
            .write_record(layout.record(row, query))
            .with_context(|| format!("Failed to write row for point {}", row.point_index))?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(rows.len())
}
