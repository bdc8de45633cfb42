use crate::config::OutputFormat;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use wfc_core::ResolvedGrid;
use wfc_rules::RuleSet;

/// Writes `grid` to `output_path`, or to standard output when `None`.
pub fn save_grid(
    grid: &ResolvedGrid,
    rules: &RuleSet,
    format: OutputFormat,
    output_path: Option<&Path>,
) -> Result<()> {
    match output_path {
        Some(path) => {
            log::info!("Saving {:?} grid to {:?}...", format, path);
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            let mut writer = BufWriter::new(file);
            write_grid(grid, rules, format, &mut writer)?;
            writer
                .flush()
                .context("Failed to flush writer for output file")?;
            log::info!("Successfully saved grid to {:?}", path);
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_grid(grid, rules, format, &mut writer)?;
            writer.flush().context("Failed to flush standard output")?;
        }
    }
    Ok(())
}

/// Writes `grid` in `format`.
///
/// Text rows run from the top of the world (`y = height - 1`) down so that
/// the printout reads the way the world is laid out.
pub fn write_grid<W: Write>(
    grid: &ResolvedGrid,
    rules: &RuleSet,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for row in grid.rows().rev() {
                let line = row
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(writer, "{}", line)?;
            }
        }
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            csv_writer.write_record(["x", "y", "tile", "name", "texture", "transformation"])?;
            for y in 0..grid.height {
                for x in 0..grid.width {
                    let (Some(tile), Some(tag)) = (grid.tile(x, y), grid.render_tag(x, y)) else {
                        continue;
                    };
                    csv_writer.write_record([
                        x.to_string(),
                        y.to_string(),
                        tile.to_string(),
                        rules.name(tile).unwrap_or_default().to_string(),
                        tag.texture_id().to_string(),
                        tag.transformation().to_string(),
                    ])?;
                }
            }
            csv_writer.flush()?;
        }
        OutputFormat::Json => {
            let json = grid
                .to_json_pretty()
                .context("Failed to serialize grid to JSON")?;
            writeln!(writer, "{}", json)?;
        }
    }
    Ok(())
}
