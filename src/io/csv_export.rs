use std::path::Path;

use crate::model::tree::flatten_forest;
use crate::model::Task;

/// Export the schedule to a semicolon-delimited CSV file.
///
/// Columns: ID ; Name ; Start Date ; End Date ; Progress ; Parent ID.
/// Rows come out in depth-first order, so the file reads like the table
/// panel. Returns the number of tasks written.
pub fn export_csv(tasks: &[Task], path: &Path) -> Result<usize, String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| format!("Failed to create CSV file: {}", e))?;

    wtr.write_record(["ID", "Name", "Start Date", "End Date", "Progress", "Parent ID"])
        .map_err(|e| format!("Failed to write header: {}", e))?;

    let rows = flatten_forest(tasks);
    for task in &rows {
        wtr.write_record([
            task.id.as_str(),
            task.name.as_str(),
            &task.start.format("%Y-%m-%d").to_string(),
            &task.end.format("%Y-%m-%d").to_string(),
            &format!("{}%", task.progress),
            task.parent_id.as_deref().unwrap_or(""),
        ])
        .map_err(|e| format!("Failed to write task '{}': {}", task.name, e))?;
    }

    wtr.flush().map_err(|e| format!("Failed to flush CSV: {}", e))?;
    Ok(rows.len())
}
