use std::path::Path;

use crate::model::Task;

/// Save the schedule forest to a JSON file, in the same shape the AI wire
/// uses.
pub fn save_schedule(tasks: &[Task], path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(tasks).map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| e.to_string())
}

/// Load a schedule forest from a JSON file.
pub fn load_schedule(path: &Path) -> Result<Vec<Task>, String> {
    let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&json).map_err(|e| e.to_string())
}
