use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read a JSON or YAML input file and deserialize into a typed struct.
/// The format follows the extension; anything not `.yaml`/`.yml` parses
/// as JSON.
pub fn read<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(format!("File not found: {}", path).into());
    }
    if !p.is_file() {
        return Err(format!("Not a file: {}", path).into());
    }

    let contents =
        fs::read_to_string(p).map_err(|e| format!("Failed to read '{}': {}", path, e))?;

    let is_yaml = matches!(
        p.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        let value: T = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path, e))?;
        Ok(value)
    } else {
        let value: T = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path, e))?;
        Ok(value)
    }
}
