pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Request body from `--input`, else from piped stdin, else `None` so the
/// caller can assemble one from flags.
pub fn read_request<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    stdin::read_stdin()
}
