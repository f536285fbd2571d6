use crate::PipelineError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn read_text_file(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_text_file(path: &Path, text: &str) -> Result<(), PipelineError> {
    fs::write(path, text).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let text = read_text_file(path)?;
    serde_json::from_str(&text).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-printed JSON, newline terminated.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    write_text_file(path, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domecal_core::GeometryParameters;

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geometry.json");
        let geometry = GeometryParameters::default().scaled(1.25);
        write_json_file(&path, &geometry).unwrap();
        let back: GeometryParameters = load_json_file(&path).unwrap();
        assert_eq!(back, geometry);
    }

    #[test]
    fn missing_and_malformed_files_are_reported_with_their_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = load_json_file::<GeometryParameters>(&missing).unwrap_err();
        assert!(matches!(err, PipelineError::Io { ref path, .. } if path == &missing));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let err = load_json_file::<GeometryParameters>(&bad).unwrap_err();
        assert!(matches!(err, PipelineError::Json { .. }));
        assert!(err.to_string().contains("bad.json"), "message: {err}");
    }
}
