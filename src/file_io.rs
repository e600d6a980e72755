use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use archstudio_core::DiagramSnapshot;
use archstudio_session::EditorConfig;

/// Data directory for archstudio state: `$XDG_DATA_HOME/archstudio`, falling
/// back to `~/.local/share/archstudio`
pub fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
    base.join("archstudio")
}

/// Where the editor keeps its diagram when no file is given
pub fn default_storage_path() -> PathBuf {
    data_dir().join("diagram.json")
}

/// Log file used while the terminal UI owns the screen
pub fn default_log_path() -> PathBuf {
    data_dir().join("archstudio.log")
}

/// Optional editor settings, `config.json` next to the default diagram
pub fn default_config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Read editor settings; a missing file means defaults. Unknown keys are
/// ignored and absent keys keep their default.
pub fn load_config(path: &Path) -> Result<EditorConfig> {
    if !path.exists() {
        return Ok(EditorConfig::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse editor config in {}", path.display()))
}

/// Read a snapshot; a missing file is an empty diagram
pub fn load_snapshot(path: &Path) -> Result<DiagramSnapshot> {
    if !path.exists() {
        return Ok(DiagramSnapshot::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse diagram in {}", path.display()))?;
    Ok(snapshot)
}

/// Write a snapshot, creating parent directories as needed
pub fn save_snapshot(path: &Path, snapshot: &DiagramSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(snapshot).context("Failed to serialize diagram")?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstudio_core::{Diagram, ElementKind};
    use archstudio_geometry::Point;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = load_snapshot(&dir.path().join("absent.json")).unwrap();
        assert_eq!(snapshot, DiagramSnapshot::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("diagram.json");
        let mut diagram = Diagram::new();
        diagram.add_element(ElementKind::Cache, "Redis", Point::new(40.0, 60.0));

        save_snapshot(&path, &diagram.snapshot()).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded, diagram.snapshot());
    }

    #[test]
    fn legacy_type_names_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"{"elements":[{"id":1,"type":"webapp","name":"Web","x":10,"y":20}],"connections":[]}"#,
        )
        .unwrap();
        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.elements[0].kind, ElementKind::WebApp);
        assert!(snapshot.groups.is_empty());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"snapToGrid":true,"gridSize":40}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert!(config.snap_to_grid);
        assert_eq!(config.grid_size, 40.0);
        assert_eq!(config.max_zoom, 200);
        assert_eq!(load_config(&dir.path().join("none.json")).unwrap(), EditorConfig::default());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[").unwrap();
        assert!(load_snapshot(&path).is_err());
    }
}
