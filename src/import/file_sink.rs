// # File Sink
//
// Writes finished build files into the layout the game client reads:
// `<lol dir>/Game/Config/Champions/<champion>/Recommended/<file name>.json`

use crate::http::ImportCause;
use crate::models::{BuildFile, ItemBlock};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Only the fields the client recognizes are written
#[derive(Serialize)]
struct ItemSetFile<'a> {
    #[serde(rename = "type")]
    set_type: &'a str,
    map: &'a str,
    mode: &'a str,
    sortrank: u32,
    priority: bool,
    blocks: &'a [ItemBlock],
}

impl<'a> From<&'a BuildFile> for ItemSetFile<'a> {
    fn from(file: &'a BuildFile) -> Self {
        Self {
            set_type: BuildFile::TYPE,
            map: BuildFile::MAP,
            mode: BuildFile::MODE,
            sortrank: BuildFile::SORTRANK,
            priority: BuildFile::PRIORITY,
            blocks: file.blocks(),
        }
    }
}

/// Root of every champion's recommended item folders
pub fn champions_dir(target_dir: &Path) -> PathBuf {
    target_dir.join("Game").join("Config").join("Champions")
}

pub fn build_file_path(target_dir: &Path, file: &BuildFile) -> PathBuf {
    champions_dir(target_dir)
        .join(file.champion())
        .join("Recommended")
        .join(format!("{}.json", file.file_name()))
}

/// Serialize with 4-space indentation
pub fn render(file: &BuildFile) -> Result<Vec<u8>, ImportCause> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    ItemSetFile::from(file).serialize(&mut serializer)?;
    Ok(out)
}

/// Write `file` under `target_dir`, replacing any existing file of the same name
pub async fn save_to_file(target_dir: &Path, file: &BuildFile) -> Result<PathBuf, ImportCause> {
    let path = build_file_path(target_dir, file);
    let content = render(file)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, content).await?;

    debug!("Wrote {}", path.display());
    Ok(path)
}

/// Empty the champions directory, creating it if missing
pub async fn clear_builds(target_dir: &Path) -> Result<(), ImportCause> {
    let dir = champions_dir(target_dir);

    match fs::remove_dir_all(&dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(&dir).await?;

    info!("Cleared {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> BuildFile {
        BuildFile::new(
            "Ahri",
            "mid",
            "[OP.GG] mid - 10.16",
            "[OP.GG]Ahri-mid-10.16",
            vec![vec!["Q".into(), "W".into()]],
            vec![ItemBlock::new("Core Items", vec!["3089".to_string()])],
        )
    }

    #[tokio::test]
    async fn test_save_to_file_writes_whitelisted_fields() {
        let dir = TempDir::new().unwrap();

        let path = save_to_file(dir.path(), &sample()).await.unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("Game/Config/Champions/Ahri/Recommended/[OP.GG]Ahri-mid-10.16.json")
        );
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "custom",
                "map": "any",
                "mode": "any",
                "sortrank": 1,
                "priority": false,
                "blocks": [{ "type": "Core Items", "items": [{ "id": "3089", "count": 1 }] }]
            })
        );
    }

    #[tokio::test]
    async fn test_save_to_file_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = build_file_path(dir.path(), &sample());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let stale = "stale content that is longer than the new file would be...";
        std::fs::write(&path, stale).unwrap();

        save_to_file(dir.path(), &sample()).await.unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, render(&sample()).unwrap());
    }

    #[test]
    fn test_render_uses_four_space_indent() {
        let text = String::from_utf8(render(&sample()).unwrap()).unwrap();
        assert!(text.starts_with("{\n    \"type\": \"custom\""));
    }

    #[tokio::test]
    async fn test_clear_builds_empties_directory() {
        let dir = TempDir::new().unwrap();
        let path = save_to_file(dir.path(), &sample()).await.unwrap();

        clear_builds(dir.path()).await.unwrap();

        assert!(!path.exists());
        assert!(champions_dir(dir.path()).is_dir());
    }

    #[tokio::test]
    async fn test_save_to_file_reports_io_errors_as_values() {
        let dir = TempDir::new().unwrap();
        // A regular file where the Game directory should be
        std::fs::write(dir.path().join("Game"), "").unwrap();

        let result = save_to_file(dir.path(), &sample()).await;

        assert!(matches!(result, Err(ImportCause::FileSystem(_))));
    }
}
