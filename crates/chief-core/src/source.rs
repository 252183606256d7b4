// # Declarative Record Source
//
// Loads declared records from YAML files and writes remote snapshots back
// out in the same schema.
//
// ## File Format
//
// ```yaml
// - name: www
//   value: 1.2.3.4
//   type: A
//   ttl: 300
//   state: present
// - name: legacy
//   state: absent
// ```
//
// `state` may be omitted and then means `present`.
//
// ## Loading
//
// Every `*.yml` / `*.yaml` file in a directory is read in file-name order
// and the entries are concatenated in that order. That order is the order
// in which records are reconciled.
//
// ## Import Dump
//
// Written atomically (temp file, then rename) so a crash never leaves a
// half-written baseline behind.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::Error;
use crate::record::{DeclaredRecord, RemoteRecord};

/// File extensions picked up by [`load_dir`]
const RECORD_FILE_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// Default file name for the import dump
pub const DEFAULT_IMPORT_FILE: &str = "chief.yml";

/// Parse one YAML document of declared records
///
/// `origin` names the document in error messages. An empty document holds
/// no records.
pub fn parse_records(text: &str, origin: &str) -> Result<Vec<DeclaredRecord>, Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_yaml::from_str::<Option<Vec<DeclaredRecord>>>(text)
        .map(Option::unwrap_or_default)
        .map_err(|e| Error::config(format!("Failed to parse {}: {}", origin, e)))
}

/// List record files in a directory, sorted by file name
pub async fn record_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        Error::config(format!("Error reading configs in {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        Error::config(format!("Error reading configs in {}: {}", dir.display(), e))
    })? {
        let path = entry.path();
        let is_record_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| RECORD_FILE_EXTENSIONS.contains(&ext));

        if is_record_file && entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Load every declared record from the YAML files in `dir`
pub async fn load_dir(dir: &Path) -> Result<Vec<DeclaredRecord>, Error> {
    let mut records = Vec::new();

    for path in record_files(dir).await? {
        tracing::info!("[config] loading: {}", path.display());

        let text = fs::read_to_string(&path).await.map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let loaded = parse_records(&text, &path.display().to_string())?;
        tracing::info!("{} records loaded from {}", loaded.len(), path.display());
        records.extend(loaded);
    }

    tracing::info!("{} local records found", records.len());
    Ok(records)
}

/// Convert a remote snapshot into a declarative baseline
pub fn snapshot_to_declared(records: &[RemoteRecord]) -> Vec<DeclaredRecord> {
    records.iter().map(DeclaredRecord::from).collect()
}

/// Write declared records to `path` as YAML, atomically
pub async fn write_records(path: &Path, records: &[DeclaredRecord]) -> Result<(), Error> {
    let yaml = serde_yaml::to_string(records)?;

    let temp_path = temp_path(path);
    {
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            Error::config(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        write_contents(&mut file, &yaml, &temp_path).await?;
    }

    fs::rename(&temp_path, path).await.map_err(|e| {
        Error::config(format!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        ))
    })?;

    tracing::debug!("{} records written to {}", records.len(), path.display());
    Ok(())
}

async fn write_contents<W>(writer: &mut W, yaml: &str, temp_path: &Path) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(yaml.as_bytes()).await.map_err(|e| {
        Error::config(format!("Failed to write {}: {}", temp_path.display(), e))
    })?;
    writer
        .flush()
        .await
        .map_err(|e| Error::config(format!("Failed to flush {}: {}", temp_path.display(), e)))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_IMPORT_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::tempdir;

    /// Sink that rejects every write, like a full disk
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &[u8]) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn test_parse_records() {
        let records = parse_records(
            "- name: www\n  value: 1.2.3.4\n  type: A\n  ttl: 300\n- name: legacy\n  state: absent\n",
            "inline",
        )
        .unwrap();

        assert_eq!(
            records,
            vec![
                DeclaredRecord::present("www", "1.2.3.4", "A", 300),
                DeclaredRecord::absent("legacy"),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_unknown_state() {
        let records = parse_records("- name: www\n  state: maybe\n", "inline").unwrap();
        assert_eq!(records[0].state, "maybe");
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = parse_records("- name: [unterminated\n", "bad.yml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("bad.yml"));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_records("", "empty.yml").unwrap().is_empty());
        assert!(parse_records("  \n", "blank.yml").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_dir_concatenates_in_file_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.yml"), "- name: second\n  value: 2.2.2.2\n  type: A\n  ttl: 60\n")
            .await
            .unwrap();
        fs::write(dir.path().join("a.yaml"), "- name: first\n  value: 1.1.1.1\n  type: A\n  ttl: 60\n")
            .await
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "- name: ignored\n").await.unwrap();
        fs::write(dir.path().join("c.yml.bak"), "- name: ignored\n").await.unwrap();

        let records = load_dir(dir.path()).await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_load_dir_missing_directory() {
        let dir = tempdir().unwrap();
        let err = load_dir(&dir.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_import_dump_round_trips_into_load() {
        let dir = tempdir().unwrap();
        let remote = vec![
            RemoteRecord {
                name: "www.example.com".to_string(),
                value: "1.2.3.4".to_string(),
                record_type: "A".to_string(),
                ttl: 300,
                provider_id: "r1".to_string(),
            },
            RemoteRecord {
                name: "example.com".to_string(),
                value: "v=spf1 -all".to_string(),
                record_type: "TXT".to_string(),
                ttl: 1,
                provider_id: "r2".to_string(),
            },
        ];

        let path = dir.path().join(DEFAULT_IMPORT_FILE);
        write_records(&path, &snapshot_to_declared(&remote)).await.unwrap();

        let text = fs::read_to_string(&path).await.unwrap();
        assert!(text.contains("state: present"));
        assert!(!text.contains("r1"), "provider IDs are not part of the schema");
        assert!(!temp_path(&path).exists());

        let loaded = load_dir(dir.path()).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], DeclaredRecord::present("www.example.com", "1.2.3.4", "A", 300));
        assert_eq!(loaded[1].record_type, "TXT");
    }

    #[tokio::test]
    async fn test_failed_write_is_config_error() {
        let err = write_contents(&mut FullDisk, "- name: www\n", Path::new("chief.yml.tmp"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.to_string().contains("chief.yml.tmp"));
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join(DEFAULT_IMPORT_FILE);

        let err = write_records(&path, &[]).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
    }
}
