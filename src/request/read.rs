use std::{fs, io};
use std::path::{Path, PathBuf};

/// List job request messages waiting in the spool directory
///
/// Only `*.json` files count as messages, so editor backups and README files can live in the
/// spool without tripping ingestion. Paths are sorted for a deterministic ingest order.
pub fn get_message_paths(dir: &Path) -> Result<Vec<PathBuf>, io::Error> {
    let mut paths = fs::read_dir(dir)?
        .map(|res| res.map(|e| e.path()))
        .collect::<Result<Vec<PathBuf>, io::Error>>()?;

    paths.retain(|p| p.extension().is_some_and(|ext| ext == "json"));
    paths.sort();

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_json_files_are_listed_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("b.json"), "{}").expect("write");
        fs::write(temp.path().join("a.json"), "{}").expect("write");
        fs::write(temp.path().join("notes.txt"), "").expect("write");

        let paths = get_message_paths(temp.path()).expect("paths");
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().expect("name").to_str().expect("utf8"))
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn missing_spool_directory_is_an_error() {
        assert!(get_message_paths(Path::new("/nonexistent/spool")).is_err());
    }
}
