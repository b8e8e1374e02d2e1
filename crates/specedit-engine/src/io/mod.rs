use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("{}: {source}", path.display())]
    NotFound { path: PathBuf, source: io::Error },
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read a spec file into a string.
pub fn read_spec(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(|source| {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => IoError::NotFound { path, source },
            _ => IoError::Read { path, source },
        }
    })
}

/// Read all of `reader`, e.g. standard input used as a side channel.
pub fn read_all(mut reader: impl Read) -> Result<String, IoError> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_spec_success() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.spec");
        fs::write(&path, "Name: hello\n").unwrap();

        assert_eq!(read_spec(&path).unwrap(), "Name: hello\n");
    }

    #[test]
    fn test_read_spec_not_found_mentions_os_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.spec");

        let error = read_spec(&path).unwrap_err();
        assert!(matches!(error, IoError::NotFound { .. }));
        assert!(error.to_string().contains("missing.spec"));
        assert!(error.to_string().contains("No such file or directory"));
    }

    #[test]
    fn test_read_spec_directory_is_read_error() {
        let dir = TempDir::new().unwrap();
        let error = read_spec(dir.path()).unwrap_err();
        assert!(matches!(error, IoError::Read { .. }));
    }

    #[test]
    fn test_read_all() {
        let content = read_all("side\nchannel\n".as_bytes()).unwrap();
        assert_eq!(content, "side\nchannel\n");
    }
}
