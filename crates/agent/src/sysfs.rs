//! Integer sysfs attribute helpers.
//!
//! IIO exposes every value as a small text file holding one decimal
//! integer. Writes are read back and compared, since the driver may
//! silently clamp or reject a value.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SysfsError {
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("{path}: '{content}' is not an integer")]
    Parse { path: PathBuf, content: String },

    #[error("{path}: expected a positive value, read {value}")]
    Negative { path: PathBuf, value: i32 },

    #[error("{path}: wrote {expected}, read back {actual}")]
    VerifyMismatch {
        path: PathBuf,
        expected: i32,
        actual: i32,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SysfsError + '_ {
    move |source| SysfsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read an integer attribute.
pub fn read_int(path: &Path) -> Result<i32, SysfsError> {
    let content = std::fs::read_to_string(path).map_err(io_error(path))?;
    let trimmed = content.trim();
    trimmed.parse().map_err(|_| SysfsError::Parse {
        path: path.to_path_buf(),
        content: trimmed.to_string(),
    })
}

/// Read an attribute that must hold a non-negative integer.
pub fn read_posint(path: &Path) -> Result<i32, SysfsError> {
    let value = read_int(path)?;
    if value < 0 {
        return Err(SysfsError::Negative {
            path: path.to_path_buf(),
            value,
        });
    }
    Ok(value)
}

/// Write `value` to an existing attribute and read it back.
pub fn write_int_and_verify(path: &Path, value: i32) -> Result<(), SysfsError> {
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(io_error(path))?;
    file.write_all(format!("{value}\n").as_bytes())
        .map_err(io_error(path))?;
    drop(file);

    let actual = read_int(path)?;
    if actual != value {
        return Err(SysfsError::VerifyMismatch {
            path: path.to_path_buf(),
            expected: value,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn reads_trimmed_integer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("in_voltage2_input");
        std::fs::write(&path, "1234\n").expect("write");

        assert_eq!(read_posint(&path).unwrap(), 1234);
    }

    #[test]
    fn rejects_negative_and_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("attr");

        std::fs::write(&path, "-5\n").expect("write");
        assert_matches!(read_posint(&path), Err(SysfsError::Negative { value: -5, .. }));

        std::fs::write(&path, "n/a\n").expect("write");
        assert_matches!(read_int(&path), Err(SysfsError::Parse { .. }));
    }

    #[test]
    fn write_overwrites_longer_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("thresh_rising_value");
        std::fs::write(&path, "2047\n").expect("write");

        write_int_and_verify(&path, 5).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "5\n");
    }

    #[test]
    fn missing_attribute_is_not_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing_en");

        assert_matches!(write_int_and_verify(&path, 1), Err(SysfsError::Io { .. }));
        assert!(!path.exists());
    }
}
