//! Thin wrapper over OpenCV `FileStorage` for named numeric matrices.
//!
//! The on-disk format follows the file extension (`.xml`, `.yml`/`.yaml`,
//! `.json`), which keeps camera parameter files interchangeable with the
//! ones OpenCV calibration tools produce.

use crate::{Error, Result};
use opencv::{
    core::{FileStorage, FileStorage_Mode, Mat, CV_64F},
    prelude::*,
};
use std::path::Path;

/// A `FileStorage` opened for reading
pub struct StorageReader {
    storage: FileStorage,
}

impl StorageReader {
    /// Open `path` for reading
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist or cannot be
    /// opened, and [`Error::MalformedInput`] if OpenCV fails to parse it.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let name = path_str(path)?;
        let storage = FileStorage::new(name, FileStorage_Mode::READ as i32, "")
            .map_err(|e| Error::MalformedInput(format!("{}: {}", path.display(), e.message)))?;
        if !storage.is_opened()? {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Ok(Self { storage })
    }

    /// Read the matrix stored under `key` as CV_64F values in row-major order
    ///
    /// Returns `None` when the field is absent or holds an empty matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the node exists but is not a numeric matrix.
    pub fn read_matrix(&self, key: &str) -> Result<Option<StoredMatrix>> {
        let node = self.storage.get(key)?;
        if node.empty()? {
            return Ok(None);
        }
        let mat = node
            .mat()
            .map_err(|e| Error::MalformedInput(format!("field \"{key}\" is not a matrix: {}", e.message)))?;
        if mat.empty() {
            return Ok(None);
        }
        if mat.channels() != 1 {
            return Err(Error::MalformedInput(format!(
                "field \"{key}\" must be single-channel, got {} channels",
                mat.channels()
            )));
        }

        let mut values = Mat::default();
        mat.convert_to(&mut values, CV_64F, 1.0, 0.0)?;
        Ok(Some(StoredMatrix {
            rows: usize::try_from(values.rows()).unwrap_or_default(),
            cols: usize::try_from(values.cols()).unwrap_or_default(),
            data: values.data_typed::<f64>()?.to_vec(),
        }))
    }
}

/// A `FileStorage` opened for writing
pub struct StorageWriter {
    storage: FileStorage,
    path: std::path::PathBuf,
}

impl StorageWriter {
    /// Create (or truncate) `path` for writing
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailure`] if the destination cannot be opened.
    pub fn create(path: &Path) -> Result<Self> {
        let name = path_str(path)?;
        let storage = FileStorage::new(name, FileStorage_Mode::WRITE as i32, "")
            .map_err(|e| Error::write_failure(path, e.message))?;
        let opened = storage
            .is_opened()
            .map_err(|e| Error::write_failure(path, e.message))?;
        if !opened {
            return Err(Error::write_failure(path, "cannot open file for writing"));
        }
        Ok(Self {
            storage,
            path: path.to_path_buf(),
        })
    }

    /// Store a row-major `rows` x `cols` matrix under `key`
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailure`] if the data does not match the shape or
    /// OpenCV rejects the write.
    pub fn write_matrix(&mut self, key: &str, rows: usize, cols: usize, data: &[f64]) -> Result<()> {
        if rows * cols != data.len() || cols == 0 {
            return Err(Error::write_failure(
                &self.path,
                format!("field \"{key}\": {} values do not fill a {rows}x{cols} matrix", data.len()),
            ));
        }
        let row_slices: Vec<&[f64]> = data.chunks(cols).collect();
        let mat = Mat::from_slice_2d(&row_slices).map_err(|e| Error::write_failure(&self.path, e.message))?;
        self.storage
            .write_mat(key, &mat)
            .map_err(|e| Error::write_failure(&self.path, e.message))
    }

    /// Flush and close the file
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailure`] if OpenCV fails to finish the file.
    pub fn finish(mut self) -> Result<()> {
        self.storage
            .release()
            .map_err(|e| Error::write_failure(&self.path, e.message))
    }
}

/// Matrix values read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMatrix {
    /// Row count
    pub rows: usize,
    /// Column count
    pub cols: usize,
    /// Row-major values
    pub data: Vec<f64>,
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::InvalidInput(format!("path is not valid UTF-8: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrices.yml");

        let mut writer = StorageWriter::create(&path).unwrap();
        writer.write_matrix("m", 2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.5]).unwrap();
        writer.finish().unwrap();

        let reader = StorageReader::open(&path).unwrap();
        let m = reader.read_matrix("m").unwrap().unwrap();
        assert_eq!(m.rows, 2);
        assert_eq!(m.cols, 3);
        assert_eq!(m.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.5]);
        assert!(reader.read_matrix("absent").unwrap().is_none());
    }

    #[test]
    fn test_write_shape_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = StorageWriter::create(&dir.path().join("bad.xml")).unwrap();
        let result = writer.write_matrix("m", 2, 2, &[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(Error::WriteFailure { .. })));
    }

    #[test]
    fn test_open_missing() {
        assert!(matches!(
            StorageReader::open(Path::new("no/such/file.xml")),
            Err(Error::FileNotFound(_))
        ));
    }
}
