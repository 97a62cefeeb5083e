//! Persistence of the solved camera pose.

use crate::{
    constants::{ROTATION_KEY, TRANSLATION_KEY},
    pose::Pose,
    storage::{StorageReader, StorageWriter},
    Error, Result,
};
use log::info;
use nalgebra::Vector3;
use std::path::Path;

/// Write `rotation` and `translation` as 3x1 matrices to `path`
///
/// # Errors
///
/// Returns [`Error::WriteFailure`] if the destination cannot be written.
pub fn write_pose<P: AsRef<Path>>(path: P, pose: &Pose) -> Result<()> {
    let path = path.as_ref();
    let mut writer = StorageWriter::create(path)?;
    writer.write_matrix(ROTATION_KEY, 3, 1, pose.rotation.as_slice())?;
    writer.write_matrix(TRANSLATION_KEY, 3, 1, pose.translation.as_slice())?;
    writer.finish()?;
    info!("Wrote camera position to {}", path.display());
    Ok(())
}

/// Read a pose written by [`write_pose`]
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] if the file cannot be opened, or
/// [`Error::MalformedInput`] if either field is missing or not a 3-vector.
pub fn read_pose<P: AsRef<Path>>(path: P) -> Result<Pose> {
    let reader = StorageReader::open(path.as_ref())?;
    Ok(Pose::new(
        read_vector(&reader, ROTATION_KEY)?,
        read_vector(&reader, TRANSLATION_KEY)?,
    ))
}

fn read_vector(reader: &StorageReader, key: &str) -> Result<Vector3<f64>> {
    let stored = reader
        .read_matrix(key)?
        .ok_or_else(|| Error::MalformedInput(format!("missing or empty field \"{key}\"")))?;
    if stored.data.len() != 3 {
        return Err(Error::MalformedInput(format!(
            "field \"{key}\" must hold 3 values, got {}x{}",
            stored.rows, stored.cols
        )));
    }
    Ok(Vector3::from_column_slice(&stored.data))
}
