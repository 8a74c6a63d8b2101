// Temp-file staging
// A transfer never streams the live, possibly-appended source file; it
// works from an isolated copy in the staging directory

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::Builder;

use logmesh_common::LogMeshError;

const STAGED_PREFIX: &str = "staged-";
const DELIVERED_PREFIX: &str = "delivered-";
const SNAPSHOT_SUFFIX: &str = ".snapshot";

/// Copy `source` into an isolated temp file under `staging_dir` and return
/// its path. The copy is private to this transfer and safe to stream while
/// the source keeps growing.
pub fn stage_copy(source: &Path, staging_dir: &Path) -> Result<PathBuf, LogMeshError> {
    fs::create_dir_all(staging_dir)?;

    let mut src = fs::File::open(source)?;
    let temp = Builder::new()
        .prefix(STAGED_PREFIX)
        .suffix(SNAPSHOT_SUFFIX)
        .tempfile_in(staging_dir)?;
    let (mut file, path) = temp.keep().map_err(|e| LogMeshError::Io(e.error))?;

    io::copy(&mut src, &mut file)?;
    file.sync_all()?;

    Ok(path)
}

/// Materialize delivered bytes as a private temp file under `staging_dir`
pub fn write_staged(data: &[u8], staging_dir: &Path) -> Result<PathBuf, LogMeshError> {
    fs::create_dir_all(staging_dir)?;

    let temp = Builder::new()
        .prefix(DELIVERED_PREFIX)
        .suffix(SNAPSHOT_SUFFIX)
        .tempfile_in(staging_dir)?;
    let (mut file, path) = temp.keep().map_err(|e| LogMeshError::Io(e.error))?;

    file.write_all(data)?;
    file.sync_all()?;

    Ok(path)
}
