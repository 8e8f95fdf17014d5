//! Environment file output

use peerboot_cluster::BootstrapParams;
use peerboot_core::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write `KEY=VALUE` lines next to `out`, then rename them over it
///
/// Nothing is left behind when writing fails.
pub fn write_env_file(out: &Path, params: &BootstrapParams) -> Result<()> {
    let tmp = temp_path(out);
    tracing::debug!(path = %tmp.display(), "writing environment variables");

    let written = write_synced(&tmp, params).and_then(|_| fs::rename(&tmp, out));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    Ok(())
}

fn temp_path(out: &Path) -> PathBuf {
    let mut path = out.as_os_str().to_owned();
    path.push(".tmp");
    PathBuf::from(path)
}

fn write_synced(path: &Path, params: &BootstrapParams) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (key, value) in params.iter() {
        writeln!(writer, "{}={}", key, value)?;
    }

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}
