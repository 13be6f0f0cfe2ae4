use super::{json_pretty, EXIT_CHANGES_NEEDED, EXIT_SUCCESS};
use fs2::FileExt;
use limpet_core::{reconcile, DesiredState};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Advisory exclusive lock on a sidecar path, held from read through write so
/// two concurrent `limpet apply` runs cannot interleave on the same manifest.
/// Released on drop.
struct ManifestLock {
    lock_file: File,
}

impl ManifestLock {
    fn acquire(lock_path: &Path) -> Result<Self, String> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|e| format!("open lock file {}: {e}", lock_path.display()))?;
        file.lock_exclusive()
            .map_err(|e| format!("lock {}: {e}", lock_path.display()))?;
        Ok(Self { lock_file: file })
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.lock_file);
    }
}

fn write_atomic(dest: &Path, content: &str) -> Result<(), String> {
    let dir = dest
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| format!("write temp file: {e}"))?;
    use std::io::Write;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("write temp file: {e}"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| format!("fsync temp file: {e}"))?;
    tmp.persist(dest)
        .map_err(|e| format!("persist manifest: {}", e.error))?;
    Ok(())
}

fn lock_path_for(manifest_path: &Path) -> PathBuf {
    manifest_path.with_extension("lock")
}

pub fn run(
    manifest_path: &Path,
    desired: &DesiredState,
    indent: usize,
    check: bool,
    dry_run: bool,
    json: bool,
) -> Result<u8, String> {
    // Read-only modes skip the lock; anything that may write takes it before
    // reading so the snapshot it patches is the snapshot it replaces.
    let _lock = if check || dry_run {
        None
    } else {
        let lock = ManifestLock::acquire(&lock_path_for(manifest_path))?;
        debug!(manifest = %manifest_path.display(), "acquired manifest lock");
        Some(lock)
    };

    let text = fs::read_to_string(manifest_path)
        .map_err(|e| format!("failed to read manifest {}: {e}", manifest_path.display()))?;

    let result = reconcile(&text, desired, indent).map_err(|e| format!("manifest error: {e}"))?;

    if check {
        if result.changed {
            if json {
                let payload = serde_json::json!({
                    "manifest": manifest_path,
                    "satisfied": false,
                });
                println!("{}", json_pretty(&payload)?);
            } else {
                println!("{} needs changes", manifest_path.display());
            }
            return Ok(EXIT_CHANGES_NEEDED);
        }
        if json {
            let payload = serde_json::json!({
                "manifest": manifest_path,
                "satisfied": true,
            });
            println!("{}", json_pretty(&payload)?);
        } else {
            println!("{} already satisfied", manifest_path.display());
        }
        return Ok(EXIT_SUCCESS);
    }

    if !result.changed {
        if json {
            let payload = serde_json::json!({
                "manifest": manifest_path,
                "changed": false,
            });
            println!("{}", json_pretty(&payload)?);
        } else {
            println!(
                "{} {} already satisfied",
                console::style("✓").green(),
                manifest_path.display()
            );
        }
        return Ok(EXIT_SUCCESS);
    }

    if !dry_run {
        write_atomic(manifest_path, &result.text)?;
    }

    if json {
        let payload = serde_json::json!({
            "manifest": manifest_path,
            "changed": true,
            "applied": !dry_run,
            "package": desired.dependency.package,
            "version": desired.dependency.version,
        });
        println!("{}", json_pretty(&payload)?);
    } else if dry_run {
        println!("would update {}", manifest_path.display());
    } else {
        println!(
            "{} updated {}",
            console::style("✓").green(),
            manifest_path.display()
        );
    }
    Ok(EXIT_SUCCESS)
}
