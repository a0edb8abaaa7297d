//! Persists the records file.

use anyhow::Context;
use std::path::{Path, PathBuf};

/// Replace the contents of `path` with `contents`.
///
/// The bytes are first written to a hidden sibling file which is then renamed
/// over `path`, so readers see either the previous or the new file. The
/// staging file takes the permissions and owner of the file it replaces.
///
/// When the file cannot be replaced that way (the directory is not writable,
/// the staging name is too long, `path` is bind-mounted into a container...)
/// `path` is overwritten in place instead.
pub async fn write_records_file(path: &Path, contents: &[u8]) -> Result<(), anyhow::Error> {
    if let Err(err) = replace_atomically(path, contents).await {
        tracing::warn!(
            path = %path.display(),
            error = %format!("{:#}", err),
            "could not replace records file atomically, overwriting it in place"
        );

        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}

async fn replace_atomically(path: &Path, contents: &[u8]) -> Result<(), anyhow::Error> {
    let staging = staging_path(path)?;

    let result = async {
        tokio::fs::write(&staging, contents)
            .await
            .with_context(|| format!("failed to write {}", staging.display()))?;
        copy_metadata(path, &staging).await?;
        tokio::fs::rename(&staging, path)
            .await
            .with_context(|| format!("failed to rename {}", staging.display()))
    }
    .await;

    if result.is_err() {
        if let Err(err) = tokio::fs::remove_file(&staging).await {
            tracing::debug!(path = %staging.display(), error = %err, "failed to clean up staging file");
        }
    }

    result
}

/// Give `staging` the permissions and owner of `target`, if it exists.
async fn copy_metadata(target: &Path, staging: &Path) -> Result<(), anyhow::Error> {
    let metadata = match tokio::fs::metadata(target).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to stat {}", target.display()))
        }
    };

    tokio::fs::set_permissions(staging, metadata.permissions())
        .await
        .with_context(|| format!("failed to set permissions of {}", staging.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        let staged = tokio::fs::metadata(staging)
            .await
            .with_context(|| format!("failed to stat {}", staging.display()))?;
        if (staged.uid(), staged.gid()) != (metadata.uid(), metadata.gid()) {
            let staging_owned = staging.to_path_buf();
            let (uid, gid) = (metadata.uid(), metadata.gid());
            tokio::task::spawn_blocking(move || {
                std::os::unix::fs::chown(&staging_owned, Some(uid), Some(gid))
            })
            .await?
            .with_context(|| format!("failed to change owner of {}", staging.display()))?;
        }
    }

    Ok(())
}

fn staging_path(path: &Path) -> Result<PathBuf, anyhow::Error> {
    let file_name = path
        .file_name()
        .with_context(|| format!("'{}' is not a file path", path.display()))?;

    let mut staging_name = std::ffi::OsString::from(".");
    staging_name.push(file_name);
    staging_name.push(".tmp");

    Ok(path.with_file_name(staging_name))
}
