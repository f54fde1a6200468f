//! Zip packages for deployment.
//!
//! A deploy path is either an existing `.zip` file, used as is, or a
//! folder that gets zipped into the temp directory. Zips created here are
//! removed when their [`DeployPackage`] is dropped.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::SiteError;

/// A zip file ready to deploy.
#[derive(Debug)]
pub struct DeployPackage {
    path: PathBuf,
    temporary: bool,
}

impl DeployPackage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the zip was created for this deployment.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }
}

impl Drop for DeployPackage {
    fn drop(&mut self) {
        if !self.temporary {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed temporary zip"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove temporary zip"),
        }
    }
}

/// Resolves `path` to a zip: `.zip` files as is, folders zipped.
pub async fn resolve_package(path: &Path, ignore: &[String]) -> Result<DeployPackage, SiteError> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.is_file() && has_zip_extension(path) {
        return Ok(DeployPackage {
            path: path.to_path_buf(),
            temporary: false,
        });
    }
    if !metadata.is_dir() {
        return Err(SiteError::InvalidDeployPath(path.display().to_string()));
    }

    let dir = path.to_path_buf();
    let ignore = ignore.to_vec();
    tokio::task::spawn_blocking(move || zip_directory(&dir, &ignore))
        .await
        .map_err(std::io::Error::other)?
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Zips the contents of `dir` into a new temp file, skipping entries whose
/// relative path matches one of `ignore`.
pub fn zip_directory(dir: &Path, ignore: &[String]) -> Result<DeployPackage, SiteError> {
    let ignore = build_ignore_set(ignore)?;
    let stem = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".into());
    let dest = std::env::temp_dir().join(format!("{stem}-{}.zip", uuid::Uuid::new_v4()));

    // Owns the file from here on so a failure below still removes it.
    let package = DeployPackage {
        path: dest,
        temporary: true,
    };
    let file = File::create(&package.path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut file_count = 0usize;
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_ignored(&ignore, dir, e.path()));
    for entry in walker {
        let entry = entry.map_err(std::io::Error::other)?;
        let name = relative_name(dir, entry.path());

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let data = std::fs::read(entry.path())?;
            zip.write_all(&data)?;
            file_count += 1;
        }
    }
    zip.finish()?;

    debug!(
        dir = %dir.display(),
        zip = %package.path.display(),
        files = file_count,
        "zipped folder"
    );
    Ok(package)
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, SiteError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn is_ignored(ignore: &GlobSet, root: &Path, path: &Path) -> bool {
    path != root && ignore.is_match(relative_name(root, path))
}

/// Relative path with `/` separators.
fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
