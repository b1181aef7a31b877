//! On-disk layout and publication of produced symbol artifacts.
//!
//! Artifacts live under `symbol_files/<os>/<kernel>/`. Publication is
//! atomic: the compressed document is staged under a dot-prefixed name in
//! the destination directory and renamed into place while holding an
//! advisory lock, so the completion probe only ever sees fully written
//! artifacts and concurrent runs cannot interleave a publication.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, info};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::Result;

/// Store directory name under the working directory.
pub const STORE_DIR: &str = "symbol_files";

const ISF_SUFFIX: &str = ".json.xz";
const BANNER_FILENAME: &str = "banner.txt";
const LOCK_FILENAME: &str = ".lock";
const XZ_LEVEL: u32 = 6;

/// One published artifact found by [`SymbolStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIsf {
    pub os: String,
    pub kernel: String,
    pub path: PathBuf,
}

/// Artifact store rooted at `<base_dir>/symbol_files`.
#[derive(Debug, Clone)]
pub struct SymbolStore {
    root: PathBuf,
}

impl SymbolStore {
    pub fn open(base_dir: &Path) -> Self {
        Self {
            root: base_dir.join(STORE_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn os_dir(&self, os: &str) -> PathBuf {
        self.root.join(os)
    }

    pub fn kernel_dir(&self, os: &str, kernel: &str) -> PathBuf {
        self.root.join(os).join(kernel)
    }

    pub fn isf_path(&self, os: &str, kernel: &str) -> PathBuf {
        self.kernel_dir(os, kernel)
            .join(format!("{kernel}{ISF_SUFFIX}"))
    }

    /// Whether the final artifact for a kernel already exists.
    ///
    /// Staged intermediates never satisfy this check; they live under a
    /// different (dot-prefixed) name until the publishing rename.
    pub fn is_complete(&self, os: &str, kernel: &str) -> bool {
        self.isf_path(os, kernel).is_file()
    }

    /// Compress and publish an ISF document, returning the artifact path.
    ///
    /// Also writes a `<artifact>.sha256` sidecar over the compressed bytes.
    pub fn publish_isf(&self, os: &str, kernel: &str, isf: &[u8]) -> Result<PathBuf> {
        let dir = self.kernel_dir(os, kernel);
        fs::create_dir_all(&dir)?;

        let lock_file = File::create(dir.join(LOCK_FILENAME))?;
        lock_file.lock_exclusive()?;

        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), XZ_LEVEL);
        encoder.write_all(isf)?;
        let compressed = encoder.finish()?;

        let final_path = self.isf_path(os, kernel);
        let staging_path = dir.join(format!(".{kernel}{ISF_SUFFIX}.partial"));
        fs::write(&staging_path, &compressed)?;
        fs::rename(&staging_path, &final_path)?;
        debug!("published {}", final_path.display());

        let digest = Sha256::digest(&compressed);
        let digest_hex = format!("{:x}", digest);
        let checksum_path = dir.join(format!("{kernel}{ISF_SUFFIX}.sha256"));
        // Two spaces between hash and filename, coreutils style.
        fs::write(
            &checksum_path,
            format!("{digest_hex}  {kernel}{ISF_SUFFIX}\n"),
        )?;

        info!("ISF created at {}", final_path.display());
        Ok(final_path)
    }

    pub fn write_banner(&self, os: &str, kernel: &str, banner: &str) -> Result<PathBuf> {
        let dir = self.kernel_dir(os, kernel);
        fs::create_dir_all(&dir)?;
        let path = dir.join(BANNER_FILENAME);
        fs::write(&path, banner)?;
        Ok(path)
    }

    /// Walk the store and list every published artifact.
    pub fn list(&self) -> Vec<StoredIsf> {
        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(ISF_SUFFIX) || name.starts_with('.') {
                continue;
            }
            let kernel = name.trim_end_matches(ISF_SUFFIX).to_owned();
            let Some(os) = path
                .parent()
                .and_then(|p| p.parent())
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
            else {
                continue;
            };
            found.push(StoredIsf {
                os: os.to_owned(),
                kernel,
                path: path.to_path_buf(),
            });
        }
        found.sort_by(|a, b| (&a.os, &a.kernel).cmp(&(&b.os, &b.kernel)));
        found
    }
}
