//! Invocation of the external `dwarf2json` symbol-table generator.
//!
//! Resolution order:
//! 1. `DWARF2JSON_BIN` env var (path to binary)
//! 2. `dwarf2json` next to the current executable
//! 3. System PATH
//!
//! The generator writes the ISF JSON document to stdout. The kernel
//! banner lives inside it as a base64-encoded constant; failing to pull
//! it out never invalidates the document itself.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, info, warn};

use crate::error::{BuilderError, Result};

/// Resolved generator binary.
#[derive(Debug, Clone)]
pub struct GeneratorBinary {
    pub path: PathBuf,
}

/// Find the `dwarf2json` binary using the resolution order.
pub fn find_dwarf2json() -> Result<GeneratorBinary> {
    if let Ok(bin_path) = env::var("DWARF2JSON_BIN") {
        let path = PathBuf::from(&bin_path);
        if path.is_file() {
            return Ok(GeneratorBinary { path });
        }
        return Err(BuilderError::Config(format!(
            "DWARF2JSON_BIN points to non-existent path: {bin_path}"
        )));
    }

    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("dwarf2json");
            if sibling.is_file() {
                return Ok(GeneratorBinary { path: sibling });
            }
        }
    }

    if let Ok(path) = which::which("dwarf2json") {
        return Ok(GeneratorBinary { path });
    }

    Err(BuilderError::Config(
        "could not find dwarf2json binary\n\
         Resolution order tried:\n\
         1. DWARF2JSON_BIN env var - not set\n\
         2. Next to the isf-builder executable - not found\n\
         3. System PATH - not found\n\
         Install dwarf2json or set DWARF2JSON_BIN=/path/to/dwarf2json"
            .into(),
    ))
}

impl GeneratorBinary {
    /// Run the generator over a symbol map and a debug image, returning
    /// the ISF JSON document bytes from stdout.
    pub fn run(&self, system_map: &Path, vmlinux: &Path) -> Result<Vec<u8>> {
        info!("running {} for {}", self.path.display(), vmlinux.display());
        debug!(
            "{} linux --system-map {} --elf {}",
            self.path.display(),
            system_map.display(),
            vmlinux.display()
        );

        let output = Command::new(&self.path)
            .arg("linux")
            .arg("--system-map")
            .arg(system_map)
            .arg("--elf")
            .arg(vmlinux)
            .output()
            .map_err(|e| {
                BuilderError::Generator(format!("failed to execute {}: {e}", self.path.display()))
            })?;

        if !output.status.success() {
            return Err(BuilderError::Generator(format!(
                "dwarf2json exited with {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(BuilderError::Generator("dwarf2json produced no output".into()));
        }

        Ok(output.stdout)
    }
}

/// Pull the kernel banner constant out of an ISF document.
///
/// Returns `None` when the document is unparsable or the banner symbol is
/// missing; callers log and move on.
pub fn extract_banner(isf: &[u8]) -> Option<String> {
    let document: serde_json::Value = match serde_json::from_slice(isf) {
        Ok(value) => value,
        Err(e) => {
            warn!("could not parse ISF document for banner: {e}");
            return None;
        }
    };

    let encoded = document
        .get("symbols")?
        .get("linux_banner")?
        .get("constant_data")?
        .as_str()?;

    let decoded = match BASE64.decode(encoded) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("could not decode banner constant: {e}");
            return None;
        }
    };

    // The constant carries the trailing newline and NUL padding.
    let trimmed: &[u8] = {
        let mut end = decoded.len();
        while end > 0 && (decoded[end - 1] == b'\n' || decoded[end - 1] == 0) {
            end -= 1;
        }
        &decoded[..end]
    };

    Some(String::from_utf8_lossy(trimmed).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_is_decoded_and_trimmed() {
        let banner = b"Linux version 5.15.0-91-generic (buildd@lcy02) #101-Ubuntu SMP\n\0\0";
        let isf = serde_json::json!({
            "symbols": {
                "linux_banner": {
                    "constant_data": BASE64.encode(banner)
                }
            }
        });
        let bytes = serde_json::to_vec(&isf).unwrap();

        assert_eq!(
            extract_banner(&bytes).unwrap(),
            "Linux version 5.15.0-91-generic (buildd@lcy02) #101-Ubuntu SMP"
        );
    }

    #[test]
    fn missing_banner_is_none() {
        let isf = serde_json::json!({ "symbols": {} });
        assert!(extract_banner(&serde_json::to_vec(&isf).unwrap()).is_none());
    }

    #[test]
    fn garbage_document_is_none() {
        assert!(extract_banner(b"not json at all").is_none());
    }
}
