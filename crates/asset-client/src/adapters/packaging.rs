//! # Program Packaging Platforms
//!
//! Validation and packaging per runtime platform. A packaged program is an
//! encoded [`CodePackage`] and its content-addressed name:
//!
//! ```text
//! name = hex(SHA3-256(frame(path) ‖ frame(encode(input)) ‖ frame(code_package)))
//! frame(x) = be64(len(x)) ‖ x
//! ```
//!
//! Program paths are relative to the source root. Absolute paths and `..`
//! components are rejected by every platform.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use prost::Message;
use shared_crypto::sha3_256;
use shared_types::{ChaincodeSpec, ChaincodeType, CodePackage, PackagedFile};
use tracing::debug;

use crate::domain::errors::PackagingError;
use crate::ports::outbound::{PackagedProgram, Platform, PlatformResolver};

/// Registry of the supported platforms, keyed by program type.
pub struct PlatformRegistry {
    platforms: HashMap<ChaincodeType, Arc<dyn Platform>>,
}

impl PlatformRegistry {
    /// Golang, car and java platforms. With a `source_root`, program paths
    /// are resolved and packaged from disk.
    pub fn new(source_root: Option<PathBuf>) -> Self {
        let mut platforms: HashMap<ChaincodeType, Arc<dyn Platform>> = HashMap::new();
        platforms.insert(
            ChaincodeType::Golang,
            Arc::new(GolangPlatform {
                source_root: source_root.clone(),
            }),
        );
        platforms.insert(
            ChaincodeType::Car,
            Arc::new(CarPlatform {
                source_root: source_root.clone(),
            }),
        );
        platforms.insert(ChaincodeType::Java, Arc::new(JavaPlatform { source_root }));
        Self { platforms }
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PlatformResolver for PlatformRegistry {
    fn platform_for(&self, chaincode_type: i32) -> Result<Arc<dyn Platform>, PackagingError> {
        ChaincodeType::try_from(chaincode_type)
            .ok()
            .and_then(|kind| self.platforms.get(&kind))
            .cloned()
            .ok_or(PackagingError::UnknownPlatform(chaincode_type))
    }
}

fn program_path(spec: &ChaincodeSpec) -> Result<&str, PackagingError> {
    let path = spec
        .chaincode_id
        .as_ref()
        .map(|id| id.path.as_str())
        .ok_or(PackagingError::MissingSpec)?;
    let contained = Path::new(path)
        .components()
        .all(|part| matches!(part, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(PackagingError::InvalidSpec(format!(
            "program path escapes its root: {path}"
        )));
    }
    Ok(path)
}

// =============================================================================
// GOLANG
// =============================================================================

/// Go programs addressed by import path.
#[derive(Debug, Clone)]
pub struct GolangPlatform {
    source_root: Option<PathBuf>,
}

impl Platform for GolangPlatform {
    fn validate_spec(&self, spec: &ChaincodeSpec) -> Result<(), PackagingError> {
        let path = program_path(spec)?;
        if path.is_empty() {
            return Err(PackagingError::InvalidSpec("empty program path".into()));
        }
        if path.chars().any(char::is_whitespace) {
            return Err(PackagingError::InvalidSpec(format!(
                "program path contains whitespace: {path:?}"
            )));
        }
        if let Some(root) = &self.source_root {
            let dir = root.join(path);
            if !dir.is_dir() {
                return Err(PackagingError::InvalidSpec(format!(
                    "path to chaincode does not exist: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    fn package(&self, spec: &ChaincodeSpec) -> Result<PackagedProgram, PackagingError> {
        let path = program_path(spec)?;
        let files = match &self.source_root {
            Some(root) => collect_files(&root.join(path))?,
            None => Vec::new(),
        };
        finish(spec, path, files)
    }
}

// =============================================================================
// CAR
// =============================================================================

/// Pre-built program archives.
#[derive(Debug, Clone)]
pub struct CarPlatform {
    source_root: Option<PathBuf>,
}

impl Platform for CarPlatform {
    fn validate_spec(&self, spec: &ChaincodeSpec) -> Result<(), PackagingError> {
        let path = program_path(spec)?;
        if !path.ends_with(".car") {
            return Err(PackagingError::InvalidSpec(format!(
                "archive path must end in .car: {path}"
            )));
        }
        Ok(())
    }

    fn package(&self, spec: &ChaincodeSpec) -> Result<PackagedProgram, PackagingError> {
        let path = program_path(spec)?;
        let files = match &self.source_root {
            Some(root) => vec![PackagedFile {
                path: path.to_string(),
                contents: fs::read(root.join(path))?,
            }],
            None => Vec::new(),
        };
        finish(spec, path, files)
    }
}

// =============================================================================
// JAVA
// =============================================================================

#[derive(Debug, Clone)]
pub struct JavaPlatform {
    source_root: Option<PathBuf>,
}

impl Platform for JavaPlatform {
    fn validate_spec(&self, spec: &ChaincodeSpec) -> Result<(), PackagingError> {
        if program_path(spec)?.is_empty() {
            return Err(PackagingError::InvalidSpec("empty program path".into()));
        }
        Ok(())
    }

    fn package(&self, spec: &ChaincodeSpec) -> Result<PackagedProgram, PackagingError> {
        let path = program_path(spec)?;
        let files = match &self.source_root {
            Some(root) => collect_files(&root.join(path))?,
            None => Vec::new(),
        };
        finish(spec, path, files)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Every regular file under `dir`, sorted by relative path.
fn collect_files(dir: &Path) -> Result<Vec<PackagedFile>, PackagingError> {
    let mut files = Vec::new();
    walk(dir, dir, &mut files)?;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<PackagedFile>) -> Result<(), PackagingError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(root, &path, files)?;
        } else {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            files.push(PackagedFile {
                path: relative.to_string_lossy().replace('\\', "/"),
                contents: fs::read(&path)?,
            });
        }
    }
    Ok(())
}

fn finish(
    spec: &ChaincodeSpec,
    path: &str,
    files: Vec<PackagedFile>,
) -> Result<PackagedProgram, PackagingError> {
    let file_count = files.len();
    let code_package = CodePackage {
        root: path.to_string(),
        files,
    }
    .encode_to_vec();
    let input = spec
        .input
        .as_ref()
        .map(|input| input.encode_to_vec())
        .unwrap_or_default();
    let mut framed = Vec::with_capacity(24 + path.len() + input.len() + code_package.len());
    for part in [path.as_bytes(), input.as_slice(), code_package.as_slice()] {
        framed.extend_from_slice(&(part.len() as u64).to_be_bytes());
        framed.extend_from_slice(part);
    }
    let name = hex::encode(sha3_256(&[framed.as_slice()]));
    debug!(path, files = file_count, name = %name, "Program packaged");
    Ok(PackagedProgram { code_package, name })
}
