use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::core::error::{DownloadError, DownloadResult};
use crate::core::maven::ResolvedArtifact;

/// Check that a resolved file can be put on the classpath.
///
/// The file must exist, match its SHA-1 when one was supplied, and open as a
/// zip archive when it is a `.jar` or `.zip`.
pub fn verify_artifact(artifact: &ResolvedArtifact) -> DownloadResult<()> {
    let path = artifact.file.as_path();

    if let Some(expected) = &artifact.sha1 {
        let actual = sha1_of(path)?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(DownloadError::Sha1Mismatch {
                path: path.to_path_buf(),
                expected: expected.clone(),
                actual,
            });
        }
    }

    if is_archive(path) {
        let file = open(path)?;
        zip::ZipArchive::new(file).map_err(|e| DownloadError::InvalidArchive {
            path: path.to_path_buf(),
            source: e,
        })?;
    } else {
        open(path)?;
    }

    Ok(())
}

/// Verify every artifact; the first failure wins.
pub fn verify_all(artifacts: &[ResolvedArtifact]) -> DownloadResult<()> {
    artifacts.iter().try_for_each(verify_artifact)
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
}

fn open(path: &Path) -> DownloadResult<File> {
    File::open(path).map_err(|e| DownloadError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn sha1_of(path: &Path) -> DownloadResult<String> {
    let mut file = open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| DownloadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
