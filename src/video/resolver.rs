use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{JobError, Result};

/// Suffix appended to the source stem for every export
pub const OUTPUT_SUFFIX: &str = "_SHORTS";

/// Check the path's extension against the configured list, ignoring case.
///
/// A bare dotfile such as `.mp4` has no extension and is never a clip.
pub fn is_supported<P: AsRef<Path>>(path: P, extensions: &[String]) -> bool {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some(ext) => extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Expand a clip or a folder of clips into the files to export.
///
/// Folders are not searched recursively and entries keep the order the
/// filesystem lists them in. An empty result is not an error.
pub fn resolve_sources<P: AsRef<Path>>(source: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let source = source.as_ref();

    if !source.exists() {
        return Err(JobError::SourceNotFound {
            path: source.display().to_string(),
        }.into());
    }

    if !source.is_dir() {
        if is_supported(source, extensions) {
            return Ok(vec![source.to_path_buf()]);
        }
        info!("{} is not a supported video file, nothing to do", source.display());
        return Ok(Vec::new());
    }

    let mut clips = Vec::new();
    for entry in std::fs::read_dir(source)? {
        let path = entry?.path();

        if path.is_file() && is_supported(&path, extensions) {
            clips.push(path);
        } else {
            debug!("Ignoring {}", path.display());
        }
    }

    Ok(clips)
}

/// Create the export folder (and parents) when missing
pub fn ensure_destination<P: AsRef<Path>>(destination: P) -> Result<()> {
    let destination = destination.as_ref();
    if !destination.exists() {
        info!("Creating export directory {}", destination.display());
        std::fs::create_dir_all(destination)?;
    }
    Ok(())
}

/// `destination/<stem>_SHORTS.mp4` for a source clip
pub fn output_path_for<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<PathBuf> {
    let source = source.as_ref();
    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| JobError::InvalidSourceName {
            path: source.display().to_string(),
        })?;

    Ok(destination.as_ref().join(format!("{}{}.mp4", stem, OUTPUT_SUFFIX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EXTENSIONS;
    use tempfile::tempdir;

    fn extensions() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
    }

    #[test]
    fn test_directory_keeps_only_matching_extensions() {
        let dir = tempdir().unwrap();
        for name in ["a.mp4", "b.MOV", "c.mkv", "notes.txt", "thumb.png", "noext"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();
        std::fs::write(dir.path().join("nested.mp4").join("inner.mp4"), b"").unwrap();

        let mut names: Vec<String> = resolve_sources(dir.path(), &extensions())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();

        assert_eq!(names, vec!["a.mp4", "b.MOV", "c.mkv"]);
    }

    #[test]
    fn test_hidden_clips_need_a_stem() {
        let dir = tempdir().unwrap();
        for name in [".replay.mp4", ".mp4"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let clips = resolve_sources(dir.path(), &extensions()).unwrap();
        assert_eq!(clips, vec![dir.path().join(".replay.mp4")]);
    }

    #[test]
    fn test_single_file_source() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("clip.mkv");
        let text = dir.path().join("clip.txt");
        std::fs::write(&clip, b"").unwrap();
        std::fs::write(&text, b"").unwrap();

        assert_eq!(resolve_sources(&clip, &extensions()).unwrap(), vec![clip]);
        assert!(resolve_sources(&text, &extensions()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let dir = tempdir().unwrap();
        assert!(resolve_sources(dir.path(), &extensions()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        let result = resolve_sources(dir.path().join("ingest"), &extensions());
        assert!(matches!(
            result,
            Err(crate::ShortsError::Job(JobError::SourceNotFound { .. }))
        ));
    }

    #[test]
    fn test_ensure_destination_creates_nested_folders() {
        let dir = tempdir().unwrap();
        let exports = dir.path().join("out").join("exports");
        ensure_destination(&exports).unwrap();
        assert!(exports.is_dir());
        ensure_destination(&exports).unwrap();
    }

    #[test]
    fn test_output_name() {
        let output = output_path_for("/clips/Wraith Clutch.mov", "/exports").unwrap();
        assert_eq!(output, PathBuf::from("/exports/Wraith Clutch_SHORTS.mp4"));
    }
}
