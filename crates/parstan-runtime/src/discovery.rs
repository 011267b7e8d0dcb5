use parstan_types::FileFinding;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Files to analyse plus findings for input paths that could not be used.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub findings: Vec<FileFinding>,
}

/// Expand input paths into the list of files handed to workers.
///
/// Files are taken as given; directories are walked recursively (following symlinks, sorted
/// by name so repeated runs see the same order) keeping files whose extension is listed.
/// A path that does not exist becomes a non-suppressible finding instead of an error.
pub fn collect_files(paths: &[PathBuf], working_dir: &Path, extensions: &[String]) -> Discovery {
    let mut discovery = Discovery::default();

    for path in paths {
        let path = absolutize(path, working_dir);
        if !path.exists() {
            discovery.findings.push(FileFinding::new(
                path.clone(),
                None,
                format!("Path {} does not exist", path.display()),
                false,
            ));
        } else if path.is_file() {
            discovery.files.push(path);
        } else {
            walk_directory(&path, extensions, &mut discovery.files);
        }
    }

    tracing::debug!(
        files = discovery.files.len(),
        missing = discovery.findings.len(),
        "collected input files"
    );
    discovery
}

fn walk_directory(dir: &Path, extensions: &[String], files: &mut Vec<PathBuf>) {
    let walker = WalkDir::new(dir).follow_links(true).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry under {}: {}", dir.display(), err);
                continue;
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(normalize(entry.path()));
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
}

/// Resolve `path` against `working_dir` and fold away `.` and `..` components.
pub fn absolutize(path: &Path, working_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&working_dir.join(path))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
