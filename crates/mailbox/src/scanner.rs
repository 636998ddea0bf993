use crate::error::{MailboxError, Result};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: &[&str] = &["mbox", "mbx"];

/// Where mailbox archives are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSource {
    /// Directory scanned for archives
    pub dir: PathBuf,

    /// File inside `dir` used when no archive matches `extensions`
    #[serde(default)]
    pub fallback_file: Option<String>,

    /// Archive file extensions, case-insensitive, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Maximum directory depth (1 = only `dir` itself)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

const fn default_max_depth() -> usize {
    1
}

impl ArchiveSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fallback_file: None,
            extensions: default_extensions(),
            max_depth: default_max_depth(),
        }
    }

    pub fn with_fallback_file(mut self, name: impl Into<String>) -> Self {
        self.fallback_file = Some(name.into());
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }
}

/// Finds archive files for an [`ArchiveSource`]
pub struct ArchiveScanner<'a> {
    source: &'a ArchiveSource,
}

impl<'a> ArchiveScanner<'a> {
    pub fn new(source: &'a ArchiveSource) -> Self {
        Self { source }
    }

    /// List archive files in path order.
    ///
    /// Falls back to `fallback_file` when nothing matches by extension.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.source.dir;
        if !dir.is_dir() {
            return Err(MailboxError::MissingSource(dir.clone()));
        }

        let mut files = Vec::new();
        let mut builder = WalkBuilder::new(dir);
        builder
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .max_depth(Some(self.source.max_depth));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if file_type.is_file() && self.is_archive(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => log::warn!("Failed to read archive entry: {e}"),
            }
        }
        files.sort();

        if files.is_empty() {
            if let Some(fallback) = self.fallback_path() {
                log::debug!(
                    "No archives matched {:?} in {}; using fallback {}",
                    self.source.extensions,
                    dir.display(),
                    fallback.display()
                );
                files.push(fallback);
            }
        }

        log::info!("Found {} mailbox archive(s) in {}", files.len(), dir.display());
        Ok(files)
    }

    fn fallback_path(&self) -> Option<PathBuf> {
        let name = self.source.fallback_file.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        let path = self.source.dir.join(name);
        path.is_file().then_some(path)
    }

    fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.source
                    .extensions
                    .iter()
                    .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_archives_by_extension_in_sorted_order() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b.mbox"), b"").unwrap();
        fs::write(temp.path().join("a.MBOX"), b"").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();

        let source = ArchiveSource::new(temp.path());
        let files = ArchiveScanner::new(&source).scan().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.MBOX", "b.mbox"]);
    }

    #[test]
    fn uses_fallback_when_nothing_matches() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("export"), b"").unwrap();

        let source = ArchiveSource::new(temp.path()).with_fallback_file("export");
        let files = ArchiveScanner::new(&source).scan().unwrap();
        assert_eq!(files, vec![temp.path().join("export")]);
    }

    #[test]
    fn missing_fallback_yields_no_files() {
        let temp = tempdir().unwrap();
        let source = ArchiveSource::new(temp.path()).with_fallback_file("absent.mbox");
        assert!(ArchiveScanner::new(&source).scan().unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempdir().unwrap();
        let source = ArchiveSource::new(temp.path().join("nope"));
        assert!(matches!(
            ArchiveScanner::new(&source).scan(),
            Err(MailboxError::MissingSource(_))
        ));
    }

    #[test]
    fn nested_archives_need_depth() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("2023")).unwrap();
        fs::write(temp.path().join("2023").join("old.mbox"), b"").unwrap();

        let shallow = ArchiveSource::new(temp.path());
        assert!(ArchiveScanner::new(&shallow).scan().unwrap().is_empty());

        let deep = ArchiveSource::new(temp.path()).with_max_depth(2);
        assert_eq!(ArchiveScanner::new(&deep).scan().unwrap().len(), 1);
    }
}
