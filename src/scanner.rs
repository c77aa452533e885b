use crate::{
    error::Result,
    rules::{relative_path, IgnoreRules},
};
use std::{
    cmp::Ordering,
    ffi::{OsStr, OsString},
    path::PathBuf,
};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// One visited directory and the non-ignored files directly inside it.
#[derive(Debug, Clone)]
pub(crate) struct DirListing {
    /// Path as produced by the walk (root joined with the relative path)
    pub(crate) path: PathBuf,

    /// `/`-separated path relative to the root, `.` for the root
    pub(crate) relative: String,

    /// Directory base name
    pub(crate) name: String,

    /// Number of separators between this directory and the root
    pub(crate) depth: usize,

    /// True if the directory itself matches an ignore rule
    pub(crate) ignored: bool,

    /// File names in traversal order, as found on disk
    pub(crate) files: Vec<OsString>,
}

impl DirListing {
    /// Root-relative path of a file in this directory, for display.
    pub(crate) fn relative_file(&self, file: &OsStr) -> String {
        let file = file.to_string_lossy();
        if self.depth == 0 {
            file.into_owned()
        } else {
            format!("{}/{}", self.relative, file)
        }
    }
}

/// Statistics collected during scanning.
#[derive(Debug, Default, Clone)]
pub(crate) struct ScanStats {
    /// Directories visited
    pub(crate) directories: usize,

    /// Files kept in listings
    pub(crate) files: usize,

    /// Files dropped by ignore rules
    pub(crate) ignored_files: usize,

    /// Subdirectories pruned before descending
    pub(crate) pruned_directories: usize,
}

/// Result of a scan: listings in top-down traversal order.
#[derive(Debug, Clone)]
pub(crate) struct ScanResult {
    pub(crate) directories: Vec<DirListing>,
    pub(crate) stats: ScanStats,
}

/// Top-down directory walker that prunes ignored subdirectories.
pub(crate) struct Scanner {
    root_dir: PathBuf,
    rules: IgnoreRules,
}

impl Scanner {
    pub(crate) fn new(root_dir: impl Into<PathBuf>, rules: IgnoreRules) -> Self {
        Self {
            root_dir: root_dir.into(),
            rules,
        }
    }

    pub(crate) fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Walks the root directory.
    ///
    /// Within a directory, files come first and then subdirectories, each
    /// group sorted by name, so every file follows its own directory's entry.
    ///
    /// # Errors
    ///
    /// Returns an error on the first entry that cannot be read.
    pub(crate) fn scan(&self) -> Result<ScanResult> {
        debug!("Scanning {}", self.root_dir.display());

        let mut directories: Vec<DirListing> = Vec::new();
        let mut stats = ScanStats::default();
        let mut pruned = 0usize;

        let walker = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .sort_by(files_before_dirs)
            .into_iter()
            .filter_entry(|entry| {
                let prune = entry.depth() > 0
                    && entry.file_type().is_dir()
                    && self.rules.should_ignore(entry.path());
                if prune {
                    trace!("Pruning {}", entry.path().display());
                    pruned += 1;
                }
                !prune
            });

        for entry in walker {
            let entry = entry?;

            if entry.file_type().is_dir() {
                directories.push(self.listing_for(&entry));
                stats.directories += 1;
                continue;
            }

            if !is_regular_file(&entry) {
                trace!("Skipping non-regular entry {}", entry.path().display());
                continue;
            }

            let parent = entry.path().parent();
            let Some(listing) = directories
                .iter_mut()
                .rev()
                .find(|listing| Some(listing.path.as_path()) == parent)
            else {
                continue;
            };

            if listing.ignored || self.rules.should_ignore(entry.path()) {
                stats.ignored_files += 1;
                continue;
            }

            listing.files.push(entry.file_name().to_os_string());
            stats.files += 1;
        }

        stats.pruned_directories = pruned;

        debug!(
            "Scan complete: {} directories, {} files, {} ignored files, {} pruned directories",
            stats.directories, stats.files, stats.ignored_files, stats.pruned_directories
        );

        Ok(ScanResult { directories, stats })
    }

    fn listing_for(&self, entry: &DirEntry) -> DirListing {
        let path = entry.path().to_path_buf();
        let relative = relative_path(&self.root_dir, &path);
        let ignored = self.rules.should_ignore(&path);
        if ignored {
            debug!("Directory {} is ignored; listing its children only", relative);
        }

        DirListing {
            name: entry.file_name().to_string_lossy().into_owned(),
            depth: entry.depth(),
            relative,
            ignored,
            files: Vec::new(),
            path,
        }
    }
}

/// Orders files before directories, then by name.
fn files_before_dirs(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Regular files and symlinks to regular files; symlinked directories are
/// not followed and not listed.
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    entry.path_is_symlink() && entry.path().is_file()
}
