//! Ignore rules loaded from `.catignore`.
//!
//! Each rule is a shell glob matched against the path relative to the root.
//! A rule ending in `/` names a directory and also matches everything below it.

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A single compiled ignore rule.
#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    matcher: GlobMatcher,
}

impl Rule {
    fn new(pattern: &str) -> Result<Self> {
        // fnmatch semantics: `*` crosses `/`, backslash is a literal.
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .backslash_escape(false)
            .build()
            .map_err(|e| Error::invalid_pattern(pattern, e.kind().to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    fn is_dir_rule(&self) -> bool {
        self.pattern.ends_with('/')
    }

    fn matches(&self, relative: &str) -> bool {
        if self.is_dir_rule() {
            self.matcher.is_match(format!("{relative}/"))
                || relative.starts_with(self.pattern.as_str())
        } else {
            self.matcher.is_match(relative)
        }
    }
}

/// Ordered set of ignore rules anchored at a root directory.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Compiles `patterns` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for a pattern that is not a valid glob.
    pub fn new<I, S>(root: impl Into<PathBuf>, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|p| Rule::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root: root.into(),
            rules,
        })
    }

    /// Loads rules from `root/ignore_file`; a missing file yields no rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or holds an
    /// invalid pattern.
    pub fn load(root: impl Into<PathBuf>, ignore_file: &str) -> Result<Self> {
        let root = root.into();
        let path = root.join(ignore_file);

        if !path.is_file() {
            debug!("No ignore file at {}", path.display());
            return Self::new(root, Vec::<String>::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let patterns = parse_patterns(&content);
        debug!("Loaded {} ignore rules from {}", patterns.len(), path.display());

        Self::new(root, patterns)
    }

    /// Appends more rules after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for a pattern that is not a valid glob.
    pub fn extend<I, S>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.rules.push(Rule::new(pattern.as_ref())?);
        }
        Ok(())
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if `path` matches any rule.
    ///
    /// `path` may be absolute or relative to the working directory; it is
    /// made relative to the root before matching.
    #[must_use]
    pub fn should_ignore(&self, path: &Path) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let relative = relative_path(&self.root, path);
        self.is_ignored_relative(&relative)
    }

    /// Matches an already root-relative, `/`-separated path.
    #[must_use]
    pub fn is_ignored_relative(&self, relative: &str) -> bool {
        match self.rules.iter().find(|rule| rule.matches(relative)) {
            Some(rule) => {
                trace!("'{}' ignored by rule '{}'", relative, rule.pattern);
                true
            }
            None => false,
        }
    }
}

/// Parses ignore file content: trimmed lines, skipping blanks and `#` comments.
fn parse_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Path of `path` relative to `root`, `/`-separated; the root itself is `.`.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let relative = match path.strip_prefix(root) {
        Ok(stripped) => stripped.to_path_buf(),
        Err(_) => pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf()),
    };
    let text = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    if text.is_empty() { ".".to_string() } else { text }
}
