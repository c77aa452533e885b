use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::path::{self, Component, Path, PathBuf};

/// Extensions included when no explicit allow-list is given.
pub const DEFAULT_CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "java", "c", "cpp", "h", "cs", "rb", "go", "php", "ts", "swift", "html", "css",
    "sql", "sh", "bash", "ps1", "R", "scala", "kt", "rs", "dart",
];

/// README candidates, in priority order. Only looked up in the root directory.
pub const README_FILES: &[&str] = &["README", "README.md", "README.txt"];

/// Name of the per-directory ignore file.
pub const CATIGNORE_FILENAME: &str = ".catignore";

/// Configuration for a single catenation run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Root directory to walk
    pub root_dir: PathBuf,

    /// Extensions (without the dot) whose files are included
    pub include_extensions: BTreeSet<String>,

    /// Extensions removed after the allow-list is applied
    pub ignore_extensions: BTreeSet<String>,

    /// Whether to emit the directory tree block
    pub include_tree: bool,

    /// Whether to emit the first README found in the root
    pub include_readme: bool,

    /// Title for the document header
    pub title: String,

    /// Name of the ignore file looked up in the root
    pub ignore_file: String,

    /// Extra ignore patterns appended after the ignore file's rules
    pub exclude_patterns: Vec<String>,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use catenator::Config;
    ///
    /// let config = Config::builder()
    ///     .root_dir("./src")
    ///     .include_extensions(["rs", "toml"])
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory doesn't exist or is not a directory.
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                self.root_dir.display()
            )));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        if self.ignore_file.is_empty() {
            return Err(Error::config("ignore_file must not be empty"));
        }

        if self.include_extensions.is_empty() {
            tracing::warn!("No extensions are included; only the tree and README will be emitted");
        }

        Ok(())
    }

    /// Returns true if a file with this extension passes both extension lists.
    #[must_use]
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.include_extensions.contains(extension) && !self.ignore_extensions.contains(extension)
    }

    /// Returns true if `name` is one of the README candidates.
    #[must_use]
    pub fn is_readme_name(name: &str) -> bool {
        README_FILES.contains(&name)
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    root_dir: Option<PathBuf>,
    include_extensions: Option<BTreeSet<String>>,
    ignore_extensions: BTreeSet<String>,
    include_tree: Option<bool>,
    include_readme: Option<bool>,
    title: Option<String>,
    ignore_file: Option<String>,
    exclude_patterns: Vec<String>,
}

impl ConfigBuilder {
    /// Sets the root directory to walk.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Replaces the default extension allow-list.
    ///
    /// An empty list keeps the defaults.
    #[must_use]
    pub fn include_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = extensions.into_iter().map(Into::into).collect();
        self.include_extensions = if set.is_empty() { None } else { Some(set) };
        self
    }

    /// Sets the extension deny-list.
    #[must_use]
    pub fn ignore_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables the directory tree block.
    #[must_use]
    pub fn include_tree(mut self, enabled: bool) -> Self {
        self.include_tree = Some(enabled);
        self
    }

    /// Enables or disables README inclusion.
    #[must_use]
    pub fn include_readme(mut self, enabled: bool) -> Self {
        self.include_readme = Some(enabled);
        self
    }

    /// Overrides the title. An empty title falls back to the root's base name.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = if title.is_empty() { None } else { Some(title) };
        self
    }

    /// Overrides the ignore file name (default `.catignore`).
    #[must_use]
    pub fn ignore_file(mut self, name: impl Into<String>) -> Self {
        self.ignore_file = Some(name.into());
        self
    }

    /// Adds ignore patterns evaluated after the ignore file's rules.
    #[must_use]
    pub fn exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let root_dir = self.root_dir.unwrap_or_else(|| PathBuf::from("."));

        let mut config = Config {
            title: String::new(),
            root_dir,
            include_extensions: self.include_extensions.unwrap_or_else(|| {
                DEFAULT_CODE_EXTENSIONS
                    .iter()
                    .map(|ext| (*ext).to_string())
                    .collect()
            }),
            ignore_extensions: self.ignore_extensions,
            include_tree: self.include_tree.unwrap_or(true),
            include_readme: self.include_readme.unwrap_or(true),
            ignore_file: self
                .ignore_file
                .unwrap_or_else(|| CATIGNORE_FILENAME.to_string()),
            exclude_patterns: self.exclude_patterns,
        };

        config.validate()?;

        config.title = match self.title {
            Some(title) => title,
            None => root_name(&config.root_dir)?,
        };

        Ok(config)
    }
}

/// Returns the base name of the absolute form of `root`.
///
/// `.` and `..` are folded lexically; symlinks are not resolved, so a linked
/// root keeps the link's name.
pub(crate) fn root_name(root: &Path) -> Result<String> {
    let mut absolute = PathBuf::new();
    for component in path::absolute(root).map_err(|e| Error::io(root, e))?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                absolute.pop();
            }
            other => absolute.push(other),
        }
    }

    Ok(absolute
        .file_name()
        .map_or_else(
            || absolute.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder().root_dir(temp.path()).build().unwrap();

        assert_eq!(config.include_extensions.len(), DEFAULT_CODE_EXTENSIONS.len());
        assert!(config.include_extensions.contains("R"));
        assert!(config.ignore_extensions.is_empty());
        assert!(config.include_tree);
        assert!(config.include_readme);
        assert_eq!(config.ignore_file, CATIGNORE_FILENAME);
    }

    #[test]
    fn test_default_title_is_root_name() {
        let temp = assert_fs::TempDir::new().unwrap();
        let project = temp.child("my-project");
        project.create_dir_all().unwrap();

        let config = Config::builder().root_dir(project.path()).build().unwrap();
        assert_eq!(config.title, "my-project");
    }

    #[test]
    fn test_root_name_folds_dot_components() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("app/src").create_dir_all().unwrap();

        let root = temp.path().join("app/./src/..");
        assert_eq!(root_name(&root).unwrap(), "app");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_keeps_link_name() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("real-project");
        target.create_dir_all().unwrap();
        let link = temp.child("linked-project");
        link.symlink_to_dir(target.path()).unwrap();

        let config = Config::builder().root_dir(link.path()).build().unwrap();
        assert_eq!(config.title, "linked-project");
    }

    #[test]
    fn test_empty_title_falls_back() {
        let temp = assert_fs::TempDir::new().unwrap();
        let project = temp.child("demo");
        project.create_dir_all().unwrap();

        let config = Config::builder()
            .root_dir(project.path())
            .title("")
            .build()
            .unwrap();
        assert_eq!(config.title, "demo");
    }

    #[test]
    fn test_empty_include_keeps_defaults() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .include_extensions(Vec::<String>::new())
            .build()
            .unwrap();

        assert!(config.include_extensions.contains("py"));
    }

    #[test]
    fn test_accepts_extension() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .include_extensions(["py", "md"])
            .ignore_extensions(["md"])
            .build()
            .unwrap();

        assert!(config.accepts_extension("py"));
        assert!(!config.accepts_extension("md"));
        assert!(!config.accepts_extension("rs"));
        assert!(!config.accepts_extension(""));
    }

    #[test]
    fn test_invalid_root_dir() {
        let result = Config::builder()
            .root_dir("/nonexistent/path/that/should/not/exist")
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("file.py");
        file.write_str("x = 1").unwrap();

        let result = Config::builder().root_dir(file.path()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_readme_names() {
        assert!(Config::is_readme_name("README.md"));
        assert!(Config::is_readme_name("README"));
        assert!(!Config::is_readme_name("readme.md"));
    }
}
