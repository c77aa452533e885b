use crate::{
    config::{root_name, Config, README_FILES},
    error::{Error, Result},
    rules::IgnoreRules,
    scanner::{ScanResult, Scanner},
    tree,
};
use std::{
    ffi::OsStr,
    fs,
    path::Path,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, trace};

/// Header line introducing the tree block.
const TREE_HEADER: &str = "# Project Directory Structure\n";

/// Statistics collected during a catenation run.
#[derive(Debug, Clone, Default)]
pub struct CatenationStats {
    /// Directories visited
    pub directories: usize,

    /// Files whose content was emitted
    pub files_included: usize,

    /// Files dropped by the extension allow/deny lists
    pub skipped_by_extension: usize,

    /// Files dropped by ignore rules
    pub skipped_by_rules: usize,

    /// README candidates skipped in the file loop
    pub skipped_readmes: usize,

    /// Name of the README emitted, if any
    pub readme: Option<String>,

    /// Size of the document in bytes
    pub bytes: usize,

    /// Total execution time
    pub duration: Duration,
}

/// The assembled document and how it was built.
#[derive(Debug, Clone)]
pub struct Catenation {
    /// The full document
    pub content: String,

    /// Root-relative paths of files included, in emission order
    pub files: Vec<String>,

    /// Run statistics
    pub stats: CatenationStats,
}

/// Concatenates a directory's source files into a single document.
pub struct Catenator {
    config: Config,
    scanner: Scanner,
    root_name: String,
}

impl Catenator {
    /// Creates a catenator, loading ignore rules from the root.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The ignore file cannot be read or holds an invalid pattern
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut rules = IgnoreRules::load(&config.root_dir, &config.ignore_file)?;
        rules.extend(&config.exclude_patterns)?;
        debug!("{} ignore rules active", rules.len());

        let root_name = root_name(&config.root_dir)?;
        let scanner = Scanner::new(&config.root_dir, rules);

        Ok(Self {
            config,
            scanner,
            root_name,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the loaded ignore rules.
    #[must_use]
    pub fn rules(&self) -> &IgnoreRules {
        self.scanner.rules()
    }

    /// Returns true if `path` matches an ignore rule.
    #[must_use]
    pub fn should_ignore(&self, path: &Path) -> bool {
        self.scanner.rules().should_ignore(path)
    }

    /// Renders the directory tree listing without building the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the walk fails.
    pub fn render_tree(&self) -> Result<String> {
        let scan = self.scanner.scan()?;
        Ok(tree::render(&scan.directories, &self.root_name))
    }

    /// Builds the document and returns it as one string.
    ///
    /// # Errors
    ///
    /// Returns an error if the walk fails, a file cannot be read, or a
    /// selected file is not valid UTF-8.
    pub fn catenate(&self) -> Result<String> {
        self.run().map(|catenation| catenation.content)
    }

    /// Builds the document along with the list of included files and stats.
    ///
    /// # Process
    ///
    /// 1. Title header
    /// 2. Tree block, if enabled
    /// 3. First README found in the root, if enabled
    /// 4. Every selected file, in traversal order, under its relative path
    ///
    /// # Errors
    ///
    /// Same as [`Catenator::catenate`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use catenator::{Catenator, Config};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder().root_dir(".").build()?;
    /// let catenation = Catenator::new(config)?.run()?;
    /// println!("{} files", catenation.files.len());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(root_dir = %self.config.root_dir.display()))]
    pub fn run(&self) -> Result<Catenation> {
        let start_time = Instant::now();
        let scan = self.scanner.scan()?;

        let mut stats = CatenationStats {
            directories: scan.stats.directories,
            skipped_by_rules: scan.stats.ignored_files,
            ..CatenationStats::default()
        };
        let mut content = format!("### {}\n\n", self.config.title);

        if self.config.include_tree {
            content.push_str(TREE_HEADER);
            content.push_str("```\n");
            content.push_str(&tree::render(&scan.directories, &self.root_name));
            content.push_str("\n```\n\n");
        }

        if self.config.include_readme {
            if let Some((name, readme)) = self.find_readme()? {
                content.push_str(&format!("# {name}\n\n{readme}\n\n"));
                stats.readme = Some(name.to_string());
            }
        }

        let files = self.append_files(&scan, &mut content, &mut stats)?;

        stats.files_included = files.len();
        stats.bytes = content.len();
        stats.duration = start_time.elapsed();

        info!(
            "Catenated {} files ({} bytes) in {:.2}s",
            stats.files_included,
            stats.bytes,
            stats.duration.as_secs_f64()
        );
        debug!(
            "Skipped {} by extension, {} by ignore rules, {} README candidates",
            stats.skipped_by_extension, stats.skipped_by_rules, stats.skipped_readmes
        );

        Ok(Catenation {
            content,
            files,
            stats,
        })
    }

    /// Finds the first README candidate in the root that exists and is not ignored.
    fn find_readme(&self) -> Result<Option<(&'static str, String)>> {
        for name in README_FILES {
            let path = self.config.root_dir.join(name);
            if !path.is_file() || self.should_ignore(&path) {
                continue;
            }

            debug!("Including README {}", name);
            return read_text(&path).map(|readme| Some((*name, readme)));
        }

        Ok(None)
    }

    /// Appends every selected file and returns their relative paths.
    fn append_files(
        &self,
        scan: &ScanResult,
        content: &mut String,
        stats: &mut CatenationStats,
    ) -> Result<Vec<String>> {
        let mut files = Vec::new();

        for dir in scan.directories.iter().filter(|d| !d.ignored) {
            for name in &dir.files {
                let readme_name = name.to_str().is_some_and(Config::is_readme_name);
                if self.config.include_readme && readme_name {
                    stats.skipped_readmes += 1;
                    continue;
                }

                if !self.config.accepts_extension(extension_of(name)) {
                    trace!("Skipping {} by extension", name.to_string_lossy());
                    stats.skipped_by_extension += 1;
                    continue;
                }

                let relative = dir.relative_file(name);
                let text = read_text(&dir.path.join(name))?;

                content.push_str(&format!("# {relative}\n"));
                content.push_str(&text);
                content.push_str("\n\n");

                trace!("Appended {} ({} bytes)", relative, text.len());
                files.push(relative);
            }
        }

        Ok(files)
    }
}

/// Text after the last `.` of a file name, empty if none or not UTF-8.
fn extension_of(name: &OsStr) -> &str {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}

/// Reads a file as UTF-8; anything else aborts the run.
fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            Error::invalid_utf8(path)
        } else {
            Error::io(path, e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn catenator(root: &Path) -> Catenator {
        Catenator::new(Config::builder().root_dir(root).build().unwrap()).unwrap()
    }

    #[test]
    fn test_extension_of() {
        let ext = |name: &str| extension_of(OsStr::new(name)).to_string();
        assert_eq!(ext("main.py"), "py");
        assert_eq!(ext("archive.tar.gz"), "gz");
        assert_eq!(ext("Makefile"), "");
        assert_eq!(ext(".bashrc"), "");
        assert_eq!(ext("analysis.R"), "R");
    }

    #[test]
    fn test_single_file_block() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.py").write_str("print(1)").unwrap();

        let output = catenator(temp.path()).catenate().unwrap();
        assert!(output.contains("# a.py\nprint(1)\n\n"));
    }

    #[test]
    fn test_document_layout() {
        let temp = assert_fs::TempDir::new().unwrap();
        let root = temp.child("proj");
        root.child("main.py").write_str("x = 1").unwrap();

        let config = Config::builder()
            .root_dir(root.path())
            .include_readme(false)
            .build()
            .unwrap();
        let output = Catenator::new(config).unwrap().catenate().unwrap();

        let expected = "### proj\n\n\
# Project Directory Structure\n\
```\n\
proj/\n\
│   main.py\n\
```\n\n\
# main.py\n\
x = 1\n\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_tree_can_be_disabled() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("main.py").write_str("x = 1").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .include_tree(false)
            .title("Custom")
            .build()
            .unwrap();
        let output = Catenator::new(config).unwrap().catenate().unwrap();

        assert!(output.starts_with("### Custom\n\n# main.py\n"));
        assert!(!output.contains(TREE_HEADER));
    }

    #[test]
    fn test_only_first_readme_included() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("README.md").write_str("markdown readme").unwrap();
        temp.child("README.txt").write_str("text readme").unwrap();

        let catenation = catenator(temp.path()).run().unwrap();

        assert!(catenation.content.contains("# README.md\n\nmarkdown readme\n\n"));
        assert!(!catenation.content.contains("text readme"));
        assert_eq!(catenation.stats.readme.as_deref(), Some("README.md"));
    }

    #[test]
    fn test_ignored_readme_falls_through() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".catignore").write_str("README\n").unwrap();
        temp.child("README").write_str("plain").unwrap();
        temp.child("README.txt").write_str("text").unwrap();

        let output = catenator(temp.path()).catenate().unwrap();

        assert!(output.contains("# README.txt\n\ntext\n\n"));
        assert!(!output.contains("plain"));
    }

    #[test]
    fn test_readme_not_duplicated() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("README.md").write_str("hello").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .include_extensions(["md"])
            .build()
            .unwrap();
        let catenation = Catenator::new(config).unwrap().run().unwrap();

        assert_eq!(catenation.content.matches("hello").count(), 1);
        assert!(catenation.files.is_empty());
    }

    #[test]
    fn test_readme_as_plain_file_when_disabled() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("README.md").write_str("hello").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .include_extensions(["md"])
            .include_readme(false)
            .build()
            .unwrap();
        let catenation = Catenator::new(config).unwrap().run().unwrap();

        assert_eq!(catenation.content.matches("hello").count(), 1);
        assert_eq!(catenation.files, vec!["README.md"]);
    }

    #[test]
    fn test_extension_lists() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("app.py").write_str("py").unwrap();
        temp.child("notes.md").write_str("md").unwrap();
        temp.child("lib.rs").write_str("rs").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .include_extensions(["py", "md"])
            .ignore_extensions(["md"])
            .include_tree(false)
            .build()
            .unwrap();
        let catenation = Catenator::new(config).unwrap().run().unwrap();

        assert_eq!(catenation.files, vec!["app.py"]);
        assert_eq!(catenation.stats.skipped_by_extension, 2);
    }

    #[test]
    fn test_ignored_directory_absent_everywhere() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".catignore").write_str("build/\n").unwrap();
        temp.child("src/app.py").write_str("app").unwrap();
        temp.child("build/gen.py").write_str("generated").unwrap();

        let output = catenator(temp.path()).catenate().unwrap();

        assert!(output.contains("# src/app.py\napp\n\n"));
        assert!(!output.contains("build"));
        assert!(!output.contains("generated"));
    }

    #[test]
    fn test_invalid_utf8_aborts() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("bad.py").write_binary(&[0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = catenator(temp.path()).catenate().unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_file_name_is_read_from_disk() {
        use std::os::unix::ffi::OsStrExt;

        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("ok.py").write_str("fine").unwrap();
        let latin1 = OsStr::from_bytes(b"caf\xe9.py");
        fs::write(temp.path().join(latin1), "accent").unwrap();

        let catenation = catenator(temp.path()).run().unwrap();

        assert_eq!(catenation.files, vec!["caf\u{FFFD}.py", "ok.py"]);
        assert!(catenation.content.contains("│   caf\u{FFFD}.py\n"));
        assert!(catenation.content.contains("# caf\u{FFFD}.py\naccent\n\n"));
        assert!(catenation.content.contains("# ok.py\nfine\n\n"));
    }

    #[test]
    fn test_binary_with_unlisted_extension_is_never_read() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("logo.png").write_binary(&[0x89, 0x50, 0xff]).unwrap();
        temp.child("main.go").write_str("package main").unwrap();

        let catenation = catenator(temp.path()).run().unwrap();
        assert_eq!(catenation.files, vec!["main.go"]);
    }

    #[test]
    fn test_render_tree_matches_block() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("pkg/mod.py").write_str("").unwrap();

        let c = catenator(temp.path());
        let tree = c.render_tree().unwrap();
        assert!(tree.ends_with("├── pkg/\n├── │   mod.py"));
        assert!(c.catenate().unwrap().contains(&tree));
    }

    #[test]
    fn test_rerun_is_identical() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("b.py").write_str("b").unwrap();
        temp.child("a/c.js").write_str("c").unwrap();
        temp.child("a/d.ts").write_str("d").unwrap();

        let c = catenator(temp.path());
        assert_eq!(c.catenate().unwrap(), c.catenate().unwrap());
    }
}
