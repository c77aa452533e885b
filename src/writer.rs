use crate::error::{Error, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Environment variable that turns the executable into a clipboard holder.
///
/// X11 and Wayland only serve a selection while its owner is alive, so on
/// Linux the document is handed to a background copy of the current
/// executable, which must call [`serve_clipboard_holder`] when this is set.
#[cfg(target_os = "linux")]
pub const CLIPBOARD_HOLDER_ENV: &str = "CATENATOR_CLIPBOARD_HOLDER";

/// Where the finished document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Print the document
    Stdout,
    /// Write the document to a file
    File(PathBuf),
    /// Copy the document to the system clipboard
    Clipboard,
}

impl OutputTarget {
    /// Picks a target from CLI-style flags; a file path wins over the clipboard.
    #[must_use]
    pub fn from_flags(output: Option<PathBuf>, clipboard: bool) -> Self {
        match output {
            Some(path) => Self::File(path),
            None if clipboard => Self::Clipboard,
            None => Self::Stdout,
        }
    }

    /// Delivers `content`, writing either the document or a confirmation line
    /// to `console`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file, the clipboard, or `console` cannot be
    /// written.
    pub fn deliver(&self, content: &str, console: &mut impl Write) -> Result<()> {
        match self {
            Self::Stdout => {
                debug!("Writing {} bytes to stdout", content.len());
                writeln!(console, "{content}").map_err(|e| Error::io("<stdout>", e))
            }
            Self::File(path) => {
                write_file_atomic(path, content)?;
                info!("Wrote {} bytes to {}", content.len(), path.display());
                writeln!(console, "Catenated content written to {}", path.display())
                    .map_err(|e| Error::io("<stdout>", e))
            }
            Self::Clipboard => {
                copy_to_clipboard(content)?;
                info!("Copied {} bytes to clipboard", content.len());
                writeln!(console, "Catenated content copied to clipboard")
                    .map_err(|e| Error::io("<stdout>", e))
            }
        }
    }
}

/// Writes a file atomically.
///
/// # Process
///
/// 1. Writes content to a sibling temporary file
/// 2. Syncs the temporary file to disk
/// 3. Renames it over the target path
///
/// The temporary file is removed if any step fails.
fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::config(format!("Invalid output path: {}", path.display())))?
        .to_string_lossy();
    let temp = TempFile::new(path.with_file_name(format!(".{file_name}.tmp")));

    let mut temp_file = fs::File::create(&temp.path).map_err(|e| Error::io(&temp.path, e))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::io(&temp.path, e))?;

    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp.path, e))?;

    drop(temp_file);

    temp.persist(path)
}

/// Sibling temporary file, deleted on drop unless persisted.
struct TempFile {
    path: PathBuf,
    persisted: bool,
}

impl TempFile {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn persist(mut self, target: &Path) -> Result<()> {
        fs::rename(&self.path, target).map_err(|e| Error::io(target, e))?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn copy_to_clipboard(content: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(content)?;
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_to_clipboard(content: &str) -> Result<()> {
    // Fail here rather than in the detached holder when no display is reachable.
    drop(arboard::Clipboard::new()?);

    let exe = std::env::current_exe().map_err(|e| Error::io("<current executable>", e))?;
    let mut holder = holder_command(&exe)
        .spawn()
        .map_err(|e| Error::io(&exe, e))?;
    debug!("Spawned clipboard holder (pid {})", holder.id());

    let mut stdin = holder
        .stdin
        .take()
        .ok_or_else(|| Error::Clipboard {
            message: "clipboard holder has no stdin".to_string(),
        })?;
    stdin
        .write_all(content.as_bytes())
        .map_err(|e| Error::io("<clipboard holder>", e))
}

#[cfg(target_os = "linux")]
fn holder_command(exe: &Path) -> std::process::Command {
    use std::process::{Command, Stdio};

    let mut command = Command::new(exe);
    command
        .env(CLIPBOARD_HOLDER_ENV, "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .current_dir("/");
    command
}

/// Reads a document from stdin and owns the clipboard with it until another
/// application replaces the contents.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the clipboard is unavailable.
#[cfg(target_os = "linux")]
pub fn serve_clipboard_holder() -> Result<()> {
    use arboard::SetExtLinux;
    use std::io::Read;

    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| Error::io("<stdin>", e))?;

    arboard::Clipboard::new()?.set().wait().text(content)?;
    Ok(())
}
