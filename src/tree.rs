//! Text rendering of the scanned directory hierarchy.

use crate::scanner::DirListing;

/// Indent marker for each level above the current one.
const INDENT: &str = "│   ";

/// Branch marker in front of a nested directory.
const BRANCH: &str = "├── ";

/// Renders listings as one line per directory followed by one line per file.
///
/// The root directory is labelled `root_name`; an ignored directory gets no
/// line of its own.
pub(crate) fn render(listings: &[DirListing], root_name: &str) -> String {
    let mut lines = Vec::new();

    for dir in listings.iter().filter(|d| !d.ignored) {
        let indent = indent_for(dir.depth);
        let name = if dir.depth == 0 { root_name } else { dir.name.as_str() };

        lines.push(format!("{indent}{name}/"));
        for file in &dir.files {
            lines.push(format!("{indent}{INDENT}{}", file.to_string_lossy()));
        }
    }

    lines.join("\n")
}

fn indent_for(depth: usize) -> String {
    if depth == 0 {
        String::new()
    } else {
        format!("{}{BRANCH}", INDENT.repeat(depth - 1))
    }
}
