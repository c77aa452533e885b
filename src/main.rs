use anyhow::Context;
use catenator::{Catenator, Config, OutputTarget, TokenizerKind};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "catenator",
    version,
    about = "Catenate code files in a directory",
    long_about = "Catenate the code files of a directory into one document for an LLM context window.\n\n\
    The document starts with a title, an optional directory tree and the project README, \
    followed by every file whose extension is selected. Paths matched by a `.catignore` \
    file in the directory are left out of both the tree and the content.\n\n\
    USAGE EXAMPLES:\n  \
      # Print the document\n  \
      catenator ./my-project\n\n  \
      # Only Python and SQL, copied to the clipboard\n  \
      catenator ./my-project --include py,sql --clipboard\n\n  \
      # Write to a file and report the token count\n  \
      catenator ./my-project --output context.md --count-tokens"
)]
struct Cli {
    /// Directory to process
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Output file path
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Copy output to clipboard (ignored when --output is given)
    #[arg(long)]
    clipboard: bool,

    /// Disable directory tree
    #[arg(long)]
    no_tree: bool,

    /// Disable README inclusion
    #[arg(long)]
    no_readme: bool,

    /// Comma-separated list of extensions to include (replaces the defaults)
    #[arg(long, value_name = "LIST", default_value = "")]
    include: String,

    /// Comma-separated list of extensions to ignore
    #[arg(long, value_name = "LIST", default_value = "")]
    ignore: String,

    /// Title for the catenated output
    #[arg(long, value_name = "TEXT", env = "CATENATOR_TITLE")]
    title: Option<String>,

    /// Count tokens in the catenated output
    #[arg(long)]
    count_tokens: bool,

    /// Tokenizer used by --count-tokens
    #[arg(long, value_enum, default_value = "cl100k")]
    tokenizer: CliTokenizer,

    /// Extra ignore pattern with .catignore syntax (repeatable)
    #[arg(short = 'x', long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliTokenizer {
    /// cl100k_base encoding
    Cl100k,
    /// o200k_base encoding
    O200k,
    /// Character heuristic, no BPE tables
    Estimate,
}

impl From<CliTokenizer> for TokenizerKind {
    fn from(t: CliTokenizer) -> Self {
        match t {
            CliTokenizer::Cl100k => Self::Cl100k,
            CliTokenizer::O200k => Self::O200k,
            CliTokenizer::Estimate => Self::Estimate,
        }
    }
}

fn main() -> anyhow::Result<()> {
    #[cfg(target_os = "linux")]
    if std::env::var_os(catenator::CLIPBOARD_HOLDER_ENV).is_some() {
        return catenator::serve_clipboard_holder().context("Failed to hold clipboard contents");
    }

    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let mut builder = Config::builder()
        .root_dir(&cli.directory)
        .include_extensions(split_list(&cli.include))
        .ignore_extensions(split_list(&cli.ignore))
        .include_tree(!cli.no_tree)
        .include_readme(!cli.no_readme)
        .exclude_patterns(cli.exclude);

    if let Some(title) = cli.title {
        builder = builder.title(title);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let content = Catenator::new(config)
        .context("Failed to load ignore rules")?
        .catenate()
        .with_context(|| format!("Failed to catenate {}", cli.directory.display()))?;

    OutputTarget::from_flags(cli.output, cli.clipboard)
        .deliver(&content, &mut std::io::stdout().lock())
        .context("Failed to deliver output")?;

    if cli.count_tokens {
        let counter = TokenizerKind::from(cli.tokenizer).create()?;
        println!("Token count: {}", counter.count(&content));
    }

    Ok(())
}

/// Splits a comma-separated list, trimming items and dropping empty ones.
fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn setup_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::new("catenator=warn"),
        1 => EnvFilter::new("catenator=debug"),
        _ => EnvFilter::new("catenator=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}
