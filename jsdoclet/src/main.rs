//! jsdoclet: extract doclets from annotated JavaScript sources.
//!
//! - `jsdoclet src/ lib/*.js` prints the processed doclets as JSON
//! - `jsdoclet -f markdown -o API.md src/` writes a markdown reference page
//! - `jsdoclet --tree src/` prints the longname tree

mod config;
mod render;
mod toc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use jsdoclet_core::{ParserOptions, Plugins, RunContext, UnknownTags};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Parser)]
#[command(name = "jsdoclet", about = "Extract documentation records from annotated JavaScript")]
struct Cli {
    /// Input files, directories or glob patterns. Added to the config's
    /// `source.include`.
    inputs: Vec<String>,

    /// Output file (stdout when omitted). Gets the format's extension when it has none.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: json (default), markdown
    #[arg(short = 'f', long, default_value = "json")]
    format: String,

    /// Config file. Defaults to ./jsdoclet.json when present.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Built-in plugin to load (react, markdown). Can be repeated.
    #[arg(long = "plugin")]
    plugins: Vec<String>,

    /// Report every tag missing from the dictionary
    #[arg(long)]
    strict_tags: bool,

    /// Emit the nested longname tree instead of the flat list (json only)
    #[arg(long)]
    tree: bool,

    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    let renderer = render::create_renderer(&cli.format, cli.tree)?;

    let mut options: ParserOptions = config.tags;
    if cli.strict_tags {
        options.unknown_tags = UnknownTags::Flag(false);
    }

    let mut plugins = Plugins::default();
    for name in config.plugins.iter().chain(&cli.plugins) {
        plugins.install(name);
    }
    let mut ctx = RunContext::new(options, plugins);

    let patterns: Vec<String> = config
        .source
        .include
        .iter()
        .chain(&cli.inputs)
        .cloned()
        .collect();
    if patterns.is_empty() {
        bail!("no input files; pass paths or set source.include in {}", config::DEFAULT_CONFIG);
    }
    let files = expand_globs(&patterns, |p| ctx.accepts(p))?;
    if files.is_empty() {
        bail!("no source files matched");
    }
    info!(files = files.len(), "collected source files");

    let processed = ctx.parse_files(&files)?;
    let output = renderer.render(&processed)?;

    match cli.output {
        Some(ref path) => {
            let path = &with_default_extension(path, renderer.file_extension());
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).with_context(|| {
                    format!("failed to create output directory: {}", dir.display())
                })?;
            }
            fs::write(path, &output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!(path = %path.display(), doclets = processed.doclets.len(), "output written");
        }
        None => {
            io::stdout()
                .write_all(output.as_bytes())
                .context("failed to write to stdout")?;
        }
    }
    Ok(())
}

/// `API` becomes `API.md` for the markdown renderer; explicit extensions
/// are kept.
fn with_default_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// Expand glob patterns into a list of real file paths. A bare directory is
/// scanned recursively for files `accepts` takes; explicit files are kept
/// as given.
fn expand_globs(patterns: &[String], accepts: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            scan_dir(path, &accepts, &mut files)?;
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!(pattern = %pattern, "no files matched");
        }
        files.extend(matches);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn scan_dir(dir: &Path, accepts: &impl Fn(&Path) -> bool, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))?;
    for entry in entries.flatten() {
        let p = entry.path();
        if p.is_dir() {
            let skipped = p
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| SKIPPED_DIRS.contains(&n));
            if !skipped {
                scan_dir(&p, accepts, files)?;
            }
        } else if p.is_file() && accepts(&p) {
            files.push(p);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_js(p: &Path) -> bool {
        p.extension().is_some_and(|e| e == "js")
    }

    #[test]
    fn directories_are_scanned_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::write(root.join("lib/a.js"), "").unwrap();
        fs::write(root.join("lib/nested/b.js"), "").unwrap();
        fs::write(root.join("lib/readme.txt"), "").unwrap();
        fs::write(root.join("node_modules/dep/index.js"), "").unwrap();

        let files = expand_globs(&[root.to_string_lossy().into_owned()], is_js).unwrap();
        assert_eq!(files, vec![root.join("lib/a.js"), root.join("lib/nested/b.js")]);
    }

    #[test]
    fn globs_and_explicit_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.js"), "").unwrap();
        fs::write(root.join("b.js"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let pattern = root.join("*.js").to_string_lossy().into_owned();
        let explicit = root.join("notes.txt").to_string_lossy().into_owned();
        let files = expand_globs(&[pattern.clone(), explicit, pattern], is_js).unwrap();
        assert_eq!(files, vec![root.join("a.js"), root.join("b.js"), root.join("notes.txt")]);
    }

    #[test]
    fn output_extension_defaults_to_the_format() {
        let path = with_default_extension(Path::new("out/API"), "md");
        assert_eq!(path, PathBuf::from("out/API.md"));
        let path = with_default_extension(Path::new("doclets.txt"), "json");
        assert_eq!(path, PathBuf::from("doclets.txt"));
    }

    #[test]
    fn unmatched_glob_is_not_an_error() {
        let files = expand_globs(&["/definitely/not/here/*.js".to_string()], is_js).unwrap();
        assert!(files.is_empty());
    }
}
