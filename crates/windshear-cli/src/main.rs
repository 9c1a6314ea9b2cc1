//! Windshear CLI
//!
//! Drives one mangling session over files on disk:
//! - `run` processes a set of sources (JS/TS/templates first, CSS last, so the
//!   stylesheet pass sees every mapping the sources seeded) and optionally
//!   writes the rewritten files and the class-map report;
//! - `css` rewrites a single stylesheet to stdout;
//! - `candidates` shows what the extractor finds in a file and how each token
//!   canonicalizes.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use windshear_candidate::canonical_class_name;
use windshear_core::{
    class_map_entries, css_handler, pre_process_js, pre_process_raw_code, write_class_map,
    Context, CssHandlerOptions, MangleUserConfig, SplitExtractor,
};

#[derive(Parser)]
#[command(name = "windshear")]
#[command(author, version, about = "Rewrite utility-class names into short generated ones")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process sources and stylesheets in one session.
    Run {
        /// Files to process.
        paths: Vec<PathBuf>,
        /// Config file (defaults to `windshear.config.json` in the cwd).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Rewrite the files in place instead of only reporting.
        #[arg(short, long)]
        write: bool,
        /// Write the class-map report to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Rewrite one stylesheet to stdout using mappings from the config.
    Css {
        input: PathBuf,
        /// Also mangle selectors carrying a `[data-v-...]` scoped marker.
        #[arg(long)]
        no_vue_scoped: bool,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show extracted candidates and their canonical forms.
    Candidates { input: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { paths, config, write, report } => run(paths, config, write, report),
        Commands::Css { input, no_vue_scoped, config } => css(input, no_vue_scoped, config),
        Commands::Candidates { input } => candidates(input),
    }
}

fn build_context(config: Option<PathBuf>) -> Result<Context> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let user = match config {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config `{}`", path.display()))?;
            serde_json::from_str::<MangleUserConfig>(&text)
                .with_context(|| format!("parsing config `{}`", path.display()))?
        }
        None => MangleUserConfig::default(),
    };
    let mut ctx = Context::new();
    ctx.init_config(user, &cwd).context("initializing session configuration")?;
    Ok(ctx)
}

fn is_css(path: &Path) -> bool {
    matches!(extension(path), "css")
}

fn is_script(path: &Path) -> bool {
    matches!(extension(path), "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs")
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or_default()
}

fn run(
    paths: Vec<PathBuf>,
    config: Option<PathBuf>,
    write: bool,
    report: Option<PathBuf>,
) -> Result<()> {
    let ctx = build_context(config)?;
    let extractor = SplitExtractor;

    // Sources first: they seed the mappings the stylesheet pass consumes.
    let (stylesheets, sources): (Vec<_>, Vec<_>) = paths.into_iter().partition(|p| is_css(p));

    for path in sources.iter().chain(stylesheets.iter()) {
        let id = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading `{id}`"))?;

        let (output, replaced) = if is_css(path) {
            let out = css_handler(
                &content,
                CssHandlerOptions { ctx: &ctx, file: Some(&id), ignore_vue_scoped: None },
            );
            (out.css, out.replacements)
        } else if is_script(path) {
            let out = pre_process_js(&content, &ctx, &id, &extractor)?;
            let replaced = usize::from(out != content);
            (out, replaced)
        } else {
            let out = pre_process_raw_code(&content, &ctx, &id, &extractor)?;
            let replaced = usize::from(out != content);
            (out, replaced)
        };

        if write && output != content {
            std::fs::write(path, &output).with_context(|| format!("writing `{id}`"))?;
            println!("{} {id}", "rewrote".green());
        } else if replaced > 0 {
            println!("{} {id}", "would rewrite".yellow());
        }
    }

    let entries = class_map_entries(&ctx);
    println!("{} {} class name(s) mapped", "done:".green().bold(), entries.len());

    let report = report.or_else(|| {
        ctx.options()
            .class_map_output
            .as_ref()
            .filter(|o| o.enable)
            .map(|o| o.filename.clone())
    });
    if let Some(path) = report {
        let loose = ctx.options().class_map_output.as_ref().map(|o| o.loose).unwrap_or(true);
        write_class_map(&path, &entries, loose)
            .with_context(|| format!("writing class map `{}`", path.display()))?;
        println!("{} {} generated!", "✨".green(), path.display());
    }
    Ok(())
}

fn css(input: PathBuf, no_vue_scoped: bool, config: Option<PathBuf>) -> Result<()> {
    let ctx = build_context(config)?;
    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("reading `{}`", input.display()))?;
    let id = input.display().to_string();
    let out = css_handler(
        &content,
        CssHandlerOptions {
            ctx: &ctx,
            file: Some(&id),
            ignore_vue_scoped: no_vue_scoped.then_some(false),
        },
    );
    print!("{}", out.css);
    Ok(())
}

fn candidates(input: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("reading `{}`", input.display()))?;
    let extractor = SplitExtractor;
    use windshear_core::CandidateExtractor as _;
    for candidate in extractor.extract(&content, extension(&input)) {
        let canonical = canonical_class_name(&candidate.raw, None);
        if canonical == candidate.raw {
            println!("{:>8}  {}", candidate.start, candidate.raw);
        } else {
            println!("{:>8}  {}  {} {}", candidate.start, candidate.raw, "→".dimmed(), canonical);
        }
    }
    Ok(())
}
