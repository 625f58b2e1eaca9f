//! slidewright command line
//!
//! Thin wrappers over the library: project scaffolding, ingest and
//! validation, bundler invocation, the dev API and the PDF/PPTX exporters.
//! Set RUST_LOG=debug for verbose output.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use slidewright::config::CONFIG_FILE;
use slidewright::deck::Deck;
use slidewright::devapi::{start_dev, DevApi};
use slidewright::project::Project;
use slidewright::simple::SimpleEngine;
use slidewright::theme::Theme;
use slidewright::{pdf, pptx, EngineConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "slidewright", version, about = "Local-first slide deck tooling")]
struct Cli {
    /// Project directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scaffold deck.yaml, brief.json, outline.json and the project folders
    Init {
        #[arg(long, default_value = "deck")]
        id: String,
        #[arg(long, default_value = "Untitled deck")]
        title: String,
        #[arg(long, default_value = "slate")]
        theme: String,
    },
    /// Scan sources/ into generated/manifest.json
    Ingest,
    /// Validate brief.json, outline.json and the manifest
    Validate,
    /// Start the bundler dev server and the dev API
    Dev {
        /// Only serve the dev API
        #[arg(long)]
        no_bundler: bool,
        /// Override the dev API address from deck.yaml
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run the bundler build
    Build,
    /// Print every slide and merge the pages into one PDF
    ExportPdf {
        #[arg(short, long, default_value = "deck.pdf")]
        output: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Re-emit every slide as native PPTX shapes
    ExportPptx {
        #[arg(short, long, default_value = "deck.pptx")]
        output: PathBuf,
        /// Override the theme from deck.yaml
        #[arg(long)]
        theme: Option<String>,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Copy the build output into the static site directory
    ExportStatic,
    /// Commit the static site to the publish branch and force-push it
    PublishGithub {
        #[arg(short, long, default_value = "Publish deck")]
        message: String,
    },
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// Rendering backend
    #[arg(long, value_enum, default_value = "cdp")]
    backend: Backend,
    /// Override the deck URL from deck.yaml
    #[arg(long)]
    url: Option<String>,
    /// Override the slide count (otherwise deck.yaml, then outline.json)
    #[arg(long)]
    slides: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Headless Chrome
    Cdp,
    /// Pre-rendered HTML with inline geometry, no browser
    Static,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

// Ok(false) reports a failure that was already printed (validation issues).
fn run(cli: Cli) -> Result<bool> {
    let root = cli.project;
    match cli.command {
        Commands::Init { id, title, theme } => {
            let project = Project::init(&root, &id, &title, &theme)
                .with_context(|| format!("Failed to initialize project in {}", root.display()))?;
            println!("Initialized {} in {}", CONFIG_FILE, project.root.display());
        }
        Commands::Ingest => {
            let manifest = open(&root)?.ingest().context("Ingest failed")?;
            println!("Ingested {} files", manifest.files.len());
        }
        Commands::Validate => {
            let reports = open(&root)?.validate().context("Validation failed")?;
            let mut ok = true;
            for doc in &reports {
                if doc.report.is_ok() {
                    println!("{}: ok", doc.file);
                    continue;
                }
                ok = false;
                for message in doc.report.messages() {
                    eprintln!("{}: {}", doc.file, message);
                }
            }
            return Ok(ok);
        }
        Commands::Dev { no_bundler, bind } => {
            let project = open(&root)?;
            let addr = bind.unwrap_or_else(|| project.config.api.bind.clone());
            // The bundler guard stops `commands.dev` when this scope unwinds.
            let (server, _bundler) = start_dev(&project, &addr, !no_bundler)
                .with_context(|| format!("Failed to start the dev environment on {}", addr))?;
            println!("Dev API on http://{}/__api/status", server.local_addr());
            server.run(DevApi::new(project));
        }
        Commands::Build => {
            open(&root)?.build().context("Build failed")?;
        }
        Commands::ExportPdf { output, source } => {
            let project = open(&root)?;
            let deck = resolve_deck(&project, &source)?;
            let bytes = match source.backend {
                Backend::Cdp => export_pdf_cdp(project.config.engine_config(), &deck)?,
                Backend::Static => pdf::export_pdf_with::<SimpleEngine>(project.config.engine_config(), &deck)?,
            };
            std::fs::write(&output, &bytes).with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} ({} slides)", output.display(), deck.slide_count);
        }
        Commands::ExportPptx { output, theme, source } => {
            let project = open(&root)?;
            let theme = Theme::lookup(theme.as_deref().unwrap_or(&project.config.theme))?;
            let deck = resolve_deck(&project, &source)?;
            let bytes = match source.backend {
                Backend::Cdp => export_pptx_cdp(project.config.engine_config(), &deck, theme)?,
                Backend::Static => {
                    pptx::export_pptx_with::<SimpleEngine>(project.config.engine_config(), &deck, theme)?
                }
            };
            std::fs::write(&output, &bytes).with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} ({} slides, theme {})", output.display(), deck.slide_count, theme.name);
        }
        Commands::ExportStatic => {
            let copied = open(&root)?.export_static().context("Static export failed")?;
            println!("Copied {} files", copied);
        }
        Commands::PublishGithub { message } => {
            open(&root)?.publish_github(&message).context("Publish failed")?;
            println!("Published");
        }
    }
    Ok(true)
}

fn open(root: &std::path::Path) -> Result<Project> {
    if !root.join(CONFIG_FILE).is_file() {
        bail!("No {} in {}; run `slidewright init` first", CONFIG_FILE, root.display());
    }
    Ok(Project::open(root))
}

fn resolve_deck(project: &Project, source: &SourceArgs) -> Result<Deck> {
    let mut config = project.config.clone();
    if let Some(url) = &source.url {
        config.deck_url = url.clone();
    }
    if let Some(n) = source.slides {
        config.slide_count = Some(n);
    }
    Ok(config.deck(&project.root)?)
}

#[cfg(feature = "cdp")]
fn export_pdf_cdp(config: EngineConfig, deck: &Deck) -> Result<Vec<u8>> {
    Ok(pdf::export_pdf_with::<slidewright::cdp::CdpEngine>(config, deck)?)
}

#[cfg(not(feature = "cdp"))]
fn export_pdf_cdp(_config: EngineConfig, _deck: &Deck) -> Result<Vec<u8>> {
    bail!("built without the `cdp` feature; use --backend static")
}

#[cfg(feature = "cdp")]
fn export_pptx_cdp(config: EngineConfig, deck: &Deck, theme: &Theme) -> Result<Vec<u8>> {
    Ok(pptx::export_pptx_with::<slidewright::cdp::CdpEngine>(config, deck, theme)?)
}

#[cfg(not(feature = "cdp"))]
fn export_pptx_cdp(_config: EngineConfig, _deck: &Deck, _theme: &Theme) -> Result<Vec<u8>> {
    bail!("built without the `cdp` feature; use --backend static")
}
