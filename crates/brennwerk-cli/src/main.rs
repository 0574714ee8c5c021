// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Brennwerk — mark regions on PDF pages and burn them into an exported copy.
//
// Entry point. Initialises logging, parses the command line, and drives a
// session registry for each command.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use brennwerk_core::error::Result;
use brennwerk_core::human_errors::humanize_error;
use brennwerk_core::{AnnotationKind, AppConfig, Color, DocPoint, DocRect};
use brennwerk_document::{PageRenderer, PaperRenderer};
use brennwerk_document::pdf::sample::specimen_document;
use brennwerk_session::SessionRegistry;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "brennwerk",
    about = "Burn pixelation, blur, fills, strokes and labels irreversibly into PDF pages",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page count and page sizes of a PDF
    Info {
        /// Input PDF file
        input: PathBuf,
    },

    /// Burn an annotation list into a copy of a PDF
    Burn {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// JSON list of `{"page": n, "kind": {...}}` entries
        #[arg(short, long)]
        annotations: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Settings file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a specimen PDF and a matching annotation list
    Demo {
        /// Output PDF file
        #[arg(short, long, default_value = "specimen.pdf")]
        output: PathBuf,

        /// Number of pages
        #[arg(short, long, default_value_t = 3)]
        pages: usize,

        /// Also write sample annotations for `burn` here
        #[arg(short, long)]
        marks: Option<PathBuf>,
    },

    /// Write the default settings as JSON
    Config {
        /// Output file
        #[arg(short, long, default_value = "brennwerk.json")]
        output: PathBuf,
    },
}

/// One entry of an annotation list file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MarkEntry {
    /// Zero-based page index.
    page: usize,
    kind: AnnotationKind,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Info { input } => info_command(&input).await,
        Commands::Burn {
            input,
            annotations,
            output,
            config,
        } => burn_command(&input, &annotations, &output, config.as_deref()).await,
        Commands::Demo {
            output,
            pages,
            marks,
        } => demo_command(&output, pages, marks.as_deref()).await,
        Commands::Config { output } => AppConfig::default().save(&output).map(|()| {
            println!("Wrote default settings to {}", output.display());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("Error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            tracing::debug!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn registry(config: AppConfig) -> SessionRegistry {
    let renderer = page_renderer(&config);
    SessionRegistry::new(config, renderer)
}

/// PDFium when it is compiled in and its library loads, otherwise blank
/// paper.
fn page_renderer(config: &AppConfig) -> Arc<dyn PageRenderer> {
    #[cfg(feature = "pdfium")]
    match brennwerk_document::PdfiumRenderer::bind() {
        Ok(renderer) => return Arc::new(renderer),
        Err(err) => warn!(error = %err, "PDFium unavailable, burning onto blank paper"),
    }
    Arc::new(PaperRenderer::new(config.paper_color))
}

async fn info_command(input: &Path) -> Result<()> {
    let mut registry = registry(AppConfig::default());
    let id = registry.open_file(input).await?;
    let session = registry.session(id)?;

    println!("{}", serde_json::to_string_pretty(&session.summary())?);
    for page in session.source().pages() {
        println!(
            "page {:>3}: {:.1} x {:.1} pt",
            page.index + 1,
            page.width(),
            page.height()
        );
    }
    Ok(())
}

async fn burn_command(
    input: &Path,
    annotations: &Path,
    output: &Path,
    config: Option<&Path>,
) -> Result<()> {
    let config = match config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let marks: Vec<MarkEntry> = serde_json::from_str(&tokio::fs::read_to_string(annotations).await?)?;

    let mut registry = registry(config);
    let id = registry.open_file(input).await?;
    let session = registry.session_mut(id)?;
    let mut rejected = 0usize;
    for mark in marks {
        let label = mark.kind.label();
        if session.propose(mark.page, mark.kind)?.is_none() {
            warn!(page = mark.page, kind = label, "annotation dropped as degenerate or off-page");
            rejected += 1;
        }
    }
    info!(
        accepted = session.annotations().len(),
        rejected, "annotations loaded"
    );

    let outcome = registry.export_document(id).await?;
    tokio::fs::write(output, &outcome.bytes).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    println!("Wrote {}", output.display());
    Ok(())
}

async fn demo_command(output: &Path, pages: usize, marks: Option<&Path>) -> Result<()> {
    tokio::fs::write(output, specimen_document(pages)).await?;
    println!("Wrote specimen to {}", output.display());

    if let Some(path) = marks {
        let raw = serde_json::to_string_pretty(&demo_marks())?;
        tokio::fs::write(path, raw).await?;
        println!("Wrote sample annotations to {}", path.display());
    }
    Ok(())
}

/// Marks over the customer, address and account lines of the first
/// specimen page, plus one of each vector kind.
fn demo_marks() -> Vec<MarkEntry> {
    vec![
        MarkEntry {
            page: 0,
            kind: AnnotationKind::Pixelate {
                rect: DocRect::new(52.0, 742.0, 200.0, 18.0),
            },
        },
        MarkEntry {
            page: 0,
            kind: AnnotationKind::Blur {
                rect: DocRect::new(52.0, 724.0, 240.0, 18.0),
            },
        },
        MarkEntry {
            page: 0,
            kind: AnnotationKind::OpaqueFill {
                rect: DocRect::new(52.0, 706.0, 230.0, 18.0),
                color: Color::BLACK,
            },
        },
        MarkEntry {
            page: 0,
            kind: AnnotationKind::StrokeRect {
                rect: DocRect::new(46.0, 686.0, 200.0, 22.0),
                color: Color::RED,
                width: 1.5,
            },
        },
        MarkEntry {
            page: 0,
            kind: AnnotationKind::FreehandStroke {
                points: vec![
                    DocPoint::new(320.0, 690.0),
                    DocPoint::new(360.0, 720.0),
                    DocPoint::new(400.0, 690.0),
                ],
                color: Color::BLUE,
                width: 2.0,
            },
        },
        MarkEntry {
            page: 0,
            kind: AnnotationKind::TextLabel {
                rect: DocRect::new(380.0, 742.0, 80.0, 14.4),
                text: "REDACTED".into(),
                font_size: 12.0,
                color: Color::RED,
            },
        },
    ]
}
