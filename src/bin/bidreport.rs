//! CLI binary for bid-report.
//!
//! A thin shim over the library crate: one subcommand per service operation,
//! plus `paginate` for splitting an existing render without a browser.

use anyhow::{Context, Result};
use bid_report::service::write_atomic;
use bid_report::{
    analyze_document, ask_question, generate_pdf_to_file, health, paginate_image,
    translate_fields_google, ChromeRasterizer, CutKind, FieldMap, FieldValue, ProgressCallback,
    ReportConfig, ReportProgressCallback,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner plus one log line per accepted or dropped page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(message: &str) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Report");
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_render_complete(&self, width: u32, height: u32) {
        self.bar
            .println(format!("  {} Rendered {}x{} px", green("✓"), width, height));
        self.bar.set_message("Paginating…");
    }

    fn on_cut(&self, page_num: usize, top: u32, bottom: u32, kind: CutKind) {
        self.bar.println(format!(
            "  {} Page {:>2}  rows {:>5}..{:<5}  {}",
            green("✓"),
            page_num,
            top,
            bottom,
            dim(&format!("{kind:?}")),
        ));
    }

    fn on_page_dropped(&self, top: u32, bottom: u32) {
        self.bar.println(format!(
            "  {} blank rows {:>5}..{:<5} skipped",
            dim("·"),
            top,
            bottom
        ));
    }

    fn on_pagination_complete(&self, pages: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} {} page(s)", green("✔"), bold(&pages.to_string()));
    }

    fn on_translation_fallback(&self, path: &str, error: &str) {
        self.bar.println(format!(
            "  {} {} kept original ({})",
            red("✗"),
            path,
            red(error)
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract tender fields (JSON on stdout)
  bidreport analyze tender.pdf

  # Batch: one JSON file per document
  bidreport analyze a.pdf b.pdf c.txt --output-dir fields/

  # Translate extracted fields to Telugu
  bidreport translate fields/a.json --target Telugu -o a.te.json

  # Render a paginated PDF report
  bidreport generate-pdf fields/a.json -o report.pdf --template template.png

  # Paginate an existing tall screenshot, no browser needed
  bidreport paginate render.png -o report.pdf

  # Ask about a tender
  bidreport ask "What is the EMD amount?" --context fields/a.json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium for text extraction
  BIDREPORT_CHROME        Chromium/Chrome executable for rendering
"#;

/// Analyse tender documents and render paginated PDF reports.
#[derive(Parser, Debug)]
#[command(
    name = "bidreport",
    version,
    about = "Analyse tender documents with an LLM and render paginated PDF reports",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// LLM model ID (default: gemini-2.5-flash).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, global = true, env = "BIDREPORT_PROVIDER")]
    provider: Option<String>,

    /// Retries on a failed LLM call.
    #[arg(long, global = true, env = "BIDREPORT_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, global = true, env = "BIDREPORT_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "BIDREPORT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress output.
    #[arg(long, global = true, env = "BIDREPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "BIDREPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "BIDREPORT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract tender fields from PDF/text files or URLs.
    Analyze {
        /// Files or URLs to analyse.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Write `<stem>.json` per input here instead of printing to stdout.
        #[arg(short, long, env = "BIDREPORT_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Translate every text value of a field mapping.
    Translate {
        /// JSON field mapping (`-` for stdin).
        data: PathBuf,

        /// Language name (Telugu, Hindi, ...) or code (te, hi, ...).
        #[arg(short, long, env = "BIDREPORT_TARGET_LANG", default_value = "hi")]
        target: String,

        /// Write JSON here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Concurrent translations per mapping.
        #[arg(long, env = "BIDREPORT_MAP_WORKERS", default_value_t = 10)]
        map_workers: usize,

        /// Concurrent translations per list.
        #[arg(long, env = "BIDREPORT_LIST_WORKERS", default_value_t = 5)]
        list_workers: usize,
    },

    /// Render a field mapping as a paginated PDF report.
    GeneratePdf {
        /// JSON field mapping (`-` for stdin).
        data: PathBuf,

        /// Output PDF path.
        #[arg(short, long, default_value = "Bid_Analysis_Report.pdf")]
        output: PathBuf,

        /// Chromium/Chrome executable.
        #[arg(long, env = "BIDREPORT_CHROME")]
        chrome_path: Option<PathBuf>,

        /// PNG tiled behind every page.
        #[arg(long, env = "BIDREPORT_TEMPLATE")]
        template: Option<PathBuf>,

        /// Viewport height of the render, in pixels.
        #[arg(long, env = "BIDREPORT_RENDER_HEIGHT", default_value_t = 7016)]
        render_height: u32,
    },

    /// Paginate an existing tall image into a PDF.
    Paginate {
        /// Rendered report image (PNG or JPEG).
        image: PathBuf,

        /// Output PDF path.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Answer a question about an analysed tender.
    Ask {
        /// The question.
        question: String,

        /// JSON field mapping produced by `analyze`.
        #[arg(short, long)]
        context: PathBuf,
    },

    /// Print the liveness payload.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let show_progress = !cli.quiet && !cli.no_progress;

    match &cli.command {
        Command::Analyze { inputs, output_dir } => {
            let config = build_config(&cli, None)?;
            run_analyze(inputs, output_dir.as_deref(), &config, show_progress).await
        }

        Command::Translate {
            data,
            target,
            output,
            map_workers,
            list_workers,
        } => {
            let progress = show_progress.then(|| progress_for("Translating…"));
            let mut config = build_config(&cli, progress)?;
            config.translate_map_workers = (*map_workers).max(1);
            config.translate_list_workers = (*list_workers).max(1);

            let fields = read_fields(data).await?;
            let translated = translate_fields_google(&fields, target, &config)
                .await
                .context("Translation failed")?;
            emit_json(&translated, output.as_deref()).await
        }

        Command::GeneratePdf {
            data,
            output,
            chrome_path,
            template,
            render_height,
        } => {
            let progress = show_progress.then(|| progress_for("Rendering HTML…"));
            let mut config = build_config(&cli, progress)?;
            config.chrome_path = chrome_path.clone();
            config.template_image = template.clone();
            config.render_height = (*render_height).max(1);

            let fields = read_fields(data).await?;
            let rasterizer = ChromeRasterizer::new(config.chrome_path.clone());
            let written = generate_pdf_to_file(&fields, &rasterizer, output, &config)
                .await
                .context("Report generation failed")?;
            if !cli.quiet {
                eprintln!(
                    "{}  {}  →  {}",
                    green("✔"),
                    dim(&format!("{written} bytes")),
                    bold(&output.display().to_string())
                );
            }
            Ok(())
        }

        Command::Paginate { image, output } => {
            let progress = show_progress.then(|| progress_for("Paginating…"));
            let config = build_config(&cli, progress)?;
            let pdf = paginate_image(image, &config)
                .await
                .with_context(|| format!("Failed to paginate {}", image.display()))?;
            write_atomic(output, &pdf).await.context("Failed to write PDF")?;
            if !cli.quiet {
                eprintln!("{}  →  {}", green("✔"), bold(&output.display().to_string()));
            }
            Ok(())
        }

        Command::Ask { question, context } => {
            let config = build_config(&cli, None)?;
            let fields = read_fields(context).await?;
            let answer = ask_question(question, &fields, &config)
                .await
                .context("Question answering failed")?;
            println!("{answer}");
            Ok(())
        }

        Command::Health => {
            println!("{}", serde_json::to_string(&health())?);
            Ok(())
        }
    }
}

/// Analyse each input in turn; one failure does not stop the batch.
async fn run_analyze(
    inputs: &[String],
    output_dir: Option<&Path>,
    config: &ReportConfig,
    show_progress: bool,
) -> Result<()> {
    let bar = if show_progress && inputs.len() > 1 {
        let bar = ProgressBar::new(inputs.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Analyzing");
        Some(bar)
    } else {
        None
    };

    let mut failed = 0usize;
    for input in inputs {
        match analyze_document(input, config).await {
            Ok(analysis) => {
                let line = format!(
                    "  {} {}  {}",
                    green("✓"),
                    input,
                    dim(&format!(
                        "{} fields, {} tokens in / {} out, {}ms",
                        analysis.fields.len(),
                        analysis.input_tokens,
                        analysis.output_tokens,
                        analysis.duration_ms
                    ))
                );
                match &bar {
                    Some(b) => b.println(line),
                    None if show_progress => eprintln!("{line}"),
                    None => {}
                }

                let target = output_dir.map(|dir| dir.join(format!("{}.json", stem_of(input))));
                emit_json(&analysis.fields, target.as_deref()).await?;
            }
            Err(e) => {
                failed += 1;
                let line = format!("  {} {}  {}", red("✗"), input, red(&e.to_string()));
                match &bar {
                    Some(b) => b.println(line),
                    None => eprintln!("{line}"),
                }
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }

    if let Some(b) = bar {
        b.finish_and_clear();
    }
    if failed == inputs.len() {
        anyhow::bail!("All {} document(s) failed to analyse", failed);
    }
    if failed > 0 {
        eprintln!("{} {}/{} documents failed", red("⚠"), failed, inputs.len());
    }
    Ok(())
}

fn progress_for(message: &str) -> ProgressCallback {
    CliProgressCallback::new(message) as Arc<dyn ReportProgressCallback>
}

/// Map global CLI args to `ReportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder()
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Read a field mapping from a file or stdin.
///
/// Accepts either the mapping itself or an envelope `{"data": {...}}`.
async fn read_fields(path: &Path) -> Result<FieldMap> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    let fields: FieldMap = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON object", path.display()))?;
    if fields.len() == 1 {
        if let Some(FieldValue::Map(inner)) = fields.get("data") {
            return Ok(inner.clone());
        }
    }
    Ok(fields)
}

/// Pretty JSON to `path`, or to stdout.
async fn emit_json(fields: &FieldMap, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(fields).context("Failed to serialise fields")?;
    match path {
        Some(p) => write_atomic(p, format!("{json}\n").as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", p.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

/// File stem of a path or URL, for batch output names.
fn stem_of(input: &str) -> String {
    let last = input
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(input);
    Path::new(last)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}
