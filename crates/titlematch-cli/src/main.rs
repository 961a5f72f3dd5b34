use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;
use tracing_subscriber::EnvFilter;

use titlematch_core::{FuzzyMatcher, MatchConfig, ReconciliationReport, config_file};
use titlematch_ingest::catalog::{augmented_output_path, read_catalog, write_augmented_catalog};
use titlematch_ingest::{CorpusIndex, CorpusIndexer, IndexProgress};
use titlematch_parsing::TitleExtractor;

mod output;
mod settings;

use output::ColorMode;
use settings::{DEFAULT_CATALOG, DEFAULT_HTML_FOLDER, DEFAULT_MARKDOWN_DIR, Overrides, Settings};

/// Journal title matcher - pair article PDFs with the rows of an issue catalog
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every command that reads PDFs.
#[derive(Args, Debug, Default)]
struct ExtractionArgs {
    /// Number of leading pages to read from each PDF
    #[arg(long)]
    max_pages: Option<usize>,

    /// Comma-separated list of file extensions to index
    #[arg(long, value_delimiter = ',')]
    extensions: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a catalog CSV from saved journal issue pages
    Catalog {
        /// Folder holding the saved .htm/.html issue pages
        html_folder: Option<PathBuf>,

        /// Path of the catalog CSV to write
        #[arg(short, long, default_value = DEFAULT_CATALOG)]
        output: PathBuf,

        /// Print the year only on the first row of each year
        #[arg(long)]
        group_years: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Convert saved journal pages to markdown
    Convert {
        /// Folder holding the saved .htm/.html pages
        html_folder: Option<PathBuf>,

        /// Folder for the markdown files
        #[arg(short, long, default_value = DEFAULT_MARKDOWN_DIR)]
        output_dir: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Dry run: extract and print the title of every PDF without matching
    Index {
        /// Folder holding the PDFs
        folder: Option<PathBuf>,

        #[command(flatten)]
        extraction: ExtractionArgs,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Match PDFs against the catalog and write the augmented catalog
    Match {
        /// Folder holding the PDFs
        #[arg(long)]
        pdf_folder: Option<PathBuf>,

        /// Catalog CSV to reconcile
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Minimum similarity (0-100) for a match to be accepted
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        threshold: Option<u8>,

        /// Folder for the augmented catalog
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        extraction: ExtractionArgs,

        /// Also write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Path to output log file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli.command) {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Catalog {
            html_folder,
            output,
            group_years,
            no_color,
        } => build_catalog(
            html_folder.unwrap_or_else(|| PathBuf::from(DEFAULT_HTML_FOLDER)),
            &output,
            group_years,
            ColorMode(!no_color),
        ),
        Command::Convert {
            html_folder,
            output_dir,
            no_color,
        } => convert_pages(
            html_folder.unwrap_or_else(|| PathBuf::from(DEFAULT_HTML_FOLDER)),
            &output_dir,
            ColorMode(!no_color),
        ),
        Command::Index {
            folder,
            extraction,
            no_color,
        } => {
            let overrides = Overrides {
                pdf_folder: folder,
                max_pages: extraction.max_pages,
                extensions: extraction.extensions,
                ..Default::default()
            };
            dry_run_index(resolve_settings(overrides)?, ColorMode(!no_color))
        }
        Command::Match {
            pdf_folder,
            catalog,
            threshold,
            output_dir,
            extraction,
            json,
            output,
            no_color,
        } => {
            let overrides = Overrides {
                pdf_folder,
                catalog,
                output_dir,
                threshold,
                max_pages: extraction.max_pages,
                extensions: extraction.extensions,
            };
            reconcile(resolve_settings(overrides)?, json, output, no_color)
        }
    }
}

fn resolve_settings(overrides: Overrides) -> anyhow::Result<Settings> {
    let file = config_file::load_config();
    Settings::resolve(overrides, |key| std::env::var(key).ok(), &file)
}

fn build_catalog(
    html_folder: PathBuf,
    output: &Path,
    group_years: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !html_folder.is_dir() {
        anyhow::bail!("HTML folder not found: {}", html_folder.display());
    }

    let catalog = titlematch_ingest::extract_html_catalog(&html_folder)?;
    if catalog.records.is_empty() {
        anyhow::bail!(
            "No articles found in the pages of {}",
            html_folder.display()
        );
    }
    titlematch_ingest::write_catalog(output, &catalog.records, group_years)?;

    let mut stdout = std::io::stdout();
    output::print_html_summary(&mut stdout, &catalog.summary, output, color)?;
    Ok(())
}

fn convert_pages(html_folder: PathBuf, output_dir: &Path, color: ColorMode) -> anyhow::Result<()> {
    if !html_folder.is_dir() {
        anyhow::bail!("HTML folder not found: {}", html_folder.display());
    }

    let summary = titlematch_ingest::convert_folder(&html_folder, output_dir)?;

    let mut stdout = std::io::stdout();
    output::print_conversion_summary(&mut stdout, &summary, output_dir, color)?;
    Ok(())
}

fn dry_run_index(settings: Settings, color: ColorMode) -> anyhow::Result<()> {
    let corpus = index_corpus(&settings)?;

    let mut stdout = std::io::stdout();
    for (identifier, outcome) in &corpus.outcomes {
        output::print_document_outcome(&mut stdout, identifier, outcome, color)?;
    }
    writeln!(stdout)?;
    output::print_index_stats(&mut stdout, &corpus.stats, color)?;
    Ok(())
}

fn reconcile(
    settings: Settings,
    json: Option<PathBuf>,
    output: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    let color = ColorMode(!no_color && output.is_none());

    if !settings.catalog.is_file() {
        anyhow::bail!("Catalog not found: {}", settings.catalog.display());
    }
    let table = read_catalog(&settings.catalog)?;

    let corpus = index_corpus(&settings)?;
    if corpus.titles.is_empty() {
        anyhow::bail!(
            "No titles could be extracted from {}",
            settings.pdf_folder.display()
        );
    }

    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };
    output::print_index_stats(&mut writer, &corpus.stats, color)?;

    let matcher = FuzzyMatcher::new(MatchConfig::with_threshold(settings.threshold));
    let outcome = matcher.reconcile(&corpus.titles, &table.records);
    let report = ReconciliationReport::build(corpus.titles.len(), &table.records, &outcome);

    let out_path = augmented_output_path(&settings.catalog, &settings.output_dir);
    write_augmented_catalog(&out_path, &table, &report.rows)?;

    output::print_match_report(&mut writer, &report, &out_path, color)?;

    if let Some(json_path) = json {
        std::fs::write(&json_path, report.to_json_pretty()?)?;
        writeln!(writer, "JSON report written to: {}", json_path.display())?;
    }

    Ok(())
}

fn index_corpus(settings: &Settings) -> anyhow::Result<CorpusIndex> {
    if !settings.pdf_folder.is_dir() {
        anyhow::bail!("PDF folder not found: {}", settings.pdf_folder.display());
    }

    let backend = titlematch_ingest::pdf_backend(settings.backend_options())?;
    let indexer = CorpusIndexer::new(backend.as_ref())
        .with_extractor(TitleExtractor::with_config(settings.title_config.clone()))
        .with_config(settings.indexer_config());

    let bar_style =
        ProgressStyle::with_template("{spinner:.green} {msg} [{bar:40.green/dim}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> ");
    let bar = ProgressBar::new(0);
    bar.set_style(bar_style);

    let corpus = indexer.index_folder(&settings.pdf_folder, |event| match event {
        IndexProgress::Started { total } => {
            bar.set_length(total as u64);
            bar.set_message("Extracting titles");
        }
        IndexProgress::Processed {
            index, identifier, ..
        } => {
            bar.set_position(index as u64 + 1);
            bar.set_message(identifier.to_string());
        }
        IndexProgress::Finished { stats } => {
            bar.finish_with_message(format!("Indexed {} documents", stats.indexed));
        }
    })?;

    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &Path) -> Settings {
        let overrides = Overrides {
            pdf_folder: Some(dir.join("Published")),
            catalog: Some(dir.join("catalog.csv")),
            output_dir: Some(dir.join("out")),
            ..Default::default()
        };
        let file = config_file::ConfigFile::default();
        Settings::resolve(overrides, |_| None, &file).unwrap()
    }

    #[test]
    fn missing_catalog_leaves_no_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");

        let err = reconcile(settings_in(dir.path()), None, Some(log.clone()), true).unwrap_err();
        assert!(err.to_string().contains("Catalog not found"));
        assert!(!log.exists());
    }

    #[test]
    fn missing_pdf_folder_leaves_no_log_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("catalog.csv"), "Title\nSoft Grippers\n").unwrap();
        let log = dir.path().join("run.log");

        let err = reconcile(settings_in(dir.path()), None, Some(log.clone()), true).unwrap_err();
        assert!(err.to_string().contains("PDF folder not found"));
        assert!(!log.exists());
    }

    #[test]
    fn missing_html_folder_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("markdown_files");
        let err = convert_pages(dir.path().join("html_files"), &out, ColorMode(false)).unwrap_err();
        assert!(err.to_string().contains("HTML folder not found"));
        assert!(!out.exists());
    }
}
