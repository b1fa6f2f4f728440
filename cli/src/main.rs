//! docx-refine CLI - carry amended wording into a DOCX

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docx_refine::{
    inspect_file, parser, AmendedSource, ComplexParagraphPolicy, JsonFormat, ParagraphStatus,
    RefineOptions, RefineReport, Refiner,
};

#[derive(Parser)]
#[command(name = "docx-refine")]
#[command(author = "iyulab")]
#[command(version)]
#[command(
    about = "Carry amended wording into a DOCX while keeping its formatting",
    long_about = None
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Original DOCX whose formatting is kept
    #[arg(long, value_name = "FILE")]
    original: Option<PathBuf>,

    /// Amended DOCX with the same paragraphs
    #[arg(long, value_name = "FILE", conflicts_with = "amended_txt")]
    amended: Option<PathBuf>,

    /// Amended UTF-8 text, paragraphs separated by blank lines
    #[arg(long, value_name = "FILE")]
    amended_txt: Option<PathBuf>,

    /// Output DOCX (must differ from the inputs)
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Do not mark inserted text
    #[arg(long)]
    no_markup: bool,

    /// Highlight color for inserted text
    #[arg(long, value_name = "COLOR", default_value = "yellow")]
    highlight: String,

    /// Also refine footnotes and endnotes (amended DOCX only)
    #[arg(long)]
    include_notes: bool,

    /// Replace the text of paragraphs with hyperlinks or fields instead of skipping them
    #[arg(long)]
    replace_complex: bool,

    /// Write the change ledger as JSON
    #[arg(long, value_name = "FILE")]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export body paragraphs in the amended-text format
    Text {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show paragraph counts and paragraphs that would be skipped
    Info {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Text { input, output }) => cmd_text(input, output.as_deref()),
        Some(Commands::Info { input, json }) => cmd_info(input, *json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => cmd_refine(&cli),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_refine(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(original), Some(out)) = (cli.original.as_deref(), cli.out.as_deref()) else {
        println!(
            "{}",
            "Usage: docx-refine --original <FILE> (--amended <FILE> | --amended-txt <FILE>) --out <FILE>"
                .yellow()
        );
        println!("       docx-refine --help for more information");
        return Err("--original and --out are required".into());
    };

    let amended = match (&cli.amended, &cli.amended_txt) {
        (Some(path), None) => AmendedSource::docx(path),
        (None, Some(path)) => AmendedSource::text(path),
        _ => return Err("exactly one of --amended or --amended-txt is required".into()),
    };

    let mut options = RefineOptions::new()
        .with_markup(!cli.no_markup)
        .with_highlight(cli.highlight.as_str())
        .with_notes(cli.include_notes);
    if cli.replace_complex {
        options = options.with_complex_policy(ComplexParagraphPolicy::Replace);
    }
    log::debug!("Refine options: {:?}", options);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Refining {}...", original.display()));

    let refiner = Refiner::new(options);
    let result = match cli.ledger.as_deref() {
        Some(ledger) => {
            refiner.refine_with_ledger(original, &amended, out, ledger, JsonFormat::Pretty)
        }
        None => refiner.refine(original, &amended, out),
    };
    pb.finish_and_clear();
    let report = result?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RefineReport) {
    let summary = report.summary();

    println!("{} {}", "Saved to".green(), report.output.display());
    println!(
        "  {}: {} ({} modified, {} unchanged, {} skipped)",
        "Paragraphs".bold(),
        summary.total,
        summary.modified,
        summary.unchanged,
        summary.skipped
    );
    println!(
        "  {}: +{} -{}",
        "Words".bold(),
        summary.inserted_words,
        summary.deleted_words
    );

    let attention = report
        .ledger
        .entries
        .iter()
        .filter(|e| e.status == ParagraphStatus::Skipped || e.needs_review);
    for entry in attention {
        let label = if entry.needs_review {
            "review".yellow()
        } else {
            "skipped".yellow()
        };
        println!(
            "  {} {} #{}: {}",
            label,
            entry.story,
            entry.index,
            entry.note.as_deref().unwrap_or("")
        );
    }

    if let Some(ref path) = report.ledger_file {
        println!("{} {}", "Ledger saved to".green(), path.display());
    }
}

fn cmd_text(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let paragraphs = docx_refine::extract_paragraphs(input)?;
    if !parser::round_trips(&paragraphs) {
        eprintln!(
            "{}: {} has empty paragraphs or paragraphs with leading/trailing line breaks; \
             edited text will not split back into the same paragraphs, use --amended with a DOCX",
            "Warning".yellow().bold(),
            input.display()
        );
    }
    let text = parser::join_paragraphs(&paragraphs);

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let info = inspect_file(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), info.format);

    for story in &info.stories {
        println!();
        println!("{}", story.story.to_string().cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}: {}", "Paragraphs".bold(), story.paragraphs.len());

        let words: usize = story
            .paragraphs
            .iter()
            .map(|p| p.text.split_whitespace().count())
            .sum();
        println!("{}: {}", "Words".bold(), words);

        let unsupported: Vec<_> = story.unsupported().collect();
        println!("{}: {}", "Would be skipped".bold(), unsupported.len());
        for paragraph in unsupported {
            println!(
                "  {} #{}: {}",
                "├─".dimmed(),
                paragraph.index,
                paragraph.unsupported.as_deref().unwrap_or("")
            );
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docx-refine".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Carries amended wording into a DOCX while keeping its formatting");
    println!();
    println!(
        "Repository: {}",
        "https://github.com/iyulab/docx-refine".dimmed()
    );
    println!("License: MIT");
}
