//! CLI tool for converting HTML slide decks to PowerPoint files.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deck_core::normalize::truncate_chars;
use deck_core::{extract_deck, AssetResolver, ComposeReport, DeckComposer, ExtractedDeck, Theme};
use deck_pptx::{OutlineReader, PptxDeck};
use std::fs;
use std::path::{Path, PathBuf};

/// Convert HTML slide decks into PowerPoint presentations.
#[derive(Parser, Debug)]
#[command(name = "html2pptx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an HTML slide deck to a .pptx file
    Convert {
        /// Input HTML file
        input: PathBuf,

        /// Output .pptx path (default: input with a .pptx extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the slides and CSS variables extracted from an HTML deck as JSON
    Inspect {
        /// Input HTML file
        input: PathBuf,
    },
}

impl Command {
    fn verbose(&self) -> bool {
        matches!(self, Command::Convert { verbose: true, .. })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.command.verbose() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match &cli.command {
        Command::Convert {
            input,
            output,
            verbose,
        } => {
            run_convert(input, output.as_deref(), *verbose)?;
        }
        Command::Inspect { input } => {
            let deck = read_deck(input)?;
            let json = serde_json::to_string_pretty(&deck).context("Failed to serialize deck")?;
            println!("{}", json);
        }
    }

    Ok(())
}

/// Result of a successful conversion.
#[derive(Debug)]
struct ConvertSummary {
    output: PathBuf,
    /// Slide count read back from the written file.
    slides: usize,
    size_bytes: u64,
    report: ComposeReport,
}

/// Read and extract an HTML deck.
fn read_deck(input: &Path) -> Result<ExtractedDeck> {
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }

    let is_html = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        .unwrap_or(false);
    if !is_html {
        log::warn!("{} does not look like an HTML file", input.display());
    }

    let html = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    Ok(extract_deck(&html))
}

/// Convert `input` to a presentation at `output` (or next to the input).
fn run_convert(input: &Path, output: Option<&Path>, verbose: bool) -> Result<ConvertSummary> {
    let output_path = get_output_path(input, output);

    println!("Input:  {}", input.display());
    println!("Output: {}", output_path.display());

    let deck = read_deck(input)?;
    println!("CSS variables: {}", deck.stylesheet.len());
    println!("Slides found: {}", deck.slides.len());

    if verbose {
        for slide in &deck.slides {
            println!(
                "  {:>3}. [{}] {} ({} blocks, {} images)",
                slide.number,
                slide.slide_type,
                truncate_chars(slide.title_text(), 40),
                slide.content.len(),
                slide.images.len()
            );
        }
    }

    if deck.is_empty() {
        bail!(
            "No slides found in {}. Hint: slides must be <section> elements whose class contains \"slide\".",
            input.display()
        );
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let theme = Theme::from_stylesheet(&deck.stylesheet);
    let composer = DeckComposer::new(theme).with_progress(verbose);

    let title = deck
        .slides
        .iter()
        .find_map(|s| s.title.clone())
        .or_else(|| input.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_default();
    let mut writer = PptxDeck::new().with_title(title);

    let base_dir = match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut assets = AssetResolver::new(base_dir);

    let report = composer
        .compose(&deck, &mut writer, &mut assets, &output_path)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    let slides = OutlineReader::new()
        .read_path(&output_path)
        .with_context(|| format!("Failed to read back {}", output_path.display()))?
        .len();
    let size_bytes = fs::metadata(&output_path)?.len();

    println!("Saved: {}", output_path.display());
    println!("Slides written: {}", slides);
    println!("Size: {:.1} KB", size_bytes as f64 / 1024.0);
    if !report.warnings.is_empty() {
        println!("Warnings: {}", report.warnings.len());
    }

    Ok(ConvertSummary {
        output: output_path,
        slides,
        size_bytes,
        report,
    })
}

/// Determine the output path for a converted file.
fn get_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("pptx"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn write_input(dir: &Path, name: &str, html: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, html).unwrap();
        path
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            get_output_path(Path::new("talks/deck.html"), None),
            PathBuf::from("talks/deck.pptx")
        );
        assert_eq!(
            get_output_path(Path::new("deck.html"), Some(Path::new("out/final.pptx"))),
            PathBuf::from("out/final.pptx")
        );
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let result = run_convert(&dir.path().join("absent.html"), None, false);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_slides_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input =
            write_input(dir.path(), "empty.html", "<html><body><div>No slides</div></body></html>");

        let err = run_convert(&input, None, false).unwrap_err();
        assert!(err.to_string().contains("No slides found"));
        assert!(!dir.path().join("empty.pptx").exists());
    }

    #[test]
    fn test_convert_deck() {
        let dir = TempDir::new().unwrap();
        let html = format!(
            r#"<html><head><style>:root {{ --accent: #123456; --font-display: 'Inter', sans-serif; }}</style></head>
            <body>
              <section class="slide title-slide"><h1>Launch Plan</h1><h2>Q3 review</h2></section>
              <section class="slide">
                <h2>Agenda</h2>
                <ul><li>Goals</li><li>Timeline</li></ul>
                <img src="data:image/png;base64,{}" alt="pixel">
                <div class="speaker-notes">Keep it short</div>
              </section>
            </body></html>"#,
            PIXEL_PNG
        );
        let input = write_input(dir.path(), "deck.html", &html);
        let output = dir.path().join("nested/out/deck.pptx");

        let summary = run_convert(&input, Some(&output), true).unwrap();
        assert_eq!(summary.output, output);
        assert!(output.is_file());
        assert_eq!(summary.slides, 2);
        assert!(summary.size_bytes > 0);
        assert_eq!(summary.report.slides_written, 2);
        assert_eq!(summary.report.images_placed, 1);
        assert_eq!(summary.report.notes_attached, 1);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("_temp_image_"))
            .collect();
        assert!(leftovers.is_empty());

        let outlines = OutlineReader::new().read_path(&output).unwrap();
        assert_eq!(outlines[0].lines[0], "Launch Plan");
        assert_eq!(outlines[1].picture_count, 1);
        assert_eq!(outlines[1].notes.as_deref(), Some("Keep it short"));
    }

    #[test]
    fn test_non_html_extension_still_converts() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            dir.path(),
            "deck.txt",
            r#"<section class="slide"><h1>Only</h1></section>"#,
        );

        let summary = run_convert(&input, None, false).unwrap();
        assert_eq!(summary.output, dir.path().join("deck.pptx"));
        assert_eq!(summary.slides, 1);
    }
}
