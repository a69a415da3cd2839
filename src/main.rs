use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use serde::Deserialize;
use simplelog::{Config, WriteLogger};

use versicle::highlight::Highlight;
use versicle::notes::Note;
use versicle::render::RenderedNode;
use versicle::session::ChapterSession;
use versicle::settings;
use versicle::Chapter;

/// Inspect a chapter payload: select verses, apply an optimistic highlight
/// and print the reconstructed passage the way the reading UI would see it.
#[derive(Parser)]
#[command(name = "versicle", version)]
struct Cli {
    /// Chapter JSON file (content tree plus optional highlights and notes)
    chapter: PathBuf,

    /// Verse ids to select, in activation order
    #[arg(short, long = "select", value_name = "VERSE_ID")]
    select: Vec<String>,

    /// Hex color for an optimistic highlight over the selection
    #[arg(long, value_name = "HEX")]
    highlight: Option<String>,

    /// Print the rendered node outline
    #[arg(long)]
    outline: bool,

    /// Log file path
    #[arg(long, default_value = "versicle.log")]
    log_file: PathBuf,
}

/// On-disk shape of a chapter payload: the chapter itself plus the overlay
/// lists its collaborators would deliver alongside it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterFile {
    #[serde(flatten)]
    chapter: Chapter,
    #[serde(default)]
    highlights: Vec<Highlight>,
    #[serde(default)]
    notes: Vec<Note>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create(&cli.log_file).context("Failed to create log file")?,
    )
    .context("Failed to initialize logger")?;
    settings::load();

    let raw = fs::read_to_string(&cli.chapter)
        .with_context(|| format!("Failed to read {}", cli.chapter.display()))?;
    let payload: ChapterFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", cli.chapter.display()))?;

    info!(
        "loaded chapter {} ({} persisted highlights, {} notes)",
        payload.chapter.id,
        payload.highlights.len(),
        payload.notes.len()
    );

    let mut session = ChapterSession::new(payload.chapter, payload.highlights, payload.notes);
    for verse_id in &cli.select {
        session.toggle_verse(verse_id);
    }

    if let Some(color) = &cli.highlight {
        match session.highlight_selection(color)? {
            Some((seq, request)) => info!("would send {request:?} (pending seq {seq})"),
            None => eprintln!("--highlight given but no verses selected"),
        }
    }

    let title = session.selected_title();
    if !title.is_empty() {
        println!("{title}");
        println!("{}", session.selected_text());
        println!();
    }

    let resolved = session.overlay().resolved();
    if !resolved.is_empty() {
        println!("overlay:");
        let mut entries: Vec<_> = resolved.iter().collect();
        entries.sort();
        for (verse_id, color) in entries {
            println!("  {verse_id} -> {color}");
        }
    }

    if cli.outline {
        println!("outline:");
        for node in session.render() {
            print_outline(&node, 1);
        }
    }

    Ok(())
}

fn print_outline(node: &RenderedNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let text = node
        .text
        .as_deref()
        .map(|t| format!(" {t:?}"))
        .unwrap_or_default();
    let overlay = node
        .overlay
        .as_deref()
        .map(|c| format!(" [{c}]"))
        .unwrap_or_default();
    println!("{indent}{:?} {}{text}{overlay}", node.kind, node.id);
    for child in &node.children {
        print_outline(child, depth + 1);
    }
}
