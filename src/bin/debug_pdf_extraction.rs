use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::Path;
use std::process;

use resume_extract::{
    config::Config,
    extraction::{repair, SourceDocument, TextExtractor},
};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("info")
                .add_directive("lopdf=error".parse().unwrap())
                .add_directive("resume_extract=info".parse().unwrap())
        });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    let matches = Command::new("debug_pdf_extraction")
        .about("Run the resume extraction pipeline on one file and report what happened")
        .arg(
            Arg::new("file")
                .help("PDF or text file to extract")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("no-ocr")
                .help("Disable the OCR fallback stage")
                .long("no-ocr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("preview")
                .help("Number of characters of extracted text to print")
                .long("preview")
                .short('p')
                .value_name("CHARS")
                .value_parser(clap::value_parser!(usize))
                .default_value("500"),
        )
        .arg(
            Arg::new("repair")
                .help("Treat the file as raw text and only run the repair passes")
                .long("repair-only")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let file = matches
        .get_one::<String>("file")
        .context("missing file argument")?;
    let preview_chars = matches.get_one::<usize>("preview").copied().unwrap_or(500);
    let path = Path::new(file);

    if tokio::fs::metadata(path).await.is_err() {
        eprintln!("Error: File '{}' not found", file);
        process::exit(1);
    }

    if matches.get_flag("repair") {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", file))?;
        println!("{}", repair::repair(&raw));
        return Ok(());
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let mut extraction_config = config.extraction();
    if matches.get_flag("no-ocr") {
        extraction_config.ocr_enabled = false;
    }

    let document = SourceDocument::open(path).await?;
    println!(
        "Extracting {} ({} bytes, .{})",
        file,
        document.bytes().len(),
        document.extension()
    );

    let extractor = TextExtractor::new(extraction_config);
    match extractor.extract_with_stats(&document).await {
        Ok(extracted) => {
            println!("\n=== Stats ===");
            println!("{}", serde_json::to_string_pretty(&extracted.stats)?);
            println!("\n=== Preview ===");
            println!(
                "{}",
                extracted.text.chars().take(preview_chars).collect::<String>()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("\nExtraction failed [{}]: {}", e.error_code(), e);
            if e.is_user_facing() {
                eprintln!("(this failure would be reported to the uploader)");
            }
            process::exit(2);
        }
    }
}
