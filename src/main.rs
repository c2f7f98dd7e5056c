//! CLI tool for extracting attachments from PDF documents.
//!
//! This binary is a thin boundary over the pdfattach crate: it reads a PDF
//! from disk, runs the extraction pipeline against a directory-backed
//! artifact store, prints textual attachments and reports the names stored
//! artifacts can later be retrieved under.

use pdfattach::{AttachmentExtractor, AttachmentOutcome, DirStore, Result};
use std::{env, fs, process};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let mut pdf_path: Option<&str> = None;
    let mut output_dir = "artifacts";
    let mut password: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--password" | "-p" => {
                if i + 1 >= args.len() {
                    eprintln!("❌ --password needs a value");
                    process::exit(1);
                }
                password = Some(args[i + 1].as_str());
                i += 2;
            }
            arg => {
                if pdf_path.is_none() {
                    pdf_path = Some(arg);
                } else {
                    output_dir = arg;
                }
                i += 1;
            }
        }
    }

    let Some(pdf_path) = pdf_path else {
        print_usage(&args[0]);
        process::exit(1);
    };

    match run_extraction(pdf_path, output_dir, password) {
        Ok(()) => println!("\n✅ Extraction completed successfully!"),
        Err(e) => {
            eprintln!("\n❌ Error: {}", e);
            process::exit(1);
        }
    }
}

fn print_usage(program_name: &str) {
    println!("📄 pdfattach - PDF Attachment Extraction Tool");
    println!();
    println!("USAGE:");
    println!("    {} <pdf_file> [output_dir] [--password <pw>]", program_name);
    println!();
    println!("ARGUMENTS:");
    println!("    <pdf_file>        Path to the PDF file to process");
    println!("    [output_dir]      Directory for stored artifacts (default: 'artifacts')");
    println!();
    println!("OPTIONS:");
    println!("    -p, --password    Password for protected documents");
    println!("    -h, --help        Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    {} report.pdf", program_name);
    println!("    {} statement.pdf ./out --password hunter2", program_name);
    println!();
    println!("This tool will:");
    println!("  • Open the PDF (authenticating if a password is given)");
    println!("  • Enumerate every attachment, in table order");
    println!("  • Print textual attachments inline");
    println!("  • Store nested PDFs under the output directory for retrieval");
}

fn run_extraction(pdf_path: &str, output_dir: &str, password: Option<&str>) -> Result<()> {
    println!("🔍 Processing PDF: {}", pdf_path);
    println!("📁 Artifact directory: {}", output_dir);
    println!("{}", "─".repeat(60));

    let bytes = fs::read(pdf_path)?;
    let store = DirStore::open(output_dir)?;
    let extractor = AttachmentExtractor::new();

    let outcomes = extractor.extract(&bytes, password, &store)?;

    println!("📎 Found {} attachment(s)\n", outcomes.len());

    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            AttachmentOutcome::Text { content } => {
                println!("📄 Attachment #{}: text ({} chars)", i, content.chars().count());
                println!("{content}");
            }
            AttachmentOutcome::Artifact { name } => {
                println!("📦 Attachment #{}: nested PDF stored as '{}'", i, name);
            }
            AttachmentOutcome::Error { reason } => {
                println!("⚠️  Attachment #{}: {}", i, reason);
            }
        }
    }

    println!("\n{}", "─".repeat(60));
    let stored = outcomes.iter().filter(|o| o.artifact_name().is_some()).count();
    let failed = outcomes.iter().filter(|o| o.is_error()).count();
    println!("📊 Summary:");
    println!("   • {} attachment(s) total", outcomes.len());
    println!("   • {} stored for retrieval in '{}'", stored, output_dir);
    if failed > 0 {
        println!("   • {} failed", failed);
    }

    Ok(())
}
