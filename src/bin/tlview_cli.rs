//! CLI tool for tlview - renders a timeline scene to static HTML
//!
//! Usage:
//!   tlview_cli <scene.json>              # Output HTML to stdout
//!   tlview_cli <scene.json> -o out.html  # Output HTML to file
//!
//! Set `RUST_LOG=tlview=debug` to see pass summaries.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use tlview::{render_document_html, TimelineDocument};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: tlview_cli <scene.json> [-o output.html]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = if args.len() > 3 && args[2] == "-o" {
        Some(&args[3])
    } else {
        None
    };

    // Read input file
    let json = match fs::read_to_string(input_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    // Parse scene
    let doc = match TimelineDocument::from_json(&json) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error parsing scene: {}", e);
            std::process::exit(1);
        }
    };

    // Render
    let html = match render_document_html(&doc) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error rendering timeline: {}", e);
            std::process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &html) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(html.as_bytes()).unwrap();
        }
    }
}
