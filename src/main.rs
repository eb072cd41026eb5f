use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use tocfront_pdf::Report;

#[derive(Parser)]
#[command(version, about = "Generate a sectioned PDF report with a front table of contents")]
struct Cli {
    /// Output PDF path
    output: PathBuf,

    /// Section title, repeatable. Each section starts on its own page.
    #[arg(short, long = "section")]
    sections: Vec<String>,

    /// Body paragraphs to add to every section
    #[arg(short, long, default_value_t = 1)]
    paragraphs: u32,

    /// Write content streams without Flate compression
    #[arg(long)]
    uncompressed: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let titles = if cli.sections.is_empty() {
        vec!["Page 1".to_string(), "Page 2".to_string(), "Page 3".to_string()]
    } else {
        cli.sections
    };

    let mut report = Report::new();
    report.set_compression(!cli.uncompressed);
    for title in &titles {
        report.add_section(title);
        for n in 1..=cli.paragraphs {
            report.add_paragraph(format!("This is paragraph {n} of the section \"{title}\"."));
        }
    }

    if let Err(e) = report.write_to(&cli.output) {
        eprintln!("Error: {e}");
        exit(1);
    }
}
