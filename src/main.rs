use std::path::PathBuf;

use anyhow::ensure;
use clap::Parser;

use ppdiff::{Comparator, CompareOptions};

/// Separates the main stream from the footnote stream on stdout.
const FOOTNOTE_SENTINEL: &str = "===== footnotes =====";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The two files to compare (one with --simple-html).
    files: Vec<PathBuf>,

    /// Comparison options.
    #[command(flatten)]
    options: CompareOptions,
}

fn print_side(label: &str, side: &ppdiff::SideOutput) {
    println!("===== {label} =====");
    print!("{}", side.main);
    if !side.main.ends_with('\n') {
        println!();
    }
    if !side.footnotes.is_empty() {
        println!("{FOOTNOTE_SENTINEL}");
        println!("{}", side.footnotes);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("ppdiff=warn"))
        .init();

    let args = Args::parse();
    let comparator = Comparator::new(args.options.clone());

    if args.options.simple_html {
        ensure!(
            args.files.len() == 1,
            "--simple-html takes exactly one input file"
        );
        let side = comparator.process_file(&args.files[0])?;
        print_side(&args.files[0].display().to_string(), &side);
        return Ok(());
    }

    ensure!(args.files.len() == 2, "expected exactly two input files");
    let comparison = comparator.process_pair(&args.files[0], &args.files[1])?;
    print_side(&args.files[0].display().to_string(), &comparison.left);
    print_side(&args.files[1].display().to_string(), &comparison.right);

    Ok(())
}
