use clap::Parser;
use css_inliner_lib::{css_inline, InlineOptions};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "css_inliner")]
#[command(about = "Move <style> rules into inline style attributes")]
struct Args {
    /// The path of the input html file.
    #[arg(long)]
    input_html: PathBuf,

    /// The path of the output html file.
    #[arg(long)]
    output_html: PathBuf,

    /// Hides the warnings logged for CSS that could not be parsed. Errors that
    /// stop the run are printed either way.
    #[arg(long)]
    silent: bool,
}

fn main() {
    // parse the args given in terminal
    let args: Args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.silent {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        })
        .format_timestamp(None)
        .init();

    let options = InlineOptions {
        silent: args.silent,
    };
    if let Err(e) = css_inline::inline_file(&args.input_html, &args.output_html, &options) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
