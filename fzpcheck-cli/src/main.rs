//! fzpcheck CLI - check Fritzing FZP part files and their SVG graphics from the command line.

use clap::builder::PossibleValuesParser;
use clap::{ArgAction, CommandFactory, Parser};
use fzpcheck::{
    resolve_targets, CheckOptions, CheckSelection, CheckerRunner, FzpCheckError, Targets,
    FZP_CHECKERS, SVG_CHECKERS,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "fzpcheck")]
#[command(about = "Scan FZP files for various checks", long_about = None)]
#[command(version, disable_help_flag = true)]
struct Cli {
    /// Path to FZP file or directory to scan
    #[arg(value_name = "PATH", required_unless_present = "help")]
    path: Option<PathBuf>,

    /// Type(s) of check to run (default: all)
    #[arg(
        short,
        long,
        num_args = 0..,
        default_value = "all",
        value_parser = check_name_parser()
    )]
    checks: Vec<String>,

    /// Path to an SVG file to search for in FZP files
    #[arg(short, long, value_name = "SVG")]
    svg: Option<PathBuf>,

    /// Path to a file containing a list of SVG and FZP files to check
    #[arg(short, long, value_name = "LIST")]
    file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Image name fragment marking a template placeholder (repeatable)
    #[arg(long = "template-marker", value_name = "MARKER")]
    template_markers: Vec<String>,

    /// Copper connectors drawn only by their outline need a wider stroke than this
    #[arg(long, value_name = "WIDTH")]
    min_stroke_width: Option<f64>,

    /// Name of the SVG directory next to the part directories
    #[arg(long, value_name = "DIR")]
    svg_dir: Option<String>,

    /// Show this help message and exit
    #[arg(short, long, action = ArgAction::SetTrue)]
    help: bool,
}

impl Cli {
    fn options(&self) -> CheckOptions {
        let mut options = CheckOptions {
            verbose: self.verbose,
            ..Default::default()
        };
        if !self.template_markers.is_empty() {
            options.layout.template_markers = self.template_markers.clone();
        }
        if let Some(width) = self.min_stroke_width {
            options.min_pcb_stroke_width = width;
        }
        if let Some(dir) = &self.svg_dir {
            options.layout.svg_dir = dir.clone();
        }
        options
    }
}

fn check_name_parser() -> PossibleValuesParser {
    let mut names = vec!["all"];
    names.extend(FZP_CHECKERS.iter().map(|c| c.name));
    names.extend(SVG_CHECKERS.iter().map(|c| c.name));
    PossibleValuesParser::new(names)
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.help {
        print_checks_help();
        process::exit(0);
    }

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            println!("{}", e);
            print_usage();
            -1
        }
    };

    process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32, FzpCheckError> {
    let selection = CheckSelection::from_names(&cli.checks)?;
    let options = cli.options();
    let verbose = options.verbose;

    let Some(root) = cli.path.as_deref() else {
        print_usage();
        return Ok(0);
    };

    let targets = match (&cli.file, &cli.svg) {
        (Some(list), _) => Targets::BatchList(list),
        (None, Some(svg)) => Targets::Svg(svg),
        (None, None) => Targets::Root,
    };
    let files = resolve_targets(root, targets)?;
    tracing::debug!(count = files.len(), "resolved part files");

    if verbose {
        println!("Checking {} FZP files", files.len());
    }

    let mut runner = CheckerRunner::new(root, options);
    let mut total_errors = 0usize;
    for file in files {
        runner.set_path(file);
        total_errors += runner.check(&selection.fzp, &selection.svg)?;
    }

    if verbose || total_errors > 0 {
        println!("Total errors: {}", total_errors);
    }
    Ok(i32::try_from(total_errors).unwrap_or(i32::MAX))
}

fn print_checks_help() {
    println!("\nAvailable FZP checks:");
    for checker in FZP_CHECKERS {
        println!("{}:\n{}\n", checker.name, checker.description);
    }
    println!("Available SVG checks:");
    for checker in SVG_CHECKERS {
        println!("{}:\n{}\n", checker.name, checker.description);
    }
    print_usage();
}

fn print_usage() {
    if let Err(e) = Cli::command().print_help() {
        tracing::warn!("unable to print usage: {}", e);
    }
}
