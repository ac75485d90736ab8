//! segmark - Terminal-based audio segment annotation tool.
//!
//! This application splits audio files into fixed-length segments and lets
//! the user label each segment with categorical classes (speaker gender,
//! background sound type, and so on):
//!
//! 1. **Annotator** (optional feature): a terminal UI that walks a folder of
//!    WAV/FLAC files segment by segment, plays each segment, and saves every
//!    checkbox change immediately to a delimited annotation table.
//!
//! 2. **Table tooling**: commands to list, export, and inspect the stored
//!    annotations, plus a batch converter that renders a folder of audio
//!    files to WAV for annotation.
//!
//! The tool is designed for dataset-labeling workflows where a keyboard-only
//! terminal loop is faster than a pointer-driven GUI.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;

mod cli;

#[cfg(feature = "annotator")]
mod annotator;

#[derive(Parser)]
#[command(name = "segmark")]
#[command(about = "Terminal-based audio segment annotation and labeling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize segmark configuration
    Init,
    /// Show current configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Label audio segments in a folder with the interactive annotator
    Annotate {
        /// Folder containing audio files (defaults to current directory)
        #[arg(default_value = ".")]
        folder: String,
    },
    /// List stored annotations
    List {
        /// Only show annotations for this audio file name
        #[arg(short, long)]
        audio: Option<String>,
    },
    /// Export the annotation table to another file
    Export {
        /// Output format
        #[arg(short, long, default_value = "json", value_parser = PossibleValuesParser::new(["json", "csv"]))]
        format: String,
        /// Output path (defaults to a datestamped file name)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show the segment table for one audio file
    Segments {
        /// Audio file to inspect
        file: String,
        /// Override the configured window length in milliseconds
        #[arg(long)]
        window_ms: Option<u64>,
    },
    /// Convert a folder of audio files to WAV
    Convert {
        /// Folder containing source audio files
        input: String,
        /// Folder to write WAV files into
        output: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(["annotations_file", "window_ms", "classes"]))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
        Commands::Annotate { folder } => {
            cli::annotate::handle_annotate(&folder)?;
        }
        Commands::List { audio } => {
            cli::list::handle_list(audio.as_deref())?;
        }
        Commands::Export { format, output } => {
            cli::export::handle_export(&format, output.as_deref())?;
        }
        Commands::Segments { file, window_ms } => {
            cli::segments::handle_segments(&file, window_ms)?;
        }
        Commands::Convert { input, output } => {
            cli::convert::handle_convert(&input, &output)?;
        }
    }

    Ok(())
}
