use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_stdin::FileOrStdin;
use log::LevelFilter;

#[derive(Parser)]
#[command(
    name = "jack2vm",
    version,
    about = "Compiles Jack classes to stack-machine VM code"
)]
pub struct Cli {
    /// More logging: -v info, -vv debug, -vvv trace. RUST_LOG still applies.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand)]
pub enum Mode {
    /// Compile a .jack file, or every .jack file in a directory
    Build {
        /// Source file or directory
        path: PathBuf,
        /// Write outputs here instead of next to the sources
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Write the token stream as XML instead of VM code
        #[arg(long)]
        tokens: bool,
        /// Write the parse tree as XML instead of VM code
        #[arg(long, conflicts_with = "tokens")]
        xml: bool,
        /// Stop at the first file that fails to compile
        #[arg(long)]
        fail_fast: bool,
    },
    /// Compile one class from a file or stdin and print the result
    Emit {
        /// Source file, or "-" for stdin
        #[arg(default_value = "-")]
        source: FileOrStdin,
        /// Print the token stream as XML instead of VM code
        #[arg(long)]
        tokens: bool,
        /// Print the parse tree as XML instead of VM code
        #[arg(long, conflicts_with = "tokens")]
        xml: bool,
    },
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
