use std::io;

use anyhow::Context;
use clap::Parser;
use log::info;

use jack2vm::cli::{Cli, Mode};
use jack2vm::driver::{self, Emit, Options};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match cli.mode {
        Mode::Build {
            path,
            out_dir,
            tokens,
            xml,
            fail_fast,
        } => {
            let options = Options {
                out_dir,
                emit: Emit::from_flags(tokens, xml),
                fail_fast,
            };
            let outputs = driver::compile_path(&path, &options)?;
            info!("{} file(s) written", outputs.len());
        }
        Mode::Emit {
            source,
            tokens,
            xml,
        } => {
            let input = source.contents().context("failed to read the source")?;
            match Emit::from_flags(tokens, xml) {
                Emit::Vm => {
                    jack2vm::compile(&input, io::stdout().lock())?;
                }
                Emit::Tokens => print!("{}", jack2vm::tokenize_to_xml(&input)?),
                Emit::Tree => print!("{}", jack2vm::parse_tree_to_xml(&input)?),
            }
        }
    }

    Ok(())
}
