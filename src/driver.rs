//! File and directory handling around [`crate::compile`].

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::error::CompileError;
use crate::lexer::Tokenizer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Emit {
    #[default]
    Vm,
    /// Flat `<tokens>` XML.
    Tokens,
    /// Parse-tree XML.
    Tree,
}

impl Emit {
    pub fn from_flags(tokens: bool, xml: bool) -> Self {
        match (tokens, xml) {
            (_, true) => Emit::Tree,
            (true, false) => Emit::Tokens,
            (false, false) => Emit::Vm,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Outputs go next to their sources when unset.
    pub out_dir: Option<PathBuf>,
    pub emit: Emit,
    /// Stop at the first failing file of a directory.
    pub fail_fast: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    #[error("{} is not a .jack file", .0.display())]
    NotJackFile(PathBuf),
    #[error("no .jack files in {}", .0.display())]
    NoSources(PathBuf),
    #[error("{}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: io::Error },
    #[error("{}: {}", .path.display(), .source)]
    Compile { path: PathBuf, source: CompileError },
    #[error("{failed} of {total} files failed to compile")]
    Failed { failed: usize, total: usize },
}

fn is_jack_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jack")
}

/// A single `.jack` file, or every `.jack` file directly inside a directory,
/// sorted by name.
pub fn collect_sources(path: &Path) -> Result<Vec<PathBuf>, DriverError> {
    if !path.is_dir() {
        if !is_jack_file(path) {
            return Err(DriverError::NotJackFile(path.to_path_buf()));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let io_error = |source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut sources = vec![];
    for entry in fs::read_dir(path).map_err(io_error)? {
        let source = entry.map_err(io_error)?.path();
        if source.is_file() && is_jack_file(&source) {
            sources.push(source);
        }
    }
    if sources.is_empty() {
        return Err(DriverError::NoSources(path.to_path_buf()));
    }
    sources.sort();
    Ok(sources)
}

/// `Foo.jack` becomes `Foo.vm`, `FooT.xml` for the token dump or `Foo.xml` for
/// the parse tree.
pub fn output_path(source: &Path, options: &Options) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    let file_name = match options.emit {
        Emit::Vm => format!("{}.vm", stem),
        Emit::Tokens => format!("{}T.xml", stem),
        Emit::Tree => format!("{}.xml", stem),
    };
    let dir = match &options.out_dir {
        Some(dir) => dir.as_path(),
        None => source.parent().unwrap_or(Path::new("")),
    };
    dir.join(file_name)
}

fn write_file(path: &Path, contents: &str) -> Result<(), DriverError> {
    fs::write(path, contents).map_err(|e| DriverError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Compiles one source file and returns the path of the written output.
pub fn compile_file(source: &Path, options: &Options) -> Result<PathBuf, DriverError> {
    let compile_error = |e: CompileError| DriverError::Compile {
        path: source.to_path_buf(),
        source: e,
    };
    let input = fs::read_to_string(source).map_err(|e| DriverError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    let output = output_path(source, options);
    debug!("{} -> {}", source.display(), output.display());

    match options.emit {
        Emit::Vm => {
            // a lexical error must not leave an empty .vm file behind
            let tokenizer = Tokenizer::new(&input).map_err(|e| compile_error(e.into()))?;
            let out = File::create(&output).map_err(|e| DriverError::Io {
                path: output.clone(),
                source: e,
            })?;
            crate::compile_tokens(tokenizer, BufWriter::new(out)).map_err(compile_error)?;
        }
        Emit::Tokens => {
            let xml = crate::tokenize_to_xml(&input).map_err(compile_error)?;
            write_file(&output, &xml)?;
        }
        Emit::Tree => {
            let xml = crate::parse_tree_to_xml(&input).map_err(compile_error)?;
            write_file(&output, &xml)?;
        }
    }

    info!("wrote {}", output.display());
    Ok(output)
}

/// Compiles a file or a directory. In a directory every file is attempted
/// unless `fail_fast` is set; failures are logged one by one and summed up in
/// [`DriverError::Failed`].
pub fn compile_path(path: &Path, options: &Options) -> Result<Vec<PathBuf>, DriverError> {
    let sources = collect_sources(path)?;
    if let Some(dir) = &options.out_dir {
        fs::create_dir_all(dir).map_err(|e| DriverError::Io {
            path: dir.clone(),
            source: e,
        })?;
    }

    if !path.is_dir() {
        return Ok(vec![compile_file(path, options)?]);
    }

    let mut outputs = vec![];
    let mut failed = 0;
    for source in &sources {
        match compile_file(source, options) {
            Ok(output) => outputs.push(output),
            Err(e) if options.fail_fast => return Err(e),
            Err(e) => {
                error!("{}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(DriverError::Failed {
            failed,
            total: sources.len(),
        });
    }
    Ok(outputs)
}
