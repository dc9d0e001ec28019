pub mod analyzer;
pub mod cli;
pub mod codegen;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod parser;

use std::io::Write;

use log::debug;

use codegen::VmWriter;
use error::CompileError;
use lexer::{Lexer, Tokenizer};
use parser::{Parser, TreeWriter};

/// Compiles one class to VM code written to `out` and returns the sink.
pub fn compile<W: Write>(user_input: &str, out: W) -> Result<W, CompileError> {
    compile_tokens(Tokenizer::new(user_input)?, out)
}

/// Like [`compile`], over an already tokenized class.
///
/// The sink is flushed on the error path too, so it always holds every
/// instruction emitted before the failure.
pub fn compile_tokens<W: Write>(tokenizer: Tokenizer, out: W) -> Result<W, CompileError> {
    debug!("{} tokens", tokenizer.tokens().len());

    let mut parser = Parser::new(tokenizer, VmWriter::new(out));
    let result = parser.compile_class();
    let out = parser.into_writer().close();

    result?;
    Ok(out?)
}

pub fn compile_to_string(user_input: &str) -> Result<String, CompileError> {
    let out = compile(user_input, Vec::new())?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub fn tokenize_to_xml(user_input: &str) -> Result<String, CompileError> {
    let tokens = Lexer::tokenize(user_input)?;
    Ok(lexer::tokens_to_xml(&tokens))
}

/// Renders the parse tree of one class as nested XML.
pub fn parse_tree_to_xml(user_input: &str) -> Result<String, CompileError> {
    let mut writer = TreeWriter::new(Tokenizer::new(user_input)?, Vec::new());
    writer.compile_class()?;
    let out = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
