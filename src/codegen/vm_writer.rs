use std::fmt;
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(s)
    }
}

/// Zero-operand arithmetic and logical commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Command::Add => "add",
            Command::Sub => "sub",
            Command::Neg => "neg",
            Command::Eq => "eq",
            Command::Gt => "gt",
            Command::Lt => "lt",
            Command::And => "and",
            Command::Or => "or",
            Command::Not => "not",
        };
        f.write_str(s)
    }
}

/// Writes VM commands, one per line, flushing after every line so that an
/// aborted compilation leaves a complete prefix behind.
pub struct VmWriter<W: Write> {
    out: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_raw(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    pub fn write_push(&mut self, segment: Segment, index: usize) -> io::Result<()> {
        self.write_raw(&format!("push {} {}", segment, index))
    }

    pub fn write_pop(&mut self, segment: Segment, index: usize) -> io::Result<()> {
        self.write_raw(&format!("pop {} {}", segment, index))
    }

    pub fn write_arithmetic(&mut self, command: Command) -> io::Result<()> {
        self.write_raw(&command.to_string())
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        self.write_raw(&format!("label {}", label))
    }

    pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
        self.write_raw(&format!("goto {}", label))
    }

    pub fn write_if(&mut self, label: &str) -> io::Result<()> {
        self.write_raw(&format!("if-goto {}", label))
    }

    pub fn write_call(&mut self, name: &str, n_args: usize) -> io::Result<()> {
        self.write_raw(&format!("call {} {}", name, n_args))
    }

    pub fn write_function(&mut self, name: &str, n_locals: usize) -> io::Result<()> {
        self.write_raw(&format!("function {} {}", name, n_locals))
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        self.write_raw("return")
    }

    /// Flushes and hands back the sink. Taking `self` rules out writes after
    /// closing.
    pub fn close(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
