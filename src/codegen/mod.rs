mod vm_writer;

pub use vm_writer::*;
