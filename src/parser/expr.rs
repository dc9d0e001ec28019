use std::io::Write;

use crate::codegen::{Command, Segment};
use crate::error::SemanticErrorKind;
use crate::lexer::{BinaryOp, Keyword, TokenType};

use super::{parser::Result, Parser};

const PRIMITIVE_TYPES: [&str; 3] = ["int", "char", "boolean"];

impl<W: Write> Parser<W> {
    /// expression = term (op term)*
    ///
    /// Operators have no precedence and group strictly left to right.
    pub(super) fn compile_expression(&mut self) -> Result<()> {
        self.compile_term()?;
        loop {
            self.advance()?;
            let Some(op) = self.tokenizer.op() else {
                self.tokenizer.push_back();
                return Ok(());
            };
            self.compile_term()?;
            self.write_binary_op(op)?;
        }
    }

    fn write_binary_op(&mut self, op: BinaryOp) -> Result<()> {
        match op {
            BinaryOp::Add => self.writer.write_arithmetic(Command::Add)?,
            BinaryOp::Sub => self.writer.write_arithmetic(Command::Sub)?,
            BinaryOp::And => self.writer.write_arithmetic(Command::And)?,
            BinaryOp::Or => self.writer.write_arithmetic(Command::Or)?,
            BinaryOp::LessThan => self.writer.write_arithmetic(Command::Lt)?,
            BinaryOp::GreaterThan => self.writer.write_arithmetic(Command::Gt)?,
            BinaryOp::Equal => self.writer.write_arithmetic(Command::Eq)?,
            BinaryOp::Mul => self.writer.write_call("Math.multiply", 2)?,
            BinaryOp::Div => self.writer.write_call("Math.divide", 2)?,
        }
        Ok(())
    }

    /// term = integerConstant | stringConstant | keywordConstant
    ///      | varName | varName "[" expression "]" | subroutineCall
    ///      | "(" expression ")" | ("-" | "~") term
    fn compile_term(&mut self) -> Result<()> {
        match self.advance()? {
            TokenType::IntegerConstant => {
                let value = self.tokenizer.int_val()?;
                self.writer.write_push(Segment::Constant, value as usize)?;
            }
            TokenType::StringConstant => {
                // filling in the characters is left to the runtime
                let len = self.tokenizer.string_val()?.chars().count();
                self.writer.write_push(Segment::Constant, len)?;
                self.writer.write_call("String.new", 1)?;
            }
            TokenType::Keyword => match self.tokenizer.keyword()? {
                Keyword::True => {
                    self.writer.write_push(Segment::Constant, 0)?;
                    self.writer.write_arithmetic(Command::Not)?;
                }
                Keyword::False | Keyword::Null => {
                    self.writer.write_push(Segment::Constant, 0)?;
                }
                Keyword::This => {
                    self.writer.write_push(Segment::Pointer, 0)?;
                }
                _ => return Err(self.unexpected("a term")),
            },
            TokenType::Symbol => match self.tokenizer.symbol()? {
                '(' => {
                    self.compile_expression()?;
                    self.expect_symbol(')')?;
                }
                c @ ('-' | '~') => {
                    self.compile_term()?;
                    let command = if c == '-' { Command::Neg } else { Command::Not };
                    self.writer.write_arithmetic(command)?;
                }
                _ => return Err(self.unexpected("a term")),
            },
            TokenType::Identifier => {
                let name = self.tokenizer.identifier()?.to_string();
                self.compile_identifier_term(&name)?;
            }
        }
        Ok(())
    }

    /// varName | varName "[" expression "]" | subroutineCall
    fn compile_identifier_term(&mut self, name: &str) -> Result<()> {
        self.advance()?;
        match self.tokenizer.symbol() {
            Ok('[') => {
                let (segment, index) = self.resolve_variable(name)?;
                self.writer.write_push(segment, index)?;
                self.compile_expression()?;
                self.expect_symbol(']')?;
                self.writer.write_arithmetic(Command::Add)?;
                self.writer.write_pop(Segment::Pointer, 1)?;
                self.writer.write_push(Segment::That, 0)?;
            }
            Ok('(' | '.') => {
                self.tokenizer.push_back();
                self.compile_subroutine_call(name)?;
            }
            _ => {
                self.tokenizer.push_back();
                let (segment, index) = self.resolve_variable(name)?;
                self.writer.write_push(segment, index)?;
            }
        }
        Ok(())
    }

    /// subroutineCall = subroutineName "(" expressionList ")"
    ///                | (className | varName) "." subroutineName "(" expressionList ")"
    ///
    /// `name` has already been consumed.
    pub(super) fn compile_subroutine_call(&mut self, name: &str) -> Result<()> {
        self.advance()?;
        match self.tokenizer.symbol() {
            Ok('(') => {
                // implicit call on the current object
                self.writer.write_push(Segment::Pointer, 0)?;
                let n_args = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                let target = format!("{}.{}", self.class_name, name);
                self.writer.write_call(&target, n_args + 1)?;
            }
            Ok('.') => {
                let subroutine = self.expect_identifier("a subroutine name")?;
                let receiver_type = self.symbols.type_of(name).map(str::to_string);
                let (target, receivers) = match receiver_type {
                    Some(ty) if PRIMITIVE_TYPES.contains(&ty.as_str()) => {
                        return Err(self.semantic(SemanticErrorKind::PrimitiveCallTarget {
                            name: name.to_string(),
                            ty,
                        }));
                    }
                    Some(ty) => {
                        let (segment, index) = self.resolve_variable(name)?;
                        self.writer.write_push(segment, index)?;
                        (format!("{}.{}", ty, subroutine), 1)
                    }
                    None => (format!("{}.{}", name, subroutine), 0),
                };

                self.expect_symbol('(')?;
                let n_args = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.writer.write_call(&target, n_args + receivers)?;
            }
            _ => return Err(self.unexpected("'(' or '.'")),
        }
        Ok(())
    }

    /// expressionList = (expression ("," expression)*)?
    ///
    /// Returns the number of expressions.
    fn compile_expression_list(&mut self) -> Result<usize> {
        if self.peek_symbol(')')? {
            return Ok(0);
        }
        self.compile_expression()?;
        let mut count = 1;
        while self.consume_symbol(',')? {
            self.compile_expression()?;
            count += 1;
        }
        Ok(count)
    }
}
