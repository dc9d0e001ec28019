use std::fmt;

use phf::phf_map;

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "constructor" => Keyword::Constructor,
    "function" => Keyword::Function,
    "method" => Keyword::Method,
    "field" => Keyword::Field,
    "static" => Keyword::Static,
    "var" => Keyword::Var,
    "int" => Keyword::Int,
    "char" => Keyword::Char,
    "boolean" => Keyword::Boolean,
    "void" => Keyword::Void,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
};

pub(super) static SYMBOLS: phf::Set<char> = phf::phf_set! {
    '{', '}', '(', ')', '[', ']', '.', ',', ';',
    '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
};

static OPERATORS: phf::Map<char, BinaryOp> = phf_map! {
    '+' => BinaryOp::Add,
    '-' => BinaryOp::Sub,
    '*' => BinaryOp::Mul,
    '/' => BinaryOp::Div,
    '&' => BinaryOp::And,
    '|' => BinaryOp::Or,
    '<' => BinaryOp::LessThan,
    '>' => BinaryOp::GreaterThan,
    '=' => BinaryOp::Equal,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Function => "function",
            Keyword::Method => "method",
            Keyword::Field => "field",
            Keyword::Static => "static",
            Keyword::Var => "var",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }

    pub fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS.get(word).copied()
    }
}

/// The binary operators of an expression. There are no precedence levels:
/// `a + b * c` is `(a + b) * c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    LessThan,
    GreaterThan,
    Equal,
}

impl BinaryOp {
    pub fn from_symbol(c: char) -> Option<BinaryOp> {
        OPERATORS.get(&c).copied()
    }
}

/// Token category, without the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    Keyword,
    Symbol,
    IntegerConstant,
    StringConstant,
    Identifier,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenType::Keyword => "keyword",
            TokenType::Symbol => "symbol",
            TokenType::IntegerConstant => "integer constant",
            TokenType::StringConstant => "string constant",
            TokenType::Identifier => "identifier",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(char),
    IntegerConstant(u32),
    /// Contents between the quotes.
    StringConstant(String),
    Identifier(String),
}

impl TokenKind {
    pub fn token_type(&self) -> TokenType {
        match self {
            TokenKind::Keyword(_) => TokenType::Keyword,
            TokenKind::Symbol(_) => TokenType::Symbol,
            TokenKind::IntegerConstant(_) => TokenType::IntegerConstant,
            TokenKind::StringConstant(_) => TokenType::StringConstant,
            TokenKind::Identifier(_) => TokenType::Identifier,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text, quotes included for string constants.
    pub lexeme: String,
    pub line: usize,
}
