use super::{Token, TokenKind};

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '&' => escaped.push_str("&amp;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// One terminal element, e.g. `<keyword> class </keyword>`. String constants
/// appear without their quotes.
pub fn element(token: &Token) -> String {
    let (tag, text) = match &token.kind {
        TokenKind::Keyword(k) => ("keyword", k.as_str().to_string()),
        TokenKind::Symbol(c) => ("symbol", c.to_string()),
        TokenKind::IntegerConstant(_) => ("integerConstant", token.lexeme.clone()),
        TokenKind::StringConstant(s) => ("stringConstant", s.clone()),
        TokenKind::Identifier(name) => ("identifier", name.clone()),
    };
    format!("<{tag}> {} </{tag}>", escape(&text))
}

/// Renders a flat token stream as `<tokens>` XML, one element per line.
pub fn tokens_to_xml(tokens: &[Token]) -> String {
    let mut xml = String::from("<tokens>\n");
    for token in tokens {
        xml.push_str(&element(token));
        xml.push('\n');
    }
    xml.push_str("</tokens>\n");
    xml
}
