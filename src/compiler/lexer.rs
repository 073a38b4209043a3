use crate::error::ConditionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    And,
    Or,
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Bang => "!",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    Op(Operator),
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset of the first character of the token.
    pub position: usize,
}

fn syntax(position: usize, message: impl Into<String>) -> ConditionError {
    ConditionError::Syntax {
        position,
        message: message.into(),
    }
}

/// Splits a rule string into tokens.
pub fn tokenize(rule: &str) -> Result<Vec<Token>, ConditionError> {
    let chars: Vec<char> = rule.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let start = i;
        let next = chars.get(i + 1).copied();

        let kind = match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '+' => TokenKind::Op(Operator::Plus),
            '-' => TokenKind::Op(Operator::Minus),
            '*' => TokenKind::Op(Operator::Star),
            '/' => TokenKind::Op(Operator::Slash),
            '>' | '<' | '=' | '!' => {
                if next == Some('=') {
                    i += 1;
                    TokenKind::Op(match ch {
                        '>' => Operator::GtEq,
                        '<' => Operator::LtEq,
                        '=' => Operator::Eq,
                        _ => Operator::NotEq,
                    })
                } else {
                    match ch {
                        '>' => TokenKind::Op(Operator::Gt),
                        '<' => TokenKind::Op(Operator::Lt),
                        '!' => TokenKind::Op(Operator::Bang),
                        _ => return Err(syntax(start, "single '=' is not allowed, use '=='")),
                    }
                }
            }
            '&' | '|' => {
                if next == Some(ch) {
                    i += 1;
                    TokenKind::Op(if ch == '&' { Operator::And } else { Operator::Or })
                } else {
                    return Err(syntax(
                        start,
                        format!("single '{}' is not allowed, use '{}{}'", ch, ch, ch),
                    ));
                }
            }
            '"' | '\'' => {
                let quote = ch;
                let mut literal = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        Some(&c) if c == quote => break,
                        Some(&c) => literal.push(c),
                        None => return Err(syntax(start, "unterminated string literal")),
                    }
                    i += 1;
                }
                TokenKind::Str(literal)
            }
            c if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                while i + 1 < chars.len() && (chars[i + 1].is_ascii_digit() || chars[i + 1] == '.')
                {
                    i += 1;
                }
                let text: String = chars[start..=i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| syntax(start, format!("invalid number '{}'", text)))?;
                TokenKind::Number(number)
            }
            c if c.is_alphanumeric() || c == '_' => {
                while i + 1 < chars.len()
                    && (chars[i + 1].is_alphanumeric() || chars[i + 1] == '_' || chars[i + 1] == '.')
                {
                    i += 1;
                }
                let text: String = chars[start..=i].iter().collect();
                if text.ends_with('.') || text.contains("..") {
                    return Err(syntax(start, format!("invalid variable path '{}'", text)));
                }
                TokenKind::Ident(text)
            }
            other => return Err(syntax(start, format!("unexpected character '{}'", other))),
        };

        tokens.push(Token {
            kind,
            position: start,
        });
        i += 1;
    }

    Ok(tokens)
}
