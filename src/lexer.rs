//! Tokenizer for ctx scripts.
//!
//! The token grammar is small: a fixed set of punctuation symbols, quoted
//! strings with backslash escapes, and bare strings (maximal runs of
//! non-whitespace, non-special characters). A bare run that is exactly `o` is
//! the composition operator.
//!
//! ```text
//! f(id="o1") -> (g)
//! Str LParen Str Equals Quoted RParen Arrow LParen Str RParen
//! ```
//!
//! Malformed input does not panic: the lexer emits a single
//! [`TokenKind::Error`] token and stops. Callers (the parser) check for it.

use std::fmt;

/// Characters that always terminate a bare string.
const SPECIAL: &[char] = &[',', '=', ';', '[', ']', '{', '}', '(', ')', '$', '"'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Comma,
    Equals,
    Semicolon,
    /// The binary composition operator `o`.
    Compose,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Dollar,
    Arrow,
    /// A bare (unquoted) string.
    Str(String),
    /// A quoted string with escapes already removed.
    Quoted(String),
    /// Malformed input; carries a description.
    Error(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Equals => f.write_str("'='"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Compose => f.write_str("'o'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Dollar => f.write_str("'$'"),
            TokenKind::Arrow => f.write_str("'->'"),
            TokenKind::Str(s) => write!(f, "string '{s}'"),
            TokenKind::Quoted(s) => write!(f, "quoted string \"{s}\""),
            TokenKind::Error(msg) => write!(f, "error ({msg})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character of the token.
    pub offset: usize,
}

/// Tokenize `input`.
///
/// The returned vector ends with an `Error` token if the input is malformed.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(c) = rest.chars().next() else { break };

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        let symbol = match c {
            ',' => Some(TokenKind::Comma),
            '=' => Some(TokenKind::Equals),
            ';' => Some(TokenKind::Semicolon),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '$' => Some(TokenKind::Dollar),
            _ => None,
        };
        if let Some(kind) = symbol {
            tokens.push(Token { kind, offset: pos });
            pos += 1;
            continue;
        }

        if rest.starts_with("->") {
            tokens.push(Token { kind: TokenKind::Arrow, offset: pos });
            pos += 2;
            continue;
        }

        if c == '"' {
            match regex!(r#"^"(?:[^"\\]|\\.)*""#).find(rest) {
                Some(m) => {
                    let raw = &rest[1..m.end() - 1];
                    tokens.push(Token { kind: TokenKind::Quoted(unescape(raw)), offset: pos });
                    pos += m.end();
                }
                None => {
                    tokens.push(Token { kind: TokenKind::Error("unterminated string".to_string()), offset: pos });
                    return tokens;
                }
            }
            continue;
        }

        let run = bare_run(rest);
        if run.is_empty() {
            tokens.push(Token { kind: TokenKind::Error(format!("unexpected character '{c}'")), offset: pos });
            return tokens;
        }
        let kind = if run == "o" { TokenKind::Compose } else { TokenKind::Str(run.to_string()) };
        tokens.push(Token { kind, offset: pos });
        pos += run.len();
    }

    tokens
}

/// The longest bare-string prefix of `rest`, stopping before any `->`.
fn bare_run(rest: &str) -> &str {
    let Some(m) = regex!(r#"^[^\s,=;\[\]{}()$"]+"#).find(rest) else {
        return "";
    };
    let run = m.as_str();
    match run.find("->") {
        Some(idx) => &run[..idx],
        None => run,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Quote `s` so that [`tokenize`] reads it back as the same `Quoted` token.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// True when `s` would lex back as a single bare `Str` token.
pub fn is_bare(s: &str) -> bool {
    !s.is_empty()
        && s != "o"
        && !s.contains("->")
        && !s.chars().any(|c| c.is_whitespace() || SPECIAL.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn punctuation_and_strings() {
        assert_eq!(
            kinds("f(a=\"x y\", [v]) -> ${r};"),
            vec![
                TokenKind::Str("f".into()),
                TokenKind::LParen,
                TokenKind::Str("a".into()),
                TokenKind::Equals,
                TokenKind::Quoted("x y".into()),
                TokenKind::Comma,
                TokenKind::LBracket,
                TokenKind::Str("v".into()),
                TokenKind::RBracket,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Dollar,
                TokenKind::LBrace,
                TokenKind::Str("r".into()),
                TokenKind::RBrace,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn compose_only_for_lone_o() {
        assert_eq!(
            kinds("f o g oo"),
            vec![
                TokenKind::Str("f".into()),
                TokenKind::Compose,
                TokenKind::Str("g".into()),
                TokenKind::Str("oo".into()),
            ]
        );
    }

    #[test]
    fn arrow_splits_bare_run() {
        assert_eq!(kinds("a->b"), vec![TokenKind::Str("a".into()), TokenKind::Arrow, TokenKind::Str("b".into())]);
        assert_eq!(kinds("depth<3"), vec![TokenKind::Str("depth<3".into())]);
    }

    #[test]
    fn escaped_quotes_are_unescaped() {
        assert_eq!(kinds(r#""say \"hi\" \\ ok""#), vec![TokenKind::Quoted(r#"say "hi" \ ok"#.into())]);
    }

    #[test]
    fn unterminated_string_yields_error_token() {
        let tokens = tokenize("f(\"abc");
        let last = tokens.last().unwrap();
        assert!(matches!(last.kind, TokenKind::Error(_)));
        assert_eq!(last.offset, 2);
    }

    #[test]
    fn quote_round_trips_through_lexer() {
        for s in ["plain", "with space", "q\"uote", "back\\slash", ""] {
            assert_eq!(kinds(&quote(s)), vec![TokenKind::Quoted(s.to_string())]);
        }
    }

    #[test]
    fn bare_detection() {
        assert!(is_bare("abc_1.5"));
        assert!(!is_bare("o"));
        assert!(!is_bare("a b"));
        assert!(!is_bare("a->b"));
        assert!(!is_bare(""));
    }
}
