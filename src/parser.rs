//! Recursive-descent parser for ctx scripts.
//!
//! ```text
//! script     := assignment*                       (separated by ',' or ';')
//! assignment := ['(' mod (',' mod)* ')'] type name '=' term ';'
//!             | name '=' term
//!             | term
//! term       := primary ('o' primary)*
//! primary    := name '(' assignment* ')' ['{' assignment* '}']
//!             | '"' text '"' | bare | '[' name ']' | '$' '{' name '}'
//!             | '{' assignment* '}'
//!             | '(' value (',' value)* ')'
//!             | '(' term ')' '->' '(' term ')'
//! ```

use crate::assignment::{Assignment, AssignmentList};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::obj::{Array, Function, Obj, Rule};

/// Parse a single term.
pub fn parse_obj(input: &str) -> Result<Obj, ParseError> {
    let mut parser = Parser::new(input)?;
    let obj = parser.term()?;
    parser.expect_end()?;
    Ok(obj)
}

/// Parse a whole script: the list of its top-level assignments.
pub fn parse_script(input: &str) -> Result<AssignmentList, ParseError> {
    let mut parser = Parser::new(input)?;
    let list = parser.assignment_list(None)?;
    parser.expect_end()?;
    Ok(list)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(input);
        if let Some(Token { kind: TokenKind::Error(message), offset }) = tokens.last() {
            return Err(ParseError::Lex { offset: *offset, message: message.clone() });
        }
        Ok(Parser { tokens, pos: 0 })
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.offset).unwrap_or_else(|| self.tokens.last().map_or(0, |t| t.offset))
    }

    fn next(&mut self, expected: &str) -> Result<TokenKind, ParseError> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token.kind.clone())
            }
            None => Err(ParseError::UnexpectedEnd { expected: expected.to_string() }),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::Unexpected {
                offset: token.offset,
                expected: expected.to_string(),
                found: token.kind.to_string(),
            },
            None => ParseError::UnexpectedEnd { expected: expected.to_string() },
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.peek() == Some(&kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.pos < self.tokens.len() { Err(self.unexpected("end of input")) } else { Ok(()) }
    }

    fn name(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(TokenKind::Str(s)) | Some(TokenKind::Quoted(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("name")),
        }
    }

    fn is_name_at(&self, ahead: usize) -> bool {
        matches!(self.peek_at(ahead), Some(TokenKind::Str(_)) | Some(TokenKind::Quoted(_)))
    }

    /// Parse assignments until `close` (or end of input when `close` is None).
    fn assignment_list(&mut self, close: Option<TokenKind>) -> Result<AssignmentList, ParseError> {
        let mut list = AssignmentList::new();
        loop {
            match (self.peek(), &close) {
                (None, None) => break,
                (None, Some(c)) => return Err(ParseError::UnexpectedEnd { expected: c.to_string() }),
                (Some(k), Some(c)) if k == c => break,
                _ => {}
            }
            let offset = self.offset();
            let assignment = self.assignment()?;
            list.push(assignment).map_err(|source| ParseError::Assignment { offset, source })?;
            while matches!(self.peek(), Some(TokenKind::Comma) | Some(TokenKind::Semicolon)) {
                self.pos += 1;
            }
        }
        Ok(list)
    }

    fn assignment(&mut self) -> Result<Assignment, ParseError> {
        if let Some(modifiers) = self.try_modifier_group() {
            return self.typed(modifiers);
        }
        if self.is_name_at(0) && self.is_name_at(1) && self.peek_at(2) == Some(&TokenKind::Equals) {
            return self.typed(Vec::new());
        }
        if self.is_name_at(0) && self.peek_at(1) == Some(&TokenKind::Equals) {
            let name = self.name()?;
            self.expect(TokenKind::Equals)?;
            return Ok(Assignment::named(name, self.term()?));
        }
        Ok(Assignment::positional(self.term()?))
    }

    /// `(m1, m2)` followed by `type name =`; rewinds and returns None otherwise.
    fn try_modifier_group(&mut self) -> Option<Vec<String>> {
        if self.peek() != Some(&TokenKind::LParen) {
            return None;
        }
        let start = self.pos;
        self.pos += 1;
        let mut modifiers = Vec::new();
        let group_ok = loop {
            match self.peek() {
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    break true;
                }
                Some(TokenKind::Str(_)) | Some(TokenKind::Quoted(_)) => {
                    if let Ok(m) = self.name() {
                        modifiers.push(m);
                    }
                    if self.peek() == Some(&TokenKind::Comma) {
                        self.pos += 1;
                    }
                }
                _ => break false,
            }
        };
        if group_ok && self.is_name_at(0) && self.is_name_at(1) && self.peek_at(2) == Some(&TokenKind::Equals) {
            Some(modifiers)
        } else {
            self.pos = start;
            None
        }
    }

    fn typed(&mut self, modifiers: Vec<String>) -> Result<Assignment, ParseError> {
        let type_tag = self.name()?;
        let name = self.name()?;
        self.expect(TokenKind::Equals)?;
        let value = self.term()?;
        if self.peek() == Some(&TokenKind::Semicolon) {
            self.pos += 1;
        }
        Ok(Assignment::typed(modifiers, type_tag, name, value))
    }

    fn term(&mut self) -> Result<Obj, ParseError> {
        let mut left = self.primary()?;
        // A function named `o` is always written quoted, so a bare `o` here is composition.
        while self.peek() == Some(&TokenKind::Compose) {
            self.pos += 1;
            let right = self.primary()?;
            left = Obj::Function(Function::compose(left, right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Obj, ParseError> {
        let offset = self.offset();
        match self.next("term")? {
            TokenKind::Str(s) | TokenKind::Quoted(s) => {
                if self.peek() == Some(&TokenKind::LParen) {
                    Ok(Obj::Function(self.function(s)?))
                } else {
                    Ok(Obj::literal(s))
                }
            }
            TokenKind::Compose if self.peek() == Some(&TokenKind::LParen) => {
                Ok(Obj::Function(self.function(crate::obj::COMPOSE.to_string())?))
            }
            TokenKind::LBracket => {
                let name = self.name()?;
                self.expect(TokenKind::RBracket)?;
                Ok(Obj::variable(name))
            }
            TokenKind::Dollar => {
                self.expect(TokenKind::LBrace)?;
                let name = self.name()?;
                self.expect(TokenKind::RBrace)?;
                Ok(Obj::reference(name))
            }
            TokenKind::LBrace => {
                let list = self.assignment_list(Some(TokenKind::RBrace))?;
                self.expect(TokenKind::RBrace)?;
                Ok(Obj::AssignmentList(list))
            }
            TokenKind::LParen => self.group(offset),
            other => Err(ParseError::Unexpected { offset, expected: "term".to_string(), found: other.to_string() }),
        }
    }

    /// After `(`: an array of values, or the source side of a rule.
    fn group(&mut self, offset: usize) -> Result<Obj, ParseError> {
        let mut items = Vec::new();
        while self.peek() != Some(&TokenKind::RParen) {
            items.push(self.term()?);
            match self.peek() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RParen) => {}
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
        self.expect(TokenKind::RParen)?;

        if self.peek() == Some(&TokenKind::Arrow) {
            self.pos += 1;
            let source = single_function(items, offset)?;
            let target_offset = self.offset();
            self.expect(TokenKind::LParen)?;
            let target = self.term()?;
            self.expect(TokenKind::RParen)?;
            let target = single_function(vec![target], target_offset)?;
            return Ok(Obj::Rule(Rule::new(source, target)));
        }

        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Obj::Value(v) => values.push(v),
                other => {
                    return Err(ParseError::Unexpected {
                        offset,
                        expected: "array value".to_string(),
                        found: other.to_string(),
                    });
                }
            }
        }
        Ok(Obj::Array(Array::new(values)))
    }

    fn function(&mut self, name: String) -> Result<Function, ParseError> {
        self.expect(TokenKind::LParen)?;
        let parameters = self.assignment_list(Some(TokenKind::RParen))?;
        self.expect(TokenKind::RParen)?;
        let mut function = Function::new(name, parameters);
        if self.peek() == Some(&TokenKind::LBrace) {
            self.pos += 1;
            let internal = self.assignment_list(Some(TokenKind::RBrace))?;
            self.expect(TokenKind::RBrace)?;
            function.internal = Some(internal);
        }
        Ok(function)
    }
}

fn single_function(mut items: Vec<Obj>, offset: usize) -> Result<Function, ParseError> {
    if items.len() == 1 {
        if let Some(Obj::Function(f)) = items.pop() {
            return Ok(f);
        }
    }
    Err(ParseError::Unexpected {
        offset,
        expected: "a single function in rule".to_string(),
        found: format!("{} item(s)", items.len().max(1)),
    })
}
