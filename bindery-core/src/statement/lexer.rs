//! Placeholder-aware SQL scanner.
//!
//! The scanner only knows enough SQL to tell placeholders apart from text:
//! quoted literals, quoted identifiers, comments and dollar quoting are copied
//! through untouched so a `:` inside them never becomes a parameter.

use crate::{ParseError, Token};

/// Raw lexical unit, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'a> {
    /// Plain SQL text.
    Text(&'a str),
    /// Quoted literal or identifier, dollar-quoted strings included.
    Quoted(&'a str),
    /// A comment, kept verbatim.
    Comment(&'a str),
    /// Placeholder name without the leading `:`.
    Parameter(&'a str),
    /// A `;` outside of any literal or comment.
    Terminator,
}

/// Characters that interrupt a run of plain text.
const SPECIAL: [char; 8] = [':', ';', '\'', '"', '`', '-', '/', '$'];

pub(crate) struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn slice(&self, start: usize) -> &'a str {
        &self.input[start..self.pos]
    }

    fn is_identifier_start(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    fn is_identifier_part(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    /// Consumes an identifier, the first character must already be known to be valid.
    fn scan_identifier(&mut self) {
        while self.peek().is_some_and(Self::is_identifier_part) {
            self.advance();
        }
    }

    /// `E'...'` strings accept backslash escapes, detected by the prefix right before the quote.
    fn backslash_escapes(&self, quote: usize) -> bool {
        let mut before = self.input[..quote].chars().rev();
        matches!(before.next(), Some('E' | 'e'))
            && !before.next().is_some_and(Self::is_identifier_part)
    }

    /// Scans a literal or identifier delimited by `quote`, a doubled quote is an escaped one.
    fn scan_quoted(&mut self, quote: char, what: &str) -> Result<(), ParseError> {
        let start = self.pos;
        let backslash = quote == '\'' && self.backslash_escapes(start);
        self.advance();
        loop {
            match self.advance() {
                Some('\\') if backslash => {
                    self.advance();
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                    } else {
                        return Ok(());
                    }
                }
                Some(..) => {}
                None => {
                    return Err(ParseError::new(format!("Unterminated {what}"), start));
                }
            }
        }
    }

    fn scan_line_comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    fn scan_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.advance();
        self.advance();
        let mut depth = 1;
        while depth > 0 {
            match self.advance() {
                Some('/') if self.peek() == Some('*') => {
                    self.advance();
                    depth += 1;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    depth -= 1;
                }
                Some(..) => {}
                None => {
                    return Err(ParseError::new("Unterminated block comment", start));
                }
            }
        }
        Ok(())
    }

    /// Returns the `$tag$` opener at the current position, if there is one.
    fn dollar_tag(&self) -> Option<&'a str> {
        let rest = &self.input[self.pos + 1..];
        let end = rest.find('$')?;
        let tag = &rest[..end];
        let valid = match tag.chars().next() {
            None => true,
            Some(c) => Self::is_identifier_start(c) && tag.chars().all(Self::is_identifier_part),
        };
        valid.then(|| &self.input[self.pos..self.pos + end + 2])
    }

    fn scan_dollar_quoted(&mut self, tag: &str) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += tag.len();
        match self.input[self.pos..].find(tag) {
            Some(offset) => {
                self.pos += offset + tag.len();
                Ok(())
            }
            None => Err(ParseError::new(
                format!("Unterminated dollar-quoted string {tag}"),
                start,
            )),
        }
    }

    /// Consumes a run of text that cannot contain anything interesting.
    fn scan_text(&mut self) {
        self.advance();
        while self.peek().is_some_and(|c| !SPECIAL.contains(&c)) {
            self.advance();
        }
    }

    fn next_piece(&mut self) -> Option<Result<Piece<'a>, ParseError>> {
        let start = self.pos;
        let c = self.peek()?;
        let piece = match c {
            ':' if self.peek_next().is_some_and(Self::is_identifier_start) => {
                self.advance();
                self.scan_identifier();
                Piece::Parameter(&self.input[start + 1..self.pos])
            }
            ':' if self.peek_next() == Some(':') => {
                self.advance();
                self.advance();
                Piece::Text(self.slice(start))
            }
            ';' => {
                self.advance();
                Piece::Terminator
            }
            '\'' | '"' | '`' => {
                let what = if c == '\'' {
                    "string literal"
                } else {
                    "quoted identifier"
                };
                if let Err(error) = self.scan_quoted(c, what) {
                    return Some(Err(error));
                }
                Piece::Quoted(self.slice(start))
            }
            '-' if self.peek_next() == Some('-') => {
                self.scan_line_comment();
                Piece::Comment(self.slice(start))
            }
            '/' if self.peek_next() == Some('*') => {
                if let Err(error) = self.scan_block_comment() {
                    return Some(Err(error));
                }
                Piece::Comment(self.slice(start))
            }
            '$' => match self.dollar_tag() {
                Some(tag) => {
                    if let Err(error) = self.scan_dollar_quoted(tag) {
                        return Some(Err(error));
                    }
                    Piece::Quoted(self.slice(start))
                }
                None => {
                    self.scan_text();
                    Piece::Text(self.slice(start))
                }
            },
            _ => {
                self.scan_text();
                Piece::Text(self.slice(start))
            }
        };
        Some(Ok(piece))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Piece<'a>, ParseError>;
    fn next(&mut self) -> Option<Self::Item> {
        self.next_piece()
    }
}

/// Split SQL source into literal text and named placeholders.
///
/// Consecutive text is merged, so literals and parameters always alternate.
pub fn tokenize(sql: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    for piece in Lexer::new(sql) {
        match piece? {
            Piece::Text(v) | Piece::Quoted(v) | Piece::Comment(v) => text.push_str(v),
            Piece::Terminator => text.push(';'),
            Piece::Parameter(name) => {
                if !text.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut text)));
                }
                tokens.push(Token::NamedParameter(name.to_owned()));
            }
        }
    }
    if !text.is_empty() {
        tokens.push(Token::Literal(text));
    }
    Ok(tokens)
}

/// For each placeholder in order, whether it already sits right after `(`, `[`
/// or `,` once comments and whitespace are skipped.
pub(crate) fn enclosed_placeholders(sql: &str) -> Result<Vec<bool>, ParseError> {
    let mut result = Vec::new();
    let mut last = None;
    for piece in Lexer::new(sql) {
        match piece? {
            Piece::Text(v) | Piece::Quoted(v) => {
                if let Some(c) = v.trim_end().chars().last() {
                    last = Some(c);
                }
            }
            Piece::Comment(..) => {}
            Piece::Terminator => last = Some(';'),
            Piece::Parameter(..) => {
                result.push(matches!(last, Some('(' | '[' | ',')));
                last = Some('?');
            }
        }
    }
    Ok(result)
}

/// Number of positional `?` markers, the ones in literals and comments excluded.
pub fn positional_markers(sql: &str) -> Result<usize, ParseError> {
    let mut result = 0;
    for piece in Lexer::new(sql) {
        if let Piece::Text(v) = piece? {
            result += v.matches('?').count();
        }
    }
    Ok(result)
}

/// Split a script into its statements on `;` outside of literals and comments.
///
/// Statements are trimmed, the ones made only of whitespace and comments are dropped.
pub fn split_statements(sql: &str) -> Result<Vec<&str>, ParseError> {
    let mut result = Vec::new();
    // Byte range from the first to the last meaningful piece of the current statement
    let mut span: Option<(usize, usize)> = None;
    let mut lexer = Lexer::new(sql);
    loop {
        let start = lexer.pos;
        let Some(piece) = lexer.next() else {
            break;
        };
        let meaningful = match piece? {
            Piece::Terminator => {
                if let Some((begin, end)) = span.take() {
                    result.push(sql[begin..end].trim());
                }
                continue;
            }
            Piece::Text(v) => !v.trim().is_empty(),
            Piece::Quoted(..) | Piece::Parameter(..) => true,
            Piece::Comment(..) => false,
        };
        if meaningful {
            let begin = span.map_or(start, |(begin, _)| begin);
            span = Some((begin, lexer.pos));
        }
    }
    if let Some((begin, end)) = span {
        result.push(sql[begin..end].trim());
    }
    Ok(result)
}
