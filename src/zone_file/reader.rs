// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The [`Reader`] structure.
//!
//! See the [`zone_file` module-level documentation](`super`) for
//! implementation details about how the [`Reader`] is used.

use super::{Error, ErrorKind, Result};

////////////////////////////////////////////////////////////////////////
// STRUCTURES                                                         //
////////////////////////////////////////////////////////////////////////

/// Splits zone file text into logical lines of fields.
///
/// The [`Reader`] handles comments, parentheses for line extension, and
/// quoting. Escape sequences are *not* decoded: a backslash only keeps
/// the following octet from ending the field, and the raw text
/// (backslashes included) is handed to the parser, which decodes it in
/// the manner appropriate to the field.
pub(super) struct Reader<'a> {
    text: &'a [u8],
    offset: usize,
    position: Position,
}

/// Records the current human-readable position (line and column) in a
/// zone file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A single field of a logical line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct Field<'a> {
    pub position: Position,
    pub text: &'a [u8],
    pub quoted: bool,
}

impl Field<'_> {
    /// Returns the position of the octet at `index` in the field's
    /// text. Fields do not span lines, so only the column changes.
    pub fn position_at(&self, index: usize) -> Position {
        let quote = if self.quoted { 1 } else { 0 };
        Position {
            line: self.position.line,
            column: self.position.column + quote + index,
        }
    }
}

/// A logical line, which may span several physical lines when
/// parentheses are used.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct LogicalLine<'a> {
    pub position: Position,
    pub leading_blank: bool,
    pub fields: Vec<Field<'a>>,
}

impl<'a> LogicalLine<'a> {
    /// Returns a cursor over the fields of this line.
    pub fn cursor(&self) -> Fields<'a, '_> {
        Fields {
            line: self,
            index: 0,
        }
    }
}

/// A cursor over the fields of a [`LogicalLine`].
pub(super) struct Fields<'a, 'l> {
    line: &'l LogicalLine<'a>,
    index: usize,
}

impl<'a, 'l> Fields<'a, 'l> {
    pub fn peek(&self) -> Option<&'l Field<'a>> {
        self.line.fields.get(self.index)
    }

    /// Returns the next field, or an error of kind `missing` if the
    /// line has ended.
    pub fn next_or(&mut self, missing: ErrorKind) -> Result<&'l Field<'a>> {
        let field = self
            .peek()
            .ok_or_else(|| Error::new(self.end_position(), missing))?;
        self.index += 1;
        Ok(field)
    }

    pub fn skip(&mut self) {
        self.index += 1;
    }

    pub fn remaining(&self) -> &'l [Field<'a>] {
        self.line.fields.get(self.index..).unwrap_or_default()
    }

    pub fn skip_rest(&mut self) {
        self.index = self.line.fields.len();
    }

    /// Checks that every field has been consumed.
    pub fn expect_eol(&self) -> Result<()> {
        match self.peek() {
            Some(field) => Err(Error::new(field.position, ErrorKind::ExpectedEol)),
            None => Ok(()),
        }
    }

    /// Returns the position of the next field, or the position just
    /// past the last field if the line has ended.
    pub fn position(&self) -> Position {
        self.peek()
            .map_or_else(|| self.end_position(), |field| field.position)
    }

    fn end_position(&self) -> Position {
        match self.line.fields.last() {
            Some(last) => {
                let quotes = if last.quoted { 1 } else { 0 };
                last.position_at(last.text.len() + quotes)
            }
            None => self.line.position,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// READING                                                            //
////////////////////////////////////////////////////////////////////////

impl<'a> Reader<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self {
            text,
            offset: 0,
            position: Position { line: 1, column: 1 },
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn at_eof(&self) -> bool {
        self.offset >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.offset).copied()
    }

    fn advance(&mut self) {
        if let Some(octet) = self.peek() {
            self.offset += 1;
            if octet == b'\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
    }

    /// Reads the next logical line. Returns `None` at the end of the
    /// input. Blank lines (and lines holding only comments) are
    /// returned with no fields.
    pub fn read_line(&mut self) -> Result<Option<LogicalLine<'a>>> {
        if self.at_eof() {
            return Ok(None);
        }

        let mut line = LogicalLine {
            position: self.position,
            leading_blank: matches!(self.peek(), Some(b' ' | b'\t')),
            fields: Vec::new(),
        };
        let mut paren_start = None;

        loop {
            match self.peek() {
                None => {
                    return match paren_start {
                        Some(start) => Err(Error::new(start, ErrorKind::EofBeforeCloseParen)),
                        None => Ok(Some(line)),
                    };
                }
                Some(b'\n') => {
                    self.advance();
                    if paren_start.is_none() {
                        return Ok(Some(line));
                    }
                }
                Some(c) if is_whitespace(c) => self.advance(),
                Some(b';') => self.skip_comment(),
                Some(b'(') => {
                    if paren_start.is_some() {
                        return Err(Error::new(self.position, ErrorKind::NestedParens));
                    }
                    paren_start = Some(self.position);
                    self.advance();
                }
                Some(b')') => {
                    if paren_start.take().is_none() {
                        return Err(Error::new(self.position, ErrorKind::UnmatchedCloseParen));
                    }
                    self.advance();
                }
                Some(b'"') => line.fields.push(self.read_quoted_field()?),
                Some(_) => line.fields.push(self.read_unquoted_field()?),
            }
        }
    }

    fn skip_comment(&mut self) {
        while !matches!(self.peek(), None | Some(b'\n')) {
            self.advance();
        }
    }

    fn read_unquoted_field(&mut self) -> Result<Field<'a>> {
        let position = self.position;
        let start = self.offset;
        while let Some(c) = self.peek() {
            if ends_field(c) {
                break;
            }
            self.advance();
            if c == b'\\' {
                if self.at_eof() {
                    return Err(Error::new(self.position, ErrorKind::EofInEscape));
                }
                self.advance();
            }
        }
        Ok(Field {
            position,
            text: &self.text[start..self.offset],
            quoted: false,
        })
    }

    fn read_quoted_field(&mut self) -> Result<Field<'a>> {
        let position = self.position;
        self.advance();
        let start = self.offset;
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(Error::new(position, ErrorKind::UnterminatedQuotedString))
                }
                Some(b'"') => break,
                Some(b'\\') => {
                    self.advance();
                    if self.at_eof() {
                        return Err(Error::new(self.position, ErrorKind::EofInEscape));
                    }
                    self.advance();
                }
                Some(_) => self.advance(),
            }
        }
        let text = &self.text[start..self.offset];
        self.advance();
        Ok(Field {
            position,
            text,
            quoted: true,
        })
    }
}

fn is_whitespace(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\r'
}

fn ends_field(c: u8) -> bool {
    is_whitespace(c) || matches!(c, b'\n' | b';' | b'(' | b')' | b'"')
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
