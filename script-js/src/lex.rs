use crate::char::is_digit;
use crate::char::is_id_continue;
use crate::char::is_id_start;
use crate::char::is_line_terminator;
use crate::char::is_whitespace;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::KEYWORDS_MAPPING;
use crate::token::TT;
use core::ops::Index;

// Longest match first within each group.
#[rustfmt::skip]
static PUNCTUATORS: &[(&[u8], TT)] = &[
  (b"===", TT::EqualsEqualsEquals),
  (b"!==", TT::ExclamationEqualsEquals),
  (b"&&", TT::AmpersandAmpersand),
  (b"*=", TT::AsteriskEquals),
  (b"||", TT::BarBar),
  (b"<=", TT::ChevronLeftEquals),
  (b">=", TT::ChevronRightEquals),
  (b"=>", TT::EqualsChevronRight),
  (b"==", TT::EqualsEquals),
  (b"!=", TT::ExclamationEquals),
  (b"-=", TT::HyphenEquals),
  (b"+=", TT::PlusEquals),
  (b"??", TT::QuestionQuestion),
  (b"*", TT::Asterisk),
  (b"}", TT::BraceClose),
  (b"{", TT::BraceOpen),
  (b"]", TT::BracketClose),
  (b"[", TT::BracketOpen),
  (b"<", TT::ChevronLeft),
  (b">", TT::ChevronRight),
  (b":", TT::Colon),
  (b",", TT::Comma),
  (b".", TT::Dot),
  (b"=", TT::Equals),
  (b"!", TT::Exclamation),
  (b"-", TT::Hyphen),
  (b")", TT::ParenthesisClose),
  (b"(", TT::ParenthesisOpen),
  (b"%", TT::Percent),
  (b"+", TT::Plus),
  (b"?", TT::Question),
  (b";", TT::Semicolon),
  (b"/", TT::Slash),
];

pub struct Lexer<'a> {
  source: &'a str,
  next: usize,
}

impl<'a> Lexer<'a> {
  pub fn new(source: &'a str) -> Lexer<'a> {
    Lexer { source, next: 0 }
  }

  pub fn source(&self) -> &'a str {
    self.source
  }

  pub fn source_range(&self) -> Loc {
    Loc(0, self.source.len())
  }

  pub fn next(&self) -> usize {
    self.next
  }

  fn bytes(&self) -> &'a [u8] {
    self.source.as_bytes()
  }

  fn peek(&self, n: usize) -> Option<u8> {
    self.bytes().get(self.next + n).copied()
  }

  fn at_end(&self) -> bool {
    self.next >= self.source.len()
  }

  fn rest(&self) -> &'a [u8] {
    &self.bytes()[self.next..]
  }

  fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
    while self.peek(0).is_some_and(&pred) {
      self.next += 1;
    }
  }

  fn error_at(&self, start: usize, typ: SyntaxErrorType) -> crate::error::SyntaxError {
    Loc(start, self.next.max(start)).error(typ, None)
  }

  /// Skips whitespace and comments, returning whether a line terminator was crossed.
  fn skip_trivia(&mut self) -> SyntaxResult<bool> {
    let mut saw_line_terminator = false;
    loop {
      match self.peek(0) {
        Some(c) if is_whitespace(c) => self.next += 1,
        Some(c) if is_line_terminator(c) => {
          saw_line_terminator = true;
          self.next += 1;
        }
        Some(b'/') if self.peek(1) == Some(b'/') => {
          self.skip_while(|c| !is_line_terminator(c));
        }
        Some(b'/') if self.peek(1) == Some(b'*') => {
          let start = self.next;
          self.next += 2;
          loop {
            match self.peek(0) {
              None => return Err(self.error_at(start, SyntaxErrorType::UnexpectedEnd)),
              Some(b'*') if self.peek(1) == Some(b'/') => {
                self.next += 2;
                break;
              }
              Some(c) => {
                saw_line_terminator |= is_line_terminator(c);
                self.next += 1;
              }
            }
          }
        }
        _ => break,
      }
    }
    Ok(saw_line_terminator)
  }

  fn lex_string(&mut self) -> SyntaxResult<TT> {
    let start = self.next;
    let quote = self.bytes()[self.next];
    self.next += 1;
    loop {
      match self.peek(0) {
        None => return Err(self.error_at(start, SyntaxErrorType::UnexpectedEnd)),
        Some(b'\\') => {
          if self.peek(1).is_none() {
            self.next += 1;
            return Err(self.error_at(start, SyntaxErrorType::UnexpectedEnd));
          }
          // CRLF after a backslash is a single line continuation.
          self.next += if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') {
            3
          } else {
            2
          };
        }
        Some(c) if is_line_terminator(c) => {
          return Err(self.error_at(start, SyntaxErrorType::LineTerminatorInString));
        }
        Some(c) if c == quote => {
          self.next += 1;
          return Ok(TT::LiteralString);
        }
        Some(_) => self.next += 1,
      }
    }
  }

  fn lex_number(&mut self) -> SyntaxResult<TT> {
    let start = self.next;
    if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X')) {
      self.next += 2;
      let digits_start = self.next;
      self.skip_while(|c| c.is_ascii_hexdigit());
      if self.next == digits_start {
        return Err(self.error_at(start, SyntaxErrorType::MalformedLiteralNumber));
      }
    } else {
      self.skip_while(is_digit);
      if self.peek(0) == Some(b'.') {
        self.next += 1;
        self.skip_while(is_digit);
      }
      if matches!(self.peek(0), Some(b'e' | b'E')) {
        self.next += 1;
        if matches!(self.peek(0), Some(b'+' | b'-')) {
          self.next += 1;
        }
        let exp_start = self.next;
        self.skip_while(is_digit);
        if self.next == exp_start {
          return Err(self.error_at(start, SyntaxErrorType::MalformedLiteralNumber));
        }
      }
    }
    // A numeric literal must not be immediately followed by an identifier start or digit.
    if self.peek(0).is_some_and(is_id_start) {
      self.next += 1;
      return Err(self.error_at(start, SyntaxErrorType::MalformedLiteralNumber));
    }
    Ok(TT::LiteralNumber)
  }

  fn lex_identifier_or_keyword(&mut self) -> TT {
    let start = self.next;
    self.skip_while(is_id_continue);
    let word = &self.source[start..self.next];
    KEYWORDS_MAPPING.get(word).copied().unwrap_or(TT::Identifier)
  }

  fn lex_punctuator(&mut self) -> Option<TT> {
    let rest = self.rest();
    let (pat, typ) = PUNCTUATORS.iter().find(|(pat, _)| rest.starts_with(pat))?;
    self.next += pat.len();
    Some(*typ)
  }

  pub fn lex_next(&mut self) -> SyntaxResult<Token> {
    let preceded_by_line_terminator = self.skip_trivia()?;
    let start = self.next;
    if self.at_end() {
      return Ok(Token {
        loc: Loc(start, start),
        preceded_by_line_terminator,
        typ: TT::EOF,
      });
    }
    let c = self.bytes()[start];
    let typ = match c {
      b'"' | b'\'' => self.lex_string()?,
      b'.' if self.peek(1).is_some_and(is_digit) => self.lex_number()?,
      c if is_digit(c) => self.lex_number()?,
      c if is_id_start(c) => self.lex_identifier_or_keyword(),
      _ => match self.lex_punctuator() {
        Some(typ) => typ,
        None => {
          // Advance past the whole (possibly multibyte) character so the location stays on a
          // char boundary.
          let len = self.source[start..].chars().next().map_or(1, char::len_utf8);
          self.next += len;
          return Err(Loc(start, self.next).error(SyntaxErrorType::UnexpectedCharacter, None));
        }
      },
    };
    Ok(Token {
      loc: Loc(start, self.next),
      preceded_by_line_terminator,
      typ,
    })
  }

  /// Lexes the entire source. The returned list always ends with a single [`TT::EOF`] token.
  pub fn tokenize(mut self) -> SyntaxResult<Vec<Token>> {
    let mut tokens = Vec::new();
    loop {
      let token = self.lex_next()?;
      let is_eof = token.typ == TT::EOF;
      tokens.push(token);
      if is_eof {
        return Ok(tokens);
      }
    }
  }
}

impl<'a> Index<Loc> for Lexer<'a> {
  type Output = str;

  fn index(&self, index: Loc) -> &Self::Output {
    &self.source[index.0..index.1]
  }
}

#[cfg(test)]
mod tests {
  use super::Lexer;
  use crate::error::SyntaxErrorType;
  use crate::token::TT;

  fn types(source: &str) -> Vec<TT> {
    Lexer::new(source)
      .tokenize()
      .unwrap()
      .into_iter()
      .map(|t| t.typ)
      .collect()
  }

  #[test]
  fn lexes_punctuators_longest_first() {
    assert_eq!(types("a === b !== c => d"), vec![
      TT::Identifier,
      TT::EqualsEqualsEquals,
      TT::Identifier,
      TT::ExclamationEqualsEquals,
      TT::Identifier,
      TT::EqualsChevronRight,
      TT::Identifier,
      TT::EOF,
    ]);
  }

  #[test]
  fn lexes_keywords_and_literals() {
    assert_eq!(types("let x = 'a' + 1.5e3; // trailing"), vec![
      TT::KeywordLet,
      TT::Identifier,
      TT::Equals,
      TT::LiteralString,
      TT::Plus,
      TT::LiteralNumber,
      TT::Semicolon,
      TT::EOF,
    ]);
  }

  #[test]
  fn tracks_line_terminators_across_comments() {
    let tokens = Lexer::new("a /* x\n */ b c").tokenize().unwrap();
    assert!(!tokens[0].preceded_by_line_terminator);
    assert!(tokens[1].preceded_by_line_terminator);
    assert!(!tokens[2].preceded_by_line_terminator);
  }

  #[test]
  fn line_continuations_stay_inside_strings() {
    for source in ["'a\\\r\nb'", "'a\\\nb'", "'a\\\rb'"] {
      assert_eq!(types(source), vec![TT::LiteralString, TT::EOF], "{source:?}");
    }
    let err = Lexer::new("'a\\\r\n\nb'").tokenize().unwrap_err();
    assert_eq!(err.typ, SyntaxErrorType::LineTerminatorInString);
  }

  #[test]
  fn rejects_malformed_input() {
    let err = Lexer::new("1e").tokenize().unwrap_err();
    assert_eq!(err.typ, SyntaxErrorType::MalformedLiteralNumber);
    let err = Lexer::new("'abc").tokenize().unwrap_err();
    assert_eq!(err.typ, SyntaxErrorType::UnexpectedEnd);
    let err = Lexer::new("'a\nb'").tokenize().unwrap_err();
    assert_eq!(err.typ, SyntaxErrorType::LineTerminatorInString);
    let err = Lexer::new("a # b").tokenize().unwrap_err();
    assert_eq!(err.typ, SyntaxErrorType::UnexpectedCharacter);
    assert_eq!(err.loc.0, 2);
  }
}
