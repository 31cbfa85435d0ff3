use crate::loc::Loc;
use crate::token::TT;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Formatter;
use std::error::Error;
use std::fmt::Display;

/// A stable classification of syntax errors produced by the parser.
///
/// Diagnostic codes (prefix `SS`) are assigned per variant and are stable:
/// - `SS0001`: [`SyntaxErrorType::DuplicateDeclaration`]
/// - `SS0002`: [`SyntaxErrorType::ExpectedSyntax`]
/// - `SS0003`: [`SyntaxErrorType::IllegalBreak`]
/// - `SS0004`: [`SyntaxErrorType::IllegalContinue`]
/// - `SS0005`: [`SyntaxErrorType::IllegalReturn`]
/// - `SS0006`: [`SyntaxErrorType::InvalidAssigmentTarget`]
/// - `SS0007`: [`SyntaxErrorType::InvalidCharacterEscape`]
/// - `SS0008`: [`SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters`]
/// - `SS0009`: [`SyntaxErrorType::LineTerminatorAfterThrow`]
/// - `SS0010`: [`SyntaxErrorType::LineTerminatorInString`]
/// - `SS0011`: [`SyntaxErrorType::MalformedLiteralNumber`]
/// - `SS0012`: [`SyntaxErrorType::RequiredTokenNotFound`]
/// - `SS0013`: [`SyntaxErrorType::TryStatementHasNoCatchOrFinally`]
/// - `SS0014`: [`SyntaxErrorType::UnexpectedCharacter`]
/// - `SS0015`: [`SyntaxErrorType::UnexpectedEnd`]
/// - `SS0016`: [`SyntaxErrorType::UnexpectedNewTarget`]
/// - `SS0017`: [`SyntaxErrorType::UnexpectedSuperCall`]
/// - `SS0018`: [`SyntaxErrorType::UnexpectedSuperProperty`]
/// - `SS0019`: [`SyntaxErrorType::NestingTooDeep`]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxErrorType {
  DuplicateDeclaration,
  ExpectedSyntax(&'static str),
  IllegalBreak,
  IllegalContinue,
  IllegalReturn,
  InvalidAssigmentTarget,
  InvalidCharacterEscape,
  LineTerminatorAfterArrowFunctionParameters,
  LineTerminatorAfterThrow,
  LineTerminatorInString,
  MalformedLiteralNumber,
  NestingTooDeep,
  RequiredTokenNotFound(TT),
  TryStatementHasNoCatchOrFinally,
  UnexpectedCharacter,
  UnexpectedEnd,
  // The following are raised by callers that restrict where these forms may appear, not by the
  // parser itself.
  UnexpectedNewTarget,
  UnexpectedSuperCall,
  UnexpectedSuperProperty,
}

#[derive(Clone)]
pub struct SyntaxError {
  pub typ: SyntaxErrorType,
  pub loc: Loc,
  pub actual_token: Option<TT>,
}

impl SyntaxError {
  pub fn new(typ: SyntaxErrorType, loc: Loc, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError {
      typ,
      loc,
      actual_token,
    }
  }

  pub fn code(&self) -> &'static str {
    self.typ.code()
  }

  pub fn message(&self) -> String {
    self.typ.message(self.actual_token)
  }
}

impl Debug for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} around loc [{}:{}]", self, self.loc.0, self.loc.1)
  }
}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.code(), self.message())
  }
}

impl Error for SyntaxError {}

impl PartialEq for SyntaxError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;

impl SyntaxErrorType {
  /// Stable diagnostic code for this syntax error variant.
  pub fn code(&self) -> &'static str {
    match self {
      SyntaxErrorType::DuplicateDeclaration => "SS0001",
      SyntaxErrorType::ExpectedSyntax(_) => "SS0002",
      SyntaxErrorType::IllegalBreak => "SS0003",
      SyntaxErrorType::IllegalContinue => "SS0004",
      SyntaxErrorType::IllegalReturn => "SS0005",
      SyntaxErrorType::InvalidAssigmentTarget => "SS0006",
      SyntaxErrorType::InvalidCharacterEscape => "SS0007",
      SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters => "SS0008",
      SyntaxErrorType::LineTerminatorAfterThrow => "SS0009",
      SyntaxErrorType::LineTerminatorInString => "SS0010",
      SyntaxErrorType::MalformedLiteralNumber => "SS0011",
      SyntaxErrorType::NestingTooDeep => "SS0019",
      SyntaxErrorType::RequiredTokenNotFound(_) => "SS0012",
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => "SS0013",
      SyntaxErrorType::UnexpectedCharacter => "SS0014",
      SyntaxErrorType::UnexpectedEnd => "SS0015",
      SyntaxErrorType::UnexpectedNewTarget => "SS0016",
      SyntaxErrorType::UnexpectedSuperCall => "SS0017",
      SyntaxErrorType::UnexpectedSuperProperty => "SS0018",
    }
  }

  /// Human-readable message describing this syntax error.
  pub fn message(&self, actual_token: Option<TT>) -> String {
    match self {
      SyntaxErrorType::DuplicateDeclaration => "identifier has already been declared".into(),
      SyntaxErrorType::ExpectedSyntax(expected) => format!("expected {}", expected),
      SyntaxErrorType::IllegalBreak => "illegal break statement".into(),
      SyntaxErrorType::IllegalContinue => "illegal continue statement".into(),
      SyntaxErrorType::IllegalReturn => "illegal return statement".into(),
      SyntaxErrorType::InvalidAssigmentTarget => "invalid assignment target".into(),
      SyntaxErrorType::InvalidCharacterEscape => "invalid character escape".into(),
      SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters => {
        "line terminator not allowed after arrow function parameters".into()
      }
      SyntaxErrorType::LineTerminatorAfterThrow => {
        "line terminator not allowed after `throw`".into()
      }
      SyntaxErrorType::LineTerminatorInString => {
        "line terminator not allowed in string literal".into()
      }
      SyntaxErrorType::MalformedLiteralNumber => "malformed number literal".into(),
      SyntaxErrorType::NestingTooDeep => "source is nested too deeply".into(),
      SyntaxErrorType::RequiredTokenNotFound(token) => format!("expected token {:?}", token),
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => {
        "try statement requires a catch or finally block".into()
      }
      SyntaxErrorType::UnexpectedCharacter => "unexpected character".into(),
      SyntaxErrorType::UnexpectedEnd => actual_token
        .map(|tok| format!("unexpected end before {:?}", tok))
        .unwrap_or_else(|| "unexpected end of input".into()),
      SyntaxErrorType::UnexpectedNewTarget => "new.target expression is not allowed here".into(),
      SyntaxErrorType::UnexpectedSuperCall => "'super' call is not allowed here".into(),
      SyntaxErrorType::UnexpectedSuperProperty => {
        "'super' property access is not allowed here".into()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::SyntaxErrorType;
  use crate::token::TT;

  #[test]
  fn codes_are_unique() {
    let all = [
      SyntaxErrorType::DuplicateDeclaration,
      SyntaxErrorType::ExpectedSyntax("x"),
      SyntaxErrorType::IllegalBreak,
      SyntaxErrorType::IllegalContinue,
      SyntaxErrorType::IllegalReturn,
      SyntaxErrorType::InvalidAssigmentTarget,
      SyntaxErrorType::InvalidCharacterEscape,
      SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters,
      SyntaxErrorType::LineTerminatorAfterThrow,
      SyntaxErrorType::LineTerminatorInString,
      SyntaxErrorType::MalformedLiteralNumber,
      SyntaxErrorType::NestingTooDeep,
      SyntaxErrorType::RequiredTokenNotFound(TT::Semicolon),
      SyntaxErrorType::TryStatementHasNoCatchOrFinally,
      SyntaxErrorType::UnexpectedCharacter,
      SyntaxErrorType::UnexpectedEnd,
      SyntaxErrorType::UnexpectedNewTarget,
      SyntaxErrorType::UnexpectedSuperCall,
      SyntaxErrorType::UnexpectedSuperProperty,
    ];
    let mut codes: Vec<_> = all.iter().map(|t| t.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), all.len());
  }
}
