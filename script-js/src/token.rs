use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::loc::Loc;
use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub enum TT {
  // Special token used to represent the end of the source code.
  EOF,

  AmpersandAmpersand,
  Asterisk,
  AsteriskEquals,
  BarBar,
  BraceClose,
  BraceOpen,
  BracketClose,
  BracketOpen,
  ChevronLeft,
  ChevronLeftEquals,
  ChevronRight,
  ChevronRightEquals,
  Colon,
  Comma,
  Dot,
  Equals,
  EqualsChevronRight,
  EqualsEquals,
  EqualsEqualsEquals,
  Exclamation,
  ExclamationEquals,
  ExclamationEqualsEquals,
  Hyphen,
  HyphenEquals,
  Identifier,
  KeywordBreak,
  KeywordCatch,
  KeywordConst,
  KeywordContinue,
  KeywordDo,
  KeywordElse,
  KeywordFinally,
  KeywordFor,
  KeywordFunction,
  KeywordIf,
  KeywordLet,
  KeywordNew,
  KeywordReturn,
  KeywordSuper,
  KeywordThis,
  KeywordThrow,
  KeywordTry,
  KeywordTypeof,
  KeywordVar,
  KeywordVoid,
  KeywordWhile,
  LiteralFalse,
  LiteralNull,
  LiteralNumber,
  LiteralString,
  LiteralTrue,
  ParenthesisClose,
  ParenthesisOpen,
  Percent,
  Plus,
  PlusEquals,
  Question,
  QuestionQuestion,
  Semicolon,
  Slash,
}

pub static KEYWORDS_MAPPING: Lazy<HashMap<&'static str, TT>> = Lazy::new(|| {
  let mut map = HashMap::<&'static str, TT>::new();
  map.insert("break", TT::KeywordBreak);
  map.insert("catch", TT::KeywordCatch);
  map.insert("const", TT::KeywordConst);
  map.insert("continue", TT::KeywordContinue);
  map.insert("do", TT::KeywordDo);
  map.insert("else", TT::KeywordElse);
  map.insert("false", TT::LiteralFalse);
  map.insert("finally", TT::KeywordFinally);
  map.insert("for", TT::KeywordFor);
  map.insert("function", TT::KeywordFunction);
  map.insert("if", TT::KeywordIf);
  map.insert("let", TT::KeywordLet);
  map.insert("new", TT::KeywordNew);
  map.insert("null", TT::LiteralNull);
  map.insert("return", TT::KeywordReturn);
  map.insert("super", TT::KeywordSuper);
  map.insert("this", TT::KeywordThis);
  map.insert("throw", TT::KeywordThrow);
  map.insert("true", TT::LiteralTrue);
  map.insert("try", TT::KeywordTry);
  map.insert("typeof", TT::KeywordTypeof);
  map.insert("var", TT::KeywordVar);
  map.insert("void", TT::KeywordVoid);
  map.insert("while", TT::KeywordWhile);
  map
});

impl TT {
  /// Whether this token may be used as a property name after `.` or as an object literal key,
  /// where reserved words are allowed.
  pub fn is_identifier_name(self) -> bool {
    self == TT::Identifier || KEYWORDS_MAPPING.values().any(|tt| *tt == self)
  }
}

#[derive(Clone, Copy, Debug)]
pub struct Token {
  pub loc: Loc,
  // Whether one or more whitespace characters appear immediately before this token, and at least
  // one of those whitespace characters is a line terminator.
  pub preceded_by_line_terminator: bool,
  pub typ: TT,
}

impl Token {
  pub fn error(&self, typ: SyntaxErrorType) -> SyntaxError {
    self.loc.error(typ, Some(self.typ))
  }
}
