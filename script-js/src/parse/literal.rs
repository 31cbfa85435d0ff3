use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::loc::Loc;
use crate::num::parse_number_literal;

fn hex_value(digits: &str) -> Option<u32> {
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
    return None;
  }
  u32::from_str_radix(digits, 16).ok()
}

/// Decodes the raw source of a string literal token (including its quotes) into its value.
pub fn normalise_literal_string(raw: &str, loc: Loc) -> SyntaxResult<String> {
  let invalid = || loc.error(SyntaxErrorType::InvalidCharacterEscape, None);
  let inner = &raw[1..raw.len() - 1];
  let mut out = String::with_capacity(inner.len());
  let mut rest = inner;
  while let Some(pos) = rest.find('\\') {
    out.push_str(&rest[..pos]);
    let mut chars = rest[pos + 1..].chars();
    let esc = chars.next().ok_or_else(invalid)?;
    let mut consumed = esc.len_utf8();
    match esc {
      'b' => out.push('\u{8}'),
      'f' => out.push('\u{c}'),
      'n' => out.push('\n'),
      'r' => out.push('\r'),
      't' => out.push('\t'),
      'v' => out.push('\u{b}'),
      '0' if !chars.next().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
      '1'..='9' | '0' => return Err(invalid()),
      // Line continuation.
      '\n' | '\u{2028}' | '\u{2029}' => {}
      '\r' => {
        if chars.next() == Some('\n') {
          consumed += 1;
        }
      }
      'x' => {
        let digits = rest.get(pos + 2..pos + 4).ok_or_else(invalid)?;
        let c = hex_value(digits).and_then(char::from_u32).ok_or_else(invalid)?;
        out.push(c);
        consumed += 2;
      }
      'u' => {
        let after = &rest[pos + 2..];
        let (digits, len) = if let Some(braced) = after.strip_prefix('{') {
          let end = braced.find('}').ok_or_else(invalid)?;
          (&braced[..end], end + 2)
        } else {
          (after.get(..4).ok_or_else(invalid)?, 4)
        };
        let c = hex_value(digits).and_then(char::from_u32).ok_or_else(invalid)?;
        out.push(c);
        consumed += len;
      }
      c => out.push(c),
    }
    rest = &rest[pos + 1 + consumed..];
  }
  out.push_str(rest);
  Ok(out)
}

pub fn normalise_literal_number(raw: &str, loc: Loc) -> SyntaxResult<f64> {
  parse_number_literal(raw).ok_or_else(|| loc.error(SyntaxErrorType::MalformedLiteralNumber, None))
}

#[cfg(test)]
mod tests {
  use super::normalise_literal_string;
  use crate::error::SyntaxErrorType;
  use crate::loc::Loc;

  fn decode(raw: &str) -> Result<String, SyntaxErrorType> {
    normalise_literal_string(raw, Loc(0, raw.len())).map_err(|e| e.typ)
  }

  #[test]
  fn decodes_escapes() {
    assert_eq!(decode(r#""a\nb""#).unwrap(), "a\nb");
    assert_eq!(decode(r#"'\x41B\u{43}'"#).unwrap(), "ABC");
    assert_eq!(decode(r#"'it\'s'"#).unwrap(), "it's");
    assert_eq!(decode(r#"'\0'"#).unwrap(), "\0");
    assert_eq!(decode("'héllo'").unwrap(), "héllo");
  }

  #[test]
  fn rejects_bad_escapes() {
    assert_eq!(decode(r#"'\x4'"#), Err(SyntaxErrorType::InvalidCharacterEscape));
    assert_eq!(decode(r#"'\u{110000}'"#), Err(SyntaxErrorType::InvalidCharacterEscape));
    assert_eq!(decode(r#"'\01'"#), Err(SyntaxErrorType::InvalidCharacterEscape));
  }

  #[test]
  fn line_continuations_decode_to_nothing() {
    assert_eq!(decode("'a\\\r\nb'").unwrap(), "ab");
    assert_eq!(decode("'a\\\nb'").unwrap(), "ab");
    assert_eq!(decode("'a\\\rb'").unwrap(), "ab");
    assert_eq!(decode("'a\\\u{2028}b'").unwrap(), "ab");
  }

  #[test]
  fn lone_surrogate_escapes_are_rejected() {
    // Literals decode to UTF-8, which cannot hold unpaired surrogates.
    assert_eq!(decode(r#"'\uD800'"#), Err(SyntaxErrorType::InvalidCharacterEscape));
    assert_eq!(decode(r#"'\u{DFFF}'"#), Err(SyntaxErrorType::InvalidCharacterEscape));
    assert_eq!(decode(r#"'\uD83D\uDE00'"#), Err(SyntaxErrorType::InvalidCharacterEscape));
    assert_eq!(decode("'😀'").unwrap(), "😀");
  }
}
