pub fn is_digit(c: u8) -> bool {
  c.is_ascii_digit()
}

pub fn is_id_start(c: u8) -> bool {
  c.is_ascii_alphabetic() || c == b'$' || c == b'_'
}

pub fn is_id_continue(c: u8) -> bool {
  is_id_start(c) || is_digit(c)
}

pub fn is_whitespace(c: u8) -> bool {
  matches!(c, b' ' | b'\t' | b'\x0b' | b'\x0c')
}

pub fn is_line_terminator(c: u8) -> bool {
  matches!(c, b'\n' | b'\r')
}
