use std::fmt;

/// A JavaScript string value, as stored in the heap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JsString {
  text: Box<str>,
}

impl JsString {
  pub fn from_str(s: &str) -> Self {
    Self { text: s.into() }
  }

  pub fn as_str(&self) -> &str {
    &self.text
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  pub(crate) fn heap_size_bytes(&self) -> usize {
    Self::heap_size_bytes_for_len(self.text.len())
  }

  pub(crate) fn heap_size_bytes_for_len(len: usize) -> usize {
    core::mem::size_of::<Self>().saturating_add(len)
  }
}

impl fmt::Debug for JsString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&self.text, f)
  }
}

impl fmt::Display for JsString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.text)
  }
}
