/// Parses the raw source text of a numeric literal token.
pub fn parse_number_literal(raw: &str) -> Option<f64> {
  if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
    return u64::from_str_radix(hex, 16).ok().map(|v| v as f64);
  }
  raw.parse::<f64>().ok()
}

/// Formats a number the way it is rendered as a property key, e.g. `1` not `1.0`.
pub fn number_to_key(value: f64) -> String {
  if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e21 {
    format!("{}", value as i64)
  } else {
    format!("{}", value)
  }
}
