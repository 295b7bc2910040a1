//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// No nested or conditional logic.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings, cut on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let cut = s.char_indices().map(|(i, _)| i).take_while(|&i| i <= max).last().unwrap_or(0);
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

/// Round to one decimal place, as shown on the reviews board.
pub fn round1(x: f64) -> f64 {
  (x * 10.0).round() / 10.0
}
