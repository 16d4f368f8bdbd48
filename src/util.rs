//! Small utility helpers used across modules.

use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> Option<&'static Regex> {
  static TAG: OnceLock<Option<Regex>> = OnceLock::new();
  TAG.get_or_init(|| Regex::new(r"(?s)<.*?>").ok()).as_ref()
}

/// Turn an HTML problem statement into plain text: tags become spaces and the
/// `&nbsp;`, `&lt;`, `&gt;` entities are decoded.
pub fn strip_html(html: &str) -> String {
  if html.is_empty() {
    return String::new();
  }
  let text = match tag_pattern() {
    Some(re) => re.replace_all(html, " ").into_owned(),
    None => html.to_string(),
  };
  text.replace("&nbsp;", " ").replace("&lt;", "<").replace("&gt;", ">").trim().to_string()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn html_is_flattened() {
    let html = "<p>给定数组&nbsp;a，求 a[i] &lt; a[j] 的对数</p>\n<br/>";
    assert_eq!(strip_html(html), "给定数组 a，求 a[i] < a[j] 的对数");
    assert_eq!(strip_html(""), "");
    // Entities decoded after tag removal stay as text.
    assert_eq!(strip_html("&lt;b&gt;"), "<b>");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("abc", 10), "abc");
    let t = trunc_for_log("哈希表哈希表", 4);
    assert!(t.starts_with("哈…"));
    assert!(t.ends_with("(18 bytes total)"));
  }
}
