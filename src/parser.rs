//! Reply parsing: turn the model's semi-structured markdown into typed results.
//!
//! Both document kinds (standard solution, code review) run through one line-driven
//! `SectionMachine`. A `Schema` says which headings exist and how a finished section
//! is folded into the output; the machine owns the current section, the text buffer
//! and the code-fence toggle. Nothing here returns an error: unknown or missing
//! sections leave their field at its default.

use std::collections::btree_map::Entry;
use std::fmt;
use std::mem;

use tracing::debug;

use crate::domain::{CodeAnalysis, StandardSolution, UNKNOWN_SCORE};
use crate::prompts::fence_tag;

/// Describes one document layout for the section machine.
pub trait Schema {
  type Section: Copy + PartialEq + fmt::Debug + 'static;
  type Output: Default;

  /// Accepted heading names per section; longest variants first.
  const HEADINGS: &'static [(Self::Section, &'static [&'static str])];

  /// Section whose marked heading may carry a prefix ("C++ 示例代码").
  fn loose_heading(&self, _section: Self::Section) -> bool {
    false
  }

  /// Section whose heading may end in a bare number ("## 评分 85").
  fn takes_trailing_number(&self, _section: Self::Section) -> bool {
    false
  }

  fn flush(&self, out: &mut Self::Output, section: Self::Section, lines: &[String]);

  fn code_block(&self, _out: &mut Self::Output, _section: Option<Self::Section>, _fence: &str, _code: String) {}

  fn finish(&self, _out: &mut Self::Output) {}
}

/// Line-at-a-time state machine. `step` consumes one line and returns the next state.
pub struct SectionMachine<S: Schema> {
  schema: S,
  out: S::Output,
  current: Option<S::Section>,
  buffer: Vec<String>,
  /// `Some(tag)` while inside a fenced block opened with that info string.
  fence: Option<String>,
  code: Vec<String>,
}

impl<S: Schema> SectionMachine<S> {
  pub fn new(schema: S) -> Self {
    Self {
      schema,
      out: S::Output::default(),
      current: None,
      buffer: Vec::new(),
      fence: None,
      code: Vec::new(),
    }
  }

  pub fn step(mut self, line: &str) -> Self {
    let trimmed = line.trim();

    if let Some(tag) = fence_marker(trimmed) {
      match self.fence.take() {
        None => self.fence = Some(tag.to_string()),
        Some(open) => self.close_fence(&open),
      }
      return self;
    }

    if let Some((at, tag)) = inline_fence(line) {
      match self.fence.take() {
        None => {
          self = self.step(&line[..at]);
          self.fence = Some(tag.to_string());
        }
        Some(open) => {
          let code = line[..at].trim_end();
          if !code.trim().is_empty() {
            self.code.push(code.to_string());
          }
          self.close_fence(&open);
        }
      }
      return self;
    }

    if self.fence.is_some() {
      self.code.push(line.trim_end().to_string());
      return self;
    }

    if let Some((section, inline)) = match_heading(&self.schema, trimmed) {
      self.flush();
      self.current = Some(section);
      if let Some(text) = inline {
        self.buffer.push(text);
      }
      return self;
    }

    if !trimmed.is_empty() && self.current.is_some() {
      self.buffer.push(trimmed.to_string());
    }
    self
  }

  pub fn finish(mut self) -> S::Output {
    // An unterminated fence still yields its code.
    if let Some(open) = self.fence.take() {
      self.close_fence(&open);
    }
    self.flush();
    self.schema.finish(&mut self.out);
    self.out
  }

  fn flush(&mut self) {
    let lines = mem::take(&mut self.buffer);
    if let Some(section) = self.current {
      if !lines.is_empty() {
        self.schema.flush(&mut self.out, section, &lines);
      }
    }
  }

  fn close_fence(&mut self, tag: &str) {
    let lines = mem::take(&mut self.code);
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let Some(start) = start else { return };
    let code = lines[start..].join("\n").trim_end().to_string();
    self.schema.code_block(&mut self.out, self.current, tag, code);
  }
}

/// Run a whole reply through a schema.
pub fn parse_with<S: Schema>(schema: S, text: &str) -> S::Output {
  text.lines().fold(SectionMachine::new(schema), SectionMachine::step).finish()
}

/// Hints are free text; only surrounding whitespace is removed.
pub fn parse_hint(text: &str) -> String {
  text.trim().to_string()
}

pub fn parse_solution(text: &str, language: &str) -> StandardSolution {
  let solution = parse_with(SolutionSchema::new(language), text);
  debug!(
    target: "qa",
    approach_len = solution.approach.len(),
    code_blocks = solution.sample_code.len(),
    key_points = solution.key_points.len(),
    "Solution reply parsed"
  );
  solution
}

pub fn parse_analysis(text: &str) -> CodeAnalysis {
  let analysis = parse_with(AnalysisSchema, text).finish();
  debug!(target: "qa", score = analysis.score, suggestions = analysis.suggestions.len(), "Analysis reply parsed");
  analysis
}

/* ---------------- solution ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolutionSection {
  Approach,
  Algorithm,
  Complexity,
  KeyPoints,
  SampleCode,
}

pub struct SolutionSchema {
  language: String,
  tag: String,
}

impl SolutionSchema {
  pub fn new(language: &str) -> Self {
    Self { language: language.to_string(), tag: fence_tag(language) }
  }

  /// Blocks tagged with the requested language (or untagged) are filed under its display name.
  fn key_for(&self, fence: &str) -> String {
    if fence.is_empty() || fence_tag(fence) == self.tag {
      self.language.clone()
    } else {
      fence.to_string()
    }
  }
}

impl Schema for SolutionSchema {
  type Section = SolutionSection;
  type Output = StandardSolution;

  const HEADINGS: &'static [(SolutionSection, &'static [&'static str])] = &[
    (SolutionSection::Approach, &["解题思路", "approach"]),
    (SolutionSection::Algorithm, &["算法说明", "algorithm"]),
    (SolutionSection::Complexity, &["复杂度分析", "复杂度", "complexity analysis", "complexity"]),
    (SolutionSection::KeyPoints, &["关键点", "key points"]),
    (SolutionSection::SampleCode, &["示例代码", "代码示例", "参考代码", "sample code"]),
  ];

  fn loose_heading(&self, section: SolutionSection) -> bool {
    section == SolutionSection::SampleCode
  }

  fn flush(&self, out: &mut StandardSolution, section: SolutionSection, lines: &[String]) {
    match section {
      SolutionSection::Approach => out.approach = free_text(lines),
      SolutionSection::Algorithm => out.algorithm = free_text(lines),
      SolutionSection::Complexity => pick_complexity(lines, &mut out.time_complexity, &mut out.space_complexity),
      SolutionSection::KeyPoints => out.key_points.extend(lines.iter().filter_map(|l| list_item(l))),
      // Prose around the sample code is not kept.
      SolutionSection::SampleCode => {}
    }
  }

  fn code_block(&self, out: &mut StandardSolution, section: Option<SolutionSection>, fence: &str, code: String) {
    let key = self.key_for(fence);
    if section == Some(SolutionSection::SampleCode) {
      out.sample_code.insert(key, code);
    } else if let Entry::Vacant(slot) = out.sample_code.entry(key) {
      slot.insert(code);
    }
  }
}

/* ---------------- code analysis ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisSection {
  Overall,
  Correctness,
  Complexity,
  Suggestions,
  Score,
}

pub struct AnalysisSchema;

/// Review under construction; the score stays unknown until a valid one is seen.
#[derive(Debug, Default)]
pub struct AnalysisDraft {
  analysis: CodeAnalysis,
  score: Option<u8>,
}

impl AnalysisDraft {
  pub fn finish(self) -> CodeAnalysis {
    CodeAnalysis { score: self.score.unwrap_or(UNKNOWN_SCORE), ..self.analysis }
  }
}

impl Schema for AnalysisSchema {
  type Section = AnalysisSection;
  type Output = AnalysisDraft;

  const HEADINGS: &'static [(AnalysisSection, &'static [&'static str])] = &[
    (AnalysisSection::Overall, &["整体评价", "总体评价", "overall review", "overall"]),
    (AnalysisSection::Correctness, &["正确性分析", "正确性", "correctness"]),
    (AnalysisSection::Complexity, &["复杂度分析", "complexity analysis", "complexity"]),
    (AnalysisSection::Suggestions, &["优化建议", "改进建议", "suggestions"]),
    (AnalysisSection::Score, &["评分", "得分", "score"]),
  ];

  fn takes_trailing_number(&self, section: AnalysisSection) -> bool {
    section == AnalysisSection::Score
  }

  fn flush(&self, out: &mut AnalysisDraft, section: AnalysisSection, lines: &[String]) {
    let a = &mut out.analysis;
    match section {
      AnalysisSection::Overall => a.overall_review = free_text(lines),
      AnalysisSection::Correctness => a.correctness = free_text(lines),
      AnalysisSection::Complexity => pick_complexity(lines, &mut a.time_complexity, &mut a.space_complexity),
      AnalysisSection::Suggestions => a.suggestions.extend(lines.iter().filter_map(|l| list_item(l))),
      AnalysisSection::Score => {
        if out.score.is_none() {
          out.score = first_integer(&lines.join(" ")).and_then(|n| u8::try_from(n).ok()).filter(|n| *n <= 100);
        }
      }
    }
  }
}

/* ---------------- line helpers ---------------- */

/// Info string of a fence line (```` ```cpp ```` → `cpp`), or None when the line is not a fence.
fn fence_marker(trimmed: &str) -> Option<&str> {
  trimmed
    .strip_prefix("```")
    .or_else(|| trimmed.strip_prefix("~~~"))
    .map(|rest| rest.trim_start_matches(['`', '~']).trim())
}

/// A fence that follows text on the same line (`代码如下：```cpp`): byte offset of the
/// backticks and the info string. A span closed on the same line is prose, not a fence.
fn inline_fence(line: &str) -> Option<(usize, &str)> {
  let at = line.find("```")?;
  let rest = line[at..].trim_start_matches('`');
  if rest.contains("```") {
    return None;
  }
  Some((at, rest.trim()))
}

/// Recognize a heading line and return its section plus any inline content.
///
/// Accepted forms: a marked line (`#`.. or `**`) starting with the name; an unmarked line
/// starting with the name followed by a colon; a line that is exactly the name. A
/// parenthesised qualifier may sit between the name and the colon (`评分 (满分100): 85`).
/// Loose sections also accept a `#` heading ending in the name (`## C++ 示例代码`).
fn match_heading<S: Schema>(schema: &S, line: &str) -> Option<(S::Section, Option<String>)> {
  if line.is_empty() {
    return None;
  }
  let hashed = line.starts_with('#');
  let unhashed = line.trim_start_matches('#').trim_start();
  let bold = unhashed.starts_with("**");
  let marked = hashed || bold;
  // A single leading `*` is a list bullet, never emphasis.
  let text = if bold { unhashed.trim_start_matches('*').trim_start() } else { unhashed };
  let lower = text.to_ascii_lowercase();

  for (section, names) in S::HEADINGS {
    for &name in names.iter() {
      let (at, loose) = if lower.starts_with(name) {
        (0, false)
      } else if hashed && schema.loose_heading(*section) {
        match lower.find(name) {
          Some(at) => (at, true),
          None => continue,
        }
      } else {
        continue;
      };

      let rest = &text[at + name.len()..];
      let mut after = rest.trim_start_matches(['*', ' ', '\t']);
      let qualified = skip_qualifier(after);
      if qualified.starts_with([':', '：']) || qualified.trim_end_matches(['*', ' ', '\t']).is_empty() {
        after = qualified;
      }
      let colon = after.starts_with([':', '：']);
      let exact = after.trim_end_matches(['*', ' ', '\t']).is_empty();
      let accepted = if loose { colon || exact } else { marked || colon || exact };
      if !accepted {
        continue;
      }
      return Some((*section, inline_content(after, colon, schema.takes_trailing_number(*section))));
    }
  }
  None
}

/// Skip a leading `(..)` / `（..）` qualifier and the spacing after it.
fn skip_qualifier(after: &str) -> &str {
  let close = match after.chars().next() {
    Some('(') => ')',
    Some('（') => '）',
    _ => return after,
  };
  match after.find(close) {
    Some(end) => after[end + close.len_utf8()..].trim_start_matches(['*', ' ', '\t']),
    None => after,
  }
}

fn inline_content(after: &str, colon: bool, trailing_number: bool) -> Option<String> {
  if colon {
    let body = after.trim_start_matches([':', '：']).trim().trim_end_matches('*').trim();
    return (!body.is_empty()).then(|| body.to_string());
  }
  if trailing_number {
    let tail = after.trim().trim_end_matches(['*', ' ']).trim_end_matches('分').trim_end_matches("/100").trim_end();
    let digits = tail.len() - tail.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
      return Some(tail[tail.len() - digits..].to_string());
    }
  }
  None
}

fn free_text(lines: &[String]) -> String {
  lines.join("\n").trim().to_string()
}

/// First line mentioning each complexity kind wins; later sections never overwrite.
fn pick_complexity(lines: &[String], time: &mut String, space: &mut String) {
  for line in lines {
    let lower = line.to_ascii_lowercase();
    if time.is_empty() && (line.contains("时间复杂度") || lower.contains("time complexity")) {
      *time = line.clone();
    }
    if space.is_empty() && (line.contains("空间复杂度") || lower.contains("space complexity")) {
      *space = line.clone();
    }
  }
}

/// A bullet (`-`, `•`, `*`, `·`) or numbered line, stripped of its marker.
fn list_item(line: &str) -> Option<String> {
  let t = line.trim();
  let first = t.chars().next()?;
  let body = if matches!(first, '-' | '•' | '*' | '·') {
    t.trim_start_matches(['-', '•', '*', '·'])
  } else if first.is_ascii_digit() {
    let rest = t.trim_start_matches(|c: char| c.is_ascii_digit());
    match rest.chars().next() {
      Some(p @ ('.' | ')' | '、' | '）' | ':' | '：')) => &rest[p.len_utf8()..],
      _ => t,
    }
  } else {
    return None;
  };
  let body = body.trim();
  (!body.is_empty()).then(|| body.to_string())
}

/// First integer token, with an optional leading minus. Overlong runs yield None.
fn first_integer(text: &str) -> Option<i64> {
  let start = text.find(|c: char| c.is_ascii_digit())?;
  let run = &text[start..];
  let end = run.find(|c: char| !c.is_ascii_digit()).unwrap_or(run.len());
  let n: i64 = run[..end].parse().ok()?;
  let negative = text[..start].ends_with('-');
  Some(if negative { -n } else { n })
}
