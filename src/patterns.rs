//! Code pattern detection: which concepts are evidenced in submitted source code.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::vocabulary::{CodePatternRule, Concept, ConceptVocabulary};

#[derive(Clone, Debug)]
pub struct CodePatternDetector {
  vocab: Arc<ConceptVocabulary>,
}

impl CodePatternDetector {
  pub fn new(vocab: Arc<ConceptVocabulary>) -> Self {
    Self { vocab }
  }

  /// Concepts whose rule has at least one matching predicate. Never fails: disabled
  /// predicates count as "not matched".
  #[instrument(level = "debug", skip(self, code), fields(code_len = code.len()))]
  pub fn detect_patterns(&self, code: &str) -> BTreeSet<Concept> {
    let mut detected = BTreeSet::new();
    for rule in self.vocab.rules() {
      if rule_matches(rule, code) {
        detected.insert(rule.concept);
      }
    }
    debug!(target: "knowledge", count = detected.len(), "Code patterns detected");
    detected
  }
}

fn rule_matches(rule: &CodePatternRule, code: &str) -> bool {
  rule.predicates.iter().any(|p| {
    if p.is_invalid() {
      debug!(target: "knowledge", concept = ?rule.concept, "Skipping disabled code pattern predicate");
      return false;
    }
    p.is_match(code)
  })
}

/// Concepts the problem text suggests but the code does not show.
pub fn concept_gap(expected: &BTreeSet<Concept>, detected: &BTreeSet<Concept>) -> BTreeSet<Concept> {
  expected.difference(detected).copied().collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vocabulary::Matcher;

  fn detector() -> CodePatternDetector {
    CodePatternDetector::new(Arc::new(ConceptVocabulary::builtin()))
  }

  #[test]
  fn detects_common_idioms() {
    let d = detector();
    let cpp = r#"
      unordered_map<int, int> seen;
      for (int i = 0; i < n; i++) {
        for (int j = 0; j < i; j++) { dp[i] = max(dp[i], dp[j] + 1); }
      }
      sort(a.begin(), a.end());
    "#;
    let found = d.detect_patterns(cpp);
    assert!(found.contains(&Concept::HashTable));
    assert!(found.contains(&Concept::DynamicProgramming));
    assert!(found.contains(&Concept::Sorting));
    assert!(!found.contains(&Concept::UnionFind));
  }

  #[test]
  fn binary_search_needs_loop_shape_and_mid() {
    let d = detector();
    assert!(d.detect_patterns("while (lo <= hi) { int mid = (lo + hi) / 2; }").contains(&Concept::BinarySearch));
    assert!(!d.detect_patterns("while (lo <= hi) { lo++; }").contains(&Concept::BinarySearch));
  }

  #[test]
  fn python_dfs_and_bfs() {
    let d = detector();
    let py = "def dfs(node):\n    pass\nq = deque()\nq.append(1)\n";
    let found = d.detect_patterns(py);
    assert!(found.contains(&Concept::Dfs));
    // "deque" lacks "queue", but "q.append" alone is not enough.
    assert!(!found.contains(&Concept::Bfs));
  }

  #[test]
  fn adversarial_inputs_never_panic() {
    let d = detector();
    let long = "(".repeat(10_000);
    let inputs = ["", "((([[[{{{", "dp[", "\u{0}\u{FFFD}\u{1F600}", "while (", long.as_str(), "``` ``` ```"];
    for input in inputs {
      let _ = d.detect_patterns(input);
    }
  }

  #[test]
  fn invalid_predicate_is_treated_as_no_match() {
    let rule = CodePatternRule {
      concept: Concept::Stack,
      predicates: vec![Matcher::regex("[unterminated"), Matcher::Contains("stk")],
    };
    assert!(!rule_matches(&rule, "[unterminated"));
    assert!(rule_matches(&rule, "int stk[100];"));
  }

  #[test]
  fn gap_is_expected_minus_detected() {
    let expected: BTreeSet<_> = [Concept::HashTable, Concept::Sorting].into_iter().collect();
    let detected: BTreeSet<_> = [Concept::Sorting, Concept::Stack].into_iter().collect();
    assert_eq!(concept_gap(&expected, &detected), [Concept::HashTable].into_iter().collect());
  }
}
