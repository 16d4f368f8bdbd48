//! Concept extraction from problem text, plus prerequisite and related-concept expansion.
//!
//! Matching is plain substring containment over the lower-cased `title + " " + description`.
//! Short keywords (`dp`, `bit`, `sort`) therefore also fire inside longer words; this is the
//! accepted behavior of the tagger, not something to tighten with word boundaries.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::vocabulary::{Concept, ConceptVocabulary};

/// Members taken from a concept's domain group when listing related concepts.
const RELATED_PER_CONCEPT: usize = 2;

#[derive(Clone, Debug)]
pub struct ConceptExtractor {
  vocab: Arc<ConceptVocabulary>,
}

impl ConceptExtractor {
  pub fn new(vocab: Arc<ConceptVocabulary>) -> Self {
    Self { vocab }
  }

  #[instrument(level = "debug", skip(self, title, description), fields(title_len = title.len(), desc_len = description.len()))]
  pub fn extract_concepts(&self, title: &str, description: &str) -> BTreeSet<Concept> {
    let text = format!("{} {}", title, description).to_lowercase();
    let mut tags = BTreeSet::new();

    for (keyword, concepts) in self.vocab.keywords() {
      if text.contains(keyword) {
        tags.extend(concepts.iter().copied());
      }
    }

    debug!(target: "knowledge", count = tags.len(), "Concepts extracted from problem text");
    tags
  }

  /// One hop over the prerequisite graph; never returns a concept that is already in `concepts`.
  pub fn expand_prerequisites(&self, concepts: &BTreeSet<Concept>) -> BTreeSet<Concept> {
    concepts
      .iter()
      .flat_map(|c| self.vocab.prerequisites_of(*c).iter().copied())
      .filter(|p| !concepts.contains(p))
      .collect()
  }

  /// Up to two other members of each concept's domain group, in group order.
  pub fn related_concepts(&self, concepts: &BTreeSet<Concept>) -> BTreeSet<Concept> {
    let mut related = BTreeSet::new();
    for concept in concepts {
      if let Some(domain) = self.vocab.domain_of(*concept) {
        related.extend(
          domain
            .members
            .iter()
            .copied()
            .filter(|m| m != concept)
            .take(RELATED_PER_CONCEPT),
        );
      }
    }
    related
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn extractor() -> ConceptExtractor {
    ConceptExtractor::new(Arc::new(ConceptVocabulary::builtin()))
  }

  #[test]
  fn every_keyword_tags_its_concepts_in_any_case() {
    let ex = extractor();
    let vocab = ConceptVocabulary::builtin();
    for (keyword, concepts) in vocab.keywords() {
      let desc = format!("题目描述 {} 结尾", keyword.to_uppercase());
      let tags = ex.extract_concepts("", &desc);
      for c in concepts {
        assert!(tags.contains(c), "keyword {keyword:?} should tag {c:?}");
      }
    }
  }

  #[test]
  fn two_sum_with_hash_table_tags_hash_table() {
    let ex = extractor();
    let tags = ex.extract_concepts("Two Sum", "给定一个整数数组，请使用哈希表在一次遍历中找到两个数。");
    assert!(tags.contains(&Concept::HashTable));

    let prereqs = ex.expand_prerequisites(&tags);
    assert!(!prereqs.contains(&Concept::HashTable));
    for p in &prereqs {
      assert!(!tags.contains(p));
    }
  }

  #[test]
  fn substring_matching_is_permissive() {
    // "bit" fires inside "orbital", "sort" inside "resort".
    let tags = extractor().extract_concepts("Orbital resort", "");
    assert!(tags.contains(&Concept::BitManipulation));
    assert!(tags.contains(&Concept::Sorting));
  }

  #[test]
  fn prerequisites_are_one_hop_and_exclude_inputs() {
    let ex = extractor();
    let input: BTreeSet<_> = [Concept::Memoization, Concept::HashTable].into_iter().collect();
    let prereqs = ex.expand_prerequisites(&input);
    assert_eq!(prereqs, [Concept::Recursion].into_iter().collect());

    // Backtracking -> Dfs, but Dfs's own prerequisites are not followed.
    let prereqs = ex.expand_prerequisites(&[Concept::Backtracking].into_iter().collect());
    assert_eq!(prereqs, [Concept::Recursion, Concept::Dfs].into_iter().collect());
  }

  #[test]
  fn prerequisites_never_intersect_input_for_any_single_concept_pair() {
    let ex = extractor();
    let vocab = ConceptVocabulary::builtin();
    let all: Vec<Concept> = vocab.keywords().flat_map(|(_, cs)| cs.iter().copied()).collect();
    for a in &all {
      for b in &all {
        let input: BTreeSet<_> = [*a, *b].into_iter().collect();
        assert!(ex.expand_prerequisites(&input).is_disjoint(&input));
      }
    }
  }

  #[test]
  fn related_concepts_take_two_from_the_domain() {
    let ex = extractor();
    let related = ex.related_concepts(&[Concept::Bfs].into_iter().collect());
    assert_eq!(related, [Concept::BinarySearch, Concept::Dfs].into_iter().collect());

    let related = ex.related_concepts(&[Concept::NumberTheory].into_iter().collect());
    assert!(related.is_empty());
  }
}
