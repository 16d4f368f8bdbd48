//! Knowledge graph facade: one handle over the shared vocabulary, the extractor and the detector.
//!
//! Prompt building and the engine only talk to `KnowledgeGraph`; it turns a
//! (title, description, code?) triple into a `KnowledgeReport`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::extractor::ConceptExtractor;
use crate::patterns::{concept_gap, CodePatternDetector};
use crate::vocabulary::{Concept, ConceptVocabulary};

#[derive(Clone, Debug)]
pub struct KnowledgeGraph {
  extractor: ConceptExtractor,
  detector: CodePatternDetector,
}

/// Everything the knowledge layer can say about a problem and (optionally) a submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeReport {
  pub concepts: BTreeSet<Concept>,
  pub prerequisites: BTreeSet<Concept>,
  pub related: BTreeSet<Concept>,
  /// Concepts evidenced in the submitted code; empty when no code was given.
  pub detected: BTreeSet<Concept>,
  /// `concepts \ detected`, only computed when code was given.
  pub gaps: BTreeSet<Concept>,
}

impl KnowledgeGraph {
  pub fn new(vocab: Arc<ConceptVocabulary>) -> Self {
    Self {
      extractor: ConceptExtractor::new(vocab.clone()),
      detector: CodePatternDetector::new(vocab),
    }
  }

  pub fn extractor(&self) -> &ConceptExtractor {
    &self.extractor
  }

  pub fn detector(&self) -> &CodePatternDetector {
    &self.detector
  }

  #[instrument(level = "debug", skip_all, fields(has_code = code.is_some()))]
  pub fn report(&self, title: &str, description: &str, code: Option<&str>) -> KnowledgeReport {
    let concepts = self.extractor.extract_concepts(title, description);
    let prerequisites = self.extractor.expand_prerequisites(&concepts);
    let related = self.extractor.related_concepts(&concepts);

    let (detected, gaps) = match code.map(str::trim).filter(|c| !c.is_empty()) {
      Some(code) => {
        let detected = self.detector.detect_patterns(code);
        let gaps = concept_gap(&concepts, &detected);
        (detected, gaps)
      }
      None => (BTreeSet::new(), BTreeSet::new()),
    };

    KnowledgeReport { concepts, prerequisites, related, detected, gaps }
  }
}

impl Default for KnowledgeGraph {
  fn default() -> Self {
    Self::new(Arc::new(ConceptVocabulary::builtin()))
  }
}

/// Join concept labels with the Chinese enumeration comma, in set order.
pub fn join_labels(concepts: &BTreeSet<Concept>) -> String {
  concepts.iter().map(|c| c.label()).collect::<Vec<_>>().join("、")
}
