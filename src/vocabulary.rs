//! Concept vocabulary: the closed set of algorithmic concepts plus the static tables
//! built on top of it (keyword map, prerequisite graph, domain groups, code pattern rules).
//!
//! The vocabulary is built once at startup and shared read-only (`Arc<ConceptVocabulary>`)
//! by the extractor and the code pattern detector.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named algorithmic / data-structure topic.
///
/// Serialized by variant name (`"HashTable"`); `label()` is the display name used in prompts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Concept {
  // Paradigms
  DynamicProgramming,
  Memoization,
  Greedy,
  Backtracking,
  DivideAndConquer,
  Recursion,
  RecursiveThinking,
  MathematicalInduction,
  StateCompression,
  Knapsack,
  LongestSubsequence,
  // Search
  BinarySearch,
  Dfs,
  Bfs,
  // Graphs
  ShortestPath,
  TopologicalSort,
  MinimumSpanningTree,
  StronglyConnectedComponents,
  GraphRepresentation,
  GraphBasics,
  // Data structures
  Array,
  LinkedList,
  Stack,
  Queue,
  HashTable,
  Tree,
  Graph,
  Heap,
  PriorityQueue,
  SegmentTree,
  FenwickTree,
  UnionFind,
  Trie,
  BinaryTree,
  CompleteBinaryTree,
  TreeRepresentation,
  // Sorting
  Sorting,
  QuickSort,
  MergeSort,
  HeapSort,
  BubbleSort,
  // Strings
  Kmp,
  StringHashing,
  SuffixArray,
  StringProcessing,
  StringBasics,
  StateMachine,
  HashFunction,
  RadixConversion,
  // Math
  NumberTheory,
  Primes,
  Gcd,
  Combinatorics,
  PermutationsAndCombinations,
  Recurrence,
  Probability,
  BasicProbability,
  Expectation,
  // Techniques
  TwoPointers,
  SlidingWindow,
  PrefixSum,
  DifferenceArray,
  BitManipulation,
  BinaryOperations,
}

impl Concept {
  pub fn label(self) -> &'static str {
    use Concept::*;
    match self {
      DynamicProgramming => "动态规划",
      Memoization => "记忆化搜索",
      Greedy => "贪心算法",
      Backtracking => "回溯",
      DivideAndConquer => "分治",
      Recursion => "递归",
      RecursiveThinking => "递归思想",
      MathematicalInduction => "数学归纳法",
      StateCompression => "状态压缩",
      Knapsack => "背包问题",
      LongestSubsequence => "最长子序列",
      BinarySearch => "二分查找",
      Dfs => "DFS",
      Bfs => "BFS",
      ShortestPath => "最短路径",
      TopologicalSort => "拓扑排序",
      MinimumSpanningTree => "最小生成树",
      StronglyConnectedComponents => "强连通分量",
      GraphRepresentation => "图的表示",
      GraphBasics => "图论基础",
      Array => "数组",
      LinkedList => "链表",
      Stack => "栈",
      Queue => "队列",
      HashTable => "哈希表",
      Tree => "树",
      Graph => "图",
      Heap => "堆",
      PriorityQueue => "优先队列",
      SegmentTree => "线段树",
      FenwickTree => "树状数组",
      UnionFind => "并查集",
      Trie => "Trie树",
      BinaryTree => "二叉树",
      CompleteBinaryTree => "完全二叉树",
      TreeRepresentation => "树的表示",
      Sorting => "排序算法",
      QuickSort => "快速排序",
      MergeSort => "归并排序",
      HeapSort => "堆排序",
      BubbleSort => "冒泡排序",
      Kmp => "KMP",
      StringHashing => "字符串哈希",
      SuffixArray => "后缀数组",
      StringProcessing => "字符串处理",
      StringBasics => "字符串基础",
      StateMachine => "状态机",
      HashFunction => "哈希函数",
      RadixConversion => "进制转换",
      NumberTheory => "数论",
      Primes => "质数",
      Gcd => "最大公约数",
      Combinatorics => "组合数学",
      PermutationsAndCombinations => "排列组合",
      Recurrence => "递推",
      Probability => "概率论",
      BasicProbability => "基础概率",
      Expectation => "期望",
      TwoPointers => "双指针",
      SlidingWindow => "滑动窗口",
      PrefixSum => "前缀和",
      DifferenceArray => "差分数组",
      BitManipulation => "位运算",
      BinaryOperations => "二进制运算",
    }
  }
}

impl fmt::Display for Concept {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Boolean predicate over a source-code string.
///
/// Evaluation is total: an `Invalid` matcher (a regex that failed to compile) never matches.
#[derive(Clone, Debug)]
pub enum Matcher {
  Contains(&'static str),
  ContainsAny(Vec<&'static str>),
  Regex(Regex),
  All(Vec<Matcher>),
  Any(Vec<Matcher>),
  Invalid { pattern: String, reason: String },
}

impl Matcher {
  /// Compile a regex matcher; a bad pattern degrades to `Invalid` instead of failing the build.
  pub fn regex(pattern: &str) -> Self {
    match Regex::new(pattern) {
      Ok(re) => Matcher::Regex(re),
      Err(e) => {
        warn!(target: "knowledge", %pattern, error = %e, "Code pattern regex rejected; rule predicate disabled");
        Matcher::Invalid { pattern: pattern.to_string(), reason: e.to_string() }
      }
    }
  }

  pub fn any_of(literals: &[&'static str]) -> Self {
    Matcher::ContainsAny(literals.to_vec())
  }

  pub fn is_match(&self, code: &str) -> bool {
    match self {
      Matcher::Contains(lit) => code.contains(*lit),
      Matcher::ContainsAny(lits) => lits.iter().any(|l| code.contains(*l)),
      Matcher::Regex(re) => re.is_match(code),
      Matcher::All(parts) => !parts.is_empty() && parts.iter().all(|m| m.is_match(code)),
      Matcher::Any(parts) => parts.iter().any(|m| m.is_match(code)),
      Matcher::Invalid { .. } => false,
    }
  }

  pub fn is_invalid(&self) -> bool {
    matches!(self, Matcher::Invalid { .. })
  }
}

/// A concept paired with independent predicates; the rule matches if any predicate does.
#[derive(Clone, Debug)]
pub struct CodePatternRule {
  pub concept: Concept,
  pub predicates: Vec<Matcher>,
}

/// Named domain group, used only for "related concepts" lookup.
#[derive(Clone, Debug)]
pub struct Domain {
  pub name: &'static str,
  pub members: Vec<Concept>,
}

#[derive(Clone, Debug)]
pub struct ConceptVocabulary {
  keywords: Vec<(String, Vec<Concept>)>,
  prerequisites: HashMap<Concept, Vec<Concept>>,
  domains: Vec<Domain>,
  rules: Vec<CodePatternRule>,
}

impl ConceptVocabulary {
  /// Built-in tables for competitive-programming style exercises.
  pub fn builtin() -> Self {
    Self {
      keywords: builtin_keywords()
        .iter()
        .map(|(k, cs)| (k.to_lowercase(), cs.to_vec()))
        .collect(),
      prerequisites: builtin_prerequisites()
        .iter()
        .map(|(c, ps)| (*c, ps.to_vec()))
        .collect(),
      domains: builtin_domains(),
      rules: builtin_rules(),
    }
  }

  /// Append extra keyword rows (e.g. from configuration). Keywords are lower-cased;
  /// a keyword that already exists gets the new concepts merged in.
  pub fn with_extra_keywords<I>(mut self, rows: I) -> Self
  where
    I: IntoIterator<Item = (String, Vec<Concept>)>,
  {
    for (keyword, concepts) in rows {
      let keyword = keyword.trim().to_lowercase();
      if keyword.is_empty() || concepts.is_empty() {
        continue;
      }
      match self.keywords.iter_mut().find(|(k, _)| *k == keyword) {
        Some((_, existing)) => {
          for c in concepts {
            if !existing.contains(&c) {
              existing.push(c);
            }
          }
        }
        None => self.keywords.push((keyword, concepts)),
      }
    }
    self
  }

  pub fn keywords(&self) -> impl Iterator<Item = (&str, &[Concept])> {
    self.keywords.iter().map(|(k, cs)| (k.as_str(), cs.as_slice()))
  }

  pub fn prerequisites_of(&self, concept: Concept) -> &[Concept] {
    self.prerequisites.get(&concept).map(Vec::as_slice).unwrap_or(&[])
  }

  /// First domain group that lists `concept` as a member.
  pub fn domain_of(&self, concept: Concept) -> Option<&Domain> {
    self.domains.iter().find(|d| d.members.contains(&concept))
  }

  pub fn rules(&self) -> &[CodePatternRule] {
    &self.rules
  }
}

impl Default for ConceptVocabulary {
  fn default() -> Self {
    Self::builtin()
  }
}

fn builtin_keywords() -> &'static [(&'static str, &'static [Concept])] {
  use Concept::*;
  const TABLE: &[(&str, &[Concept])] = &[
    // dynamic programming
    ("动态规划", &[DynamicProgramming]),
    ("dp", &[DynamicProgramming]),
    ("最优子结构", &[DynamicProgramming]),
    ("重叠子问题", &[DynamicProgramming]),
    ("背包", &[DynamicProgramming, Knapsack]),
    ("最长公共子序列", &[DynamicProgramming, LongestSubsequence]),
    ("最长上升子序列", &[DynamicProgramming, LongestSubsequence]),
    // greedy
    ("贪心", &[Greedy]),
    ("greedy", &[Greedy]),
    ("局部最优", &[Greedy]),
    // search
    ("二分", &[BinarySearch]),
    ("binary search", &[BinarySearch]),
    ("dfs", &[Dfs]),
    ("深度优先", &[Dfs]),
    ("bfs", &[Bfs]),
    ("广度优先", &[Bfs]),
    ("回溯", &[Backtracking]),
    ("backtrack", &[Backtracking]),
    // graphs
    ("最短路", &[ShortestPath]),
    ("dijkstra", &[ShortestPath]),
    ("floyd", &[ShortestPath]),
    ("最小生成树", &[MinimumSpanningTree]),
    ("拓扑排序", &[TopologicalSort]),
    ("连通性", &[GraphBasics]),
    // data structures
    ("栈", &[Stack]),
    ("stack", &[Stack]),
    ("队列", &[Queue]),
    ("queue", &[Queue]),
    ("哈希", &[HashTable]),
    ("hash", &[HashTable]),
    ("堆", &[Heap]),
    ("heap", &[Heap]),
    ("优先队列", &[Heap, PriorityQueue]),
    ("线段树", &[SegmentTree]),
    ("树状数组", &[FenwickTree]),
    ("并查集", &[UnionFind]),
    ("union find", &[UnionFind]),
    ("trie", &[Trie]),
    ("前缀树", &[Trie]),
    // sorting
    ("排序", &[Sorting]),
    ("sort", &[Sorting]),
    // strings
    ("kmp", &[Kmp]),
    ("字符串匹配", &[StringProcessing]),
    ("子串", &[StringProcessing]),
    // math
    ("质数", &[NumberTheory]),
    ("素数", &[NumberTheory]),
    ("最大公约数", &[NumberTheory]),
    ("gcd", &[NumberTheory]),
    ("组合", &[Combinatorics]),
    ("排列", &[Combinatorics]),
    ("概率", &[Probability]),
    ("期望", &[Probability]),
    // techniques
    ("滑动窗口", &[TwoPointers, SlidingWindow]),
    ("双指针", &[TwoPointers]),
    ("前缀和", &[PrefixSum]),
    ("差分", &[DifferenceArray]),
    ("位运算", &[BitManipulation]),
    ("bit", &[BitManipulation]),
  ];
  TABLE
}

fn builtin_prerequisites() -> &'static [(Concept, &'static [Concept])] {
  use Concept::*;
  const TABLE: &[(Concept, &[Concept])] = &[
    (DynamicProgramming, &[RecursiveThinking, MathematicalInduction]),
    (Memoization, &[Recursion, HashTable]),
    (Greedy, &[Sorting, PriorityQueue]),
    (Backtracking, &[Recursion, Dfs]),
    (DivideAndConquer, &[Recursion]),
    (ShortestPath, &[GraphRepresentation, Bfs]),
    (TopologicalSort, &[GraphRepresentation, Dfs, Bfs]),
    (MinimumSpanningTree, &[GraphRepresentation, UnionFind, Greedy]),
    (StronglyConnectedComponents, &[Dfs, GraphBasics]),
    (SegmentTree, &[BinaryTree, Recursion]),
    (FenwickTree, &[BinaryOperations, PrefixSum]),
    (UnionFind, &[TreeRepresentation]),
    (Trie, &[TreeRepresentation, StringProcessing]),
    (Heap, &[CompleteBinaryTree, PriorityQueue]),
    (Kmp, &[StringBasics, StateMachine]),
    (StringHashing, &[HashFunction, RadixConversion]),
    (NumberTheory, &[Primes, Gcd]),
    (Combinatorics, &[PermutationsAndCombinations, Recurrence]),
    (Probability, &[BasicProbability, Expectation]),
  ];
  TABLE
}

fn builtin_domains() -> Vec<Domain> {
  use Concept::*;
  vec![
    Domain { name: "数据结构", members: vec![Array, LinkedList, Stack, Queue, HashTable, Tree, Graph, Heap] },
    Domain { name: "搜索算法", members: vec![BinarySearch, Dfs, Bfs, Backtracking] },
    Domain { name: "排序算法", members: vec![QuickSort, MergeSort, HeapSort, BubbleSort] },
    Domain { name: "动态规划", members: vec![Memoization, StateCompression, Knapsack, LongestSubsequence] },
    Domain { name: "图论", members: vec![ShortestPath, MinimumSpanningTree, TopologicalSort, StronglyConnectedComponents] },
    Domain { name: "字符串", members: vec![Kmp, StringHashing, Trie, SuffixArray] },
  ]
}

fn builtin_rules() -> Vec<CodePatternRule> {
  use Concept::*;
  use Matcher::{All, Contains};

  let rule = |concept, predicates| CodePatternRule { concept, predicates };

  vec![
    rule(DynamicProgramming, vec![
      Contains("dp["),
      Contains("memo["),
      Matcher::regex(r"for.*for.*dp\["),
    ]),
    rule(BinarySearch, vec![
      All(vec![
        Matcher::regex(r"while\s*\(\s*\w+\s*[<>]=\s*\w+\s*\)"),
        Matcher::any_of(&["mid", "middle"]),
      ]),
      Matcher::any_of(&["binary_search", "BinarySearch"]),
      Matcher::any_of(&["lower_bound", "upper_bound"]),
    ]),
    rule(Dfs, vec![
      Matcher::Any(vec![Matcher::regex(r"void\s+dfs\s*\("), Matcher::regex(r"def\s+dfs\s*\(")]),
      All(vec![Contains("visited["), Contains("递归")]),
      Matcher::regex(r"function\s+dfs"),
    ]),
    rule(Bfs, vec![
      All(vec![
        Matcher::any_of(&["queue", "Queue"]),
        Matcher::any_of(&["push", "Enqueue", "append"]),
      ]),
      All(vec![Matcher::regex(r"while.*(!|not).*empty\(\)"), Contains("front")]),
      Contains("bfs"),
    ]),
    rule(HashTable, vec![
      Matcher::any_of(&["unordered_map", "HashMap", "Dictionary", "dict"]),
      Matcher::any_of(&["hash", "Hash"]),
      Matcher::regex(r"map\s*<"),
    ]),
    rule(Stack, vec![
      All(vec![Matcher::any_of(&["stack", "Stack"]), Matcher::any_of(&["push", "pop"])]),
      Contains("stk"),
    ]),
    rule(Heap, vec![
      Matcher::any_of(&["priority_queue", "PriorityQueue"]),
      Matcher::any_of(&["heap", "Heap"]),
      Contains("heapify"),
    ]),
    rule(Sorting, vec![
      Matcher::any_of(&["sort(", "Sort(", ".sort()", "sorted("]),
      Matcher::any_of(&["quicksort", "mergesort"]),
    ]),
    rule(UnionFind, vec![
      All(vec![Contains("find("), Contains("union(")]),
      All(vec![Contains("parent["), Matcher::regex(r"find|union")]),
      Matcher::any_of(&["UnionFind", "DSU"]),
    ]),
    rule(TwoPointers, vec![
      Matcher::Any(vec![
        Matcher::regex(r"(left|l)\s*=.*right|r\s*="),
        Matcher::regex(r"while.*<.*\+\+.*--"),
      ]),
      All(vec![
        Contains("left"),
        Contains("right"),
        Matcher::any_of(&["left++", "right--"]),
      ]),
    ]),
    rule(PrefixSum, vec![
      Matcher::any_of(&["prefix", "preSum", "前缀和"]),
      Matcher::regex(r"sum\[\w+\]\s*[-+]=\s*sum\[\w+\s*[-+]\s*1\]"),
    ]),
    rule(SlidingWindow, vec![
      All(vec![Contains("window"), Matcher::any_of(&["left", "right"])]),
      Matcher::regex(r"while.*窗口"),
    ]),
    rule(BitManipulation, vec![
      Matcher::regex(r"[&|^~]\s*[&|^~]|<<|>>"),
      Matcher::any_of(&["bit", "Bit"]),
    ]),
    rule(Greedy, vec![
      All(vec![Contains("sort"), Matcher::regex(r"for.*greedy|贪心")]),
    ]),
  ]
}
