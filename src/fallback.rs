//! Built-in content: fixed fallback results and the seed question set.
//!
//! Fallbacks are what the engine serves when the model cannot answer. They are
//! deterministic and are never written to a cache.

use std::collections::BTreeMap;

use crate::domain::{HintLevel, Question, StandardSolution};

/// Level-appropriate hint used when generation fails.
pub fn fallback_hint(level: HintLevel) -> &'static str {
  match level.get() {
    1 => "提示：仔细阅读题目要求，思考需要处理的边界情况。",
    2 => "提示：考虑使用合适的数据结构来存储和处理数据。思考算法的时间复杂度要求。",
    _ => "提示：可以先写出解题的伪代码，然后逐步实现每个步骤。注意测试边界情况。",
  }
}

/// Placeholder standard solution used when generation fails.
pub fn fallback_solution() -> StandardSolution {
  StandardSolution {
    approach: "题解暂时无法生成，请稍后重试。".into(),
    algorithm: "N/A".into(),
    time_complexity: "N/A".into(),
    space_complexity: "N/A".into(),
    sample_code: BTreeMap::new(),
    key_points: vec!["请联系管理员".into()],
  }
}

/// Small built-in problem set so the service answers without any external bank.
pub fn seed_questions() -> Vec<Question> {
  vec![
    Question {
      id: 1,
      title: "两数之和".into(),
      description: "给定一个整数数组 nums 和一个目标值 target，请你在该数组中找出和为目标值的两个整数，并返回它们的数组下标。可以使用哈希表在一次遍历中完成。".into(),
      difficulty: "简单".into(),
    },
    Question {
      id: 2,
      title: "爬楼梯".into(),
      description: "假设你正在爬楼梯，需要 n 阶才能到达楼顶。每次可以爬 1 或 2 个台阶，有多少种不同的方法可以爬到楼顶？".into(),
      difficulty: "简单".into(),
    },
    Question {
      id: 3,
      title: "最短路径".into(),
      description: "给定一张带权有向图，边权均为非负整数，求从 1 号点到 n 号点的最短路长度。".into(),
      difficulty: "中等".into(),
    },
    Question {
      id: 4,
      title: "0-1 背包".into(),
      description: "有 n 件物品和一个容量为 V 的背包，每件物品只能使用一次。求解将哪些物品装入背包，可使价值总和最大。".into(),
      difficulty: "中等".into(),
    },
  ]
}
