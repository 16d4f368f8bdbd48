//! Prompt construction for hints, standard solutions and code reviews.
//!
//! Builders are pure: the same inputs and vocabulary always produce the same text.
//! Each hint level has its own disclosure contract; the level-1 template must never contain
//! code of any kind (no fences, no indexing snippets), only qualitative direction.

use std::fmt::Write as _;

use crate::domain::{effective_language, HintLevel};
use crate::knowledge::{join_labels, KnowledgeGraph, KnowledgeReport};

#[derive(Clone, Debug, Default)]
pub struct PromptBuilder {
  knowledge: KnowledgeGraph,
}

impl PromptBuilder {
  pub fn new(knowledge: KnowledgeGraph) -> Self {
    Self { knowledge }
  }

  pub fn hint_prompt(
    &self,
    title: &str,
    description: &str,
    level: HintLevel,
    user_code: Option<&str>,
    language: Option<&str>,
  ) -> String {
    let lang = effective_language(language);
    let code = user_code.map(str::trim).filter(|c| !c.is_empty());
    let report = self.knowledge.report(title, description, code);

    let mut p = String::new();
    let _ = writeln!(p, "题目：{}", title);
    let _ = writeln!(p, "描述：{}", description);
    p.push('\n');

    push_knowledge_context(&mut p, &report, level);

    match level.get() {
      1 => push_level_one(&mut p),
      2 => push_level_two(&mut p),
      _ => push_level_three(&mut p, lang),
    }

    if let Some(code) = code {
      p.push('\n');
      if !report.detected.is_empty() {
        let _ = writeln!(p, "（系统检测到用户代码中体现的思路：{}）", join_labels(&report.detected));
        if level.get() == 1 {
          p.push_str("（以上名称只供你参考，轻度提示中不得直接说出这些名称）\n");
        }
      }
      let _ = writeln!(p, "用户当前代码（{}）：", lang);
      let _ = writeln!(p, "{}", code);
      p.push_str("请根据用户代码给出更有针对性的提示，指出可能的问题方向\n");
    }

    p
  }

  pub fn solution_prompt(&self, title: &str, description: &str, language: Option<&str>) -> String {
    let lang = effective_language(language);
    let fence = fence_tag(lang);
    format!(
      "请为以下算法题目生成标准题解：\n\
       \n\
       题目：{title}\n\
       描述：{description}\n\
       \n\
       请按以下格式输出：\n\
       \n\
       # 解题思路\n\
       [详细的解题思路]\n\
       \n\
       # 算法说明\n\
       [使用的算法和数据结构]\n\
       \n\
       # 复杂度分析\n\
       时间复杂度：[如 O(n)]\n\
       空间复杂度：[如 O(1)]\n\
       \n\
       # 关键点\n\
       - [关键点1]\n\
       - [关键点2]\n\
       - [关键点3]\n\
       \n\
       # {lang}示例代码\n\
       ```{fence}\n\
       [完整的{lang}代码]\n\
       ```\n\
       \n\
       用简体中文回答，代码部分使用{lang}。"
    )
  }

  pub fn code_analysis_prompt(&self, title: &str, description: &str, code: &str, language: &str) -> String {
    let lang = effective_language(Some(language));
    let fence = fence_tag(lang);
    let report = self.knowledge.report(title, description, Some(code));

    let mut p = String::new();
    p.push_str("作为一个算法评测系统，请从算法正确性角度分析以下用户提交的代码。\n\n");
    p.push_str("【重要】评分标准：\n");
    p.push_str("- 这是算法评测，不是代码审查\n");
    p.push_str("- 只关注：代码能否正确解决题目要求\n");
    p.push_str("- 不关注：代码风格、变量命名、注释、鲁棒性（如NULL检查、边界保护等）\n");
    p.push_str("- 评分依据：能否通过测试用例、算法逻辑是否正确\n\n");
    let _ = writeln!(p, "题目：{}", title);
    let _ = writeln!(p, "描述：{}", description);
    let _ = writeln!(p, "编程语言：{}", lang);
    p.push('\n');
    p.push_str("用户代码：\n");
    let _ = writeln!(p, "```{}", fence);
    let _ = writeln!(p, "{}", code.trim_end());
    p.push_str("```\n\n");

    if !report.gaps.is_empty() {
      p.push_str("【诊断线索】\n");
      let _ = writeln!(p, "- 该题通常涉及：{}，但在用户代码中未检测到相应写法", join_labels(&report.gaps));
      if !report.detected.is_empty() {
        let _ = writeln!(p, "- 用户代码中检测到：{}", join_labels(&report.detected));
      }
      p.push_str("- 请重点检查上述知识点对应的逻辑是否缺失或实现有误（这只是线索，不是结论）\n\n");
    }

    p.push_str("请严格按以下格式输出（必须包含所有标题）：\n\n");
    p.push_str("# 整体评价\n[一句话评价代码能否解决问题，30字以内]\n\n");
    p.push_str("# 正确性分析\n[详细分析代码逻辑是否正确，能否满足题目要求，能否通过测试用例。只关注算法逻辑，不评价代码风格。]\n\n");
    p.push_str("# 复杂度分析\n时间复杂度：O(n) - [简短说明]\n空间复杂度：O(1) - [简短说明]\n\n");
    p.push_str("# 优化建议\n- [如果有更优的算法，给出建议1]\n- [如果有性能问题，给出建议2]\n- [如果逻辑有误，给出修正建议]\n\n");
    p.push_str("# 评分\n[0-100分的数字，只需要数字]\n\n");
    p.push_str("评分参考：\n");
    p.push_str("- 90-100分：算法完全正确，能通过所有测试用例\n");
    p.push_str("- 70-89分：算法基本正确，可能存在小的边界问题\n");
    p.push_str("- 50-69分：算法思路正确但实现有明显错误\n");
    p.push_str("- 30-49分：算法思路部分正确\n");
    p.push_str("- 0-29分：算法思路错误或无法运行\n\n");
    p.push_str("【再次强调】不要因为缺少NULL检查、缺少异常处理、变量命名不规范等代码风格问题扣分！只评价算法逻辑！\n\n");
    p.push_str("用简体中文回答。");
    p
  }
}

/// Lower-cased fence tag for a language name ("C++" -> "cpp", "C#" -> "csharp").
pub fn fence_tag(language: &str) -> String {
  match language.trim().to_lowercase().as_str() {
    "c++" | "cpp" => "cpp".into(),
    "c#" | "csharp" => "csharp".into(),
    "python" | "python3" | "py" => "python".into(),
    "javascript" | "js" => "javascript".into(),
    "typescript" | "ts" => "typescript".into(),
    other => other.replace(' ', ""),
  }
}

// Levels 1-2 also get one-hop prerequisites; level 3 only the concepts themselves.
fn push_knowledge_context(p: &mut String, report: &KnowledgeReport, level: HintLevel) {
  if report.concepts.is_empty() {
    return;
  }
  p.push_str("【知识点参考（供你组织提示时参考）】\n");
  let _ = writeln!(p, "- 本题涉及的知识点：{}", join_labels(&report.concepts));
  if level.get() <= 2 && !report.prerequisites.is_empty() {
    let _ = writeln!(p, "- 需要的前置知识：{}", join_labels(&report.prerequisites));
  }
  if level.get() == 1 {
    p.push_str("- 注意：以上名称只供你参考，轻度提示中不得直接说出这些名称\n");
  }
  p.push('\n');
}

fn push_level_one(p: &mut String) {
  p.push_str("请给出轻度提示（Level 1）：\n");
  p.push_str("【重要】绝对禁止事项：\n");
  p.push_str("- 严禁提及任何具体的算法名称（如：动态规划、二分查找、DFS、BFS等）\n");
  p.push_str("- 严禁提及任何具体的数据结构名称（如：栈、队列、哈希表、树等）\n");
  p.push_str("- 严禁给出任何代码、伪代码或代码片段\n");
  p.push_str("- 严禁给出具体的实现步骤\n\n");
  p.push_str("【允许的提示内容】：\n");
  p.push_str("- 只能用通俗的语言描述解题的大致思考方向\n");
  p.push_str("- 可以提醒需要注意的边界条件和特殊情况\n");
  p.push_str("- 可以提示题目的关键突破点（但不能说具体怎么做）\n");
  p.push_str("- 控制在2-4句话以内\n");
  p.push_str("- 用简体中文回答，不要使用专业术语\n\n");
  p.push_str("示例（好的轻度提示）：\n");
  p.push_str("\"思考一下如何记录之前看过的信息，避免重复计算。注意处理空值和边界情况。\"\n");
}

fn push_level_two(p: &mut String) {
  p.push_str("请给出中度提示（Level 2）：\n");
  p.push_str("【允许的内容】：\n");
  p.push_str("- 可以提及适合使用的数据结构类型（如：需要先进先出的结构）\n");
  p.push_str("- 可以提及算法的大类（如：遍历、搜索、优化等）\n");
  p.push_str("- 给出解题的关键步骤（用文字描述）\n\n");
  p.push_str("【严格禁止】：\n");
  p.push_str("- 绝对不能给出任何代码\n");
  p.push_str("- 不能给出伪代码\n");
  p.push_str("- 不能给出具体的API调用\n\n");
  p.push_str("- 控制在4-7句话\n");
  p.push_str("- 用简体中文回答\n");
}

fn push_level_three(p: &mut String, lang: &str) {
  let fence = fence_tag(lang);
  p.push_str("请给出深度提示（Level 3）：\n");
  p.push_str("- 详细说明完整的解题思路和算法\n");
  p.push_str("- 给出清晰的伪代码或算法步骤\n");
  let _ = writeln!(p, "- 如果给出代码片段，使用{}语言，放在 ```{} 代码块中，只给关键部分（不超过30行）", lang, fence);
  p.push_str("- 说明时间和空间复杂度\n");
  p.push_str("- 可以接近完整解法，但建议留一些细节让用户自己实现\n");
  let _ = writeln!(p, "- 用简体中文回答，代码注释也用中文，代码使用{}", lang);
}
