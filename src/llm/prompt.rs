//! 分类提示词

const NOT_SPECIFIED: &str = "（指定なし）";

const INSTRUCTIONS: &str = "\
コメントを分析し、次のキーを持つ JSON オブジェクトのみを返してください。
- sentiment: positive / neutral / negative のいずれか
- category: content（講義内容） / material（講義資料） / instructor（講師） / operation（運営） / other（その他） のいずれか
- importance: high / medium / low のいずれか（講義改善にとっての重要度）
- is_abusive: 誹謗中傷や不適切な表現を含む場合は true、それ以外は false";

/// 组装一条评论的提示词
pub fn build_prompt(course_name: &str, question: &str, comment: &str) -> String {
    let course_name = if course_name.trim().is_empty() {
        NOT_SPECIFIED
    } else {
        course_name
    };
    let question = if question.trim().is_empty() {
        NOT_SPECIFIED
    } else {
        question
    };

    format!(
        "あなたは大学の講義改善を支援するアシスタントです。\
        ある講義に対する受講生のフィードバックコメントを分析してください。\n\n\
        ## 講義名\n{course_name}\n\n\
        ## 質問項目\n{question}\n\n\
        ## コメント\n```\n{comment}\n```\n\n\
        ## 指示\n{INSTRUCTIONS}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_context() {
        let prompt = build_prompt("統計学入門", "今後の要望", "演習を増やしてほしい");
        assert!(prompt.contains("統計学入門"));
        assert!(prompt.contains("今後の要望"));
        assert!(prompt.contains("演習を増やしてほしい"));
        assert!(prompt.contains("is_abusive"));
    }

    #[test]
    fn test_missing_context_placeholder() {
        let prompt = build_prompt("", " ", "良かった");
        assert_eq!(prompt.matches(NOT_SPECIFIED).count(), 2);
    }
}
