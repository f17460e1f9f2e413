//! CSV 表头分类表
//!
//! 表头按下列顺序判定角色：
//! 1. 以 `（任意）` 开头：自由记述，参与 LLM 分析
//! 2. 以 `【必須】` 开头：自由记述，只保存不分析
//! 3. 固定映射表中的评分题与身份列
//! 4. 其余表头忽略

use crate::models::surveys::{QuestionType, ScoreKey};

/// 可分析的自由记述前缀
pub const OPTIONAL_MARKER: &str = "（任意）";
/// 只保存的自由记述前缀
pub const REQUIRED_MARKER: &str = "【必須】";

/// 表头前缀与评论角色的对应
const MARKER_ROLES: &[(&str, CommentRole)] = &[
    (OPTIONAL_MARKER, CommentRole::Analyzable),
    (REQUIRED_MARKER, CommentRole::StoredOnly),
];

/// 评分题表头
const SCORE_HEADERS: &[(&str, ScoreKey)] = &[
    (
        "本日の総合的な満足度を５段階で教えてください。",
        ScoreKey::SatisfactionOverall,
    ),
    (
        "本日の講義内容について５段階で教えてください。\n学習量は適切だった",
        ScoreKey::ContentVolume,
    ),
    (
        "本日の講義内容について５段階で教えてください。\n講義内容が十分に理解できた",
        ScoreKey::ContentUnderstanding,
    ),
    (
        "本日の講義内容について５段階で教えてください。\n運営側のアナウンスが適切だった",
        ScoreKey::ContentAnnouncement,
    ),
    (
        "本日の講師の総合的な満足度を５段階で教えてください。",
        ScoreKey::InstructorOverall,
    ),
    (
        "本日の講師について５段階で教えてください。\n授業時間を効率的に使っていた",
        ScoreKey::InstructorTime,
    ),
    (
        "本日の講師について５段階で教えてください。\n質問に丁寧に対応してくれた",
        ScoreKey::InstructorQa,
    ),
    (
        "本日の講師について５段階で教えてください。\n話し方や声の大きさが適切だった",
        ScoreKey::InstructorSpeaking,
    ),
    (
        "ご自身について５段階で教えてください。\n事前に予習をした",
        ScoreKey::SelfPreparation,
    ),
    (
        "ご自身について５段階で教えてください。\n意欲をもって講義に臨んだ",
        ScoreKey::SelfMotivation,
    ),
    (
        "ご自身について５段階で教えてください。\n今回学んだことを学習や研究に生かせる",
        ScoreKey::SelfFuture,
    ),
    (
        "親しいご友人にこの講義の受講をお薦めしますか？",
        ScoreKey::RecommendFriend,
    ),
];

const ACCOUNT_ID_HEADERS: &[&str] = &["アカウントID", "account_id", "アカウント ID"];
const ATTRIBUTE_HEADERS: &[&str] = &["受講生の属性", "受講生属性", "student_attribute"];

/// 题目类型关键词（按顺序匹配，所有关键词都出现才命中）
const QUESTION_TYPE_KEYWORDS: &[(&[&str], QuestionType)] = &[
    (&["学んだこと"], QuestionType::Learned),
    (&["学び"], QuestionType::Learned),
    (&["良かった点"], QuestionType::GoodPoints),
    (&["良い点"], QuestionType::GoodPoints),
    (&["よかった"], QuestionType::GoodPoints),
    (&["改善"], QuestionType::Improvements),
    (&["講師", "フィードバック"], QuestionType::InstructorFeedback),
    (&["要望"], QuestionType::FutureRequests),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRole {
    Analyzable,
    StoredOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Score(ScoreKey),
    AccountId,
    Attribute,
    Comment(CommentRole, QuestionType),
    Ignored,
}

impl ColumnRole {
    pub fn is_comment(&self) -> bool {
        matches!(self, ColumnRole::Comment(..))
    }
}

/// 规范化表头：去掉首尾空白，统一换行符
pub fn normalize_header(raw: &str) -> String {
    raw.trim().replace("\r\n", "\n").replace('\r', "\n")
}

/// 判定单个（已规范化的）表头的角色
pub fn classify_header(header: &str) -> ColumnRole {
    for (marker, role) in MARKER_ROLES {
        if header.starts_with(marker) {
            return ColumnRole::Comment(*role, question_type_for(header));
        }
    }

    if let Some((_, key)) = SCORE_HEADERS.iter().find(|(name, _)| *name == header) {
        return ColumnRole::Score(*key);
    }
    if ACCOUNT_ID_HEADERS.contains(&header) {
        return ColumnRole::AccountId;
    }
    if ATTRIBUTE_HEADERS.contains(&header) {
        return ColumnRole::Attribute;
    }

    ColumnRole::Ignored
}

/// 去掉前缀标记后的题目文字
pub fn question_text(header: &str) -> &str {
    let mut name = header;
    for (marker, _) in MARKER_ROLES {
        name = name.strip_prefix(marker).unwrap_or(name);
    }
    name.trim()
}

/// 根据表头文字推断题目类型
pub fn question_type_for(header: &str) -> QuestionType {
    let name = question_text(header);

    QUESTION_TYPE_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().all(|k| name.contains(k)))
        .map(|(_, qt)| *qt)
        .unwrap_or(QuestionType::FreeComment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_roles() {
        assert_eq!(
            classify_header("（任意）ご自由にご意見を"),
            ColumnRole::Comment(CommentRole::Analyzable, QuestionType::FreeComment)
        );
        assert_eq!(
            classify_header("【必須】本日の講義で学んだこと"),
            ColumnRole::Comment(CommentRole::StoredOnly, QuestionType::Learned)
        );
    }

    #[test]
    fn test_marker_must_be_prefix() {
        assert_eq!(classify_header("感想（任意）"), ColumnRole::Ignored);
    }

    #[test]
    fn test_question_type_keywords() {
        let cases = [
            ("（任意）本日の講義で学んだこと", QuestionType::Learned),
            ("（任意）講義の良かった点", QuestionType::GoodPoints),
            ("（任意）特によかった部分", QuestionType::GoodPoints),
            ("（任意）分かりにくかった部分や改善点", QuestionType::Improvements),
            ("（任意）講師へのフィードバック", QuestionType::InstructorFeedback),
            ("（任意）講師について", QuestionType::FreeComment),
            ("（任意）今後の要望", QuestionType::FutureRequests),
            ("（任意）ご自由にご意見を", QuestionType::FreeComment),
        ];
        for (header, expected) in cases {
            assert_eq!(question_type_for(header), expected, "{header}");
        }
    }

    #[test]
    fn test_question_text_strips_marker() {
        assert_eq!(question_text("（任意） 今後の要望"), "今後の要望");
        assert_eq!(question_text("【必須】学んだこと"), "学んだこと");
        assert_eq!(question_text("感想"), "感想");
    }

    #[test]
    fn test_score_and_identity_headers() {
        assert_eq!(
            classify_header("親しいご友人にこの講義の受講をお薦めしますか？"),
            ColumnRole::Score(ScoreKey::RecommendFriend)
        );
        assert_eq!(
            classify_header(&normalize_header(
                " 本日の講師について５段階で教えてください。\r\n質問に丁寧に対応してくれた "
            )),
            ColumnRole::Score(ScoreKey::InstructorQa)
        );
        assert_eq!(classify_header("account_id"), ColumnRole::AccountId);
        assert_eq!(classify_header("受講生の属性"), ColumnRole::Attribute);
        assert_eq!(classify_header("タイムスタンプ"), ColumnRole::Ignored);
    }

    #[test]
    fn test_every_score_key_has_a_header() {
        for key in ScoreKey::ALL {
            assert!(
                SCORE_HEADERS.iter().any(|(_, k)| k == key),
                "missing header for {key}"
            );
        }
    }
}
