//! 汇总计算
//!
//! `compute_aggregates` 是纯函数：同样的回答和评论总是得到同样的汇总行。
//! `aggregate_batch` 读取批次数据后整体替换已有汇总。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::errors::Result;
use crate::models::summaries::{
    ALL_GROUP, AnalysisType, BatchAggregates, CommentSummary, ScoreDistribution, SurveySummary,
};
use crate::models::surveys::{
    Category, Comment, Importance, RespondentAttribute, ScoreKey, Sentiment, SurveyResponse,
};
use crate::storage::Storage;

const PROMOTER_MIN: i32 = 9;
const PASSIVE_MIN: i32 = 7;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 计算一个批次的全部汇总行
///
/// 属性组顺序：先 "ALL"，再按枚举顺序列出实际出现过的属性。
pub fn compute_aggregates(
    batch_id: i64,
    responses: &[SurveyResponse],
    comments: &[Comment],
) -> BatchAggregates {
    let attribute_of: HashMap<i64, RespondentAttribute> = responses
        .iter()
        .map(|r| (r.id, r.respondent_attribute))
        .collect();

    let observed: BTreeSet<RespondentAttribute> =
        responses.iter().map(|r| r.respondent_attribute).collect();

    let mut groups: Vec<(String, Option<RespondentAttribute>)> = vec![(ALL_GROUP.to_string(), None)];
    groups.extend(observed.into_iter().map(|a| (a.to_string(), Some(a))));

    let mut aggregates = BatchAggregates::default();

    for (group, attribute) in groups {
        let group_responses: Vec<&SurveyResponse> = responses
            .iter()
            .filter(|r| attribute.is_none_or(|a| r.respondent_attribute == a))
            .collect();
        let group_comments: Vec<&Comment> = comments
            .iter()
            .filter(|c| {
                attribute.is_none_or(|a| attribute_of.get(&c.response_id) == Some(&a))
            })
            .collect();

        aggregates.summaries.push(summarize_group(
            batch_id,
            &group,
            &group_responses,
            &group_comments,
        ));
        aggregates
            .distributions
            .extend(distribute_group(batch_id, &group, &group_responses));
        aggregates
            .comment_summaries
            .extend(count_comment_labels(batch_id, &group, &group_comments));
    }

    aggregates
}

/// 单个属性组的评分汇总，空组的 NPS 与平均值为 None
fn summarize_group(
    batch_id: i64,
    group: &str,
    responses: &[&SurveyResponse],
    comments: &[&Comment],
) -> SurveySummary {
    let count = responses.len();

    let mut promoters = 0;
    let mut passives = 0;
    let mut detractors = 0;
    for response in responses {
        let score = response.scores.recommend_friend;
        if score >= PROMOTER_MIN {
            promoters += 1;
        } else if score >= PASSIVE_MIN {
            passives += 1;
        } else {
            detractors += 1;
        }
    }

    let nps = (count > 0)
        .then(|| round2((promoters - detractors) as f64 / count as f64 * 100.0));

    let averages: BTreeMap<ScoreKey, Option<f64>> = ScoreKey::ALL
        .iter()
        .map(|key| {
            let average = (count > 0).then(|| {
                let total: i64 = responses.iter().map(|r| r.scores.get(*key) as i64).sum();
                round2(total as f64 / count as f64)
            });
            (*key, average)
        })
        .collect();

    let important = comments
        .iter()
        .filter(|c| c.is_analyzed && c.importance.is_some_and(|i| i.is_important()))
        .count();

    SurveySummary {
        batch_id,
        respondent_attribute: group.to_string(),
        response_count: count as i32,
        nps,
        promoter_count: promoters,
        passive_count: passives,
        detractor_count: detractors,
        averages,
        comment_count: comments.len() as i32,
        important_comment_count: important as i32,
    }
}

/// 每道题每个合法分值一行，人数为 0 的也输出
fn distribute_group(
    batch_id: i64,
    group: &str,
    responses: &[&SurveyResponse],
) -> Vec<ScoreDistribution> {
    let mut rows = Vec::new();
    for key in ScoreKey::ALL {
        for value in key.range() {
            let count = responses
                .iter()
                .filter(|r| r.scores.get(*key) == value)
                .count();
            rows.push(ScoreDistribution {
                batch_id,
                respondent_attribute: group.to_string(),
                question_key: *key,
                score_value: value,
                count: count as i32,
            });
        }
    }
    rows
}

/// 只统计已分析的评论，每个维度的每个标签都输出
fn count_comment_labels(
    batch_id: i64,
    group: &str,
    comments: &[&Comment],
) -> Vec<CommentSummary> {
    let analyzed: Vec<&&Comment> = comments.iter().filter(|c| c.is_analyzed).collect();

    let mut rows = Vec::new();
    let mut push = |analysis_type: AnalysisType, label: &str, count: usize| {
        rows.push(CommentSummary {
            batch_id,
            respondent_attribute: group.to_string(),
            analysis_type,
            label: label.to_string(),
            count: count as i32,
        });
    };

    for analysis_type in AnalysisType::ALL {
        match analysis_type {
            AnalysisType::Sentiment => {
                for label in Sentiment::ALL {
                    let count = analyzed
                        .iter()
                        .filter(|c| c.sentiment == Some(*label))
                        .count();
                    push(*analysis_type, label.as_str(), count);
                }
            }
            AnalysisType::Category => {
                for label in Category::ALL {
                    let count = analyzed
                        .iter()
                        .filter(|c| c.category == Some(*label))
                        .count();
                    push(*analysis_type, label.as_str(), count);
                }
            }
            AnalysisType::Importance => {
                for label in Importance::ALL {
                    let count = analyzed
                        .iter()
                        .filter(|c| c.importance == Some(*label))
                        .count();
                    push(*analysis_type, label.as_str(), count);
                }
            }
        }
    }

    rows
}

/// 读取批次数据并整体替换汇总行
pub async fn aggregate_batch(storage: &dyn Storage, batch_id: i64) -> Result<BatchAggregates> {
    let responses = storage.list_responses_by_batch(batch_id).await?;
    let comments = storage.list_comments_by_batch(batch_id).await?;

    let aggregates = compute_aggregates(batch_id, &responses, &comments);
    let analyzed = comments.iter().filter(|c| c.is_analyzed).count() as i32;

    storage
        .replace_batch_aggregates(batch_id, &aggregates, analyzed)
        .await?;

    debug!(
        "Batch {} aggregated: {} summaries, {} distributions, {} comment summaries",
        batch_id,
        aggregates.summaries.len(),
        aggregates.distributions.len(),
        aggregates.comment_summaries.len()
    );

    Ok(aggregates)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::surveys::{QuestionType, Scores};
    use chrono::Utc;

    pub(crate) fn response(
        id: i64,
        attribute: RespondentAttribute,
        satisfaction: i32,
        recommend: i32,
    ) -> SurveyResponse {
        let scores: std::result::Result<Scores, ()> = Scores::try_from_fn(|key| {
            Ok(match key {
                ScoreKey::SatisfactionOverall => satisfaction,
                ScoreKey::RecommendFriend => recommend,
                _ => 3,
            })
        });
        SurveyResponse {
            id,
            batch_id: 1,
            account_id: Some(format!("user-{id}")),
            respondent_attribute: attribute,
            scores: scores.unwrap(),
            created_at: Utc::now(),
        }
    }

    fn comment(id: i64, response_id: i64, importance: Option<Importance>) -> Comment {
        Comment {
            id,
            response_id,
            question_type: QuestionType::FreeComment,
            column_header: "（任意）ご自由にご意見を".to_string(),
            text: "text".to_string(),
            sentiment: importance.map(|_| Sentiment::Positive),
            category: importance.map(|_| Category::Content),
            importance,
            is_abusive: false,
            is_analyzed: importance.is_some(),
            analyzed_at: None,
        }
    }

    fn all_summary(aggregates: &BatchAggregates) -> &SurveySummary {
        aggregates
            .summaries
            .iter()
            .find(|s| s.respondent_attribute == ALL_GROUP)
            .unwrap()
    }

    #[test]
    fn test_nps_balanced() {
        let responses: Vec<_> = [9, 9, 8, 6, 3]
            .iter()
            .enumerate()
            .map(|(i, r)| response(i as i64, RespondentAttribute::Student, 4, *r))
            .collect();
        let aggregates = compute_aggregates(1, &responses, &[]);
        let summary = all_summary(&aggregates);

        assert_eq!(summary.response_count, 5);
        assert_eq!(summary.promoter_count, 2);
        assert_eq!(summary.passive_count, 1);
        assert_eq!(summary.detractor_count, 2);
        assert_eq!(summary.nps, Some(0.0));
    }

    #[test]
    fn test_average_rounding() {
        let responses: Vec<_> = [5, 4, 4, 3]
            .iter()
            .enumerate()
            .map(|(i, s)| response(i as i64, RespondentAttribute::Student, *s, 10))
            .collect();
        let aggregates = compute_aggregates(1, &responses, &[]);
        let summary = all_summary(&aggregates);
        assert_eq!(
            summary.averages[&ScoreKey::SatisfactionOverall],
            Some(4.0)
        );

        let responses: Vec<_> = [5, 4, 4]
            .iter()
            .enumerate()
            .map(|(i, s)| response(i as i64, RespondentAttribute::Student, *s, 10))
            .collect();
        let aggregates = compute_aggregates(1, &responses, &[]);
        assert_eq!(
            all_summary(&aggregates).averages[&ScoreKey::SatisfactionOverall],
            Some(4.33)
        );
    }

    #[test]
    fn test_empty_group_yields_nulls() {
        let summary = summarize_group(1, "faculty", &[], &[]);
        assert_eq!(summary.response_count, 0);
        assert_eq!(summary.nps, None);
        assert_eq!(summary.averages.len(), ScoreKey::ALL.len());
        assert!(summary.averages.values().all(Option::is_none));

        let aggregates = compute_aggregates(1, &[], &[]);
        assert_eq!(aggregates.summaries.len(), 1);
        assert_eq!(aggregates.summaries[0].nps, None);
    }

    #[test]
    fn test_groups_order_and_dense_rows() {
        let responses = vec![
            response(1, RespondentAttribute::Other, 5, 10),
            response(2, RespondentAttribute::Student, 4, 7),
        ];
        let aggregates = compute_aggregates(1, &responses, &[]);

        let groups: Vec<_> = aggregates
            .summaries
            .iter()
            .map(|s| s.respondent_attribute.as_str())
            .collect();
        assert_eq!(groups, vec!["ALL", "student", "other"]);

        // 11 道 1-5 分的题 + 1 道 0-10 分的题
        let per_group = 11 * 5 + 11;
        assert_eq!(aggregates.distributions.len(), per_group * 3);
        let zero_rows = aggregates
            .for_group("student")
            .distributions
            .iter()
            .filter(|d| d.question_key == ScoreKey::RecommendFriend && d.count == 0)
            .count();
        assert_eq!(zero_rows, 10);
    }

    #[test]
    fn test_comment_counts_exclude_unanalyzed() {
        let responses = vec![
            response(1, RespondentAttribute::Student, 5, 10),
            response(2, RespondentAttribute::Corporate, 4, 7),
        ];
        let comments = vec![
            comment(10, 1, Some(Importance::High)),
            comment(11, 1, None),
            comment(12, 2, Some(Importance::Low)),
        ];
        let aggregates = compute_aggregates(1, &responses, &comments);

        let all = all_summary(&aggregates);
        assert_eq!(all.comment_count, 3);
        assert_eq!(all.important_comment_count, 1);

        let student = aggregates.clone().for_group("student");
        assert_eq!(student.summaries[0].comment_count, 2);

        let positive: Vec<_> = aggregates
            .comment_summaries
            .iter()
            .filter(|c| c.analysis_type == AnalysisType::Sentiment && c.label == "positive")
            .map(|c| (c.respondent_attribute.as_str(), c.count))
            .collect();
        assert_eq!(
            positive,
            vec![("ALL", 2), ("student", 1), ("corporate", 1)]
        );

        // 每组 3 + 5 + 3 个标签
        assert_eq!(aggregates.comment_summaries.len(), 11 * 3);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let responses = vec![
            response(1, RespondentAttribute::Faculty, 2, 3),
            response(2, RespondentAttribute::Invited, 4, 9),
        ];
        let comments = vec![comment(5, 2, Some(Importance::Medium))];
        let first = compute_aggregates(7, &responses, &comments);
        let second = compute_aggregates(7, &responses, &comments);
        assert_eq!(first, second);
    }
}
