use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::BTreeMap;

use super::{LectureService, parse_attribute, pick_reporting_batch};
use crate::models::lectures::requests::WeightedAverageQuery;
use crate::models::lectures::responses::WeightedAverageResponse;
use crate::models::summaries::SurveySummary;
use crate::models::surveys::ScoreKey;
use crate::models::{ApiResponse, ErrorCode};
use crate::pipeline::aggregator::round2;
use crate::services::error_response;

/// 按回答数加权：Σ(avg_i × count_i) / Σ(count_i)
///
/// 平均值为空或回答数为 0 的讲义不参与计算。
fn weighted(values: impl Iterator<Item = (Option<f64>, i32)>) -> Option<f64> {
    let (sum, total) = values
        .filter_map(|(value, count)| value.filter(|_| count > 0).map(|v| (v, count)))
        .fold((0.0_f64, 0_i64), |(sum, total), (value, count)| {
            (sum + value * f64::from(count), total + i64::from(count))
        });
    (total > 0).then(|| round2(sum / total as f64))
}

pub(crate) fn compute_weighted_average(
    course_name: &str,
    attribute: &str,
    lecture_count: usize,
    summaries: &[SurveySummary],
) -> WeightedAverageResponse {
    let averages = ScoreKey::ALL
        .iter()
        .map(|key| {
            let value = weighted(summaries.iter().map(|s| {
                (
                    s.averages.get(key).copied().flatten(),
                    s.response_count,
                )
            }));
            (*key, value)
        })
        .collect::<BTreeMap<_, _>>();

    WeightedAverageResponse {
        course_name: course_name.to_string(),
        attribute: attribute.to_string(),
        lecture_count,
        response_count: summaries.iter().map(|s| i64::from(s.response_count)).sum(),
        nps: weighted(summaries.iter().map(|s| (s.nps, s.response_count))),
        averages,
    }
}

pub async fn get_weighted_averages(
    service: &LectureService,
    request: &HttpRequest,
    query: WeightedAverageQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let course_name = query.course_name.trim();
    if course_name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "course_name is required",
        )));
    }
    let Some(attribute) = parse_attribute(query.attribute.as_deref()) else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Unknown respondent attribute",
        )));
    };

    let term = query.term.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let lectures = match storage
        .list_lectures_by_course(course_name, query.academic_year, term)
        .await
    {
        Ok(lectures) => lectures,
        Err(e) => return Ok(error_response(&e, None)),
    };

    // 每个讲义只取一个批次
    let mut batch_ids = Vec::with_capacity(lectures.len());
    for lecture in &lectures {
        match storage.list_batches_by_lecture(lecture.id).await {
            Ok(batches) => {
                if let Some(batch) = pick_reporting_batch(&batches) {
                    batch_ids.push(batch.id);
                }
            }
            Err(e) => return Ok(error_response(&e, None)),
        }
    }

    let summaries = if batch_ids.is_empty() {
        Vec::new()
    } else {
        match storage.list_summaries_for_batches(&batch_ids, &attribute).await {
            Ok(summaries) => summaries,
            Err(e) => return Ok(error_response(&e, None)),
        }
    };

    let response = compute_weighted_average(course_name, &attribute, batch_ids.len(), &summaries);
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "获取成功")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(batch_id: i64, count: i32, nps: Option<f64>, satisfaction: Option<f64>) -> SurveySummary {
        SurveySummary {
            batch_id,
            respondent_attribute: "ALL".to_string(),
            response_count: count,
            nps,
            promoter_count: 0,
            passive_count: 0,
            detractor_count: 0,
            averages: ScoreKey::ALL
                .iter()
                .map(|key| {
                    let value = match key {
                        ScoreKey::SatisfactionOverall => satisfaction,
                        _ => None,
                    };
                    (*key, value)
                })
                .collect(),
            comment_count: 0,
            important_comment_count: 0,
        }
    }

    #[test]
    fn test_weighted_by_response_count() {
        let summaries = vec![
            summary(1, 10, Some(20.0), Some(4.0)),
            summary(2, 30, Some(-20.0), Some(3.0)),
        ];
        let result = compute_weighted_average("統計学入門", "ALL", 2, &summaries);
        assert_eq!(result.response_count, 40);
        // (4.0*10 + 3.0*30) / 40 = 3.25
        assert_eq!(result.averages[&ScoreKey::SatisfactionOverall], Some(3.25));
        // (20*10 - 20*30) / 40 = -10
        assert_eq!(result.nps, Some(-10.0));
        assert_eq!(result.averages[&ScoreKey::SelfFuture], None);
    }

    #[test]
    fn test_empty_groups_are_skipped() {
        let summaries = vec![summary(1, 0, None, None), summary(2, 3, Some(100.0), Some(5.0))];
        let result = compute_weighted_average("統計学入門", "student", 2, &summaries);
        assert_eq!(result.nps, Some(100.0));
        assert_eq!(result.averages[&ScoreKey::SatisfactionOverall], Some(5.0));

        let empty = compute_weighted_average("統計学入門", "ALL", 0, &[]);
        assert_eq!(empty.response_count, 0);
        assert!(empty.nps.is_none());
        assert_eq!(empty.averages.len(), ScoreKey::ALL.len());
    }
}
