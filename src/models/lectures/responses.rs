use serde::Serialize;
use std::collections::BTreeMap;
use ts_rs::TS;

use chrono::NaiveDate;

use super::entities::Lecture;
use crate::models::batches::entities::{Batch, BatchType};
use crate::models::summaries::{CommentSummary, ScoreDistribution, SurveySummary};
use crate::models::surveys::ScoreKey;

// 单个讲义的分析结果
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct LectureAnalysisResponse {
    pub lecture: Lecture,
    pub batch: Batch,
    pub attribute: String,
    pub summary: Option<SurveySummary>,
    pub distributions: Vec<ScoreDistribution>,
    pub comment_summaries: Vec<CommentSummary>,
}

// 课程内多个讲义的加权平均
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct WeightedAverageResponse {
    pub course_name: String,
    pub attribute: String,
    pub lecture_count: usize,
    pub response_count: i64,
    pub nps: Option<f64>,
    pub averages: BTreeMap<ScoreKey, Option<f64>>,
}

// 可选的受访者属性
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct AttributeOption {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct AttributeListResponse {
    pub attributes: Vec<AttributeOption>,
}

// 讲义详情：讲义本身与全部批次
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct LectureDetailResponse {
    pub lecture: Lecture,
    // 新的在前
    pub batches: Vec<Batch>,
    // 分析接口缺省使用的批次
    pub reporting_batch_id: Option<i64>,
}

// 课程下的一次授课
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct SessionSummary {
    pub lecture_id: i64,
    pub session: String,
    pub lecture_on: NaiveDate,
    pub instructor_name: String,
    // 已完成汇总的批次类型
    pub analysis_types: Vec<BatchType>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct CourseItem {
    pub course_name: String,
    pub academic_year: i32,
    pub term: String,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct CourseListResponse {
    pub courses: Vec<CourseItem>,
}
