use serde::Deserialize;
use ts_rs::TS;

// 讲义分析查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct LectureAnalysisQuery {
    // 缺省时取最新的确定版批次，没有则取最新的速报批次
    pub batch_id: Option<i64>,
    // 缺省为 ALL
    pub attribute: Option<String>,
}

// 课程加权平均查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct WeightedAverageQuery {
    pub course_name: String,
    pub academic_year: Option<i32>,
    pub term: Option<String>,
    pub attribute: Option<String>,
}

// 课程列表查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct CourseListQuery {
    // 课程名部分匹配
    pub course_name: Option<String>,
    pub academic_year: Option<i32>,
    pub term: Option<String>,
}
