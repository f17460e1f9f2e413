use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 讲义（一次授课）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/lecture.ts")]
pub struct Lecture {
    pub id: i64,
    pub course_name: String,
    pub academic_year: i32,
    pub term: String,
    pub session: String,
    pub lecture_on: NaiveDate,
    pub instructor_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lecture {
    pub fn key(&self) -> LectureKey {
        LectureKey {
            course_name: self.course_name.clone(),
            academic_year: self.academic_year,
            term: self.term.clone(),
            session: self.session.clone(),
            lecture_on: self.lecture_on,
        }
    }
}

/// 讲义自然键：(课程, 年度, 学期, 回次, 日期)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LectureKey {
    pub course_name: String,
    pub academic_year: i32,
    pub term: String,
    pub session: String,
    pub lecture_on: NaiveDate,
}

/// 创建讲义所需的数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLecture {
    pub key: LectureKey,
    pub instructor_name: String,
    pub description: Option<String>,
}

/// 由日期推算学年度（4 月开始）
pub fn academic_year_of(date: NaiveDate) -> i32 {
    if date.month() >= 4 {
        date.year()
    } else {
        date.year() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_academic_year_starts_in_april() {
        let april = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let march = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let january = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(academic_year_of(april), 2024);
        assert_eq!(academic_year_of(march), 2024);
        assert_eq!(academic_year_of(january), 2023);
    }
}
