//! 讲义存储操作

use super::SeaOrmStorage;
use super::batches::delete_batches_in_txn;
use crate::entity::lectures::{ActiveModel, Column, Entity as Lectures};
use crate::entity::survey_batches::{Column as BatchColumn, Entity as SurveyBatches};
use crate::errors::{Result, SurveyError};
use crate::models::lectures::entities::{Lecture, LectureKey, NewLecture};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};

impl SeaOrmStorage {
    /// 通过自然键获取讲义
    pub async fn find_lecture_by_key_impl(&self, key: &LectureKey) -> Result<Option<Lecture>> {
        let result = Lectures::find()
            .filter(Column::CourseName.eq(key.course_name.as_str()))
            .filter(Column::AcademicYear.eq(key.academic_year))
            .filter(Column::Term.eq(key.term.as_str()))
            .filter(Column::Session.eq(key.session.as_str()))
            .filter(Column::LectureOn.eq(key.lecture_on))
            .one(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询讲义失败: {e}")))?;

        Ok(result.map(|m| m.into_lecture()))
    }

    /// 创建讲义
    pub async fn create_lecture_impl(&self, req: NewLecture) -> Result<Lecture> {
        let now = chrono::Utc::now().timestamp();
        let key = req.key;

        let model = ActiveModel {
            course_name: Set(key.course_name),
            academic_year: Set(key.academic_year),
            term: Set(key.term),
            session: Set(key.session),
            lecture_on: Set(key.lecture_on),
            instructor_name: Set(req.instructor_name),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(result) => Ok(result.into_lecture()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(SurveyError::conflict(format!("讲义已存在: {e}")))
                }
                _ => Err(SurveyError::database_operation(format!("创建讲义失败: {e}"))),
            },
        }
    }

    /// 通过 ID 获取讲义
    pub async fn get_lecture_by_id_impl(&self, lecture_id: i64) -> Result<Option<Lecture>> {
        let result = Lectures::find_by_id(lecture_id)
            .one(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询讲义失败: {e}")))?;

        Ok(result.map(|m| m.into_lecture()))
    }

    /// 列出课程下的讲义
    pub async fn list_lectures_by_course_impl(
        &self,
        course_name: &str,
        academic_year: Option<i32>,
        term: Option<&str>,
    ) -> Result<Vec<Lecture>> {
        let mut select = Lectures::find().filter(Column::CourseName.eq(course_name));

        if let Some(year) = academic_year {
            select = select.filter(Column::AcademicYear.eq(year));
        }

        if let Some(term) = term
            && !term.trim().is_empty()
        {
            select = select.filter(Column::Term.eq(term.trim()));
        }

        let lectures = select
            .order_by_asc(Column::LectureOn)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询讲义列表失败: {e}")))?;

        Ok(lectures.into_iter().map(|m| m.into_lecture()).collect())
    }

    /// 按条件列出讲义
    pub async fn list_lectures_impl(
        &self,
        course_name: Option<&str>,
        academic_year: Option<i32>,
        term: Option<&str>,
    ) -> Result<Vec<Lecture>> {
        let mut select = Lectures::find();

        if let Some(name) = course_name.map(str::trim).filter(|n| !n.is_empty()) {
            select = select.filter(Column::CourseName.contains(name));
        }

        if let Some(year) = academic_year {
            select = select.filter(Column::AcademicYear.eq(year));
        }

        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            select = select.filter(Column::Term.eq(term));
        }

        let lectures = select
            .order_by_asc(Column::CourseName)
            .order_by_desc(Column::AcademicYear)
            .order_by_asc(Column::Term)
            .order_by_asc(Column::LectureOn)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询讲义列表失败: {e}")))?;

        Ok(lectures.into_iter().map(|m| m.into_lecture()).collect())
    }

    /// 删除讲义及其全部批次
    pub async fn delete_lecture_impl(&self, lecture_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SurveyError::database_operation(format!("开启事务失败: {e}")))?;

        let batch_ids: Vec<i64> = SurveyBatches::find()
            .select_only()
            .column(BatchColumn::Id)
            .filter(BatchColumn::LectureId.eq(lecture_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| SurveyError::database_operation(format!("查询讲义批次失败: {e}")))?;

        delete_batches_in_txn(&txn, &batch_ids).await?;

        let result = Lectures::delete_by_id(lecture_id)
            .exec(&txn)
            .await
            .map_err(|e| SurveyError::database_operation(format!("删除讲义失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| SurveyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
