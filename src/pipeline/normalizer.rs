//! 上传文件规范化
//!
//! 把 CSV 或 Excel 原文解析为待写入的回答和评论草稿。两种格式先读成
//! 同一种表格，再走相同的表头分类与行校验。结构性问题（空文件、编码、
//! 表头重复、没有自由记述列、工作簿损坏）直接返回 Format 错误；单行的
//! 问题只记录警告并跳过该行。

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{Reader, Xlsx};
use tracing::{debug, warn};

use super::headers::{ColumnRole, CommentRole, classify_header, normalize_header};
use crate::errors::{Result, SurveyError};
use crate::models::batches::responses::PipelineWarning;
use crate::models::surveys::{
    NewComment, NewResponse, QuestionType, RespondentAttribute, ScoreKey, Scores,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 上传文件格式，按文件扩展名判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.trim().to_ascii_lowercase();
        if lower.ends_with(".xlsx") || lower.ends_with(".xlsm") {
            Self::Xlsx
        } else {
            Self::Csv
        }
    }
}

/// 一列的位置与角色
#[derive(Debug, Clone)]
pub struct Column {
    pub index: usize,
    pub header: String,
    pub role: ColumnRole,
}

/// 尚未写入的评论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub question_type: QuestionType,
    pub column_header: String,
    pub text: String,
    // 是否需要送去分类
    pub analyzable: bool,
}

impl CommentDraft {
    pub fn to_new_comment(&self) -> NewComment {
        NewComment {
            question_type: self.question_type,
            column_header: self.column_header.clone(),
            text: self.text.clone(),
        }
    }
}

/// 通过校验的一行
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    // 文件中的行号（表头为第 1 行）
    pub row_number: usize,
    pub response: NewResponse,
    pub comments: Vec<CommentDraft>,
}

#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub columns: Vec<Column>,
    pub rows: Vec<NormalizedRow>,
    pub warnings: Vec<PipelineWarning>,
    pub total_rows: usize,
}

impl NormalizedTable {
    pub fn rejected_rows(&self) -> usize {
        self.total_rows - self.rows.len()
    }
}

/// 行级拒绝原因
struct RowRejection {
    column: Option<String>,
    reason: String,
}

/// 一行原始单元格，或读取该行时的错误
type RawRecord = std::result::Result<Vec<String>, String>;

/// 按文件名选择读取方式
pub fn normalize_upload(file_name: &str, content: &[u8]) -> Result<NormalizedTable> {
    match SourceFormat::from_file_name(file_name) {
        SourceFormat::Csv => normalize_csv(content),
        SourceFormat::Xlsx => normalize_xlsx(content),
    }
}

/// 解析并校验 CSV
pub fn normalize_csv(content: &[u8]) -> Result<NormalizedTable> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let text = std::str::from_utf8(content)
        .map_err(|e| SurveyError::format(format!("CSV must be UTF-8 encoded: {e}")))?;

    if text.trim().is_empty() {
        return Err(SurveyError::format("Uploaded file is empty."));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SurveyError::format(format!("读取表头失败: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let records = reader.records().enumerate().map(|(idx, result)| {
        let record = result
            .map(|record| record.iter().map(str::to_string).collect())
            .map_err(|e| format!("CSV 解析失败: {e}"));
        (idx + 2, record)
    });

    normalize_records(&headers, records)
}

/// 解析并校验 Excel 工作簿，只读取第一个工作表
pub fn normalize_xlsx(content: &[u8]) -> Result<NormalizedTable> {
    if content.is_empty() {
        return Err(SurveyError::format("Uploaded file is empty."));
    }

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(content))
        .map_err(|e| SurveyError::format(format!("打开 XLSX 失败: {e}")))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| SurveyError::format("Workbook contains no worksheet."))?;

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| SurveyError::format(format!("读取工作表失败: {e}")))?;

    let mut rows = range.rows();
    let mut headers: Vec<String> = rows
        .next()
        .ok_or_else(|| SurveyError::format("Uploaded file is empty."))?
        .iter()
        .map(|cell| cell.to_string())
        .collect();
    // 工作表范围可能比表头宽
    while headers.last().is_some_and(|h| h.trim().is_empty()) {
        headers.pop();
    }

    // CSV 读取器会跳过空行，工作表的空行同样跳过
    let records = rows
        .enumerate()
        .map(|(idx, row)| {
            let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            (idx + 2, cells)
        })
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|(row_number, cells)| (row_number, Ok(cells)));

    normalize_records(&headers, records)
}

/// 两种格式共用的表头分类与逐行校验
fn normalize_records(
    headers: &[String],
    records: impl Iterator<Item = (usize, RawRecord)>,
) -> Result<NormalizedTable> {
    let columns = read_columns(headers)?;

    let score_columns: Vec<(ScoreKey, Option<&Column>)> = ScoreKey::ALL
        .iter()
        .map(|key| {
            let column = columns
                .iter()
                .find(|c| c.role == ColumnRole::Score(*key));
            (*key, column)
        })
        .collect();

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let mut total_rows = 0;

    for (row_number, record) in records {
        total_rows += 1;

        let outcome = match record {
            Ok(cells) => parse_row(&cells, &columns, &score_columns),
            Err(reason) => Err(RowRejection {
                column: None,
                reason,
            }),
        };

        match outcome {
            Ok((response, comments)) => {
                debug!(
                    "Row {} accepted with {} comment(s)",
                    row_number,
                    comments.len()
                );
                rows.push(NormalizedRow {
                    row_number,
                    response,
                    comments,
                });
            }
            Err(rejection) => {
                let err = SurveyError::row_rejected(format!(
                    "row {row_number}: {}",
                    rejection.reason
                ));
                warn!("{}", err);
                warnings.push(PipelineWarning::row_rejected(
                    row_number,
                    rejection.column,
                    rejection.reason,
                ));
            }
        }
    }

    if total_rows == 0 {
        return Err(SurveyError::format("File contains no data rows."));
    }

    if rows.is_empty() {
        let first_reason = warnings
            .first()
            .map(|w| w.message.clone())
            .unwrap_or_default();
        return Err(SurveyError::format(format!(
            "No valid rows: all {total_rows} row(s) were rejected (first: {first_reason})"
        )));
    }

    Ok(NormalizedTable {
        columns,
        rows,
        warnings,
        total_rows,
    })
}

/// 校验表头并分类各列
fn read_columns(headers: &[String]) -> Result<Vec<Column>> {
    if headers.is_empty() {
        return Err(SurveyError::format("Header row is missing."));
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());

    for (index, raw) in headers.iter().enumerate() {
        let header = normalize_header(raw);
        if header.is_empty() {
            return Err(SurveyError::format(format!(
                "Header contains an empty column name (column {}).",
                index + 1
            )));
        }
        if !seen.insert(header.clone()) {
            return Err(SurveyError::format(format!(
                "Header contains duplicate column names after normalization: {header}"
            )));
        }
        let role = classify_header(&header);
        columns.push(Column {
            index,
            header,
            role,
        });
    }

    if !columns.iter().any(|c| c.role.is_comment()) {
        return Err(SurveyError::format(
            "File must contain at least one column whose header starts with '（任意）' or '【必須】'.",
        ));
    }

    Ok(columns)
}

fn parse_row(
    cells: &[String],
    columns: &[Column],
    score_columns: &[(ScoreKey, Option<&Column>)],
) -> std::result::Result<(NewResponse, Vec<CommentDraft>), RowRejection> {
    let cell = |column: &Column| cells.get(column.index).map_or("", |c| c.trim());

    let scores = Scores::try_from_fn(|key| {
        let column = score_columns
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, c)| *c)
            .ok_or_else(|| RowRejection {
                column: None,
                reason: format!("missing score column for {key}"),
            })?;
        parse_score(key, cell(column)).map_err(|reason| RowRejection {
            column: Some(column.header.clone()),
            reason,
        })
    })?;

    let account_id = columns
        .iter()
        .filter(|c| c.role == ColumnRole::AccountId)
        .map(cell)
        .find(|v| !v.is_empty())
        .map(str::to_string);

    let respondent_attribute = columns
        .iter()
        .filter(|c| c.role == ColumnRole::Attribute)
        .map(cell)
        .find(|v| !v.is_empty())
        .map(RespondentAttribute::normalize)
        .unwrap_or(RespondentAttribute::Other);

    let comments = columns
        .iter()
        .filter_map(|column| match column.role {
            ColumnRole::Comment(role, question_type) => {
                let text = cell(column);
                if text.is_empty() {
                    return None;
                }
                Some(CommentDraft {
                    question_type,
                    column_header: column.header.clone(),
                    text: text.to_string(),
                    analyzable: role == CommentRole::Analyzable
                        && !question_type.is_excluded_from_analysis(),
                })
            }
            _ => None,
        })
        .collect();

    Ok((
        NewResponse {
            account_id,
            respondent_attribute,
            scores,
        },
        comments,
    ))
}

/// 解析单个评分并检查范围
fn parse_score(key: ScoreKey, raw: &str) -> std::result::Result<i32, String> {
    if raw.is_empty() {
        return Err(format!("{key} is empty"));
    }
    let value: i32 = raw
        .parse()
        .map_err(|_| format!("{key} is not an integer: {raw:?}"))?;
    let range = key.range();
    if !range.contains(&value) {
        return Err(format!(
            "{key} out of range {}-{}: {value}",
            range.start(),
            range.end()
        ));
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SCORE_HEADER_LINE: &str = concat!(
        "\"本日の総合的な満足度を５段階で教えてください。\",",
        "\"本日の講義内容について５段階で教えてください。\n学習量は適切だった\",",
        "\"本日の講義内容について５段階で教えてください。\n講義内容が十分に理解できた\",",
        "\"本日の講義内容について５段階で教えてください。\n運営側のアナウンスが適切だった\",",
        "\"本日の講師の総合的な満足度を５段階で教えてください。\",",
        "\"本日の講師について５段階で教えてください。\n授業時間を効率的に使っていた\",",
        "\"本日の講師について５段階で教えてください。\n質問に丁寧に対応してくれた\",",
        "\"本日の講師について５段階で教えてください。\n話し方や声の大きさが適切だった\",",
        "\"ご自身について５段階で教えてください。\n事前に予習をした\",",
        "\"ご自身について５段階で教えてください。\n意欲をもって講義に臨んだ\",",
        "\"ご自身について５段階で教えてください。\n今回学んだことを学習や研究に生かせる\",",
        "\"親しいご友人にこの講義の受講をお薦めしますか？\"",
    );

    /// 测试用 CSV 的一行数据
    pub(crate) struct TestRow<'a> {
        pub account: &'a str,
        pub attribute: &'a str,
        pub satisfaction: &'a str,
        pub recommend: &'a str,
        pub learned: &'a str,
        pub free: &'a str,
    }

    impl Default for TestRow<'_> {
        fn default() -> Self {
            Self {
                account: "u",
                attribute: "student",
                satisfaction: "4",
                recommend: "8",
                learned: "",
                free: "",
            }
        }
    }

    /// 构造包含全部评分列、一个【必須】列和一个（任意）列的 CSV
    pub(crate) fn build_csv(rows: &[TestRow<'_>]) -> Vec<u8> {
        let mut out = format!(
            "account_id,受講生の属性,{SCORE_HEADER_LINE},【必須】本日の講義で学んだこと,（任意）ご自由にご意見を\n"
        );
        for row in rows {
            // 满足度 + 10 个固定的 3 分 + 推荐度
            out.push_str(&format!(
                "{},{},{},3,3,3,3,3,3,3,3,3,3,{},\"{}\",\"{}\"\n",
                row.account, row.attribute, row.satisfaction, row.recommend, row.learned, row.free
            ));
        }
        out.into_bytes()
    }

    /// 把 build_csv 的内容写成第一个工作表，数值单元格按数字写入
    pub(crate) fn build_xlsx(rows: &[TestRow<'_>]) -> Vec<u8> {
        let csv = build_csv(rows);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(csv.as_slice());

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, record) in reader.records().enumerate() {
            let record = record.unwrap();
            for (c, value) in record.iter().enumerate() {
                let (row, col) = (r as u32, c as u16);
                match value.parse::<f64>() {
                    Ok(number) if r > 0 => {
                        sheet.write_number(row, col, number).unwrap();
                    }
                    _ if value.is_empty() => {}
                    _ => {
                        sheet.write_string(row, col, value).unwrap();
                    }
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_empty_file_is_format_error() {
        let err = normalize_csv(b"").unwrap_err();
        assert_eq!(err.code(), "E001");
        let err = normalize_csv(b"\xEF\xBB\xBF  \n").unwrap_err();
        assert_eq!(err.code(), "E001");
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let err = normalize_csv(b"\xff\xfe\x00a").unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));
    }

    #[test]
    fn test_duplicate_header_after_trim() {
        let csv = "account_id,（任意）感想, （任意）感想 \n1,a,b\n";
        let err = normalize_csv(csv.as_bytes()).unwrap_err();
        assert!(err.message().contains("duplicate"));
    }

    #[test]
    fn test_no_comment_column() {
        let csv = format!("account_id,{SCORE_HEADER_LINE}\nu1,5,5,5,5,5,5,5,5,5,5,5,10\n");
        let err = normalize_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));
    }

    #[test]
    fn test_bom_is_tolerated() {
        let mut content = UTF8_BOM.to_vec();
        content.extend(build_csv(&[TestRow::default()]));
        let csv = normalize_csv(&content).unwrap();
        assert_eq!(csv.rows.len(), 1);
        assert_eq!(csv.rows[0].response.account_id.as_deref(), Some("u"));
    }

    #[test]
    fn test_row_rejection_isolated() {
        let mut rows: Vec<TestRow<'_>> = (0..10).map(|_| TestRow::default()).collect();
        rows[6].satisfaction = "abc";
        let csv = normalize_csv(&build_csv(&rows)).unwrap();

        assert_eq!(csv.total_rows, 10);
        assert_eq!(csv.rows.len(), 9);
        assert_eq!(csv.rejected_rows(), 1);
        assert_eq!(csv.warnings.len(), 1);
        // 第 7 条数据在 CSV 第 8 行
        assert_eq!(csv.warnings[0].row, Some(8));
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let rows = [
            TestRow {
                recommend: "11",
                ..Default::default()
            },
            TestRow {
                satisfaction: "0",
                ..Default::default()
            },
            TestRow {
                recommend: "0",
                ..Default::default()
            },
        ];
        let csv = normalize_csv(&build_csv(&rows)).unwrap();
        assert_eq!(csv.rows.len(), 1);
        assert_eq!(csv.rows[0].response.scores.recommend_friend, 0);
        assert_eq!(csv.warnings.len(), 2);
    }

    #[test]
    fn test_all_rows_rejected_escalates() {
        let rows = [TestRow {
            satisfaction: "",
            ..Default::default()
        }];
        let err = normalize_csv(&build_csv(&rows)).unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));
    }

    #[test]
    fn test_comment_routing() {
        let rows = [TestRow {
            learned: "統計の基礎",
            free: "とても分かりやすかった",
            ..Default::default()
        }];
        let csv = normalize_csv(&build_csv(&rows)).unwrap();
        let comments = &csv.rows[0].comments;
        assert_eq!(comments.len(), 2);

        let learned = comments
            .iter()
            .find(|c| c.question_type == QuestionType::Learned)
            .unwrap();
        assert!(!learned.analyzable);

        let free = comments
            .iter()
            .find(|c| c.question_type == QuestionType::FreeComment)
            .unwrap();
        assert!(free.analyzable);
        assert_eq!(free.column_header, "（任意）ご自由にご意見を");
    }

    #[test]
    fn test_empty_comment_cells_skipped() {
        let csv = normalize_csv(&build_csv(&[TestRow::default()])).unwrap();
        assert!(csv.rows[0].comments.is_empty());
    }

    #[test]
    fn test_attribute_defaults_to_other() {
        let rows = [TestRow {
            attribute: "",
            ..Default::default()
        }];
        let csv = normalize_csv(&build_csv(&rows)).unwrap();
        assert_eq!(
            csv.rows[0].response.respondent_attribute,
            RespondentAttribute::Other
        );
    }

    #[test]
    fn test_source_format_from_file_name() {
        assert_eq!(SourceFormat::from_file_name("回答.XLSX"), SourceFormat::Xlsx);
        assert_eq!(SourceFormat::from_file_name("survey.csv"), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_file_name("upload"), SourceFormat::Csv);
    }

    #[test]
    fn test_xlsx_shares_row_validation() {
        let mut rows: Vec<TestRow<'_>> = (0..3).map(|_| TestRow::default()).collect();
        rows[1].satisfaction = "abc";
        rows[2].free = "とても分かりやすかった";

        let table = normalize_upload("回答一覧.xlsx", &build_xlsx(&rows)).unwrap();
        assert_eq!(table.total_rows, 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.warnings.len(), 1);
        assert_eq!(table.warnings[0].row, Some(3));

        // 数值单元格 4.0 与 CSV 的 "4" 等价
        let first = &table.rows[0].response;
        assert_eq!(first.scores.satisfaction_overall, 4);
        assert_eq!(first.scores.recommend_friend, 8);
        assert_eq!(first.account_id.as_deref(), Some("u"));

        let comments = &table.rows[1].comments;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].question_type, QuestionType::FreeComment);
        assert!(comments[0].analyzable);

        let from_csv = normalize_csv(&build_csv(&rows)).unwrap();
        let headers = |t: &NormalizedTable| {
            t.columns.iter().map(|c| c.header.clone()).collect::<Vec<_>>()
        };
        assert_eq!(headers(&table), headers(&from_csv));
    }

    #[test]
    fn test_corrupt_workbook_is_format_error() {
        let err = normalize_xlsx(b"PK\x03\x04 not really a zip").unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));

        // 扩展名是 xlsx 但内容是 CSV
        let err = normalize_upload("survey.xlsx", &build_csv(&[TestRow::default()])).unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));

        let err = normalize_xlsx(b"").unwrap_err();
        assert!(matches!(err, SurveyError::Format(_)));
    }
}
