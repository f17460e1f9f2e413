//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_survey_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum SurveyError {
            $($variant(String),)*
        }

        impl SurveyError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(SurveyError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(SurveyError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(SurveyError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl SurveyError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        SurveyError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_survey_errors! {
    Format("E001", "Format Error"),
    Validation("E002", "Validation Error"),
    RowRejected("E003", "Row Rejected"),
    Classification("E004", "Classification Failure"),
    Storage("E005", "Storage Error"),
    Conflict("E006", "Conflict Error"),
    DatabaseConfig("E007", "Database Configuration Error"),
    DatabaseConnection("E008", "Database Connection Error"),
    DatabaseOperation("E009", "Database Operation Error"),
    FileOperation("E010", "File Operation Error"),
    NotFound("E011", "Resource Not Found"),
    Serialization("E012", "Serialization Error"),
    DateParse("E013", "Date Parse Error"),
}

impl SurveyError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否为上传方可直接修正的问题（文件结构或元数据）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SurveyError::Format(_) | SurveyError::Validation(_) | SurveyError::DateParse(_)
        )
    }
}

impl fmt::Display for SurveyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SurveyError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for SurveyError {
    fn from(err: sea_orm::DbErr) -> Self {
        SurveyError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for SurveyError {
    fn from(err: std::io::Error) -> Self {
        SurveyError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for SurveyError {
    fn from(err: serde_json::Error) -> Self {
        SurveyError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for SurveyError {
    fn from(err: chrono::ParseError) -> Self {
        SurveyError::DateParse(err.to_string())
    }
}

impl From<csv::Error> for SurveyError {
    fn from(err: csv::Error) -> Self {
        SurveyError::Format(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SurveyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SurveyError::format("test").code(), "E001");
        assert_eq!(SurveyError::validation("test").code(), "E002");
        assert_eq!(SurveyError::storage("test").code(), "E005");
        assert_eq!(SurveyError::not_found("test").code(), "E011");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            SurveyError::classification("timeout").error_type(),
            "Classification Failure"
        );
        assert_eq!(
            SurveyError::row_rejected("row 3").error_type(),
            "Row Rejected"
        );
    }

    #[test]
    fn test_error_message() {
        let err = SurveyError::validation("course_name is required");
        assert_eq!(err.message(), "course_name is required");
    }

    #[test]
    fn test_format_simple() {
        let err = SurveyError::format("Uploaded file is empty");
        let formatted = err.format_simple();
        assert!(formatted.contains("Format Error"));
        assert!(formatted.contains("Uploaded file is empty"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(SurveyError::format("x").is_client_error());
        assert!(SurveyError::validation("x").is_client_error());
        assert!(!SurveyError::storage("x").is_client_error());
        assert!(!SurveyError::database_operation("x").is_client_error());
    }
}
