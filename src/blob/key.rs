use chrono::NaiveDate;
use uuid::Uuid;

const FALLBACK_SLUG: &str = "untitled";

/// 保留字母数字（含日文），其余字符折叠为单个 `-`
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

fn sanitize_filename(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload.csv".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `课程/日期-回次/uuid_文件名`
pub fn storage_key(course_name: &str, lecture_on: NaiveDate, session: &str, filename: &str) -> String {
    format!(
        "{}/{}-{}/{}_{}",
        slugify(course_name),
        lecture_on.format("%Y-%m-%d"),
        slugify(session),
        Uuid::new_v4().simple(),
        sanitize_filename(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Data Science 101!"), "data-science-101");
        assert_eq!(slugify("データサイエンス概論"), "データサイエンス概論");
        assert_eq!(slugify("第1回 (前半)"), "第1回-前半");
        assert_eq!(slugify("  ***  "), FALLBACK_SLUG);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\tmp\\回答 一覧.csv"), "回答_一覧.csv");
        assert_eq!(sanitize_filename(".."), "upload.csv");
    }

    #[test]
    fn test_storage_key_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let key = storage_key("統計学入門", date, "第1回", "survey.csv");
        let parts: Vec<_> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "統計学入門");
        assert_eq!(parts[1], "2024-05-10-第1回");
        assert!(parts[2].ends_with("_survey.csv"));
    }
}
