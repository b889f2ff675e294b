use crate::errors::ValidationError;
use crate::models::{Percentage, SubjectForm, SubjectRecord};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 5;

/// Validates raw form fields and builds the record they describe.
pub fn build_record(form: &SubjectForm) -> Result<SubjectRecord, ValidationError> {
    let mut errors = ValidationError::default();

    let name = form.subject_name.trim();
    let name_len = name.chars().count();
    if name.is_empty() {
        errors.push("subjectName", "Subject name is required");
    } else if name_len < NAME_MIN_CHARS {
        errors.push("subjectName", format!("Minimum {NAME_MIN_CHARS} characters"));
    } else if name_len > NAME_MAX_CHARS {
        errors.push("subjectName", "Use short form");
    } else if name.chars().all(|ch| ch == '.') {
        // "." and ".." collapse as URL path segments.
        errors.push("subjectName", "Subject name cannot be only dots");
    }

    let attended = parse_count(
        &mut errors,
        "lectureAttended",
        &form.lecture_attended,
        "Lectures attended",
    );
    let total = parse_count(
        &mut errors,
        "totalLectures",
        &form.total_lectures,
        "Total lectures",
    );

    if let (Some(attended), Some(total)) = (attended, total) {
        if attended > total {
            errors.push(
                "lectureAttended",
                "Attended lectures cannot exceed total lectures",
            );
        }
    }

    match (attended, total) {
        (Some(attended), Some(total)) if errors.is_empty() => {
            Ok(SubjectRecord::new(name, attended, total))
        }
        _ => Err(errors),
    }
}

fn parse_count(
    errors: &mut ValidationError,
    field: &'static str,
    raw: &str,
    label: &str,
) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(field, format!("{label} is required"));
        return None;
    }
    match raw.parse::<i64>() {
        Ok(value) if value < 0 => {
            errors.push(field, format!("{label} cannot be negative"));
            None
        }
        Ok(value) => match u32::try_from(value) {
            Ok(value) => Some(value),
            Err(_) => {
                errors.push(field, format!("{label} is too large"));
                None
            }
        },
        Err(_) => {
            errors.push(field, format!("{label} must be a whole number"));
            None
        }
    }
}

/// Records one more lecture: held always, attended only when `attended`.
pub fn increment(record: &SubjectRecord, attended: bool) -> SubjectRecord {
    let total_lectures = record.total_lectures.saturating_add(1);
    let lecture_attended = if attended {
        record.lecture_attended.saturating_add(1)
    } else {
        record.lecture_attended
    };
    SubjectRecord {
        subject_name: record.subject_name.clone(),
        lecture_attended,
        total_lectures,
        percentage: Percentage::of(lecture_attended, total_lectures),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, attended: &str, total: &str) -> SubjectForm {
        SubjectForm::new(name, attended, total)
    }

    #[test]
    fn builds_record_with_percentage() {
        let record = build_record(&form(" DBMS ", "7", "10")).unwrap();
        assert_eq!(record.subject_name, "DBMS");
        assert_eq!(record.lecture_attended, 7);
        assert_eq!(record.total_lectures, 10);
        assert_eq!(record.percentage.to_string(), "70.00");
    }

    #[test]
    fn zero_lectures_is_accepted() {
        let record = build_record(&form("OS", "0", "0")).unwrap();
        assert_eq!(record.percentage, Percentage::ZERO);
    }

    #[test]
    fn rejects_attended_above_total() {
        let err = build_record(&form("CN", "11", "10")).unwrap_err();
        assert_eq!(
            err.message_for("lectureAttended"),
            Some("Attended lectures cannot exceed total lectures")
        );
    }

    #[test]
    fn rejects_bad_names() {
        let empty = build_record(&form("", "1", "2")).unwrap_err();
        assert_eq!(empty.message_for("subjectName"), Some("Subject name is required"));

        let short = build_record(&form("A", "1", "2")).unwrap_err();
        assert_eq!(short.message_for("subjectName"), Some("Minimum 2 characters"));

        let long = build_record(&form("Algorithms", "1", "2")).unwrap_err();
        assert_eq!(long.message_for("subjectName"), Some("Use short form"));
    }

    #[test]
    fn rejects_dot_only_names() {
        let err = build_record(&form("..", "1", "2")).unwrap_err();
        assert_eq!(
            err.message_for("subjectName"),
            Some("Subject name cannot be only dots")
        );
        assert!(build_record(&form("v1.2", "1", "2")).is_ok());
    }

    #[test]
    fn rejects_negative_and_garbage_counts() {
        let err = build_record(&form("DSA", "-1", "abc")).unwrap_err();
        assert_eq!(
            err.message_for("lectureAttended"),
            Some("Lectures attended cannot be negative")
        );
        assert_eq!(
            err.message_for("totalLectures"),
            Some("Total lectures must be a whole number")
        );
    }

    #[test]
    fn reports_every_missing_field() {
        let err = build_record(&SubjectForm::default()).unwrap_err();
        assert_eq!(err.fields.len(), 3);
    }

    #[test]
    fn increment_attended_bumps_both_counts() {
        let record = SubjectRecord::new("DBMS", 7, 10);
        let next = increment(&record, true);
        assert_eq!((next.lecture_attended, next.total_lectures), (8, 11));
        assert_eq!(next.percentage.to_string(), "72.73");
    }

    #[test]
    fn increment_skipped_bumps_total_only() {
        let record = SubjectRecord::new("DBMS", 7, 10);
        let next = increment(&record, false);
        assert_eq!((next.lecture_attended, next.total_lectures), (7, 11));
        assert_eq!(next.percentage.to_string(), "63.64");
    }

    #[test]
    fn increment_from_zero_total() {
        let record = SubjectRecord::new("OS", 0, 0);
        assert_eq!(increment(&record, true).percentage.to_string(), "100.00");
        assert_eq!(increment(&record, false).percentage.to_string(), "0.00");
    }
}
