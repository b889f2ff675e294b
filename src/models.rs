use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Attendance percentage held as whole hundredths of a percent, so `70.00%`
/// is `Percentage(7000)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Percentage(u32);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);

    /// `round(attended / total * 100, 2)`, rounding half up. A zero total is 0%.
    pub fn of(attended: u32, total: u32) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let attended = u64::from(attended);
        let total = u64::from(total);
        let hundredths = (attended * 20_000 + total) / (2 * total);
        Self(u32::try_from(hundredths).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let value = match Raw::deserialize(deserializer)? {
            Raw::Number(value) => value,
            Raw::Text(text) => text
                .trim()
                .trim_end_matches('%')
                .parse::<f64>()
                .map_err(serde::de::Error::custom)?,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "invalid percentage {value}"
            )));
        }
        Ok(Self((value * 100.0).round() as u32))
    }
}

/// One tracked subject. `percentage` is derived from the two counts and is
/// rewritten with them on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub subject_name: String,
    pub lecture_attended: u32,
    pub total_lectures: u32,
    pub percentage: Percentage,
}

impl SubjectRecord {
    pub fn new(subject_name: impl Into<String>, lecture_attended: u32, total_lectures: u32) -> Self {
        Self {
            subject_name: subject_name.into(),
            lecture_attended,
            total_lectures,
            percentage: Percentage::of(lecture_attended, total_lectures),
        }
    }
}

/// Raw subject form fields as typed by the user, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectForm {
    #[serde(default)]
    pub subject_name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub lecture_attended: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub total_lectures: String,
}

// JSON clients may send counts as numbers; forms always send text.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
        Raw::Text(text) => text,
    })
}

impl SubjectForm {
    pub fn new(
        subject_name: impl Into<String>,
        lecture_attended: impl Into<String>,
        total_lectures: impl Into<String>,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            lecture_attended: lecture_attended.into(),
            total_lectures: total_lectures.into(),
        }
    }

    pub fn from_record(record: &SubjectRecord) -> Self {
        Self::new(
            record.subject_name.clone(),
            record.lecture_attended.to_string(),
            record.total_lectures.to_string(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    pub attended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_formats_two_decimals() {
        assert_eq!(Percentage::of(7, 10).to_string(), "70.00");
        assert_eq!(Percentage::of(1, 3).to_string(), "33.33");
        assert_eq!(Percentage::of(2, 3).to_string(), "66.67");
        assert_eq!(Percentage::of(10, 10).to_string(), "100.00");
        assert_eq!(Percentage::of(1, 200).to_string(), "0.50");
    }

    #[test]
    fn zero_total_is_zero_percent() {
        assert_eq!(Percentage::of(0, 0), Percentage::ZERO);
        assert_eq!(Percentage::of(0, 0).to_string(), "0.00");
    }

    #[test]
    fn percentage_handles_large_counts() {
        assert_eq!(Percentage::of(u32::MAX, u32::MAX).to_string(), "100.00");
        assert_eq!(Percentage::of(u32::MAX / 2, u32::MAX).to_string(), "50.00");
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let record = SubjectRecord::new("DBMS", 7, 10);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "subjectName": "DBMS",
                "lectureAttended": 7,
                "totalLectures": 10,
                "percentage": "70.00"
            })
        );
    }

    #[test]
    fn form_accepts_numeric_counts() {
        let form: SubjectForm = serde_json::from_value(serde_json::json!({
            "subjectName": "OS",
            "lectureAttended": 3,
            "totalLectures": "4"
        }))
        .unwrap();
        assert_eq!(form.lecture_attended, "3");
        assert_eq!(form.total_lectures, "4");
    }

    #[test]
    fn percentage_reads_numbers_and_strings() {
        let from_text: Percentage = serde_json::from_str("\"33.33\"").unwrap();
        let from_number: Percentage = serde_json::from_str("33.33").unwrap();
        assert_eq!(from_text, Percentage::of(1, 3));
        assert_eq!(from_number, Percentage::of(1, 3));
        assert!(serde_json::from_str::<Percentage>("\"NaN\"").is_err());
        assert!(serde_json::from_str::<Percentage>("-4").is_err());
    }
}
