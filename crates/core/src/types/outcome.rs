//! Per-file outcomes reported by the CLI tool

use serde::{Deserialize, Deserializer, Serialize};

/// One file touched by a pull, push or deploy, as reported on stdout.
///
/// The tool names fields in camelCase and reports line/column positions
/// either as numbers or as numeric strings; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    #[serde(default)]
    pub file_path: String,
    #[serde(rename = "type", default)]
    pub metadata_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_position",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_number: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_position",
        skip_serializing_if = "Option::is_none"
    )]
    pub column_number: Option<u32>,
}

impl FileOutcome {
    /// Create an outcome for a file with a known type and full name
    #[must_use]
    pub fn new(
        file_path: impl Into<String>,
        metadata_type: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            metadata_type: metadata_type.into(),
            full_name: Some(full_name.into()),
            ..Self::default()
        }
    }

    /// Attach a state such as `Created`, `Changed` or `Deleted`
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Attach a per-file error and optional position
    #[must_use]
    pub fn with_error(
        mut self,
        error: impl Into<String>,
        line_number: Option<u32>,
        column_number: Option<u32>,
    ) -> Self {
        self.error = Some(error.into());
        self.line_number = line_number;
        self.column_number = column_number;
        self
    }

    /// Whether the tool attached an error to this file
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Position {
    Number(u64),
    Text(String),
}

fn lenient_position<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let position = Option::<Position>::deserialize(deserializer)?;
    Ok(match position {
        Some(Position::Number(n)) => u32::try_from(n).ok(),
        Some(Position::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tool_item_with_string_positions() {
        let json = r#"{
            "filePath": "classes/Foo.cls",
            "fullName": "Foo",
            "type": "ApexClass",
            "error": "Unexpected token",
            "lineNumber": "12",
            "columnNumber": "7"
        }"#;
        let outcome: FileOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.file_path, "classes/Foo.cls");
        assert_eq!(outcome.full_name.as_deref(), Some("Foo"));
        assert_eq!(outcome.metadata_type, "ApexClass");
        assert_eq!(outcome.line_number, Some(12));
        assert_eq!(outcome.column_number, Some(7));
        assert!(outcome.is_error());
    }

    #[test]
    fn decodes_numeric_positions_and_missing_optionals() {
        let json = r#"{"filePath":"a","type":"ApexPage","lineNumber":3,"columnNumber":null}"#;
        let outcome: FileOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.line_number, Some(3));
        assert_eq!(outcome.column_number, None);
        assert_eq!(outcome.full_name, None);
        assert_eq!(outcome.state, None);
    }

    #[test]
    fn non_numeric_position_is_dropped() {
        let json = r#"{"filePath":"a","type":"T","lineNumber":"n/a"}"#;
        let outcome: FileOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.line_number, None);
    }

    proptest::proptest! {
        #[test]
        fn numeric_and_string_positions_agree(line in 0u32..1_000_000, column in 0u32..10_000) {
            let as_numbers = format!(r#"{{"filePath":"a","type":"T","lineNumber":{line},"columnNumber":{column}}}"#);
            let as_strings = format!(r#"{{"filePath":"a","type":"T","lineNumber":"{line}","columnNumber":"{column}"}}"#);
            let a: FileOutcome = serde_json::from_str(&as_numbers).unwrap();
            let b: FileOutcome = serde_json::from_str(&as_strings).unwrap();
            proptest::prop_assert_eq!(&a, &b);
            proptest::prop_assert_eq!(a.line_number, Some(line));
            proptest::prop_assert_eq!(a.column_number, Some(column));
        }
    }
}
