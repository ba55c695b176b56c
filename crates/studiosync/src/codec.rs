//! Property codec - converts between the record store's typed property
//! payloads and the flat string values kept in the local property bag.
//!
//! The codec is total over every supported [`PropertyKind`]: extraction
//! never fails and never panics, and building a patch payload returns
//! `None` instead of erroring when there is nothing to write. Property
//! kinds outside the supported set deserialize into
//! [`TypedProperty::Unsupported`] and extract as an empty string; they are
//! rejected earlier when the tracked-property set is built, so seeing one
//! here is harmless.

use serde::{Deserialize, Serialize};

/// Property kinds supported for bidirectional sync.
///
/// Anything else the record store offers (relations, rollups, files, ...)
/// is excluded from tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Title,
    RichText,
    Select,
    MultiSelect,
    Status,
    Number,
    Date,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
}

impl PropertyKind {
    /// Parse a wire-format kind name. Returns `None` for unsupported kinds.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Self::Title),
            "rich_text" => Some(Self::RichText),
            "select" => Some(Self::Select),
            "multi_select" => Some(Self::MultiSelect),
            "status" => Some(Self::Status),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "checkbox" => Some(Self::Checkbox),
            "url" => Some(Self::Url),
            "email" => Some(Self::Email),
            "phone_number" => Some(Self::PhoneNumber),
            _ => None,
        }
    }

    /// Wire-format name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Status => "status",
            Self::Number => "number",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
        }
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run of text inside a title or rich_text property.
///
/// Reads carry `plain_text`; writes carry only the nested `text.content`
/// form the API expects in patch payloads. Both are optional so a single
/// type covers both directions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

impl TextRun {
    /// A run suitable for writing back to the record store.
    #[must_use]
    pub fn content(value: impl Into<String>) -> Self {
        Self {
            plain_text: None,
            text: Some(TextContent {
                content: value.into(),
            }),
        }
    }

    fn as_plain(&self) -> &str {
        self.plain_text
            .as_deref()
            .or(self.text.as_ref().map(|t| t.content.as_str()))
            .unwrap_or("")
    }
}

/// Nested write-side text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

/// A named option of a select, multi_select, or status property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// A date property value. Only the start date takes part in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
}

/// A typed property as the record store represents it on the wire.
///
/// Internally tagged on `type`, matching the API's property objects.
/// Unknown kinds collapse into [`TypedProperty::Unsupported`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypedProperty {
    Title { title: Vec<TextRun> },
    RichText { rich_text: Vec<TextRun> },
    Select { select: Option<SelectOption> },
    MultiSelect { multi_select: Vec<SelectOption> },
    Status { status: Option<SelectOption> },
    Number { number: Option<f64> },
    Date { date: Option<DateValue> },
    Checkbox { checkbox: bool },
    Url { url: Option<String> },
    Email { email: Option<String> },
    PhoneNumber { phone_number: Option<String> },
    #[serde(other)]
    Unsupported,
}

/// Extract the canonical string form of a typed property.
///
/// Title and rich_text take the first text run only. Missing or null
/// values become the empty string.
#[must_use]
pub fn extract_value(property: &TypedProperty) -> String {
    match property {
        TypedProperty::Title { title } => first_run(title),
        TypedProperty::RichText { rich_text } => first_run(rich_text),
        TypedProperty::Select { select } => option_name(select),
        TypedProperty::Status { status } => option_name(status),
        TypedProperty::MultiSelect { multi_select } => multi_select
            .iter()
            .map(|o| o.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        TypedProperty::Number { number } => number.map(format_number).unwrap_or_default(),
        TypedProperty::Date { date } => date.as_ref().map(|d| d.start.clone()).unwrap_or_default(),
        TypedProperty::Checkbox { checkbox } => {
            if *checkbox { "Yes" } else { "No" }.to_string()
        }
        TypedProperty::Url { url } => url.clone().unwrap_or_default(),
        TypedProperty::Email { email } => email.clone().unwrap_or_default(),
        TypedProperty::PhoneNumber { phone_number } => phone_number.clone().unwrap_or_default(),
        TypedProperty::Unsupported => String::new(),
    }
}

/// Build the patch payload for a local value, or `None` when the value is
/// empty - an empty local value is omitted from the patch so push never
/// clears a remote field.
#[must_use]
pub fn build_property_payload(kind: PropertyKind, value: &str) -> Option<TypedProperty> {
    if value.is_empty() {
        return None;
    }

    let payload = match kind {
        PropertyKind::Title => TypedProperty::Title {
            title: vec![TextRun::content(value)],
        },
        PropertyKind::RichText => TypedProperty::RichText {
            rich_text: vec![TextRun::content(value)],
        },
        PropertyKind::Select => TypedProperty::Select {
            select: Some(SelectOption { name: value.into() }),
        },
        PropertyKind::Status => TypedProperty::Status {
            status: Some(SelectOption { name: value.into() }),
        },
        PropertyKind::MultiSelect => TypedProperty::MultiSelect {
            multi_select: value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| SelectOption { name: s.into() })
                .collect(),
        },
        PropertyKind::Number => TypedProperty::Number {
            number: Some(lossy_number(value).0),
        },
        PropertyKind::Date => TypedProperty::Date {
            date: Some(DateValue {
                start: value.into(),
            }),
        },
        PropertyKind::Checkbox => TypedProperty::Checkbox {
            checkbox: value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true"),
        },
        PropertyKind::Url => TypedProperty::Url {
            url: Some(value.into()),
        },
        PropertyKind::Email => TypedProperty::Email {
            email: Some(value.into()),
        },
        PropertyKind::PhoneNumber => TypedProperty::PhoneNumber {
            phone_number: Some(value.into()),
        },
    };

    Some(payload)
}

/// Parse a local value as a number, coercing to 0 on failure.
///
/// Returns the parsed value and whether the coercion was lossy, so callers
/// can surface the coercion in the sync log instead of writing bad data
/// silently.
#[must_use]
pub fn lossy_number(value: &str) -> (f64, bool) {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => (n, false),
        _ => (0.0, true),
    }
}

fn first_run(runs: &[TextRun]) -> String {
    runs.first().map(|r| r.as_plain().to_string()).unwrap_or_default()
}

fn option_name(option: &Option<SelectOption>) -> String {
    option.as_ref().map(|o| o.name.clone()).unwrap_or_default()
}

/// Format a number the way the original records display it: integral
/// values without a trailing `.0`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> TypedProperty {
        serde_json::from_str(json).expect("valid property json")
    }

    #[test]
    fn extract_title_takes_first_run_plain_text() {
        let prop = parse(r#"{"type":"title","title":[{"plain_text":"Acme | Promo"},{"plain_text":"ignored"}]}"#);
        assert_eq!(extract_value(&prop), "Acme | Promo");
    }

    #[test]
    fn extract_empty_title_is_empty_string() {
        let prop = parse(r#"{"type":"title","title":[]}"#);
        assert_eq!(extract_value(&prop), "");
    }

    #[test]
    fn extract_select_and_status_use_option_name() {
        let select = parse(r#"{"type":"select","select":{"name":"Editing"}}"#);
        assert_eq!(extract_value(&select), "Editing");

        let null_status = parse(r#"{"type":"status","status":null}"#);
        assert_eq!(extract_value(&null_status), "");
    }

    #[test]
    fn extract_multi_select_joins_with_comma_space() {
        let prop = parse(
            r#"{"type":"multi_select","multi_select":[{"name":"4K"},{"name":"Drone"},{"name":"Color"}]}"#,
        );
        assert_eq!(extract_value(&prop), "4K, Drone, Color");
    }

    #[test]
    fn extract_number_formats_integral_values_without_decimal() {
        let whole = parse(r#"{"type":"number","number":1200}"#);
        assert_eq!(extract_value(&whole), "1200");

        let fractional = parse(r#"{"type":"number","number":99.5}"#);
        assert_eq!(extract_value(&fractional), "99.5");

        let null = parse(r#"{"type":"number","number":null}"#);
        assert_eq!(extract_value(&null), "");
    }

    #[test]
    fn extract_checkbox_maps_to_yes_no() {
        assert_eq!(
            extract_value(&parse(r#"{"type":"checkbox","checkbox":true}"#)),
            "Yes"
        );
        assert_eq!(
            extract_value(&parse(r#"{"type":"checkbox","checkbox":false}"#)),
            "No"
        );
    }

    #[test]
    fn extract_date_takes_start() {
        let prop = parse(r#"{"type":"date","date":{"start":"2026-03-01","end":null}}"#);
        assert_eq!(extract_value(&prop), "2026-03-01");
    }

    #[test]
    fn unknown_kind_deserializes_as_unsupported_and_extracts_empty() {
        let prop = parse(r#"{"type":"rollup","rollup":{"number":4}}"#);
        assert_eq!(prop, TypedProperty::Unsupported);
        assert_eq!(extract_value(&prop), "");
    }

    #[test]
    fn build_returns_none_for_empty_value() {
        for kind in [
            PropertyKind::Title,
            PropertyKind::RichText,
            PropertyKind::Select,
            PropertyKind::MultiSelect,
            PropertyKind::Status,
            PropertyKind::Number,
            PropertyKind::Date,
            PropertyKind::Checkbox,
            PropertyKind::Url,
            PropertyKind::Email,
            PropertyKind::PhoneNumber,
        ] {
            assert!(build_property_payload(kind, "").is_none(), "kind {kind}");
        }
    }

    #[test]
    fn build_title_wraps_value_in_text_content() {
        let payload = build_property_payload(PropertyKind::Title, "Acme | Promo Video")
            .expect("non-empty value builds");
        let json = serde_json::to_value(&payload).expect("serializable");
        assert_eq!(
            json["title"][0]["text"]["content"],
            serde_json::json!("Acme | Promo Video")
        );
    }

    #[test]
    fn build_multi_select_splits_trims_and_drops_empties() {
        let payload = build_property_payload(PropertyKind::MultiSelect, "4K , Drone,, Color")
            .expect("non-empty value builds");
        match payload {
            TypedProperty::MultiSelect { multi_select } => {
                let names: Vec<_> = multi_select.iter().map(|o| o.name.as_str()).collect();
                assert_eq!(names, vec!["4K", "Drone", "Color"]);
            }
            other => panic!("expected multi_select payload, got {other:?}"),
        }
    }

    #[test]
    fn build_checkbox_accepts_yes_and_true_case_insensitively() {
        for truthy in ["yes", "Yes", "YES", "true", "True"] {
            match build_property_payload(PropertyKind::Checkbox, truthy) {
                Some(TypedProperty::Checkbox { checkbox }) => assert!(checkbox, "{truthy}"),
                other => panic!("unexpected payload for {truthy}: {other:?}"),
            }
        }
        match build_property_payload(PropertyKind::Checkbox, "no") {
            Some(TypedProperty::Checkbox { checkbox }) => assert!(!checkbox),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn build_number_coerces_unparseable_to_zero_and_flags_it() {
        assert_eq!(lossy_number("99.5"), (99.5, false));
        assert_eq!(lossy_number(" 42 "), (42.0, false));
        assert_eq!(lossy_number("around ten"), (0.0, true));

        match build_property_payload(PropertyKind::Number, "around ten") {
            Some(TypedProperty::Number { number }) => assert_eq!(number, Some(0.0)),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn build_phone_number_is_symmetric_with_extract() {
        let payload = build_property_payload(PropertyKind::PhoneNumber, "+49 170 1234567")
            .expect("non-empty value builds");
        assert_eq!(extract_value(&payload), "+49 170 1234567");
    }

    #[test]
    fn property_kind_parse_rejects_unsupported() {
        assert_eq!(PropertyKind::parse("title"), Some(PropertyKind::Title));
        assert_eq!(
            PropertyKind::parse("phone_number"),
            Some(PropertyKind::PhoneNumber)
        );
        assert_eq!(PropertyKind::parse("relation"), None);
        assert_eq!(PropertyKind::parse("rollup"), None);
    }
}
