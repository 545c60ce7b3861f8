use std::{collections::HashSet, fmt, fs, path::Path};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::interview::{
    error::{InterviewError, invalid_form},
    validation::{FieldType, normalize_type, validate_answer},
};

/// Reserved reply the matcher uses for "no field"; no field may carry it.
pub const NO_MATCH_SENTINEL: &str = "None";

/// One form field as it appears in form and answer files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldInfo {
    #[serde(default)]
    pub value: String,
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl FieldInfo {
    pub fn field_type(&self) -> FieldType {
        normalize_type(&self.type_name)
    }

    pub fn is_answered(&self) -> bool {
        !self.value.trim().is_empty()
    }

    pub fn options_label(&self) -> String {
        if self.options.is_empty() {
            "N/A".to_string()
        } else {
            self.options.join(", ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    #[default]
    AllFields,
    RequiredFields,
}

/// Ordered field set for one interview.
///
/// Field names and order are fixed once constructed; only values change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    fields: Vec<(String, FieldInfo)>,
}

impl Form {
    pub fn new(fields: Vec<(String, FieldInfo)>) -> Result<Self, InterviewError> {
        if fields.is_empty() {
            return Err(invalid_form("form must declare at least one field"));
        }

        let mut seen = HashSet::new();
        for (name, info) in &fields {
            if name.trim().is_empty() {
                return Err(invalid_form("field names must not be blank"));
            }
            if name.trim().eq_ignore_ascii_case(NO_MATCH_SENTINEL) {
                return Err(invalid_form(format!(
                    "field name '{name}' is reserved for the matcher's no-match reply"
                )));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(invalid_form(format!(
                    "field name '{name}' is declared more than once"
                )));
            }

            let field_type = info.field_type();
            if info.is_answered() && !validate_answer(&info.value, &field_type, &info.options) {
                return Err(invalid_form(format!(
                    "field '{name}' has pre-filled value '{}' that is not a valid {}",
                    info.value, field_type
                )));
            }
            if !field_type.is_recognized() {
                tracing::warn!(
                    target: "interview",
                    field = %name,
                    field_type = %field_type,
                    "unrecognized_field_type"
                );
            }
            if matches!(field_type, FieldType::Multichoice) && info.options.is_empty() {
                tracing::warn!(target: "interview", field = %name, "multichoice_without_options");
            }
        }

        Ok(Self { fields })
    }

    pub fn from_json_str(content: &str) -> Result<Self, InterviewError> {
        let raw: RawForm = serde_json::from_str(content)
            .map_err(|err| invalid_form(format!("failed to parse form JSON: {err}")))?;
        Self::new(raw.0)
    }

    pub fn load(path: &Path) -> Result<Self, InterviewError> {
        let content = fs::read_to_string(path).map_err(|err| {
            invalid_form(format!("failed to read form '{}': {err}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldInfo)> {
        self.fields.iter().map(|(name, info)| (name.as_str(), info))
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, info)| info)
    }

    pub fn first_field(&self) -> &str {
        &self.fields[0].0
    }

    /// Unanswered field names in declared order.
    pub fn unanswered(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, info)| !info.is_answered())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn answered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter(|(_, info)| info.is_answered())
            .map(|(name, info)| (name.as_str(), info.value.as_str()))
    }

    pub fn all_unanswered(&self) -> bool {
        self.fields.iter().all(|(_, info)| !info.is_answered())
    }

    pub fn is_complete(&self, policy: CompletionPolicy) -> bool {
        self.fields.iter().all(|(_, info)| match policy {
            CompletionPolicy::AllFields => info.is_answered(),
            CompletionPolicy::RequiredFields => !info.required || info.is_answered(),
        })
    }

    /// Stores a value, enforcing that it re-validates against the field.
    pub fn set_value(&mut self, name: &str, value: &str) -> Result<(), InterviewError> {
        let info = self
            .fields
            .iter_mut()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, info)| info)
            .ok_or_else(|| invalid_form(format!("unknown field '{name}'")))?;

        if !validate_answer(value, &info.field_type(), &info.options) {
            return Err(invalid_form(format!(
                "value '{value}' is not a valid {} for field '{name}'",
                info.field_type()
            )));
        }
        info.value = value.to_string();
        Ok(())
    }
}

impl Serialize for Form {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, info) in &self.fields {
            map.serialize_entry(name, info)?;
        }
        map.end()
    }
}

/// Field list in file order; duplicates are left for `Form::new` to reject.
struct RawForm(Vec<(String, FieldInfo)>);

impl<'de> Deserialize<'de> for RawForm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawFormVisitor;

        impl<'de> Visitor<'de> for RawFormVisitor {
            type Value = RawForm;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping field names to field definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawForm, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, info)) = access.next_entry::<String, FieldInfo>()? {
                    fields.push((name, info));
                }
                Ok(RawForm(fields))
            }
        }

        deserializer.deserialize_map(RawFormVisitor)
    }
}
