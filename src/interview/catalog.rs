use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::interview::{
    error::{InterviewError, invalid_form},
    form::Form,
};

const FORM_EXTENSION: &str = "json";

/// A form file offered to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEntry {
    /// File stem with underscores shown as spaces.
    pub display_name: String,
    pub stem: String,
    pub path: PathBuf,
}

impl FormEntry {
    fn from_path(path: PathBuf) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            display_name: stem.replace('_', " "),
            stem,
            path,
        })
    }

    pub fn load(&self) -> Result<Form, InterviewError> {
        Form::load(&self.path)
    }
}

/// Where an interview writes its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub answers: PathBuf,
    pub chat_log: PathBuf,
}

/// Form files found in one directory, and the output layout for each.
#[derive(Debug, Clone)]
pub struct FormCatalog {
    forms_dir: PathBuf,
    output_dir: PathBuf,
}

impl FormCatalog {
    pub fn new(forms_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            forms_dir: forms_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn forms_dir(&self) -> &Path {
        &self.forms_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Every `*.json` form in the forms directory, sorted by display name.
    pub fn list(&self) -> Result<Vec<FormEntry>, InterviewError> {
        let entries = fs::read_dir(&self.forms_dir).map_err(|err| {
            invalid_form(format!(
                "failed to read forms directory '{}': {err}",
                self.forms_dir.display()
            ))
        })?;

        let mut forms = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|extension| extension == FORM_EXTENSION)
            })
            .filter_map(FormEntry::from_path)
            .collect::<Vec<_>>();
        forms.sort_by(|lhs, rhs| lhs.display_name.cmp(&rhs.display_name));
        Ok(forms)
    }

    /// Resolves a display name, a file stem, or a path to a form file.
    pub fn resolve(&self, selector: &str) -> Result<FormEntry, InterviewError> {
        let selector = selector.trim();
        let as_path = Path::new(selector);
        if as_path.is_file() {
            return FormEntry::from_path(as_path.to_path_buf())
                .ok_or_else(|| invalid_form(format!("form path '{selector}' has no usable name")));
        }

        let wanted = selector.replace('_', " ").to_lowercase();
        self.list()?
            .into_iter()
            .find(|entry| entry.display_name.to_lowercase() == wanted)
            .ok_or_else(|| {
                invalid_form(format!(
                    "no form named '{selector}' in '{}'",
                    self.forms_dir.display()
                ))
            })
    }

    pub fn session_paths(&self, entry: &FormEntry) -> SessionPaths {
        SessionPaths {
            answers: self.output_dir.join(format!("{}_answers.json", entry.stem)),
            chat_log: self.output_dir.join(format!("{}_chat_log.json", entry.stem)),
        }
    }
}
