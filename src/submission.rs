//! The "add game" submission form: draft, validation and payload.
//!
//! [`validate_draft`] is a pure function from a draft to a
//! [`ValidationReport`] holding every field error at once. Nothing is
//! mutated in place, so the report never depends on the order fields were
//! edited in.
//!
//! Images reach the draft through the uploader's selection callback: the
//! cover slot holds at most one file, the screenshot slot a bounded gallery.

use crate::types::CandidateFile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Wire and display format for release dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_FORMAT_LABEL: &str = "YYYY-MM-DD";

/// A game as typed into the form, before submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameDraft {
    pub name: String,
    pub developer: String,
    pub release_date: String,
    pub summary: String,
    pub genre_ids: Vec<u32>,
    pub platform_ids: Vec<u32>,
    pub websites: Vec<String>,
    pub cover: Vec<CandidateFile>,
    pub screenshots: Vec<CandidateFile>,
}

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Developer,
    ReleaseDate,
    Summary,
    Genres,
    Platforms,
    Logo,
    Screenshots,
    Websites,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Name => "name",
            Field::Developer => "developer",
            Field::ReleaseDate => "releaseDate",
            Field::Summary => "summary",
            Field::Genres => "genres",
            Field::Platforms => "platforms",
            Field::Logo => "logo",
            Field::Screenshots => "screenshots",
            Field::Websites => "websites",
        };
        f.write_str(label)
    }
}

/// All field errors for one draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: BTreeMap<Field, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn set(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }
}

/// Split the comma-separated websites field. Blank entries are dropped.
pub fn parse_websites(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a release date in `YYYY-MM-DD` form.
pub fn parse_release_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Validate a draft. Every failing field is reported.
pub fn validate_draft(draft: &GameDraft) -> ValidationReport {
    let mut report = ValidationReport::default();

    if is_blank(&draft.name) {
        report.set(Field::Name, "Name is required");
    }
    if is_blank(&draft.developer) {
        report.set(Field::Developer, "Developer is required");
    }
    if is_blank(&draft.release_date) {
        report.set(Field::ReleaseDate, "Release date is required");
    } else if parse_release_date(&draft.release_date).is_none() {
        report.set(
            Field::ReleaseDate,
            format!("Invalid date or format. Should be {DATE_FORMAT_LABEL}"),
        );
    }
    if is_blank(&draft.summary) {
        report.set(Field::Summary, "Summary is required");
    }
    if draft.genre_ids.is_empty() {
        report.set(Field::Genres, "At least one genre is required");
    }
    if draft.platform_ids.is_empty() {
        report.set(Field::Platforms, "At least one platform is required");
    }
    if draft.cover.is_empty() {
        report.set(Field::Logo, "Cover is required");
    }
    if draft.screenshots.is_empty() {
        report.set(Field::Screenshots, "Screenshots are required");
    }

    let invalid: String = draft
        .websites
        .iter()
        .filter(|site| url::Url::parse(site).is_err())
        .map(|site| format!("Website {site} is not valid. "))
        .collect();
    if !invalid.is_empty() {
        report.set(Field::Websites, invalid);
    }

    report
}

/// One entry of a server-side validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// Validation failure body returned by the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ValidationResponse {
    /// `"field: error; field: error"`, or the top-level error when there are
    /// no field entries.
    pub fn summary(&self) -> String {
        match self.fields.as_deref() {
            Some(fields) if !fields.is_empty() => fields
                .iter()
                .map(|f| format!("{}: {}", f.field, f.error))
                .collect::<Vec<_>>()
                .join("; "),
            _ => self.error.clone(),
        }
    }
}

/// Failure of a call to the catalog API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Message(String),
    Validation(ValidationResponse),
}

impl ApiError {
    /// Text for the form's error line.
    pub fn describe(&self) -> String {
        match self {
            ApiError::Message(msg) => msg.clone(),
            ApiError::Validation(resp) => resp.summary(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl std::error::Error for ApiError {}

/// Create-game request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGame {
    pub name: String,
    pub developer: String,
    pub release_date: String,
    pub summary: String,
    pub genres_ids: Vec<u32>,
    pub platforms_ids: Vec<u32>,
    pub logo_url: String,
    pub screenshots: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub websites: Vec<String>,
}

impl CreateGame {
    /// Build the payload once uploads have produced URLs.
    ///
    /// Returns the validation report instead when the draft is not valid.
    pub fn from_draft(
        draft: &GameDraft,
        logo_url: impl Into<String>,
        screenshot_urls: Vec<String>,
    ) -> Result<Self, ValidationReport> {
        let report = validate_draft(draft);
        let Some(date) = parse_release_date(&draft.release_date).filter(|_| report.is_valid())
        else {
            return Err(report);
        };

        Ok(Self {
            name: draft.name.trim().to_string(),
            developer: draft.developer.trim().to_string(),
            release_date: date.format(DATE_FORMAT).to_string(),
            summary: draft.summary.trim().to_string(),
            genres_ids: draft.genre_ids.clone(),
            platforms_ids: draft.platform_ids.clone(),
            logo_url: logo_url.into(),
            screenshots: screenshot_urls,
            websites: draft.websites.clone(),
        })
    }
}
