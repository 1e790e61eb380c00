use anyhow::Error;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Rating,
    Text,
    MultipleChoice,
    YesNo,
}

impl QuestionType {
    pub const DEFAULT_RATING_SCALE: i64 = 10;

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Rating => "rating",
            QuestionType::Text => "text",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::YesNo => "yes_no",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "rating" => Ok(QuestionType::Rating),
            "text" => Ok(QuestionType::Text),
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "yes_no" => Ok(QuestionType::YesNo),
            _ => Err(Error::msg(format!("Unknown question type: {}", s))),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Active,
    Draft,
    Completed,
}

impl FormStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormStatus::Active => "active",
            FormStatus::Draft => "draft",
            FormStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "active" => Ok(FormStatus::Active),
            "draft" => Ok(FormStatus::Draft),
            "completed" => Ok(FormStatus::Completed),
            _ => Err(Error::msg(format!("Unknown form status: {}", s))),
        }
    }
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A submitted answer value as it appears on the wire: a number for rating
/// questions, a string for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(i64),
    Text(String),
}

#[derive(Serialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub template_type: String,
    pub estimated_time: Option<i64>,
    pub icon: Option<String>,
    pub is_system_template: bool,
    pub created_by: Option<i64>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTemplate {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub template_type: Option<String>,
    pub estimated_time: Option<i64>,
    pub icon: Option<String>,
    pub is_system_template: Option<bool>,
    pub created_by: Option<i64>,
}

impl From<DbTemplate> for Template {
    fn from(template: DbTemplate) -> Self {
        Self {
            id: template.id.unwrap_or_default(),
            name: template.name.unwrap_or_default(),
            description: template.description.unwrap_or_default(),
            template_type: template.template_type.unwrap_or_default(),
            estimated_time: template.estimated_time,
            icon: template.icon,
            is_system_template: template.is_system_template.unwrap_or_default(),
            created_by: template.created_by,
        }
    }
}

#[derive(Serialize)]
pub struct Form {
    pub id: i64,
    pub name: String,
    pub template_id: Option<i64>,
    pub event_identifier: String,
    pub status: String,
    pub allow_anonymous: bool,
    pub estimated_time: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbForm {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub template_id: Option<i64>,
    pub event_identifier: Option<String>,
    pub status: Option<String>,
    pub allow_anonymous: Option<bool>,
    pub estimated_time: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbForm> for Form {
    fn from(form: DbForm) -> Self {
        Self {
            id: form.id.unwrap_or_default(),
            name: form.name.unwrap_or_default(),
            template_id: form.template_id,
            event_identifier: form.event_identifier.unwrap_or_default(),
            status: form.status.unwrap_or_default(),
            allow_anonymous: form.allow_anonymous.unwrap_or_default(),
            estimated_time: form.estimated_time,
            created_by: form.created_by,
            created_at: form
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Serialize)]
pub struct Section {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub order_index: i64,
    pub template_id: Option<i64>,
    pub form_id: Option<i64>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSection {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub order_index: Option<i64>,
    pub template_id: Option<i64>,
    pub form_id: Option<i64>,
}

impl From<DbSection> for Section {
    fn from(section: DbSection) -> Self {
        Self {
            id: section.id.unwrap_or_default(),
            title: section.title.unwrap_or_default(),
            description: section.description.unwrap_or_default(),
            order_index: section.order_index.unwrap_or_default(),
            template_id: section.template_id,
            form_id: section.form_id,
        }
    }
}

#[derive(Serialize, Clone)]
pub struct Question {
    pub id: i64,
    pub section_id: i64,
    pub question_text: String,
    pub question_type: String,
    pub options: Vec<String>,
    pub scale: Option<i64>,
    pub required: bool,
    pub order_index: i64,
    pub club_identifier: Option<String>,
    pub question_bank: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbQuestion {
    pub id: Option<i64>,
    pub section_id: Option<i64>,
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    pub options: Option<String>,
    pub scale: Option<i64>,
    pub required: Option<bool>,
    pub order_index: Option<i64>,
    pub club_identifier: Option<String>,
    pub question_bank: Option<bool>,
}

impl From<DbQuestion> for Question {
    fn from(question: DbQuestion) -> Self {
        Self {
            id: question.id.unwrap_or_default(),
            section_id: question.section_id.unwrap_or_default(),
            question_text: question.question_text.unwrap_or_default(),
            question_type: question.question_type.unwrap_or_default(),
            options: question
                .options
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_default(),
            scale: question.scale,
            required: question.required.unwrap_or_default(),
            order_index: question.order_index.unwrap_or_default(),
            club_identifier: question.club_identifier,
            question_bank: question.question_bank.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub form_id: i64,
    pub user_id: Option<i64>,
    pub is_anonymous: bool,
    pub completion_time_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbResponse {
    pub id: Option<i64>,
    pub form_id: Option<i64>,
    pub user_id: Option<i64>,
    pub is_anonymous: Option<bool>,
    pub completion_time_seconds: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbResponse> for ResponseRecord {
    fn from(response: DbResponse) -> Self {
        Self {
            id: response.id.unwrap_or_default(),
            form_id: response.form_id.unwrap_or_default(),
            user_id: response.user_id,
            is_anonymous: response.is_anonymous.unwrap_or_default(),
            completion_time_seconds: response.completion_time_seconds,
            created_at: response
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
        }
    }
}

/// One stored answer joined with its question's text and type, as needed by
/// the coach-facing results listing.
#[derive(Serialize)]
pub struct AnsweredQuestion {
    pub question_id: i64,
    pub question_text: String,
    pub question_type: String,
    pub answer: AnswerValue,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbQuestionResponse {
    pub question_id: Option<i64>,
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    pub answer_numeric: Option<i64>,
    pub answer_text: Option<String>,
    pub answer_choice: Option<String>,
}

impl DbQuestionResponse {
    /// Rebuilds the wire value from whichever answer column is populated.
    pub fn answer_value(&self) -> AnswerValue {
        if let Some(numeric) = self.answer_numeric {
            AnswerValue::Number(numeric)
        } else if let Some(choice) = &self.answer_choice {
            AnswerValue::Text(choice.clone())
        } else {
            AnswerValue::Text(self.answer_text.clone().unwrap_or_default())
        }
    }
}

impl From<DbQuestionResponse> for AnsweredQuestion {
    fn from(row: DbQuestionResponse) -> Self {
        let answer = row.answer_value();
        Self {
            question_id: row.question_id.unwrap_or_default(),
            question_text: row.question_text.unwrap_or_default(),
            question_type: row.question_type.unwrap_or_default(),
            answer,
        }
    }
}

/// Incoming question payload for the form builder. Persisted ids and order
/// indexes are assigned server-side on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub question_text: String,
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub scale: Option<i64>,
    #[serde(default)]
    pub required: bool,
    pub club_identifier: Option<String>,
    #[serde(default)]
    pub question_bank: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<QuestionInput>,
}

/// A section with its questions attached, in the order the form renderer
/// walks them.
#[derive(Serialize)]
pub struct SectionNode {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub order_index: i64,
    pub questions: Vec<Question>,
}

impl SectionNode {
    pub fn new(section: Section, questions: Vec<Question>) -> Self {
        Self {
            id: section.id,
            title: section.title,
            description: section.description,
            order_index: section.order_index,
            questions,
        }
    }
}

#[derive(Serialize)]
pub struct FormStructure {
    pub sections: Vec<SectionNode>,
}

#[derive(Serialize)]
pub struct TemplateWithStructure {
    #[serde(flatten)]
    pub template: Template,
    pub structure: FormStructure,
}

#[derive(Serialize)]
pub struct FormWithStructure {
    #[serde(flatten)]
    pub form: Form,
    pub structure: FormStructure,
}
