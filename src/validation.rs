use crate::error::AppError;
use crate::models::{AnswerValue, Question, QuestionType, SectionInput};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Serialize;
use std::collections::HashMap;
use tracing::instrument;
use validator::Validate;

#[derive(Debug, Serialize, Clone)]
pub struct ValidationResponse {
    pub status: &'static str,
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationResponse {
    pub fn new(errors: HashMap<String, Vec<String>>) -> Self {
        Self {
            status: "error",
            errors,
        }
    }

    pub fn with_error(field: &str, message: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::new(errors)
    }
}

pub trait ToValidationResponse {
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>>;
}

impl ToValidationResponse for AppError {
    #[instrument]
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>> {
        self.log_and_record("API Validation Error");
        let status = self.status_code();

        let (field, message) = match &self {
            AppError::Database(db_err) => ("database", format!("Database error: {}", db_err)),
            AppError::NotFound(msg) => ("resource", format!("Not found: {}", msg)),
            AppError::Validation(msg) => ("request", msg.clone()),
            AppError::Internal(_) => ("server", "Internal server error".to_string()),
        };

        Custom(status, Json(ValidationResponse::with_error(field, &message)))
    }
}

/// Validates a Json body with `validator` derive rules and unwraps it, or
/// produces the standard error body.
pub trait JsonValidateExt<T> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>> {
        let inner = self.into_inner();
        match inner.validate() {
            Ok(()) => Ok(inner),
            Err(errors) => {
                let mut error_map = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|error| {
                            error
                                .message
                                .clone()
                                .unwrap_or_else(|| "Invalid value".into())
                                .to_string()
                        })
                        .collect();
                    error_map.insert(field.to_string(), messages);
                }
                Err(Custom(
                    Status::BadRequest,
                    Json(ValidationResponse::new(error_map)),
                ))
            }
        }
    }
}

pub trait AppErrorExt<T> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>>;
}

impl<T> AppErrorExt<T> for Result<T, AppError> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>> {
        self.map_err(|err| err.to_validation_response())
    }
}

fn push_error(errors: &mut HashMap<String, Vec<String>>, field: String, message: impl Into<String>) {
    errors.entry(field).or_default().push(message.into());
}

/// Structural validation for the form-builder payload. Every violated rule
/// is reported, not just the first.
pub fn validate_form_payload(
    name: &str,
    sections: &[SectionInput],
) -> Result<(), Custom<Json<ValidationResponse>>> {
    let mut errors: HashMap<String, Vec<String>> = HashMap::new();

    if name.trim().is_empty() {
        push_error(&mut errors, "name".to_string(), "Form name must not be empty");
    }

    if sections.is_empty() {
        push_error(
            &mut errors,
            "sections".to_string(),
            "A form needs at least one section",
        );
    }

    for (s_idx, section) in sections.iter().enumerate() {
        if section.title.trim().is_empty() {
            push_error(
                &mut errors,
                format!("sections[{}].title", s_idx),
                "Section title must not be empty",
            );
        }

        if section.questions.is_empty() {
            push_error(
                &mut errors,
                format!("sections[{}].questions", s_idx),
                "A section needs at least one question",
            );
        }

        for (q_idx, question) in section.questions.iter().enumerate() {
            let field = |name: &str| format!("sections[{}].questions[{}].{}", s_idx, q_idx, name);

            if question.question_text.trim().is_empty() {
                push_error(
                    &mut errors,
                    field("question_text"),
                    "Question text must not be empty",
                );
            }

            match QuestionType::from_str(&question.question_type) {
                Err(_) => {
                    push_error(
                        &mut errors,
                        field("question_type"),
                        format!("Unknown question type: {}", question.question_type),
                    );
                }
                Ok(QuestionType::MultipleChoice) => {
                    if question.options.is_empty() {
                        push_error(
                            &mut errors,
                            field("options"),
                            "Multiple choice questions need at least one option",
                        );
                    }
                }
                Ok(question_type) => {
                    if !question.options.is_empty() {
                        push_error(
                            &mut errors,
                            field("options"),
                            format!("Options are only valid for multiple choice, not {}", question_type),
                        );
                    }
                    if question.scale.is_some() && question_type != QuestionType::Rating {
                        push_error(
                            &mut errors,
                            field("scale"),
                            format!("Scale is only valid for rating questions, not {}", question_type),
                        );
                    }
                }
            }

            if let Some(scale) = question.scale {
                if scale < 2 {
                    push_error(&mut errors, field("scale"), "Rating scale must be at least 2");
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Custom(
            Status::BadRequest,
            Json(ValidationResponse::new(errors)),
        ))
    }
}

/// An answer routed to its storage column by the question's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredAnswer {
    Numeric(i64),
    Text(String),
    Choice(String),
}

/// Checks a submitted value against the question's declared type and returns
/// the column it belongs in. The declared type decides storage, never the
/// runtime shape of the value.
pub fn validate_answer(question: &Question, value: &AnswerValue) -> Result<StoredAnswer, String> {
    let question_type = QuestionType::from_str(&question.question_type)
        .map_err(|_| format!("Question {} has an unknown type", question.id))?;

    match (question_type, value) {
        (QuestionType::Rating, AnswerValue::Number(n)) => {
            let scale = question.scale.unwrap_or(QuestionType::DEFAULT_RATING_SCALE);
            if *n < 1 || *n > scale {
                Err(format!(
                    "Rating for question {} must be between 1 and {}",
                    question.id, scale
                ))
            } else {
                Ok(StoredAnswer::Numeric(*n))
            }
        }
        (QuestionType::Rating, AnswerValue::Text(_)) => Err(format!(
            "Question {} expects a numeric rating",
            question.id
        )),
        (QuestionType::Text, AnswerValue::Text(text)) => Ok(StoredAnswer::Text(text.clone())),
        (QuestionType::YesNo, AnswerValue::Text(choice)) if choice == "yes" || choice == "no" => {
            Ok(StoredAnswer::Choice(choice.clone()))
        }
        (QuestionType::YesNo, _) => Err(format!(
            "Question {} expects \"yes\" or \"no\"",
            question.id
        )),
        (QuestionType::MultipleChoice, AnswerValue::Text(choice)) => {
            if question.options.iter().any(|option| option == choice) {
                Ok(StoredAnswer::Choice(choice.clone()))
            } else {
                Err(format!(
                    "\"{}\" is not an option for question {}",
                    choice, question.id
                ))
            }
        }
        (_, AnswerValue::Number(_)) => Err(format!(
            "Question {} expects a text answer",
            question.id
        )),
    }
}
