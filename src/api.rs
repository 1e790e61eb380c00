use std::collections::HashMap;

use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::analytics::{FormAnalytics, compute_analytics};
use crate::db::{
    create_form_from_template, duplicate_form, get_existing_response, get_form,
    get_form_with_structure, get_forms_for_event, get_question_bank, list_responses,
    list_templates, save_custom_form, submit_response, update_form,
};
use crate::models::{
    AnswerValue, AnsweredQuestion, FormWithStructure, Question, ResponseRecord, SectionInput,
    TemplateWithStructure,
};
use crate::validation::{
    AppErrorExt, JsonValidateExt, ValidationResponse, validate_form_payload,
};

#[get("/templates")]
pub async fn api_get_templates(
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<TemplateWithStructure>>, Status> {
    let templates = list_templates(db).await?;
    Ok(Json(templates))
}

#[get("/forms?<event_id>")]
pub async fn api_get_forms_for_event(
    event_id: String,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<FormWithStructure>>, Status> {
    let forms = get_forms_for_event(db, &event_id).await?;
    Ok(Json(forms))
}

#[derive(Deserialize, Default)]
pub struct FormCustomizations {
    pub name: Option<String>,
    #[serde(default)]
    pub allow_anonymous: bool,
}

#[derive(Deserialize)]
pub struct CreateFormRequest {
    template_id: i64,
    event_id: String,
    #[serde(default)]
    customizations: Option<FormCustomizations>,
    created_by: Option<i64>,
}

#[post("/forms/create", data = "<request>")]
pub async fn api_create_form(
    request: Json<CreateFormRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<FormWithStructure>, Custom<Json<ValidationResponse>>> {
    let request = request.into_inner();
    let customizations = request.customizations.unwrap_or_default();

    let form = create_form_from_template(
        db,
        request.template_id,
        &request.event_id,
        customizations.name.as_deref(),
        customizations.allow_anonymous,
        request.created_by,
    )
    .await
    .validate_custom()?;

    let form = get_form_with_structure(db, form.id).await.validate_custom()?;
    Ok(Json(form))
}

#[derive(Deserialize)]
pub struct SaveFormRequest {
    name: String,
    event_identifier: String,
    #[serde(default)]
    allow_anonymous: bool,
    created_by: Option<i64>,
    sections: Vec<SectionInput>,
}

#[post("/forms/save", data = "<request>")]
pub async fn api_save_custom_form(
    request: Json<SaveFormRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<FormWithStructure>, Custom<Json<ValidationResponse>>> {
    let request = request.into_inner();

    validate_form_payload(&request.name, &request.sections)?;

    let form = save_custom_form(
        db,
        &request.name,
        &request.event_identifier,
        request.allow_anonymous,
        request.created_by,
        &request.sections,
    )
    .await
    .validate_custom()?;

    let form = get_form_with_structure(db, form.id).await.validate_custom()?;
    Ok(Json(form))
}

#[derive(Deserialize)]
pub struct UpdateFormRequest {
    name: String,
    sections: Vec<SectionInput>,
}

#[put("/forms/<form_id>", data = "<request>")]
pub async fn api_update_form(
    form_id: i64,
    request: Json<UpdateFormRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<FormWithStructure>, Custom<Json<ValidationResponse>>> {
    let request = request.into_inner();

    validate_form_payload(&request.name, &request.sections)?;

    update_form(db, form_id, &request.name, &request.sections)
        .await
        .validate_custom()?;

    let form = get_form_with_structure(db, form_id).await.validate_custom()?;
    Ok(Json(form))
}

#[post("/forms/<form_id>/duplicate")]
pub async fn api_duplicate_form(
    form_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<FormWithStructure>, Custom<Json<ValidationResponse>>> {
    let copy = duplicate_form(db, form_id).await.validate_custom()?;

    let form = get_form_with_structure(db, copy.id).await.validate_custom()?;
    Ok(Json(form))
}

#[derive(Serialize)]
pub struct QuestionBankResponse {
    pub questions: Vec<Question>,
}

#[get("/questions/club/<club_id>")]
pub async fn api_get_question_bank(
    club_id: String,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<QuestionBankResponse>, Status> {
    let questions = get_question_bank(db, &club_id).await?;
    Ok(Json(QuestionBankResponse { questions }))
}

#[derive(Deserialize, Validate)]
pub struct SubmitResponseRequest {
    form_id: i64,
    user_id: Option<i64>,
    responses: HashMap<i64, AnswerValue>,
    #[validate(range(min = 0, message = "Completion time must not be negative"))]
    completion_time_seconds: Option<i64>,
    #[serde(default)]
    is_anonymous: bool,
    #[serde(default)]
    is_update: bool,
}

#[post("/responses/submit", data = "<request>")]
pub async fn api_submit_response(
    request: Json<SubmitResponseRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ResponseRecord>, Custom<Json<ValidationResponse>>> {
    let request = request.validate_custom()?;

    let response = submit_response(
        db,
        request.form_id,
        request.user_id,
        request.is_anonymous,
        &request.responses,
        request.completion_time_seconds,
        request.is_update,
    )
    .await
    .validate_custom()?;

    Ok(Json(response))
}

#[derive(Serialize)]
pub struct ExistingResponseBody {
    #[serde(flatten)]
    pub response: ResponseRecord,
    pub answers: HashMap<i64, AnswerValue>,
}

#[derive(Serialize)]
pub struct ExistingResponseReply {
    pub has_response: bool,
    pub response: Option<ExistingResponseBody>,
}

#[get("/forms/<form_id>/response/<user_id>")]
pub async fn api_get_existing_response(
    form_id: i64,
    user_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ExistingResponseReply>, Status> {
    get_form(db, form_id).await?;

    let reply = match get_existing_response(db, form_id, user_id).await? {
        Some((response, answers)) => ExistingResponseReply {
            has_response: true,
            response: Some(ExistingResponseBody { response, answers }),
        },
        None => ExistingResponseReply {
            has_response: false,
            response: None,
        },
    };

    Ok(Json(reply))
}

#[derive(Serialize)]
pub struct ResponseWithAnswers {
    #[serde(flatten)]
    pub response: ResponseRecord,
    pub answers: Vec<AnsweredQuestion>,
}

#[derive(Serialize)]
pub struct FormResponsesReply {
    pub responses: Vec<ResponseWithAnswers>,
}

#[get("/forms/<form_id>/responses")]
pub async fn api_list_responses(
    form_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<FormResponsesReply>, Status> {
    get_form(db, form_id).await?;

    let responses = list_responses(db, form_id)
        .await?
        .into_iter()
        .map(|(response, answers)| ResponseWithAnswers { response, answers })
        .collect();

    Ok(Json(FormResponsesReply { responses }))
}

#[get("/forms/<form_id>/analytics")]
pub async fn api_form_analytics(
    form_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<FormAnalytics>, Status> {
    get_form(db, form_id).await?;

    let analytics = compute_analytics(db, form_id).await?;
    Ok(Json(analytics))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
