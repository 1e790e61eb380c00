use std::collections::HashMap;

use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    AnswerValue, AnsweredQuestion, DbForm, DbQuestion, DbQuestionResponse, DbResponse, DbSection,
    DbTemplate, Form, FormStatus, FormStructure, FormWithStructure, Question, QuestionInput,
    QuestionType, ResponseRecord, Section, SectionInput, SectionNode, Template,
    TemplateWithStructure,
};
use crate::validation::{StoredAnswer, validate_answer};

const TEMPLATE_COLUMNS: &str = "id, name, description, template_type, estimated_time, icon, \
     is_system_template, created_by";

const FORM_COLUMNS: &str = "id, name, template_id, event_identifier, status, allow_anonymous, \
     estimated_time, created_by, created_at";

const QUESTION_COLUMNS: &str = "id, section_id, question_text, question_type, options, scale, \
     required, order_index, club_identifier, question_bank";

#[instrument]
pub async fn get_template(pool: &Pool<Sqlite>, id: i64) -> Result<Template, AppError> {
    info!("Fetching template by ID");
    let row = sqlx::query_as::<_, DbTemplate>(&format!(
        "SELECT {} FROM templates WHERE id = ?",
        TEMPLATE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(template) => Ok(Template::from(template)),
        _ => Err(AppError::NotFound(format!(
            "Template with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn get_form(pool: &Pool<Sqlite>, id: i64) -> Result<Form, AppError> {
    info!("Fetching form by ID");
    let row = sqlx::query_as::<_, DbForm>(&format!(
        "SELECT {} FROM forms WHERE id = ?",
        FORM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(form) => Ok(Form::from(form)),
        _ => Err(AppError::NotFound(format!(
            "Form with id {} not found in database",
            id
        ))),
    }
}

async fn questions_for_section(
    conn: &mut SqliteConnection,
    section_id: i64,
) -> Result<Vec<Question>, AppError> {
    let rows = sqlx::query_as::<_, DbQuestion>(&format!(
        "SELECT {} FROM questions WHERE section_id = ? ORDER BY order_index",
        QUESTION_COLUMNS
    ))
    .bind(section_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Question::from).collect())
}

async fn structure_for_sections(
    conn: &mut SqliteConnection,
    sections: Vec<Section>,
) -> Result<FormStructure, AppError> {
    let mut nodes = Vec::with_capacity(sections.len());
    for section in sections {
        let questions = questions_for_section(conn, section.id).await?;
        nodes.push(SectionNode::new(section, questions));
    }
    Ok(FormStructure { sections: nodes })
}

async fn template_structure(
    conn: &mut SqliteConnection,
    template_id: i64,
) -> Result<FormStructure, AppError> {
    let rows = sqlx::query_as::<_, DbSection>(
        "SELECT id, title, description, order_index, template_id, form_id
         FROM sections WHERE template_id = ? ORDER BY order_index",
    )
    .bind(template_id)
    .fetch_all(&mut *conn)
    .await?;

    structure_for_sections(conn, rows.into_iter().map(Section::from).collect()).await
}

async fn form_structure(
    conn: &mut SqliteConnection,
    form_id: i64,
) -> Result<FormStructure, AppError> {
    let rows = sqlx::query_as::<_, DbSection>(
        "SELECT id, title, description, order_index, template_id, form_id
         FROM sections WHERE form_id = ? ORDER BY order_index",
    )
    .bind(form_id)
    .fetch_all(&mut *conn)
    .await?;

    structure_for_sections(conn, rows.into_iter().map(Section::from).collect()).await
}

/// All templates with their nested sections and questions, both levels
/// ordered by order_index. An empty templates table is an empty list, not an
/// error.
#[instrument]
pub async fn list_templates(pool: &Pool<Sqlite>) -> Result<Vec<TemplateWithStructure>, AppError> {
    info!("Listing templates");
    let rows = sqlx::query_as::<_, DbTemplate>(&format!(
        "SELECT {} FROM templates ORDER BY id",
        TEMPLATE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    let mut conn = pool.acquire().await?;
    let mut templates = Vec::with_capacity(rows.len());
    for row in rows {
        let template = Template::from(row);
        let structure = template_structure(&mut conn, template.id).await?;
        templates.push(TemplateWithStructure {
            template,
            structure,
        });
    }

    Ok(templates)
}

#[instrument]
pub async fn get_form_with_structure(
    pool: &Pool<Sqlite>,
    form_id: i64,
) -> Result<FormWithStructure, AppError> {
    let form = get_form(pool, form_id).await?;
    let mut conn = pool.acquire().await?;
    let structure = form_structure(&mut conn, form.id).await?;
    Ok(FormWithStructure { form, structure })
}

/// Active forms bound to an event, newest first, nested structure included.
#[instrument]
pub async fn get_forms_for_event(
    pool: &Pool<Sqlite>,
    event_identifier: &str,
) -> Result<Vec<FormWithStructure>, AppError> {
    info!("Listing forms for event");
    let rows = sqlx::query_as::<_, DbForm>(&format!(
        "SELECT {} FROM forms WHERE event_identifier = ? AND status = ? ORDER BY id DESC",
        FORM_COLUMNS
    ))
    .bind(event_identifier)
    .bind(FormStatus::Active.as_str())
    .fetch_all(pool)
    .await?;

    let mut conn = pool.acquire().await?;
    let mut forms = Vec::with_capacity(rows.len());
    for row in rows {
        let form = Form::from(row);
        let structure = form_structure(&mut conn, form.id).await?;
        forms.push(FormWithStructure { form, structure });
    }

    Ok(forms)
}

fn options_json(options: &[String]) -> Result<Option<String>, AppError> {
    if options.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(options)
        .map(Some)
        .map_err(|err| AppError::Internal(format!("Failed to encode options: {}", err)))
}

async fn insert_section(
    conn: &mut SqliteConnection,
    form_id: i64,
    title: &str,
    description: &str,
    order_index: i64,
) -> Result<i64, AppError> {
    let res = sqlx::query(
        "INSERT INTO sections (title, description, order_index, form_id)
         VALUES (?, ?, ?, ?)",
    )
    .bind(title)
    .bind(description)
    .bind(order_index)
    .bind(form_id)
    .execute(conn)
    .await?;

    Ok(res.last_insert_rowid())
}

async fn insert_question(
    conn: &mut SqliteConnection,
    section_id: i64,
    question: &Question,
    order_index: i64,
    club_identifier: Option<&str>,
    question_bank: bool,
) -> Result<i64, AppError> {
    let res = sqlx::query(
        "INSERT INTO questions
         (section_id, question_text, question_type, options, scale, required, order_index,
          club_identifier, question_bank)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(section_id)
    .bind(&question.question_text)
    .bind(&question.question_type)
    .bind(options_json(&question.options)?)
    .bind(question.scale)
    .bind(question.required)
    .bind(order_index)
    .bind(club_identifier)
    .bind(question_bank)
    .execute(conn)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Inserts the builder payload under a form, assigning order indexes from
/// payload order. Rating questions get the default scale when none is given.
async fn insert_section_tree(
    conn: &mut SqliteConnection,
    form_id: i64,
    sections: &[SectionInput],
) -> Result<(), AppError> {
    for (s_idx, section) in sections.iter().enumerate() {
        let section_id = insert_section(
            conn,
            form_id,
            &section.title,
            &section.description,
            s_idx as i64,
        )
        .await?;

        for (q_idx, question) in section.questions.iter().enumerate() {
            let scale = match QuestionType::from_str(&question.question_type) {
                Ok(QuestionType::Rating) => {
                    Some(question.scale.unwrap_or(QuestionType::DEFAULT_RATING_SCALE))
                }
                _ => None,
            };

            sqlx::query(
                "INSERT INTO questions
                 (section_id, question_text, question_type, options, scale, required,
                  order_index, club_identifier, question_bank)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(section_id)
            .bind(&question.question_text)
            .bind(&question.question_type)
            .bind(options_json(&question.options)?)
            .bind(scale)
            .bind(question.required)
            .bind(q_idx as i64)
            .bind(&question.club_identifier)
            .bind(question.question_bank)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

/// Deep-copies the template's section/question tree under a newly created
/// form. Runs in one transaction so a failed copy leaves nothing behind.
#[instrument(skip(pool))]
pub async fn create_form_from_template(
    pool: &Pool<Sqlite>,
    template_id: i64,
    event_identifier: &str,
    name_override: Option<&str>,
    allow_anonymous: bool,
    created_by: Option<i64>,
) -> Result<Form, AppError> {
    info!("Creating form from template");
    let template = get_template(pool, template_id).await?;

    let mut tx = pool.begin().await?;

    let name = name_override.unwrap_or(&template.name);
    let res = sqlx::query(
        "INSERT INTO forms
         (name, template_id, event_identifier, status, allow_anonymous, estimated_time, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(template.id)
    .bind(event_identifier)
    .bind(FormStatus::Active.as_str())
    .bind(allow_anonymous)
    .bind(template.estimated_time)
    .bind(created_by)
    .execute(&mut *tx)
    .await?;
    let form_id = res.last_insert_rowid();

    let structure = template_structure(&mut tx, template.id).await?;
    for node in &structure.sections {
        let section_id = insert_section(
            &mut tx,
            form_id,
            &node.title,
            &node.description,
            node.order_index,
        )
        .await?;

        for question in &node.questions {
            insert_question(
                &mut tx,
                section_id,
                question,
                question.order_index,
                question.club_identifier.as_deref(),
                question.question_bank,
            )
            .await?;
        }
    }

    tx.commit().await?;

    get_form(pool, form_id).await
}

/// Persists a from-scratch form built in the form builder. Caller is
/// expected to have validated the payload already; the insert is atomic.
#[instrument(skip(pool, sections))]
pub async fn save_custom_form(
    pool: &Pool<Sqlite>,
    name: &str,
    event_identifier: &str,
    allow_anonymous: bool,
    created_by: Option<i64>,
    sections: &[SectionInput],
) -> Result<Form, AppError> {
    info!("Saving custom form");
    let mut tx = pool.begin().await?;

    let res = sqlx::query(
        "INSERT INTO forms (name, event_identifier, status, allow_anonymous, created_by)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(event_identifier)
    .bind(FormStatus::Active.as_str())
    .bind(allow_anonymous)
    .bind(created_by)
    .execute(&mut *tx)
    .await?;
    let form_id = res.last_insert_rowid();

    insert_section_tree(&mut tx, form_id, sections).await?;

    tx.commit().await?;

    get_form(pool, form_id).await
}

/// Renames a form and replaces its whole section/question tree in one
/// transaction, so a crash mid-replace cannot leave a form without sections.
#[instrument(skip(pool, sections))]
pub async fn update_form(
    pool: &Pool<Sqlite>,
    form_id: i64,
    name: &str,
    sections: &[SectionInput],
) -> Result<(), AppError> {
    info!("Updating form");
    let existing = sqlx::query("SELECT id FROM forms WHERE id = ?")
        .bind(form_id)
        .fetch_optional(pool)
        .await?;
    if existing.is_none() {
        return Err(AppError::NotFound(format!(
            "Form with id {} not found in database",
            form_id
        )));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE forms SET name = ? WHERE id = ?")
        .bind(name)
        .bind(form_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "DELETE FROM questions
         WHERE section_id IN (SELECT id FROM sections WHERE form_id = ?)",
    )
    .bind(form_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM sections WHERE form_id = ?")
        .bind(form_id)
        .execute(&mut *tx)
        .await?;

    insert_section_tree(&mut tx, form_id, sections).await?;

    tx.commit().await?;

    Ok(())
}

/// Copies a form's structure under a new id with the name suffixed "(Copy)".
/// Question-bank metadata is club-scoped and does not transfer: the copies
/// get a NULL club_identifier and question_bank = false.
#[instrument]
pub async fn duplicate_form(pool: &Pool<Sqlite>, form_id: i64) -> Result<Form, AppError> {
    info!("Duplicating form");
    let source = get_form(pool, form_id).await?;

    let mut tx = pool.begin().await?;

    let res = sqlx::query(
        "INSERT INTO forms
         (name, template_id, event_identifier, status, allow_anonymous, estimated_time, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(format!("{} (Copy)", source.name))
    .bind(source.template_id)
    .bind(&source.event_identifier)
    .bind(&source.status)
    .bind(source.allow_anonymous)
    .bind(source.estimated_time)
    .bind(source.created_by)
    .execute(&mut *tx)
    .await?;
    let copy_id = res.last_insert_rowid();

    let structure = form_structure(&mut tx, source.id).await?;
    for node in &structure.sections {
        let section_id = insert_section(
            &mut tx,
            copy_id,
            &node.title,
            &node.description,
            node.order_index,
        )
        .await?;

        for question in &node.questions {
            insert_question(&mut tx, section_id, question, question.order_index, None, false)
                .await?;
        }
    }

    tx.commit().await?;

    get_form(pool, copy_id).await
}

/// Reusable question-bank entries scoped to a club.
#[instrument]
pub async fn get_question_bank(
    pool: &Pool<Sqlite>,
    club_identifier: &str,
) -> Result<Vec<Question>, AppError> {
    info!("Listing question bank for club");
    let rows = sqlx::query_as::<_, DbQuestion>(&format!(
        "SELECT {} FROM questions
         WHERE question_bank = TRUE AND club_identifier = ?
         ORDER BY question_text",
        QUESTION_COLUMNS
    ))
    .bind(club_identifier)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Question::from).collect())
}

/// Every question belonging (through its section) to the form, keyed by id.
async fn questions_for_form(
    conn: &mut SqliteConnection,
    form_id: i64,
) -> Result<HashMap<i64, Question>, AppError> {
    let rows = sqlx::query_as::<_, DbQuestion>(
        "SELECT q.id, q.section_id, q.question_text, q.question_type, q.options, q.scale,
                q.required, q.order_index, q.club_identifier, q.question_bank
         FROM questions q
         JOIN sections s ON s.id = q.section_id
         WHERE s.form_id = ?",
    )
    .bind(form_id)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(Question::from)
        .map(|question| (question.id, question))
        .collect())
}

fn is_unique_violation(err: &AppError) -> bool {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Creates or replaces a player's response. Named resubmissions
/// (`is_update`) replace the existing answer rows in place; anonymous
/// submissions store no user id and are never deduplicated. Answer values
/// are checked against each question's declared type before anything is
/// written, and the whole write is one transaction.
#[instrument(skip(pool, answers))]
pub async fn submit_response(
    pool: &Pool<Sqlite>,
    form_id: i64,
    user_id: Option<i64>,
    is_anonymous: bool,
    answers: &HashMap<i64, AnswerValue>,
    completion_time_seconds: Option<i64>,
    is_update: bool,
) -> Result<ResponseRecord, AppError> {
    info!("Submitting response");

    if answers.is_empty() {
        return Err(AppError::Validation(
            "A response needs at least one answer".to_string(),
        ));
    }

    let form = get_form(pool, form_id).await?;

    if is_anonymous && !form.allow_anonymous {
        return Err(AppError::Validation(format!(
            "Form {} does not allow anonymous responses",
            form_id
        )));
    }
    if is_anonymous && is_update {
        return Err(AppError::Validation(
            "Anonymous responses cannot be updated".to_string(),
        ));
    }
    let named_user = if is_anonymous {
        None
    } else {
        match user_id {
            Some(id) => Some(id),
            None => {
                return Err(AppError::Validation(
                    "user_id is required for non-anonymous responses".to_string(),
                ));
            }
        }
    };

    let mut tx = pool.begin().await?;

    let questions = questions_for_form(&mut tx, form_id).await?;
    let mut stored: Vec<(i64, StoredAnswer)> = Vec::with_capacity(answers.len());
    let mut problems: Vec<String> = Vec::new();
    for (question_id, value) in answers {
        match questions.get(question_id) {
            Some(question) => match validate_answer(question, value) {
                Ok(answer) => stored.push((*question_id, answer)),
                Err(problem) => problems.push(problem),
            },
            None => problems.push(format!(
                "Question {} does not belong to form {}",
                question_id, form_id
            )),
        }
    }
    if !problems.is_empty() {
        problems.sort();
        return Err(AppError::Validation(problems.join("; ")));
    }

    let response_id = if is_update {
        let row = sqlx::query_as::<_, DbResponse>(
            "SELECT id, form_id, user_id, is_anonymous, completion_time_seconds, created_at
             FROM responses WHERE form_id = ? AND user_id = ?",
        )
        .bind(form_id)
        .bind(named_user)
        .fetch_optional(&mut *tx)
        .await?;

        let existing = match row {
            Some(row) => ResponseRecord::from(row),
            None => {
                return Err(AppError::NotFound(format!(
                    "No existing response for form {} to update",
                    form_id
                )));
            }
        };

        sqlx::query("DELETE FROM question_responses WHERE response_id = ?")
            .bind(existing.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE responses SET completion_time_seconds = ? WHERE id = ?")
            .bind(completion_time_seconds)
            .bind(existing.id)
            .execute(&mut *tx)
            .await?;

        existing.id
    } else {
        let res = sqlx::query(
            "INSERT INTO responses (form_id, user_id, is_anonymous, completion_time_seconds)
             VALUES (?, ?, ?, ?)",
        )
        .bind(form_id)
        .bind(named_user)
        .bind(is_anonymous)
        .bind(completion_time_seconds)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Validation(format!(
                    "A response for form {} already exists; resubmit with is_update",
                    form_id
                ))
            } else {
                err
            }
        })?;

        res.last_insert_rowid()
    };

    for (question_id, answer) in &stored {
        let (numeric, text, choice) = match answer {
            StoredAnswer::Numeric(n) => (Some(*n), None, None),
            StoredAnswer::Text(t) => (None, Some(t.as_str()), None),
            StoredAnswer::Choice(c) => (None, None, Some(c.as_str())),
        };

        sqlx::query(
            "INSERT INTO question_responses
             (response_id, question_id, answer_numeric, answer_text, answer_choice)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(response_id)
        .bind(question_id)
        .bind(numeric)
        .bind(text)
        .bind(choice)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let row = sqlx::query_as::<_, DbResponse>(
        "SELECT id, form_id, user_id, is_anonymous, completion_time_seconds, created_at
         FROM responses WHERE id = ?",
    )
    .bind(response_id)
    .fetch_one(pool)
    .await?;

    Ok(ResponseRecord::from(row))
}

/// A user's saved response for a form, with the answers map rebuilt from
/// whichever answer column holds each value. None when nothing was
/// submitted, supporting the resume-my-response flow.
#[instrument]
pub async fn get_existing_response(
    pool: &Pool<Sqlite>,
    form_id: i64,
    user_id: i64,
) -> Result<Option<(ResponseRecord, HashMap<i64, AnswerValue>)>, AppError> {
    info!("Fetching existing response");
    let row = sqlx::query_as::<_, DbResponse>(
        "SELECT id, form_id, user_id, is_anonymous, completion_time_seconds, created_at
         FROM responses WHERE form_id = ? AND user_id = ?",
    )
    .bind(form_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let response = match row {
        Some(row) => ResponseRecord::from(row),
        None => return Ok(None),
    };

    let answer_rows = sqlx::query_as::<_, DbQuestionResponse>(
        "SELECT qr.question_id, q.question_text, q.question_type,
                qr.answer_numeric, qr.answer_text, qr.answer_choice
         FROM question_responses qr
         JOIN questions q ON q.id = qr.question_id
         WHERE qr.response_id = ?",
    )
    .bind(response.id)
    .fetch_all(pool)
    .await?;

    let answers = answer_rows
        .into_iter()
        .map(|row| (row.question_id.unwrap_or_default(), row.answer_value()))
        .collect();

    Ok(Some((response, answers)))
}

/// All responses for a form, newest first, each with its answers joined to
/// question text and type for display.
#[instrument]
pub async fn list_responses(
    pool: &Pool<Sqlite>,
    form_id: i64,
) -> Result<Vec<(ResponseRecord, Vec<AnsweredQuestion>)>, AppError> {
    info!("Listing responses for form");
    let rows = sqlx::query_as::<_, DbResponse>(
        "SELECT id, form_id, user_id, is_anonymous, completion_time_seconds, created_at
         FROM responses WHERE form_id = ? ORDER BY id DESC",
    )
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let response = ResponseRecord::from(row);
        let answer_rows = sqlx::query_as::<_, DbQuestionResponse>(
            "SELECT qr.question_id, q.question_text, q.question_type,
                    qr.answer_numeric, qr.answer_text, qr.answer_choice
             FROM question_responses qr
             JOIN questions q ON q.id = qr.question_id
             WHERE qr.response_id = ?
             ORDER BY q.order_index",
        )
        .bind(response.id)
        .fetch_all(pool)
        .await?;

        let answers = answer_rows.into_iter().map(AnsweredQuestion::from).collect();
        result.push((response, answers));
    }

    Ok(result)
}

#[instrument]
pub async fn count_responses(pool: &Pool<Sqlite>, form_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM responses WHERE form_id = ?")
        .bind(form_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[instrument]
pub async fn average_completion_time(
    pool: &Pool<Sqlite>,
    form_id: i64,
) -> Result<Option<f64>, AppError> {
    let average = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(completion_time_seconds) FROM responses WHERE form_id = ?",
    )
    .bind(form_id)
    .fetch_one(pool)
    .await?;

    Ok(average)
}

/// Mean of all numeric answers to rating questions on the form.
#[instrument]
pub async fn average_rating(pool: &Pool<Sqlite>, form_id: i64) -> Result<Option<f64>, AppError> {
    let average = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(qr.answer_numeric)
         FROM question_responses qr
         JOIN responses r ON r.id = qr.response_id
         JOIN questions q ON q.id = qr.question_id
         WHERE r.form_id = ? AND q.question_type = 'rating'",
    )
    .bind(form_id)
    .fetch_one(pool)
    .await?;

    Ok(average)
}

#[instrument(skip_all, fields(name, role))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    name: &str,
    role: &str,
    club: &str,
) -> Result<i64, AppError> {
    info!("Creating user");
    let res = sqlx::query("INSERT INTO users (name, role, club) VALUES (?, ?, ?)")
        .bind(name)
        .bind(role)
        .bind(club)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip_all, fields(name))]
pub async fn create_template(
    pool: &Pool<Sqlite>,
    name: &str,
    description: &str,
    template_type: &str,
    estimated_time: Option<i64>,
    created_by: Option<i64>,
) -> Result<i64, AppError> {
    info!("Creating template");
    let res = sqlx::query(
        "INSERT INTO templates (name, description, template_type, estimated_time, created_by)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(template_type)
    .bind(estimated_time)
    .bind(created_by)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip_all, fields(template_id, title))]
pub async fn add_template_section(
    pool: &Pool<Sqlite>,
    template_id: i64,
    title: &str,
    description: &str,
    order_index: i64,
) -> Result<i64, AppError> {
    info!("Adding section to template");
    let res = sqlx::query(
        "INSERT INTO sections (title, description, order_index, template_id)
         VALUES (?, ?, ?, ?)",
    )
    .bind(title)
    .bind(description)
    .bind(order_index)
    .bind(template_id)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip_all, fields(section_id))]
pub async fn add_section_question(
    pool: &Pool<Sqlite>,
    section_id: i64,
    input: &QuestionInput,
    order_index: i64,
) -> Result<i64, AppError> {
    info!("Adding question to section");
    let scale = match QuestionType::from_str(&input.question_type) {
        Ok(QuestionType::Rating) => Some(input.scale.unwrap_or(QuestionType::DEFAULT_RATING_SCALE)),
        _ => None,
    };

    let res = sqlx::query(
        "INSERT INTO questions
         (section_id, question_text, question_type, options, scale, required, order_index,
          club_identifier, question_bank)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(section_id)
    .bind(&input.question_text)
    .bind(&input.question_type)
    .bind(options_json(&input.options)?)
    .bind(scale)
    .bind(input.required)
    .bind(order_index)
    .bind(&input.club_identifier)
    .bind(input.question_bank)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}
