use crate::db::{add_section_question, add_template_section, create_template, create_user};
use crate::error::AppError;
use crate::models::{Question, QuestionInput};
use rocket::local::asynchronous::Client;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Once;
use tracing::log::LevelFilter;

static INIT: Once = Once::new();

pub struct TestUser {
    pub name: String,
    pub role: String,
    pub club: String,
}

pub struct TestSection {
    pub title: String,
    pub order_index: i64,
    pub questions: Vec<QuestionInput>,
}

pub struct TestTemplate {
    pub name: String,
    pub template_type: String,
    pub sections: Vec<TestSection>,
}

#[derive(Default)]
pub struct TestDbBuilder {
    users: Vec<TestUser>,
    templates: Vec<TestTemplate>,
}

pub fn rating_question(text: &str) -> QuestionInput {
    QuestionInput {
        question_text: text.to_string(),
        question_type: "rating".to_string(),
        options: vec![],
        scale: None,
        required: false,
        club_identifier: None,
        question_bank: false,
    }
}

pub fn text_question(text: &str) -> QuestionInput {
    QuestionInput {
        question_text: text.to_string(),
        question_type: "text".to_string(),
        options: vec![],
        scale: None,
        required: false,
        club_identifier: None,
        question_bank: false,
    }
}

pub fn yes_no_question(text: &str) -> QuestionInput {
    QuestionInput {
        question_text: text.to_string(),
        question_type: "yes_no".to_string(),
        options: vec![],
        scale: None,
        required: false,
        club_identifier: None,
        question_bank: false,
    }
}

pub fn choice_question(text: &str, options: &[&str]) -> QuestionInput {
    QuestionInput {
        question_text: text.to_string(),
        question_type: "multiple_choice".to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        scale: None,
        required: false,
        club_identifier: None,
        question_bank: false,
    }
}

impl TestDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coach(mut self, name: &str, club: &str) -> Self {
        self.users.push(TestUser {
            name: name.to_string(),
            role: "coach".to_string(),
            club: club.to_string(),
        });
        self
    }

    pub fn player(mut self, name: &str, club: &str) -> Self {
        self.users.push(TestUser {
            name: name.to_string(),
            role: "player".to_string(),
            club: club.to_string(),
        });
        self
    }

    pub fn template(
        mut self,
        name: &str,
        template_type: &str,
        sections: Vec<TestSection>,
    ) -> Self {
        self.templates.push(TestTemplate {
            name: name.to_string(),
            template_type: template_type.to_string(),
            sections,
        });
        self
    }

    pub async fn build(self) -> Result<TestDb, AppError> {
        INIT.call_once(|| {
            let _ = env_logger::builder()
                .filter_level(LevelFilter::Debug)
                .is_test(true)
                .try_init();
        });

        let pool = SqlitePool::connect("sqlite::memory:").await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let mut user_id_map: HashMap<String, i64> = HashMap::new();
        let mut template_id_map: HashMap<String, i64> = HashMap::new();

        for user in &self.users {
            let user_id = create_user(&pool, &user.name, &user.role, &user.club).await?;
            user_id_map.insert(user.name.clone(), user_id);
        }

        for template in &self.templates {
            let template_id = create_template(
                &pool,
                &template.name,
                "",
                &template.template_type,
                Some(5),
                None,
            )
            .await?;

            for section in &template.sections {
                let section_id = add_template_section(
                    &pool,
                    template_id,
                    &section.title,
                    "",
                    section.order_index,
                )
                .await?;

                for (q_idx, question) in section.questions.iter().enumerate() {
                    add_section_question(&pool, section_id, question, q_idx as i64).await?;
                }
            }

            template_id_map.insert(template.name.clone(), template_id);
        }

        Ok(TestDb {
            pool,
            user_id_map,
            template_id_map,
        })
    }
}

pub struct TestDb {
    pub pool: Pool<Sqlite>,
    pub user_id_map: HashMap<String, i64>,
    pub template_id_map: HashMap<String, i64>,
}

impl TestDb {
    pub fn user_id(&self, name: &str) -> Option<i64> {
        self.user_id_map.get(name).copied()
    }

    pub fn template_id(&self, name: &str) -> Option<i64> {
        self.template_id_map.get(name).copied()
    }

    /// Every question on the form, walking sections and questions in render
    /// order.
    pub async fn form_questions(&self, form_id: i64) -> Result<Vec<Question>, AppError> {
        let form = crate::db::get_form_with_structure(&self.pool, form_id).await?;
        Ok(form
            .structure
            .sections
            .into_iter()
            .flat_map(|section| section.questions)
            .collect())
    }

    pub async fn template_question_ids(&self, template_name: &str) -> Result<Vec<i64>, AppError> {
        let template_id = self
            .template_id(template_name)
            .ok_or_else(|| AppError::NotFound(format!("Template {} not seeded", template_name)))?;

        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT q.id FROM questions q
             JOIN sections s ON s.id = q.section_id
             WHERE s.template_id = ?
             ORDER BY s.order_index, q.order_index",
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn question_response_count(&self, response_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM question_responses WHERE response_id = ?",
        )
        .bind(response_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// The "Post-Match Standard Review" fixture: 3 sections, 12 questions, plus
/// a coach and two players.
pub async fn create_standard_test_db() -> TestDb {
    TestDbBuilder::new()
        .coach("coach_dana", "fc-harbor")
        .player("player_sam", "fc-harbor")
        .player("player_riley", "fc-harbor")
        .template(
            "Post-Match Standard Review",
            "post_game",
            vec![
                TestSection {
                    title: "Physical Condition".to_string(),
                    order_index: 0,
                    questions: vec![
                        rating_question("How is your energy level after the match?"),
                        rating_question("Rate your overall fitness today"),
                        yes_no_question("Did you pick up any knocks?"),
                        text_question("Describe any injuries or discomfort"),
                    ],
                },
                TestSection {
                    title: "Team Performance".to_string(),
                    order_index: 1,
                    questions: vec![
                        rating_question("Rate the team's overall performance"),
                        rating_question("Rate our defensive shape"),
                        choice_question(
                            "Which area needs the most work?",
                            &["Attack", "Defense", "Set pieces", "Fitness"],
                        ),
                        text_question("What should we focus on in training?"),
                    ],
                },
                TestSection {
                    title: "Personal Reflection".to_string(),
                    order_index: 2,
                    questions: vec![
                        rating_question("Rate your own performance"),
                        yes_no_question("Were you happy with your minutes?"),
                        choice_question(
                            "Preferred position for the next match?",
                            &["Keeper", "Defense", "Midfield", "Attack"],
                        ),
                        text_question("Any other feedback for the coach?"),
                    ],
                },
            ],
        )
        .build()
        .await
        .expect("Failed to build standard test DB")
}

pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
    let rocket = crate::init_rocket(test_db.pool.clone()).await;
    let client = Client::tracked(rocket)
        .await
        .expect("valid rocket instance");
    (client, test_db)
}
