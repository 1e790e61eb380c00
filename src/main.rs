#[macro_use]
extern crate rocket;

mod analytics;
mod api;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_create_form, api_duplicate_form, api_form_analytics, api_get_existing_response,
    api_get_forms_for_event, api_get_question_bank, api_get_templates, api_list_responses,
    api_save_custom_form, api_submit_response, api_update_form, health,
};
use error::AppError;
use once_cell::sync::Lazy;
use rocket::{Build, Rocket};
use std::sync::Mutex;
use telemetry::{OtelGuard, TelemetryFairing, init_tracing};
use thiserror::Error;

use sqlx::SqlitePool;
use tracing::{error, info};

pub static TELEMETRY_GUARD: Lazy<Mutex<Option<OtelGuard>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[launch]
async fn rocket() -> _ {
    init_tracing();

    if let Err(e) = env::load_environment() {
        error!("Failed to load environment files: {}", e);
    }

    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            panic!("Database migration failed: {}", e);
        }
    }

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting team feedback service");

    rocket::build()
        .manage(pool)
        .mount(
            "/api",
            routes![
                api_get_templates,
                api_get_forms_for_event,
                api_create_form,
                api_save_custom_form,
                api_update_form,
                api_duplicate_form,
                api_get_question_bank,
                api_submit_response,
                api_get_existing_response,
                api_list_responses,
                api_form_analytics,
            ],
        )
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
}
