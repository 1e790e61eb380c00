#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::analytics::{ASSUMED_ROSTER_SIZE, compute_analytics};
    use crate::db::{create_form_from_template, submit_response};
    use crate::models::AnswerValue;
    use crate::test::utils::{TestDb, create_standard_test_db};

    async fn seeded_form(test_db: &TestDb) -> (i64, i64, i64) {
        let template_id = test_db
            .template_id("Post-Match Standard Review")
            .expect("Template not seeded");

        let form = create_form_from_template(
            &test_db.pool,
            template_id,
            "event-42",
            None,
            false,
            test_db.user_id("coach_dana"),
        )
        .await
        .expect("create form failed");

        let questions = test_db
            .form_questions(form.id)
            .await
            .expect("questions failed");

        let rating_q = questions
            .iter()
            .find(|q| q.question_type == "rating")
            .expect("no rating question")
            .id;
        let text_q = questions
            .iter()
            .find(|q| q.question_type == "text")
            .expect("no text question")
            .id;

        (form.id, rating_q, text_q)
    }

    #[rocket::async_test]
    async fn test_analytics_on_form_without_responses() {
        let test_db = create_standard_test_db().await;
        let (form_id, _, _) = seeded_form(&test_db).await;

        let analytics = compute_analytics(&test_db.pool, form_id)
            .await
            .expect("analytics failed");

        assert_eq!(analytics.total_responses, 0);
        assert_eq!(analytics.response_rate, 0.0);
        assert_eq!(analytics.average_completion_time_seconds, None);
        assert_eq!(analytics.average_rating, None);
        assert!(analytics.insights.is_empty());
    }

    #[rocket::async_test]
    async fn test_analytics_aggregates_submitted_responses() {
        let test_db = create_standard_test_db().await;
        let (form_id, rating_q, text_q) = seeded_form(&test_db).await;
        let sam = test_db.user_id("player_sam").expect("player missing");
        let riley = test_db.user_id("player_riley").expect("player missing");

        let answers = HashMap::from([
            (rating_q, AnswerValue::Number(6)),
            (text_q, AnswerValue::Text("Felt good".to_string())),
        ]);
        submit_response(&test_db.pool, form_id, Some(sam), false, &answers, Some(100), false)
            .await
            .expect("submit failed");

        let answers = HashMap::from([(rating_q, AnswerValue::Number(8))]);
        submit_response(&test_db.pool, form_id, Some(riley), false, &answers, Some(60), false)
            .await
            .expect("submit failed");

        let analytics = compute_analytics(&test_db.pool, form_id)
            .await
            .expect("analytics failed");

        assert_eq!(analytics.total_responses, 2);
        assert_eq!(analytics.response_rate, 2.0 / ASSUMED_ROSTER_SIZE as f64);
        assert_eq!(analytics.average_completion_time_seconds, Some(80.0));
        // Only rating answers feed the average; text answers are ignored.
        assert_eq!(analytics.average_rating, Some(7.0));

        assert_eq!(analytics.insights.len(), 3);
        assert!(analytics.insights[0].contains("2 players"));
        assert!(analytics.insights[1].contains("7.0"));
        assert!(analytics.insights[2].contains("80 seconds"));
    }

    #[rocket::async_test]
    async fn test_analytics_without_rating_questions_answered() {
        let test_db = create_standard_test_db().await;
        let (form_id, _, text_q) = seeded_form(&test_db).await;
        let sam = test_db.user_id("player_sam").expect("player missing");

        let answers = HashMap::from([(text_q, AnswerValue::Text("Only words".to_string()))]);
        submit_response(&test_db.pool, form_id, Some(sam), false, &answers, None, false)
            .await
            .expect("submit failed");

        let analytics = compute_analytics(&test_db.pool, form_id)
            .await
            .expect("analytics failed");

        assert_eq!(analytics.total_responses, 1);
        assert_eq!(analytics.average_rating, None);
        assert_eq!(analytics.average_completion_time_seconds, None);
        // Only the submission-count insight applies.
        assert_eq!(analytics.insights.len(), 1);
    }

    #[rocket::async_test]
    async fn test_analytics_api_endpoint() {
        let test_db = create_standard_test_db().await;
        let (form_id, rating_q, _) = seeded_form(&test_db).await;
        let sam = test_db.user_id("player_sam").expect("player missing");

        let answers = HashMap::from([(rating_q, AnswerValue::Number(9))]);
        submit_response(&test_db.pool, form_id, Some(sam), false, &answers, Some(45), false)
            .await
            .expect("submit failed");

        let (client, _) = crate::test::utils::setup_test_client(test_db).await;

        let response = client
            .get(format!("/api/forms/{}/analytics", form_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), rocket::http::Status::Ok);

        let body = response.into_string().await.unwrap();
        let analytics: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(analytics["total_responses"], 1);
        assert_eq!(analytics["average_rating"], 9.0);
        assert_eq!(analytics["average_completion_time_seconds"], 45.0);
    }
}
