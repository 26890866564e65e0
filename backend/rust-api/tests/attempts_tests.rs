mod common;

use axum::http::{header, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_log_attempt_fills_suggested_labels() {
    let app = common::create_test_app().await;

    let record = common::log_attempt(&app, common::ibs_attempt("A")).await;

    assert_eq!(record["id"], 1);
    assert_eq!(record["source"], "user_pasted");
    assert_eq!(record["question_type"], "management");
    assert_eq!(record["topics"], json!(["Gastroenterology"]));
    assert_eq!(
        record["error_types"],
        json!(["Content gap", "Priority/sequence"])
    );
    assert_eq!(record["confidence"], 4);
}

#[tokio::test]
async fn test_log_attempt_keeps_user_labels_and_trims_fields() {
    let app = common::create_test_app().await;

    let record = common::log_attempt(
        &app,
        json!({
            "question_bank": "  NBME  ",
            "raw_question": "  Chest pain with ST elevation.  ",
            "your_answer": " b ",
            "correct_answer": "B",
            "topics": ["cardiology"],
            "question_type": "Diagnosis",
            "error_types": []
        }),
    )
    .await;

    assert_eq!(record["question_bank"], "NBME");
    assert_eq!(record["raw_question"], "Chest pain with ST elevation.");
    assert_eq!(record["your_answer"], "b");
    assert_eq!(record["topics"], json!(["Cardiology"]));
    assert_eq!(record["question_type"], "diagnosis");
    assert_eq!(record["error_types"], json!([]));
    assert_eq!(record["confidence"], 3);
}

#[tokio::test]
async fn test_log_attempt_requires_question_and_answers() {
    let app = common::create_test_app().await;

    let response = common::post_json(
        &app,
        "/api/v1/attempts",
        json!({ "raw_question": "   ", "your_answer": "A", "correct_answer": "B" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Please paste the question stem.");
    assert_eq!(body["status"], 400);

    let response = common::post_json(
        &app,
        "/api/v1/attempts",
        json!({ "raw_question": "Stem", "your_answer": "A" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(
        body["message"],
        "Enter both your answer and the correct answer."
    );
}

#[tokio::test]
async fn test_log_attempt_rejects_unknown_labels_and_bad_confidence() {
    let app = common::create_test_app().await;

    let mut body = common::ibs_attempt("A");
    body["topics"] = json!(["Dermatology"]);
    let response = common::post_json(&app, "/api/v1/attempts", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = common::ibs_attempt("A");
    body["confidence"] = json!(9);
    let response = common::post_json(&app, "/api/v1/attempts", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was written
    let list = common::body_json(common::get(&app, "/api/v1/attempts").await).await;
    assert_eq!(list["attempts"], json!([]));
}

#[tokio::test]
async fn test_malformed_json_gets_json_error() {
    let app = common::create_test_app().await;

    let response = common::send(
        &app,
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/attempts")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse JSON request body"));
}

#[tokio::test]
async fn test_list_attempts_newest_first_with_filters_and_facets() {
    let app = common::create_test_app().await;

    common::log_attempt(&app, common::ibs_attempt("D")).await;
    let mut nbme = common::ibs_attempt("A");
    nbme["question_bank"] = json!("NBME");
    nbme["exam"] = json!("Form 9");
    common::log_attempt(&app, nbme).await;

    let list = common::body_json(common::get(&app, "/api/v1/attempts").await).await;
    let attempts = list["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["id"], 2);
    assert_eq!(attempts[1]["id"], 1);
    assert_eq!(list["facets"]["question_banks"], json!(["NBME", "UWorld"]));
    assert_eq!(list["facets"]["exams"], json!(["Block 1", "Form 9"]));

    let filtered =
        common::body_json(common::get(&app, "/api/v1/attempts?question_bank=UWorld").await).await;
    let attempts = filtered["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["question_bank"], "UWorld");
    // Facets always describe the whole history
    assert_eq!(
        filtered["facets"]["question_banks"],
        json!(["NBME", "UWorld"])
    );

    let all = common::body_json(
        common::get(&app, "/api/v1/attempts?question_bank=(all)&limit=1").await,
    )
    .await;
    let attempts = all["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["id"], 2);
}

#[tokio::test]
async fn test_export_csv() {
    let app = common::create_test_app().await;

    let mut body = common::ibs_attempt("A");
    body["notes"] = json!("Missed \"after defecation\", again");
    common::log_attempt(&app, body).await;

    let response = common::get(&app, "/api/v1/attempts/export.csv").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap(),
        "attachment; filename=\"step2hub_logs.csv\""
    );

    let csv = common::body_text(response).await;
    let (header, rows) = csv.split_once('\n').unwrap();
    assert!(header.starts_with("id,created_at,source,"));
    assert!(header.ends_with("error_types,missed_clues,notes"));
    assert!(rows.starts_with("1,"));
    // Multi-line choices stay inside one quoted field
    assert!(rows.contains("\"A. Colonoscopy\nB. CT abdomen\nC. Stool studies\nD. Reassurance\""));
    assert!(rows.contains("\"Content gap, Priority/sequence\""));
    assert!(rows.ends_with(",\"Missed \"\"after defecation\"\", again\"\n"));
}

#[tokio::test]
async fn test_export_csv_respects_filters() {
    let app = common::create_test_app().await;
    common::log_attempt(&app, common::ibs_attempt("A")).await;

    let response = common::get(&app, "/api/v1/attempts/export.csv?exam=Form%201").await;
    assert_eq!(response.status(), StatusCode::OK);
    let csv = common::body_text(response).await;
    assert_eq!(csv.lines().count(), 1);
}
