// tests/attempt_tests.rs

use std::sync::Arc;

use cbt_backend::{config::Config, routes, state::AppState, store::SqliteStore};
use serde_json::{Value, json};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "attempt-test-pw";

async fn spawn_app() -> String {
    let store = SqliteStore::in_memory().await.unwrap();

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "attempt_test_secret".to_string(),
        jwt_expiration: 600,
        port: 0,
        rust_log: "error".to_string(),
        admin_name: "Admin".to_string(),
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    };

    let state = AppState::new(Arc::new(store), config);
    state
        .credentials
        .bootstrap_admin("Admin", ADMIN_EMAIL, Some(ADMIN_PASSWORD), "unused")
        .await
        .unwrap();

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Thin client bound to one server and one bearer token.
struct Session {
    client: reqwest::Client,
    address: String,
    token: String,
}

impl Session {
    async fn admin(address: &str) -> Self {
        Self::login(address, ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    async fn student(address: &str) -> Self {
        let email = format!("s_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
        let client = reqwest::Client::new();
        let resp: Value = client
            .post(&format!("{}/api/register", address))
            .json(&json!({ "name": "Student", "email": email, "password": "password123" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        Self {
            client,
            address: address.to_string(),
            token: resp["token"].as_str().unwrap().to_string(),
        }
    }

    async fn login(address: &str, email: &str, password: &str) -> Self {
        let client = reqwest::Client::new();
        let resp: Value = client
            .post(&format!("{}/api/login", address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        Self {
            client,
            address: address.to_string(),
            token: resp["token"].as_str().unwrap().to_string(),
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", self.address, path))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

/// Creates a published exam; returns (exam_id, question ids in creation order).
async fn published_exam(
    admin: &Session,
    title: &str,
    questions: &[(&str, Value, i64)],
) -> (i64, Vec<i64>) {
    let exam: Value = admin
        .post("/api/admin/exams", json!({ "title": title, "duration_minutes": 20 }))
        .await
        .json()
        .await
        .unwrap();
    let exam_id = exam["exam"]["id"].as_i64().unwrap();

    let mut ids = Vec::new();
    for (text, options, answer_index) in questions {
        let q: Value = admin
            .post(
                &format!("/api/admin/exams/{}/questions", exam_id),
                json!({ "text": text, "options": options, "answer_index": answer_index }),
            )
            .await
            .json()
            .await
            .unwrap();
        ids.push(q["question"]["id"].as_i64().unwrap());
    }

    let publish = admin
        .post(&format!("/api/admin/exams/{}/publish", exam_id), json!({}))
        .await;
    assert_eq!(publish.status().as_u16(), 200);

    (exam_id, ids)
}

async fn start(student: &Session, exam_id: i64) -> i64 {
    let resp: Value = student
        .post(&format!("/api/exams/{}/start", exam_id), json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert!(resp["started_at"].as_str().is_some());
    resp["attemptId"].as_i64().unwrap()
}

async fn submit(student: &Session, exam_id: i64, attempt_id: i64, answers: Value) -> reqwest::Response {
    student
        .post(
            &format!("/api/exams/{}/submit", exam_id),
            json!({ "attemptId": attempt_id, "answers": answers }),
        )
        .await
}

#[tokio::test]
async fn math_101_end_to_end() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let (exam_id, ids) = published_exam(&admin, "Math 101", &[("2+2?", json!(["3", "4", "5"]), 1)]).await;

    let exams: Value = student.get("/api/exams").await.json().await.unwrap();
    assert_eq!(exams["exams"][0]["title"], "Math 101");
    assert_eq!(exams["exams"][0]["duration_minutes"], 20);

    let attempt_id = start(&student, exam_id).await;
    let resp = submit(
        &student,
        exam_id,
        attempt_id,
        json!([{ "questionId": ids[0], "answerIndex": 1 }]),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 200);

    let card: Value = resp.json().await.unwrap();
    assert_eq!(card, json!({ "score": 100.0, "correct": 1, "total": 1 }));
}

#[tokio::test]
async fn student_listing_hides_answer_keys() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let (exam_id, _) = published_exam(
        &admin,
        "Secret",
        &[("Q1", json!(["a", "b"]), 0), ("Q2", json!(["a", "b", "c"]), 2)],
    )
    .await;

    let body: Value = student
        .get(&format!("/api/exams/{}/questions", exam_id))
        .await
        .json()
        .await
        .unwrap();
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for q in questions {
        let mut keys: Vec<&str> = q.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["id", "options", "text"]);
    }

    // Admins still see the key
    let full: Value = admin
        .get(&format!("/api/admin/exams/{}/questions", exam_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(full["questions"][1]["answer_index"], 2);
}

#[tokio::test]
async fn empty_submission_scores_zero() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let (exam_id, _) = published_exam(&admin, "Empty", &[("Q", json!(["a", "b"]), 0)]).await;
    let attempt_id = start(&student, exam_id).await;
    let card: Value = submit(&student, exam_id, attempt_id, json!([])).await.json().await.unwrap();
    assert_eq!(card, json!({ "score": 0.0, "correct": 0, "total": 1 }));

    // No questions at all: zero, not NaN
    let (bare_id, _) = published_exam(&admin, "Bare", &[]).await;
    let attempt_id = start(&student, bare_id).await;
    let card: Value = submit(&student, bare_id, attempt_id, json!([])).await.json().await.unwrap();
    assert_eq!(card, json!({ "score": 0.0, "correct": 0, "total": 0 }));
}

#[tokio::test]
async fn positional_submission_follows_question_order() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let (exam_id, _) = published_exam(
        &admin,
        "Positional",
        &[("Q1", json!(["a", "b", "c"]), 2), ("Q2", json!(["a", "b"]), 0), ("Q3", json!(["a", "b"]), 1)],
    )
    .await;

    let attempt_id = start(&student, exam_id).await;
    let card: Value = submit(&student, exam_id, attempt_id, json!([2, 0, 1])).await.json().await.unwrap();
    assert_eq!(card["score"], 100.0);

    // Short arrays and nulls count as incorrect, never as errors
    let attempt_id = start(&student, exam_id).await;
    let resp = submit(&student, exam_id, attempt_id, json!([2, null])).await;
    assert_eq!(resp.status().as_u16(), 200);
    let card: Value = resp.json().await.unwrap();
    assert_eq!(card["correct"], 1);
    assert_eq!(card["total"], 3);
}

#[tokio::test]
async fn malformed_answers_are_rejected() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let (exam_id, _) = published_exam(&admin, "Shapes", &[("Q", json!(["a", "b"]), 0)]).await;
    let attempt_id = start(&student, exam_id).await;

    let resp = submit(&student, exam_id, attempt_id, json!({ "0": 1 })).await;
    assert_eq!(resp.status().as_u16(), 400);
    let resp = submit(&student, exam_id, attempt_id, json!([0, { "questionId": 1, "answerIndex": 0 }])).await;
    assert_eq!(resp.status().as_u16(), 400);

    // The attempt is still open after rejected payloads
    let resp = submit(&student, exam_id, attempt_id, json!([0])).await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn closed_attempts_are_frozen() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let (exam_id, ids) = published_exam(&admin, "Frozen", &[("Q", json!(["a", "b"]), 1)]).await;
    let attempt_id = start(&student, exam_id).await;

    let answers = json!([{ "questionId": ids[0], "answerIndex": 1 }]);
    assert_eq!(submit(&student, exam_id, attempt_id, answers).await.status().as_u16(), 200);

    let first: Value = student
        .get(&format!("/api/attempts/{}", attempt_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(first["attempt"]["score"], 100.0);
    assert!(first["attempt"]["submitted_at"].as_str().is_some());

    // Second submit is refused and changes nothing
    let again = submit(&student, exam_id, attempt_id, json!([0])).await;
    assert_eq!(again.status().as_u16(), 400);
    let body: Value = again.json().await.unwrap();
    assert_eq!(body["error"], "Attempt already submitted");

    for _ in 0..3 {
        let read: Value = student
            .get(&format!("/api/attempts/{}", attempt_id))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(read, first);
    }
}

#[tokio::test]
async fn attempts_belong_to_their_owner() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let owner = Session::student(&address).await;
    let intruder = Session::student(&address).await;

    let (exam_id, _) = published_exam(&admin, "Mine", &[("Q", json!(["a", "b"]), 1)]).await;
    let attempt_id = start(&owner, exam_id).await;

    let resp = submit(&intruder, exam_id, attempt_id, json!([1])).await;
    assert_eq!(resp.status().as_u16(), 403);
    let resp = intruder.get(&format!("/api/attempts/{}", attempt_id)).await;
    assert_eq!(resp.status().as_u16(), 403);

    // Admin may read it
    let resp = admin.get(&format!("/api/attempts/{}", attempt_id)).await;
    assert_eq!(resp.status().as_u16(), 200);

    // Unknown attempt
    let resp = submit(&owner, exam_id, 9999, json!([1])).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn unpublished_exams_cannot_be_started() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let exam: Value = admin
        .post("/api/admin/exams", json!({ "title": "Draft" }))
        .await
        .json()
        .await
        .unwrap();
    let exam_id = exam["exam"]["id"].as_i64().unwrap();

    let resp = student
        .post(&format!("/api/exams/{}/start", exam_id), json!({}))
        .await;
    assert_eq!(resp.status().as_u16(), 404);

    let exams: Value = student.get("/api/exams").await.json().await.unwrap();
    assert!(exams["exams"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn multiple_attempts_are_independent() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let (exam_id, _) = published_exam(&admin, "Retake", &[("Q", json!(["a", "b"]), 1)]).await;
    let first = start(&student, exam_id).await;
    let second = start(&student, exam_id).await;
    assert_ne!(first, second);

    let a: Value = submit(&student, exam_id, first, json!([0])).await.json().await.unwrap();
    let b: Value = submit(&student, exam_id, second, json!([1])).await.json().await.unwrap();
    assert_eq!(a["score"], 0.0);
    assert_eq!(b["score"], 100.0);
}

#[tokio::test]
async fn export_lists_attempts_as_csv() {
    let address = spawn_app().await;
    let admin = Session::admin(&address).await;
    let student = Session::student(&address).await;

    let (exam_id, _) = published_exam(&admin, "Export", &[("Q", json!(["a", "b"]), 1)]).await;
    let submitted = start(&student, exam_id).await;
    submit(&student, exam_id, submitted, json!([1, null])).await;
    start(&student, exam_id).await;

    let resp = admin.get(&format!("/api/admin/export/{}", exam_id)).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let body = resp.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], "ID,User,Email,Score,Started At,Submitted At,Answers");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains(",100.0,"));
    assert!(lines[1].ends_with("\"[1, null]\"") || lines[1].ends_with("\"[1,null]\""));

    let forbidden = student.get(&format!("/api/admin/export/{}", exam_id)).await;
    assert_eq!(forbidden.status().as_u16(), 403);
}
