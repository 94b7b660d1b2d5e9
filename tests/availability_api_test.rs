use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;
use wisteria_backend::middleware::auth::Claims;

fn db_available() -> bool {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return false;
    }
    true
}

fn init_test_env() {
    if env::var("SERVER_ADDRESS").is_err() {
        env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    }
    if env::var("JWT_SECRET").is_err() {
        env::set_var("JWT_SECRET", "test_secret_key");
    }
    if env::var("ADMIN_RPM").is_err() {
        env::set_var("ADMIN_RPM", "1000");
    }
    if env::var("CLIENT_RPM").is_err() {
        env::set_var("CLIENT_RPM", "1000");
    }
    let _ = wisteria_backend::config::init_config();
}

async fn setup() -> Option<(wisteria_backend::AppState, sqlx::PgPool)> {
    if !db_available() {
        return None;
    }
    init_test_env();

    let pool = wisteria_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");

    Some((wisteria_backend::AppState::new(pool.clone()), pool))
}

fn client_token(company_id: &str) -> String {
    let claims = Claims {
        sub: format!("client_user_{}", Uuid::new_v4().simple()),
        exp: 4102444800,
        role: Some("client".into()),
        company_id: Some(company_id.into()),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(
            wisteria_backend::config::get_config().jwt_secret.as_bytes(),
        ),
    )
    .expect("encode token")
}

fn client_router(state: wisteria_backend::AppState) -> Router {
    Router::new()
        .route(
            "/api/client/interview-availability",
            get(wisteria_backend::routes::availability::list_availability)
                .post(wisteria_backend::routes::availability::create_availability)
                .put(wisteria_backend::routes::availability::update_availability)
                .delete(wisteria_backend::routes::availability::delete_availability),
        )
        .route(
            "/api/client/applicants/:id/interview-booking",
            get(wisteria_backend::routes::interview_booking::client_get_booking),
        )
        .layer(axum::middleware::from_fn(
            wisteria_backend::middleware::auth::require_client,
        ))
        .with_state(state)
}

async fn seed_company(pool: &sqlx::PgPool) -> String {
    let company_id = format!("company_{}", Uuid::new_v4().simple());
    sqlx::query("INSERT INTO companies (id, company_name) VALUES ($1, $2)")
        .bind(&company_id)
        .bind("クライアント株式会社")
        .execute(pool)
        .await
        .expect("seed company");
    company_id
}

async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn availability_crud_round_trip() {
    let Some((state, pool)) = setup().await else { return };
    let app = client_router(state);
    let company_id = seed_company(&pool).await;
    let token = client_token(&company_id);

    let date = (chrono::Utc::now().date_naive() + chrono::Duration::days(10))
        .format("%Y-%m-%d")
        .to_string();

    // Missing times are rejected up front.
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/client/interview-availability",
        &token,
        Some(json!({ "available_date": date })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "日付と時間は必須です");

    // Inverted time range.
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/client/interview-availability",
        &token,
        Some(json!({ "available_date": date, "start_time": "15:00", "end_time": "14:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "終了時間は開始時間より後にしてください"
    );

    // Past dates cannot be published.
    let yesterday = (chrono::Utc::now().date_naive() - chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/client/interview-availability",
        &token,
        Some(json!({ "available_date": yesterday, "start_time": "10:00", "end_time": "11:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "過去の日付は登録できません");

    // Valid slot.
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/client/interview-availability",
        &token,
        Some(json!({
            "available_date": date,
            "start_time": "10:00",
            "end_time": "11:00",
            "note": "午前中のみ"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let slot_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["is_booked"], false);

    // It shows up in the listing.
    let (status, body) =
        request_json(&app, "GET", "/api/client/interview-availability", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["id"] == slot_id.as_str());
    assert!(listed);

    // Update moves the window.
    let (status, body) = request_json(
        &app,
        "PUT",
        "/api/client/interview-availability",
        &token,
        Some(json!({ "id": slot_id, "start_time": "13:00", "end_time": "14:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["start_time"], "13:00:00");

    // Delete removes it.
    let (status, _) = request_json(
        &app,
        "DELETE",
        &format!("/api/client/interview-availability?id={}", slot_id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request_json(
        &app,
        "PUT",
        "/api/client/interview-availability",
        &token,
        Some(json!({ "id": slot_id, "start_time": "13:00", "end_time": "14:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "対応可能日が見つかりません");
}

#[tokio::test]
async fn booked_slots_are_locked_and_foreign_slots_hidden() {
    let Some((state, pool)) = setup().await else { return };
    let app = client_router(state.clone());
    let company_id = seed_company(&pool).await;
    let other_company = seed_company(&pool).await;
    let token = client_token(&company_id);

    let date = chrono::Utc::now().date_naive() + chrono::Duration::days(5);
    let slot_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO interview_availability \
             (id, company_id, available_date, start_time, end_time, is_booked, booked_applicant_id) \
         VALUES ($1, $2, $3, '10:00', '11:00', TRUE, 'applicant_x')",
    )
    .bind(&slot_id)
    .bind(&company_id)
    .bind(date)
    .execute(&pool)
    .await
    .expect("seed booked slot");

    let (status, body) = request_json(
        &app,
        "PUT",
        "/api/client/interview-availability",
        &token,
        Some(json!({ "id": slot_id, "note": "変更" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "予約済みの日程は変更できません");

    let (status, body) = request_json(
        &app,
        "DELETE",
        &format!("/api/client/interview-availability?id={}", slot_id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "予約済みの日程は削除できません");

    // A different company cannot touch it at all.
    let foreign_token = client_token(&other_company);
    let (status, body) = request_json(
        &app,
        "DELETE",
        &format!("/api/client/interview-availability?id={}", slot_id),
        &foreign_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "権限がありません");
}

#[tokio::test]
async fn client_booking_view_requires_sharing() {
    let Some((state, pool)) = setup().await else { return };
    let app = client_router(state.clone());
    let company_id = seed_company(&pool).await;
    let token = client_token(&company_id);

    let job_id = format!("job_{}", Uuid::new_v4().simple());
    sqlx::query("INSERT INTO jobs (id, company_id, job_title) VALUES ($1, $2, $3)")
        .bind(&job_id)
        .bind(&company_id)
        .bind("事務スタッフ")
        .execute(&pool)
        .await
        .expect("seed job");

    let applicant_id = format!("applicant_{}", Uuid::new_v4().simple());
    let date = chrono::Utc::now().date_naive() + chrono::Duration::days(3);
    sqlx::query(
        "INSERT INTO applicants \
             (id, company_id, job_id, name, applied_at, shared_with_client, \
              interview_date, interview_start_time, interview_end_time) \
         VALUES ($1, $2, $3, $4, CURRENT_DATE, FALSE, $5, '10:00', '11:00')",
    )
    .bind(&applicant_id)
    .bind(&company_id)
    .bind(&job_id)
    .bind("佐藤花子")
    .bind(date)
    .execute(&pool)
    .await
    .expect("seed applicant");

    // Not shared yet: hidden from the portal.
    let (status, _) = request_json(
        &app,
        "GET",
        &format!("/api/client/applicants/{}/interview-booking", applicant_id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    sqlx::query("UPDATE applicants SET shared_with_client = TRUE, shared_at = NOW() WHERE id = $1")
        .bind(&applicant_id)
        .execute(&pool)
        .await
        .expect("share applicant");

    let (status, body) = request_json(
        &app,
        "GET",
        &format!("/api/client/applicants/{}/interview-booking", applicant_id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["bookedSlot"]["id"],
        format!("interview_{}", applicant_id)
    );
    assert_eq!(body["data"]["bookedSlot"]["start_time"], "10:00:00");
}
