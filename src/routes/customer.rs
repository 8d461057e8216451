//! Customer Endpoints

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::ApiError,
    services::Registration,
    types::{json_object, PhoneNumber, Validator},
    AppState,
};

// ============ Request/Response Types ============

/// 고객 등록 요청
#[derive(Debug)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    /// 문자열 또는 숫자
    pub phone_number: PhoneNumber,
    pub monthly_income: f64,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub customer_id: i64,
    pub name: String,
    pub age: i32,
    pub monthly_income: f64,
    pub approved_limit: i64,
    pub phone_number: String,
}

impl RegisterRequest {
    /// 필드별 파싱 + 범위 검증. 에러는 필드 단위로 모아서 한 번에 반환한다.
    fn from_json(body: &Value) -> Result<Self, ApiError> {
        let body = json_object(body)?;
        let mut v = Validator::new();

        let first_name: Option<String> = v.field(body, "first_name");
        let last_name: Option<String> = v.field(body, "last_name");
        let age: Option<i32> = v.field(body, "age");
        let phone_number: Option<PhoneNumber> = v.field(body, "phone_number");
        let monthly_income: Option<f64> = v.field(body, "monthly_income");

        if let Some(name) = &first_name {
            v.not_blank(name, "first_name");
        }
        if let Some(name) = &last_name {
            v.not_blank(name, "last_name");
        }
        if let Some(age) = age {
            v.check((18..=120).contains(&age), "age", "must be between 18 and 120");
        }
        if let Some(phone) = &phone_number {
            v.check(phone.is_valid(), "phone_number", "must contain 6 to 15 digits");
        }
        if let Some(income) = monthly_income {
            v.positive(income, "monthly_income");
        }
        v.finish()?;

        match (first_name, last_name, age, phone_number, monthly_income) {
            (Some(first_name), Some(last_name), Some(age), Some(phone_number), Some(monthly_income)) => {
                Ok(Self { first_name, last_name, age, phone_number, monthly_income })
            }
            _ => Err(ApiError::InternalError),
        }
    }
}

// ============ Handlers ============

/// POST /api/register
///
/// 승인 한도 = 36 × 월 소득 (100,000 단위 반올림). 성공 시 201.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(body) = payload?;
    let req = RegisterRequest::from_json(&body)?;

    let customer = state
        .lending
        .register(Registration {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            age: req.age,
            phone_number: req.phone_number.normalized(),
            monthly_income: req.monthly_income,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            customer_id: customer.id,
            name: customer.full_name(),
            age: customer.age,
            monthly_income: customer.monthly_salary,
            approved_limit: customer.approved_limit,
            phone_number: customer.phone_number,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{send, test_app};

    #[tokio::test]
    async fn test_register_customer() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/register",
            Some(json!({
                "first_name": "New",
                "last_name": "Customer",
                "age": 28,
                "phone_number": 8888888888u64,
                "monthly_income": 40000,
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["customer_id"], 1);
        assert_eq!(body["name"], "New Customer");
        assert_eq!(body["approved_limit"], 1_400_000);
        assert_eq!(body["phone_number"], "8888888888");
        assert_eq!(body["monthly_income"], 40000.0);
    }

    #[tokio::test]
    async fn test_register_missing_field() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/register",
            Some(json!({ "first_name": "New", "age": "old" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields = body["fields"].as_object().unwrap();
        assert_eq!(fields.len(), 4);
        assert!(fields["age"][0].as_str().unwrap().contains("invalid type"));
        assert_eq!(fields["last_name"][0], "This field is required.");
        assert_eq!(fields["phone_number"][0], "This field is required.");
        assert_eq!(fields["monthly_income"][0], "This field is required.");
        assert!(!fields.contains_key("first_name"));
    }

    #[tokio::test]
    async fn test_register_malformed_body() {
        let (app, _) = test_app();
        let (status, body) = send(&app, "POST", "/api/register", Some(json!(["New"]))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"], "request body must be a JSON object");
    }

    #[tokio::test]
    async fn test_register_field_errors() {
        let (app, store) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/register",
            Some(json!({
                "first_name": " ",
                "last_name": "Customer",
                "age": 12,
                "phone_number": "12",
                "monthly_income": -5,
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields = body["fields"].as_object().unwrap();
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("age"));
        assert!(fields.contains_key("phone_number"));
        assert!(fields.contains_key("monthly_income"));
        assert!(!fields.contains_key("last_name"));
        assert_eq!(store.customer_count(), 0);
    }
}
