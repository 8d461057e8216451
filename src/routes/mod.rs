//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//!
//! ```text
//! GET  /health                          - 서버/DB 상태
//!
//! POST /api/register                    - 고객 등록
//! POST /api/check-eligibility           - 대출 적격성 확인 (저장 없음)
//! POST /api/create-loan                 - 대출 생성
//! GET  /api/view-loan/:loan_id          - 대출 단건 조회
//! GET  /api/view-loans/:customer_id     - 고객별 대출 목록
//! ```

pub mod health;
pub mod customer;
pub mod loan;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// 라우터 생성 (미들웨어와 상태 주입은 호출 측에서)
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))

        // Customer
        .route("/api/register", post(customer::register))

        // Loan
        .route("/api/check-eligibility", post(loan::check_eligibility))
        .route("/api/create-loan", post(loan::create_loan))
        .route("/api/view-loan/:loan_id", get(loan::view_loan))
        .route("/api/view-loans/:customer_id", get(loan::view_loans))
}
