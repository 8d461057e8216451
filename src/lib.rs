//! Credit System API Library
//!
//! # Overview
//!
//! 고객 등록, 대출 이력 기반 신용 평가, 대출 승인/금리 보정, 대출 조회를
//! 제공하는 백엔드 API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          API                              │
//! │                                                           │
//! │  ┌────────┐   ┌────────────────┐   ┌──────────────────┐  │
//! │  │ Routes │──►│ LendingService │──►│ CreditRepository │  │
//! │  └────────┘   │  └ eligibility │   └────────┬─────────┘  │
//! │               └────────────────┘            │            │
//! └─────────────────────────────────────────────┼────────────┘
//!                                               ▼
//!                                      ┌────────────────┐
//!                                      │   PostgreSQL   │
//!                                      └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 비즈니스 로직 (적격성 평가, 대출 흐름, 대량 적재)
//! - `db`: 데이터베이스 연동
//! - `types`: 요청 검증 공통 타입
//!
//! ## Usage
//!
//! ```rust,ignore
//! use credit_system_api::{config::Config, db::Database, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config.database_url, config.db_max_connections).await?;
//!     let state = AppState::new(std::sync::Arc::new(db), config);
//!
//!     // ... 서버 시작
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod db;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::ApiError;
pub use db::{CreditRepository, Database};
pub use services::LendingService;

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CreditRepository>,
    pub lending: Arc<LendingService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn CreditRepository>, config: Config) -> Self {
        Self {
            lending: Arc::new(LendingService::new(store.clone())),
            store,
            config: Arc::new(config),
        }
    }
}
