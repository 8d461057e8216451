//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `eligibility`: 신용 점수, 승인/금리 보정, EMI 계산 (순수 함수)
//! - `LendingService`: 등록/적격성/대출 생성/조회 흐름
//! - `ingest`: 고객/대출 시트 대량 적재

pub mod eligibility;
pub mod ingest;
mod lending;

pub use eligibility::{EligibilityDecision, LoanProposal, RejectionReason};
pub use ingest::IngestReport;
pub use lending::{
    loan_end_date, EligibilityOutcome, LendingError, LendingService, LoanOutcome, Registration,
};
