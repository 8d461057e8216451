//! Repository Pattern Implementation
//!
//! 데이터 접근 로직을 `CreditRepository` trait 뒤로 숨긴다.
//!
//! - PostgreSQL 구현: `db/mod.rs`의 `Database`
//! - 테스트용 Mock: 아래 `mock::MockCreditRepository` (메모리 저장)

use async_trait::async_trait;
use anyhow::Result;

use super::models::{Customer, Loan, NewCustomer, NewLoan};

/// 고객/대출 저장소 인터페이스
#[async_trait]
pub trait CreditRepository: Send + Sync {
    /// 저장소 연결 확인
    async fn health_check(&self) -> Result<()>;

    /// 신규 고객 저장 (id 자동 할당, current_debt = 0)
    async fn insert_customer(&self, customer: &NewCustomer) -> Result<Customer>;

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>>;

    async fn find_loan(&self, id: i64) -> Result<Option<Loan>>;

    /// 고객의 전체 대출 (loan id 오름차순)
    async fn loans_for_customer(&self, customer_id: i64) -> Result<Vec<Loan>>;

    /// 신규 대출 저장 + 고객 current_debt 증가 (단일 트랜잭션)
    async fn insert_loan(&self, loan: &NewLoan) -> Result<Loan>;

    /// id를 지정해 고객 적재. 이미 존재하면 아무것도 하지 않고 `false`
    async fn import_customer(&self, customer: &Customer) -> Result<bool>;

    /// id를 지정해 대출 적재. 이미 존재하면 아무것도 하지 않고 `false`
    async fn import_loan(&self, loan: &Loan) -> Result<bool>;

    /// id 시퀀스를 현재 최대 id에 맞춤 (적재 후 id 충돌 방지)
    async fn resync_id_sequences(&self) -> Result<()>;
}
