//! Lending Service
//!
//! 고객 등록, 적격성 확인, 대출 생성, 대출 조회 흐름.
//! 저장소에서 이력을 읽고 `eligibility::evaluate`에 넘긴 뒤,
//! 승인된 경우에만 단일 쓰기(대출 저장)를 수행한다.

use std::sync::Arc;

use chrono::{Months, NaiveDate, Utc};
use thiserror::Error;

use crate::db::{CreditRepository, Customer, Loan, NewCustomer, NewLoan};
use crate::error::ApiError;
use crate::services::eligibility::{self, EligibilityDecision, LoanProposal};

#[derive(Debug, Error)]
pub enum LendingError {
    #[error("customer {0} not found")]
    CustomerNotFound(i64),

    #[error("loan {0} not found")]
    LoanNotFound(i64),

    #[error("loan terms give a non-finite monthly installment")]
    NonFiniteInstallment,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        match err {
            LendingError::CustomerNotFound(_) => ApiError::NotFound("Customer".to_string()),
            LendingError::LoanNotFound(_) => ApiError::NotFound("Loan".to_string()),
            other @ LendingError::NonFiniteInstallment => {
                ApiError::ValidationError(other.to_string())
            }
            LendingError::Store(e) => e.into(),
        }
    }
}

/// 고객 등록 입력
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub phone_number: String,
    pub monthly_income: f64,
}

/// 적격성 평가 결과 (대상 고객 포함)
#[derive(Debug, Clone)]
pub struct EligibilityOutcome {
    pub customer: Customer,
    pub proposal: LoanProposal,
    pub decision: EligibilityDecision,
}

/// 대출 생성 결과. 거절 시 `loan`은 None.
#[derive(Debug, Clone)]
pub struct LoanOutcome {
    pub customer_id: i64,
    pub proposal: LoanProposal,
    pub decision: EligibilityDecision,
    pub loan: Option<Loan>,
}

pub struct LendingService {
    store: Arc<dyn CreditRepository>,
}

impl LendingService {
    pub fn new(store: Arc<dyn CreditRepository>) -> Self {
        Self { store }
    }

    /// 고객 등록. 승인 한도는 월 소득 기준으로 고정된다.
    pub async fn register(&self, registration: Registration) -> Result<Customer, LendingError> {
        let approved_limit = eligibility::approved_limit(registration.monthly_income);

        let customer = self
            .store
            .insert_customer(&NewCustomer {
                first_name: registration.first_name,
                last_name: registration.last_name,
                age: registration.age,
                phone_number: registration.phone_number,
                monthly_salary: registration.monthly_income,
                approved_limit,
            })
            .await?;

        tracing::info!(
            customer_id = customer.id,
            approved_limit,
            "Customer registered"
        );
        Ok(customer)
    }

    /// 적격성 확인 (저장 없음)
    pub async fn check_eligibility(
        &self,
        customer_id: i64,
        proposal: LoanProposal,
    ) -> Result<EligibilityOutcome, LendingError> {
        self.evaluate_on(customer_id, proposal, today()).await
    }

    /// 대출 생성. 승인 시 오늘 날짜로 저장한다.
    pub async fn create_loan(
        &self,
        customer_id: i64,
        proposal: LoanProposal,
    ) -> Result<LoanOutcome, LendingError> {
        let start_date = today();
        let outcome = self.evaluate_on(customer_id, proposal, start_date).await?;

        let loan = if outcome.decision.approved {
            let loan = self
                .store
                .insert_loan(&NewLoan {
                    customer_id,
                    loan_amount: proposal.amount,
                    interest_rate: outcome.decision.corrected_interest_rate,
                    tenure: proposal.tenure,
                    monthly_installment: outcome.decision.monthly_installment,
                    start_date,
                    end_date: loan_end_date(start_date, proposal.tenure),
                })
                .await?;
            tracing::info!(loan_id = loan.id, customer_id, "Loan created");
            Some(loan)
        } else {
            None
        };

        Ok(LoanOutcome {
            customer_id,
            proposal,
            decision: outcome.decision,
            loan,
        })
    }

    pub async fn view_loan(&self, loan_id: i64) -> Result<Loan, LendingError> {
        self.store
            .find_loan(loan_id)
            .await?
            .ok_or(LendingError::LoanNotFound(loan_id))
    }

    /// 고객의 대출 목록. 대출이 없거나 고객이 없으면 빈 목록.
    pub async fn loans_for_customer(&self, customer_id: i64) -> Result<Vec<Loan>, LendingError> {
        Ok(self.store.loans_for_customer(customer_id).await?)
    }

    async fn evaluate_on(
        &self,
        customer_id: i64,
        proposal: LoanProposal,
        today: NaiveDate,
    ) -> Result<EligibilityOutcome, LendingError> {
        let customer = self
            .store
            .find_customer(customer_id)
            .await?
            .ok_or(LendingError::CustomerNotFound(customer_id))?;
        let history = self.store.loans_for_customer(customer_id).await?;

        let decision = eligibility::evaluate(&customer, &history, &proposal, today);
        if !decision.monthly_installment.is_finite() {
            tracing::warn!(customer_id, amount = proposal.amount, "Non-finite installment");
            return Err(LendingError::NonFiniteInstallment);
        }
        tracing::debug!(
            customer_id,
            existing_loans = history.len(),
            credit_score = decision.credit_score,
            approved = decision.approved,
            corrected_interest_rate = decision.corrected_interest_rate,
            "Eligibility evaluated"
        );

        Ok(EligibilityOutcome { customer, proposal, decision })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// 종료일 = 시작일 + (tenure / 12)년. 2/29는 2/28로 맞춘다.
pub fn loan_end_date(start_date: NaiveDate, tenure: i32) -> NaiveDate {
    let whole_years = (tenure.max(0) / 12) as u32;
    start_date
        .checked_add_months(Months::new(whole_years * 12))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockCreditRepository;
    use tokio_test::assert_ok;

    fn service() -> (Arc<MockCreditRepository>, LendingService) {
        let store = Arc::new(MockCreditRepository::new());
        (store.clone(), LendingService::new(store))
    }

    fn registration(monthly_income: f64) -> Registration {
        Registration {
            first_name: "New".to_string(),
            last_name: "Customer".to_string(),
            age: 28,
            phone_number: "8888888888".to_string(),
            monthly_income,
        }
    }

    fn proposal(amount: f64, rate: f64, tenure: i32) -> LoanProposal {
        LoanProposal { amount, interest_rate: rate, tenure }
    }

    #[test]
    fn test_loan_end_date() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(loan_end_date(start, 12), NaiveDate::from_ymd_opt(2027, 10, 17).unwrap());
        assert_eq!(loan_end_date(start, 30), NaiveDate::from_ymd_opt(2028, 10, 17).unwrap());
        assert_eq!(loan_end_date(start, 6), start);

        let leap = NaiveDate::from_ymd_opt(2028, 2, 29).unwrap();
        assert_eq!(loan_end_date(leap, 12), NaiveDate::from_ymd_opt(2029, 2, 28).unwrap());
    }

    #[tokio::test]
    async fn test_register_computes_limit() {
        let (_, service) = service();
        let customer = service.register(registration(40_000.0)).await.unwrap();

        assert_eq!(customer.id, 1);
        assert_eq!(customer.approved_limit, 1_400_000);
        assert_eq!(customer.current_debt, 0.0);
        assert_eq!(customer.full_name(), "New Customer");
    }

    #[tokio::test]
    async fn test_register_then_check_approves_at_requested_rate() {
        let (_, service) = service();
        let customer = service.register(registration(50_000.0)).await.unwrap();

        let outcome = assert_ok!(
            service.check_eligibility(customer.id, proposal(100_000.0, 10.0, 12)).await
        );
        assert!(outcome.decision.approved);
        assert_eq!(outcome.decision.corrected_interest_rate, 10.0);
        assert_eq!(outcome.decision.credit_score, 100);
    }

    #[tokio::test]
    async fn test_check_unknown_customer() {
        let (_, service) = service();
        let err = service
            .check_eligibility(42, proposal(1000.0, 10.0, 12))
            .await
            .unwrap_err();
        assert!(matches!(err, LendingError::CustomerNotFound(42)));
    }

    #[tokio::test]
    async fn test_check_does_not_persist() {
        let (store, service) = service();
        let customer = service.register(registration(50_000.0)).await.unwrap();
        service
            .check_eligibility(customer.id, proposal(100_000.0, 10.0, 12))
            .await
            .unwrap();
        assert_eq!(store.loan_count(), 0);
    }

    #[tokio::test]
    async fn test_create_loan_persists_and_accrues_debt() {
        let (store, service) = service();
        let customer = service.register(registration(50_000.0)).await.unwrap();

        let outcome = service
            .create_loan(customer.id, proposal(100_000.0, 12.0, 12))
            .await
            .unwrap();
        let loan = outcome.loan.expect("approved loan should be stored");

        assert_eq!(loan.monthly_installment, 8884.88);
        assert_eq!(loan.interest_rate, 12.0);
        assert_eq!(loan.emis_paid_on_time, 0);
        assert_eq!(loan.end_date, loan_end_date(loan.start_date, 12));

        let stored = store.find_customer(customer.id).await.unwrap().unwrap();
        assert_eq!(stored.current_debt, 100_000.0);
        assert_eq!(service.view_loan(loan.id).await.unwrap(), loan);
    }

    #[tokio::test]
    async fn test_create_loan_rejected_writes_nothing() {
        let (store, service) = service();
        let customer = service.register(registration(10_000.0)).await.unwrap();

        // 첫 대출 EMI ~8,885 > 50% of 10,000 -> 다음 요청은 거절
        let first = service
            .create_loan(customer.id, proposal(100_000.0, 12.0, 12))
            .await
            .unwrap();
        assert!(first.loan.is_some());

        let second = service
            .create_loan(customer.id, proposal(50_000.0, 12.0, 12))
            .await
            .unwrap();
        assert!(!second.decision.approved);
        assert!(second.loan.is_none());
        assert_eq!(second.decision.monthly_installment, 0.0);
        assert_eq!(store.loan_count(), 1);
    }

    #[tokio::test]
    async fn test_create_loan_non_finite_installment_writes_nothing() {
        let (store, service) = service();
        let customer = service.register(registration(50_000.0)).await.unwrap();

        let err = service
            .create_loan(customer.id, proposal(f64::MAX, 1e6, 120))
            .await
            .unwrap_err();
        assert!(matches!(err, LendingError::NonFiniteInstallment));
        assert_eq!(store.loan_count(), 0);

        let stored = store.find_customer(customer.id).await.unwrap().unwrap();
        assert_eq!(stored.current_debt, 0.0);
    }

    #[tokio::test]
    async fn test_view_missing_loan() {
        let (_, service) = service();
        let err = service.view_loan(7).await.unwrap_err();
        assert!(matches!(err, LendingError::LoanNotFound(7)));
    }

    #[tokio::test]
    async fn test_loans_for_customer_empty() {
        let (_, service) = service();
        assert!(service.loans_for_customer(99).await.unwrap().is_empty());
    }
}
