//! Loan Endpoints
//!
//! 적격성 확인, 대출 생성, 대출 조회.
//! 평가 로직은 `services::eligibility`에 있고 여기서는 입출력만 다룬다.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    db::Loan,
    error::ApiError,
    services::{
        eligibility::{MAX_ANNUAL_RATE, MAX_LOAN_AMOUNT, MAX_TENURE_MONTHS},
        LoanOutcome, LoanProposal,
    },
    types::{json_object, Validator},
    AppState,
};

// ============ Request/Response Types ============

/// 적격성 확인 / 대출 생성 공통 요청
#[derive(Debug)]
pub struct LoanRequest {
    pub customer_id: i64,
    pub loan_amount: f64,
    /// 요청 연이율 (%)
    pub interest_rate: f64,
    /// 기간 (개월)
    pub tenure: i32,
}

impl LoanRequest {
    fn from_json(body: &Value) -> Result<Self, ApiError> {
        let body = json_object(body)?;
        let mut v = Validator::new();

        let customer_id: Option<i64> = v.field(body, "customer_id");
        let loan_amount: Option<f64> = v.field(body, "loan_amount");
        let interest_rate: Option<f64> = v.field(body, "interest_rate");
        let tenure: Option<i32> = v.field(body, "tenure");

        if let Some(id) = customer_id {
            v.check(id > 0, "customer_id", "must be a positive id");
        }
        if let Some(amount) = loan_amount {
            v.positive(amount, "loan_amount").check(
                amount <= MAX_LOAN_AMOUNT,
                "loan_amount",
                "must not exceed 1000000000000",
            );
        }
        if let Some(rate) = interest_rate {
            v.non_negative(rate, "interest_rate").check(
                rate <= MAX_ANNUAL_RATE,
                "interest_rate",
                "must not exceed 100",
            );
        }
        if let Some(tenure) = tenure {
            v.check(
                (1..=MAX_TENURE_MONTHS).contains(&tenure),
                "tenure",
                "must be between 1 and 600 months",
            );
        }
        v.finish()?;

        match (customer_id, loan_amount, interest_rate, tenure) {
            (Some(customer_id), Some(loan_amount), Some(interest_rate), Some(tenure)) => Ok(Self {
                customer_id,
                loan_amount,
                interest_rate,
                tenure,
            }),
            _ => Err(ApiError::InternalError),
        }
    }

    fn proposal(&self) -> LoanProposal {
        LoanProposal {
            amount: self.loan_amount,
            interest_rate: self.interest_rate,
            tenure: self.tenure,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    pub customer_id: i64,
    pub approval: bool,
    pub interest_rate: f64,
    pub corrected_interest_rate: f64,
    pub tenure: i32,
    pub monthly_installment: f64,
}

#[derive(Debug, Serialize)]
pub struct CreateLoanResponse {
    /// 거절 시 null
    pub loan_id: Option<i64>,
    pub customer_id: i64,
    pub approval: bool,
    pub interest_rate: f64,
    pub corrected_interest_rate: f64,
    pub tenure: i32,
    pub monthly_installment: f64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoanDetail {
    pub loan_id: i64,
    pub customer_id: i64,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub monthly_installment: f64,
    pub tenure: i32,
}

#[derive(Debug, Serialize)]
pub struct LoanSummary {
    pub loan_id: i64,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub monthly_installment: f64,
    pub tenure: i32,
    pub repayments_left: i32,
}

impl From<Loan> for LoanDetail {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.id,
            customer_id: loan.customer_id,
            loan_amount: loan.loan_amount,
            interest_rate: loan.interest_rate,
            monthly_installment: loan.monthly_installment,
            tenure: loan.tenure,
        }
    }
}

impl From<Loan> for LoanSummary {
    fn from(loan: Loan) -> Self {
        Self {
            repayments_left: loan.repayments_left(),
            loan_id: loan.id,
            loan_amount: loan.loan_amount,
            interest_rate: loan.interest_rate,
            monthly_installment: loan.monthly_installment,
            tenure: loan.tenure,
        }
    }
}

impl From<LoanOutcome> for CreateLoanResponse {
    fn from(outcome: LoanOutcome) -> Self {
        let message = match (&outcome.loan, outcome.decision.rejection) {
            (Some(_), _) => "Loan approved".to_string(),
            (None, Some(reason)) => format!("Loan not approved: {}", reason.describe()),
            (None, None) => "Loan not approved".to_string(),
        };

        Self {
            loan_id: outcome.loan.map(|l| l.id),
            customer_id: outcome.customer_id,
            approval: outcome.decision.approved,
            interest_rate: outcome.proposal.interest_rate,
            corrected_interest_rate: outcome.decision.corrected_interest_rate,
            tenure: outcome.proposal.tenure,
            monthly_installment: outcome.decision.monthly_installment,
            message,
        }
    }
}

// ============ Handlers ============

/// POST /api/check-eligibility
///
/// 평가만 하고 저장하지 않는다.
pub async fn check_eligibility(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<EligibilityResponse>, ApiError> {
    let Json(body) = payload?;
    let req = LoanRequest::from_json(&body)?;

    let outcome = state
        .lending
        .check_eligibility(req.customer_id, req.proposal())
        .await?;

    Ok(Json(EligibilityResponse {
        customer_id: outcome.customer.id,
        approval: outcome.decision.approved,
        interest_rate: req.interest_rate,
        corrected_interest_rate: outcome.decision.corrected_interest_rate,
        tenure: req.tenure,
        monthly_installment: outcome.decision.monthly_installment,
    }))
}

/// POST /api/create-loan
///
/// 승인 시 대출을 저장하고 `loan_id`를 반환한다.
pub async fn create_loan(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreateLoanResponse>, ApiError> {
    let Json(body) = payload?;
    let req = LoanRequest::from_json(&body)?;

    let outcome = state
        .lending
        .create_loan(req.customer_id, req.proposal())
        .await?;

    Ok(Json(outcome.into()))
}

/// GET /api/view-loan/:loan_id
pub async fn view_loan(
    State(state): State<AppState>,
    loan_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<LoanDetail>, ApiError> {
    let Path(loan_id) =
        loan_id.map_err(|_| ApiError::invalid_field("loan_id", "must be an integer id"))?;
    let loan = state.lending.view_loan(loan_id).await?;
    Ok(Json(loan.into()))
}

/// GET /api/view-loans/:customer_id
///
/// 대출이 없으면 빈 배열 (에러 아님)
pub async fn view_loans(
    State(state): State<AppState>,
    customer_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<LoanSummary>>, ApiError> {
    let Path(customer_id) = customer_id
        .map_err(|_| ApiError::invalid_field("customer_id", "must be an integer id"))?;
    let loans = state.lending.loans_for_customer(customer_id).await?;
    Ok(Json(loans.into_iter().map(LoanSummary::from).collect()))
}
