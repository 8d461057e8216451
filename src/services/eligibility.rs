//! Eligibility Evaluator
//!
//! 고객의 기존 대출 이력과 신규 대출 조건으로 승인 여부, 보정 금리,
//! 월 상환액(EMI)을 계산한다. I/O 없는 순수 함수만 둔다.
//!
//! # Decision Flow
//!
//! ```text
//! history ──► credit_score (0..=100)
//!                  │
//! history ──► EMI burden > 50% salary? ──yes──► reject (installment 0)
//!                  │ no
//!                  ▼
//!            score > 50   : approve @ requested rate
//!            30 < s <= 50 : approve @ max(rate, 12)
//!            10 < s <= 30 : approve @ max(rate, 16)
//!            s <= 10      : reject
//! ```

use chrono::{Datelike, NaiveDate};

use crate::db::{Customer, Loan};

/// 승인 한도 = 36 × 월 소득 (100,000 단위 반올림)
pub const LIMIT_INCOME_MULTIPLIER: f64 = 36.0;
pub const LIMIT_ROUNDING_UNIT: f64 = 100_000.0;

const BASE_SCORE: i64 = 100;
const PENALTY_PER_LOAN: i64 = 2;
const PENALTY_NOT_CURRENT: i64 = 5;
const PENALTY_CURRENT_YEAR: i64 = 5;

/// 기존 EMI 합계가 월 소득의 이 비율을 넘으면 즉시 거절
const MAX_EMI_TO_SALARY: f64 = 0.5;

/// 요청 조건 상한
pub const MAX_LOAN_AMOUNT: f64 = 1e12;
pub const MAX_ANNUAL_RATE: f64 = 100.0;
pub const MAX_TENURE_MONTHS: i32 = 600;

/// 신규 대출 조건
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanProposal {
    pub amount: f64,
    /// 요청 연이율 (%)
    pub interest_rate: f64,
    /// 기간 (개월)
    pub tenure: i32,
}

/// 거절 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// 기존 EMI 합계가 월 소득의 50% 초과
    EmiBurden,
    /// 신용 점수 10 이하
    LowCreditScore,
}

impl RejectionReason {
    pub fn describe(&self) -> &'static str {
        match self {
            RejectionReason::EmiBurden => "sum of current EMIs exceeds 50% of monthly salary",
            RejectionReason::LowCreditScore => "credit score too low",
        }
    }
}

/// 평가 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityDecision {
    pub approved: bool,
    /// 내부 점수. 응답에는 포함하지 않는다.
    pub credit_score: u8,
    pub corrected_interest_rate: f64,
    /// 승인 시 EMI (소수점 2자리), 거절 시 0
    pub monthly_installment: f64,
    pub rejection: Option<RejectionReason>,
}

/// 등록 시 승인 한도 계산
///
/// 100,000 단위 반올림은 half-to-even (예: 450,000 -> 400,000).
pub fn approved_limit(monthly_income: f64) -> i64 {
    let units = (LIMIT_INCOME_MULTIPLIER * monthly_income / LIMIT_ROUNDING_UNIT).round_ties_even();
    (units * LIMIT_ROUNDING_UNIT) as i64
}

/// 대출 이력 기반 신용 점수 (0..=100)
///
/// 기존 원금 합계가 승인 한도를 넘으면 0.
pub fn credit_score(approved_limit: i64, history: &[Loan], today: NaiveDate) -> u8 {
    let total_principal: f64 = history.iter().map(|l| l.loan_amount).sum();
    if total_principal > approved_limit as f64 {
        return 0;
    }

    let current_year = today.year();
    let not_current = history
        .iter()
        .filter(|l| l.emis_paid_on_time < l.tenure)
        .count() as i64;
    let this_year = history
        .iter()
        .filter(|l| l.start_date.year() == current_year)
        .count() as i64;

    let score = BASE_SCORE
        - PENALTY_PER_LOAN * history.len() as i64
        - PENALTY_NOT_CURRENT * not_current
        - PENALTY_CURRENT_YEAR * this_year;

    score.clamp(0, BASE_SCORE) as u8
}

/// 원리금 균등 상환 월 납입액 (소수점 2자리)
///
/// `r = annual_rate / 1200`, `emi = P·r·(1+r)^n / ((1+r)^n − 1)`.
/// `(1+r)^n − 1`은 `exp_m1(n·ln_1p(r))`로 계산한다.
/// 분모가 0에 붙으면 (금리 0 포함) 원금 / 기간, `(1+r)^n`이 발산하면 `P·r`.
pub fn monthly_installment(principal: f64, annual_rate: f64, tenure: i32) -> f64 {
    let n = tenure.max(1) as f64;
    let r = annual_rate / 1200.0;
    let growth_minus_one = (n * r.ln_1p()).exp_m1();

    let emi = if growth_minus_one == f64::INFINITY {
        principal * r
    } else if growth_minus_one.is_finite() && growth_minus_one > 0.0 {
        principal * r * (growth_minus_one + 1.0) / growth_minus_one
    } else {
        principal / n
    };

    round_cents(emi)
}

fn round_cents(value: f64) -> f64 {
    let cents = value * 100.0;
    if cents.is_finite() {
        cents.round() / 100.0
    } else {
        value
    }
}

/// 금리 보정 구간
fn rate_for_score(score: u8, requested: f64) -> Option<f64> {
    match score {
        51..=u8::MAX => Some(requested),
        31..=50 => Some(requested.max(12.0)),
        11..=30 => Some(requested.max(16.0)),
        _ => None,
    }
}

/// 승인 여부, 보정 금리, EMI 계산
pub fn evaluate(
    customer: &Customer,
    history: &[Loan],
    proposal: &LoanProposal,
    today: NaiveDate,
) -> EligibilityDecision {
    let score = credit_score(customer.approved_limit, history, today);

    // 비정상(NaN/inf) EMI 기록이 있으면 부담 초과로 본다
    let current_emis: f64 = history.iter().map(|l| l.monthly_installment).sum();
    if !current_emis.is_finite() || current_emis > MAX_EMI_TO_SALARY * customer.monthly_salary {
        return EligibilityDecision {
            approved: false,
            credit_score: score,
            corrected_interest_rate: proposal.interest_rate,
            monthly_installment: 0.0,
            rejection: Some(RejectionReason::EmiBurden),
        };
    }

    match rate_for_score(score, proposal.interest_rate) {
        Some(rate) => EligibilityDecision {
            approved: true,
            credit_score: score,
            corrected_interest_rate: rate,
            monthly_installment: monthly_installment(proposal.amount, rate, proposal.tenure),
            rejection: None,
        },
        None => EligibilityDecision {
            approved: false,
            credit_score: score,
            corrected_interest_rate: proposal.interest_rate,
            monthly_installment: 0.0,
            rejection: Some(RejectionReason::LowCreditScore),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn customer(monthly_salary: f64, approved_limit: i64) -> Customer {
        Customer {
            id: 1,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            age: 30,
            phone_number: "9999999999".to_string(),
            monthly_salary,
            approved_limit,
            current_debt: 0.0,
        }
    }

    /// 완납, 과거 연도 시작 대출 (점수 -2만 적용)
    fn settled_loan(id: i64, amount: f64, emi: f64) -> Loan {
        Loan {
            id,
            customer_id: 1,
            loan_amount: amount,
            interest_rate: 10.0,
            tenure: 12,
            monthly_installment: emi,
            emis_paid_on_time: 12,
            start_date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
        }
    }

    /// 미납 + 올해 시작 대출 (점수 -12)
    fn risky_loan(id: i64, amount: f64, emi: f64) -> Loan {
        Loan {
            emis_paid_on_time: 1,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2027, 1, 10).unwrap(),
            ..settled_loan(id, amount, emi)
        }
    }

    fn proposal(rate: f64) -> LoanProposal {
        LoanProposal { amount: 100_000.0, interest_rate: rate, tenure: 12 }
    }

    #[test]
    fn test_installment_standard_amortization() {
        assert_eq!(monthly_installment(100_000.0, 12.0, 12), 8884.88);
    }

    #[test]
    fn test_installment_zero_rate_is_linear() {
        assert_eq!(monthly_installment(120_000.0, 0.0, 12), 10_000.0);
        assert_eq!(monthly_installment(100.0, 0.0, 3), 33.33);
    }

    #[test]
    fn test_installment_tiny_rate_stays_finite() {
        // 1 + r == 1 in f64
        let emi = monthly_installment(100_000.0, 1e-14, 12);
        assert!(emi.is_finite());
        assert_eq!(emi, 8333.33);

        let emi = monthly_installment(100_000.0, 1e-300, 600);
        assert_eq!(emi, 166.67);
    }

    #[test]
    fn test_installment_huge_growth_tends_to_interest_only() {
        // (1 + r)^n 발산 -> P·r
        let emi = monthly_installment(100_000.0, 1e6, 120);
        assert!(emi.is_finite());
        assert_eq!(emi, 83_333_333.33);

        let emi = monthly_installment(100_000.0, MAX_ANNUAL_RATE, MAX_TENURE_MONTHS);
        assert!(emi.is_finite());
        assert_eq!(emi, 8333.33);
    }

    #[test]
    fn test_non_finite_history_emi_counts_as_burden() {
        let history = vec![settled_loan(1, 10_000.0, f64::NAN)];
        let decision = evaluate(&customer(10_000.0, 400_000), &history, &proposal(10.0), today());

        assert!(!decision.approved);
        assert_eq!(decision.rejection, Some(RejectionReason::EmiBurden));
        assert_eq!(decision.monthly_installment, 0.0);
    }

    #[test]
    fn test_approved_limit_rounding() {
        // 36 * 50,000 = 1,800,000
        assert_eq!(approved_limit(50_000.0), 1_800_000);
        // 36 * 40,000 = 1,440,000 -> 1,400,000
        assert_eq!(approved_limit(40_000.0), 1_400_000);
        // 36 * 41,500 = 1,494,000 -> 1,500,000
        assert_eq!(approved_limit(41_500.0), 1_500_000);
        // 36 * 12,500 = 450,000 (정확히 4.5 단위) -> 짝수 쪽
        assert_eq!(approved_limit(12_500.0), 400_000);
    }

    #[test]
    fn test_no_history_scores_100_and_approves_at_requested_rate() {
        let decision = evaluate(&customer(50_000.0, 1_800_000), &[], &proposal(10.0), today());

        assert_eq!(decision.credit_score, 100);
        assert!(decision.approved);
        assert_eq!(decision.corrected_interest_rate, 10.0);
        assert_eq!(decision.monthly_installment, monthly_installment(100_000.0, 10.0, 12));
        assert_eq!(decision.rejection, None);
    }

    #[test]
    fn test_score_penalties() {
        let history = vec![settled_loan(1, 1000.0, 10.0), risky_loan(2, 1000.0, 10.0)];
        // 100 - 2*2 - 5 (미납) - 5 (올해)
        assert_eq!(credit_score(1_000_000, &history, today()), 86);
    }

    #[test]
    fn test_score_zero_when_principal_exceeds_limit() {
        let history = vec![settled_loan(1, 600_000.0, 10.0), settled_loan(2, 600_000.0, 10.0)];
        assert_eq!(credit_score(1_000_000, &history, today()), 0);

        let decision = evaluate(&customer(50_000.0, 1_000_000), &history, &proposal(10.0), today());
        assert!(!decision.approved);
        assert_eq!(decision.credit_score, 0);
        assert_eq!(decision.monthly_installment, 0.0);
        assert_eq!(decision.rejection, Some(RejectionReason::LowCreditScore));
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let history: Vec<Loan> = (1..=20).map(|id| risky_loan(id, 10.0, 0.0)).collect();
        // 100 - 20*12 < 0
        assert_eq!(credit_score(1_000_000, &history, today()), 0);
    }

    #[test]
    fn test_emi_burden_short_circuits() {
        // 기존 EMI 30,000 > 50% of 50,000
        let history = vec![settled_loan(1, 10_000.0, 30_000.0)];
        let decision = evaluate(&customer(50_000.0, 1_800_000), &history, &proposal(9.5), today());

        assert!(!decision.approved);
        assert_eq!(decision.corrected_interest_rate, 9.5);
        assert_eq!(decision.monthly_installment, 0.0);
        assert_eq!(decision.rejection, Some(RejectionReason::EmiBurden));
        // 점수는 높아도 거절
        assert_eq!(decision.credit_score, 98);
    }

    #[test]
    fn test_emi_burden_exactly_half_is_allowed() {
        let history = vec![settled_loan(1, 10_000.0, 25_000.0)];
        let decision = evaluate(&customer(50_000.0, 1_800_000), &history, &proposal(9.5), today());
        assert!(decision.approved);
    }

    #[test]
    fn test_rate_tiers() {
        assert_eq!(rate_for_score(51, 8.0), Some(8.0));
        assert_eq!(rate_for_score(50, 8.0), Some(12.0));
        assert_eq!(rate_for_score(31, 14.0), Some(14.0));
        assert_eq!(rate_for_score(30, 8.0), Some(16.0));
        assert_eq!(rate_for_score(11, 18.0), Some(18.0));
        assert_eq!(rate_for_score(10, 8.0), None);
        assert_eq!(rate_for_score(0, 8.0), None);
    }

    #[test]
    fn test_middle_tier_corrects_rate_and_recomputes_emi() {
        // 점수 100 - 5*12 = 40
        let history: Vec<Loan> = (1..=5).map(|id| risky_loan(id, 1000.0, 10.0)).collect();
        let decision = evaluate(&customer(50_000.0, 1_800_000), &history, &proposal(8.0), today());

        assert_eq!(decision.credit_score, 40);
        assert!(decision.approved);
        assert_eq!(decision.corrected_interest_rate, 12.0);
        assert_eq!(decision.monthly_installment, 8884.88);
    }

    #[test]
    fn test_low_tier_corrects_rate_to_sixteen() {
        // 점수 100 - 7*12 = 16
        let history: Vec<Loan> = (1..=7).map(|id| risky_loan(id, 1000.0, 10.0)).collect();
        let decision = evaluate(&customer(50_000.0, 1_800_000), &history, &proposal(8.0), today());

        assert_eq!(decision.credit_score, 16);
        assert!(decision.approved);
        assert_eq!(decision.corrected_interest_rate, 16.0);
    }

    #[test]
    fn test_current_year_follows_today() {
        let history = vec![risky_loan(1, 1000.0, 10.0)];
        let next_year = NaiveDate::from_ymd_opt(2027, 2, 1).unwrap();
        // 올해: 100 - 2 - 5 - 5, 내년: 올해 패널티 없음
        assert_eq!(credit_score(1_000_000, &history, today()), 88);
        assert_eq!(credit_score(1_000_000, &history, next_year), 93);
    }
}
