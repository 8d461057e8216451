//! Database Models
//!
//! Customer and loan rows. Amounts are stored as `DOUBLE PRECISION`,
//! the approved limit as a whole `BIGINT`.

use chrono::NaiveDate;
use sqlx::FromRow;

/// 등록된 고객
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub phone_number: String,

    /// 월 소득
    pub monthly_salary: f64,

    /// 승인 한도 (등록 시점에 36 × 월 소득으로 고정)
    pub approved_limit: i64,

    /// 현재 부채 (승인된 대출 원금 누적)
    pub current_debt: f64,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 대출 기록
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Loan {
    pub id: i64,
    pub customer_id: i64,

    /// 원금
    pub loan_amount: f64,

    /// 실제 적용된 연이율 (%)
    pub interest_rate: f64,

    /// 기간 (개월)
    pub tenure: i32,

    /// 월 상환액 (EMI)
    pub monthly_installment: f64,

    /// 기한 내 납부 횟수
    pub emis_paid_on_time: i32,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Loan {
    /// 남은 상환 횟수
    pub fn repayments_left(&self) -> i32 {
        (self.tenure - self.emis_paid_on_time).max(0)
    }
}

/// 신규 고객 (id는 저장소가 할당)
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub phone_number: String,
    pub monthly_salary: f64,
    pub approved_limit: i64,
}

/// 신규 대출 (id는 저장소가 할당)
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub customer_id: i64,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub tenure: i32,
    pub monthly_installment: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(tenure: i32, paid: i32) -> Loan {
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        Loan {
            id: 1,
            customer_id: 1,
            loan_amount: 1000.0,
            interest_rate: 10.0,
            tenure,
            monthly_installment: 100.0,
            emis_paid_on_time: paid,
            start_date: day,
            end_date: day,
        }
    }

    #[test]
    fn test_repayments_left() {
        assert_eq!(loan(12, 4).repayments_left(), 8);
        assert_eq!(loan(12, 15).repayments_left(), 0);
    }
}
