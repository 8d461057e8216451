//! Database Module
//!
//! PostgreSQL (SQLx `PgPool`) 기반 `CreditRepository` 구현.
//!
//! - 커넥션 풀: 최대/최소 커넥션, 3초 acquire timeout
//! - 스키마: `migrations/` (`sqlx::migrate!`)
//! - id: `BIGSERIAL`. 대량 적재 후 `resync_id_sequences`로 시퀀스를 최대 id에 맞춘다.

mod models;
mod repository;

pub use models::*;
pub use repository::CreditRepository;
#[cfg(test)]
pub use repository::mock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, age, phone_number, monthly_salary, approved_limit, current_debt";

const LOAN_COLUMNS: &str = "id, customer_id, loan_amount, interest_rate, tenure, \
     monthly_installment, emis_paid_on_time, start_date, end_date";

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 설정값 (기본 10)
    /// - min_connections: 1
    /// - acquire_timeout: 3초
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await
            .context("failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CreditRepository for Database {
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_customer(&self, customer: &NewCustomer) -> Result<Customer> {
        let created = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (
                first_name, last_name, age, phone_number,
                monthly_salary, approved_limit, current_debt
            )
            VALUES ($1, $2, $3, $4, $5, $6, 0)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.age)
        .bind(&customer.phone_number)
        .bind(customer.monthly_salary)
        .bind(customer.approved_limit)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_loan(&self, id: i64) -> Result<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    async fn loans_for_customer(&self, customer_id: i64) -> Result<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE customer_id = $1 ORDER BY id"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    async fn insert_loan(&self, loan: &NewLoan) -> Result<Loan> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO loans (
                customer_id, loan_amount, interest_rate, tenure,
                monthly_installment, emis_paid_on_time, start_date, end_date
            )
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(loan.customer_id)
        .bind(loan.loan_amount)
        .bind(loan.interest_rate)
        .bind(loan.tenure)
        .bind(loan.monthly_installment)
        .bind(loan.start_date)
        .bind(loan.end_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE customers SET current_debt = current_debt + $1 WHERE id = $2")
            .bind(loan.loan_amount)
            .bind(loan.customer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn import_customer(&self, customer: &Customer) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers (
                id, first_name, last_name, age, phone_number,
                monthly_salary, approved_limit, current_debt
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#
        )
        .bind(customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.age)
        .bind(&customer.phone_number)
        .bind(customer.monthly_salary)
        .bind(customer.approved_limit)
        .bind(customer.current_debt)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn import_loan(&self, loan: &Loan) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO loans (
                id, customer_id, loan_amount, interest_rate, tenure,
                monthly_installment, emis_paid_on_time, start_date, end_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#
        )
        .bind(loan.id)
        .bind(loan.customer_id)
        .bind(loan.loan_amount)
        .bind(loan.interest_rate)
        .bind(loan.tenure)
        .bind(loan.monthly_installment)
        .bind(loan.emis_paid_on_time)
        .bind(loan.start_date)
        .bind(loan.end_date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn resync_id_sequences(&self) -> Result<()> {
        // 빈 테이블이면 is_called = false -> 다음 id는 1
        for table in ["customers", "loans"] {
            sqlx::query(&format!(
                r#"
                SELECT setval(
                    pg_get_serial_sequence('{table}', 'id'),
                    COALESCE((SELECT MAX(id) FROM {table}), 1),
                    (SELECT MAX(id) FROM {table}) IS NOT NULL
                )
                "#
            ))
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to resync id sequence of {table}"))?;
        }
        Ok(())
    }
}
