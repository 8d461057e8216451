//! Bulk Ingestion
//!
//! 고객/대출 시트(CSV 또는 xlsx/xls/ods 워크북)를 읽어 저장소에 적재한다.
//!
//! - 워크북은 첫 시트를 CSV로 변환한 뒤 같은 경로로 파싱
//! - 헤더 정규화: trim, lowercase, 공백 -> `_`
//! - primary key 기준 멱등: 이미 있는 id는 건너뜀
//! - 존재하지 않는 고객을 가리키는 대출 행은 경고 후 건너뜀
//! - 적재 후 id 시퀀스를 최대 id에 맞춤

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::db::{CreditRepository, Customer, Loan};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

#[derive(Debug, Deserialize)]
struct CustomerRow {
    customer_id: i64,
    first_name: String,
    last_name: String,
    age: f64,
    phone_number: String,
    monthly_salary: f64,
    approved_limit: f64,
}

#[derive(Debug, Deserialize)]
struct LoanRow {
    customer_id: i64,
    loan_id: i64,
    loan_amount: f64,
    tenure: f64,
    interest_rate: f64,
    monthly_payment: f64,
    emis_paid_on_time: f64,
    date_of_approval: String,
    end_date: String,
}

/// 적재 결과 집계
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub customers_inserted: usize,
    pub customers_skipped: usize,
    pub loans_inserted: usize,
    pub loans_skipped: usize,
    pub loans_orphaned: usize,
}

/// 헤더 정규화 ("Monthly Salary " -> "monthly_salary")
fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

fn reader_with_normalized_headers<R: Read>(source: R) -> Result<csv::Reader<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers: csv::StringRecord = reader
        .headers()
        .context("failed to read header row")?
        .iter()
        .map(normalize_header)
        .collect();
    reader.set_headers(headers);
    Ok(reader)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(datetime.date());
        }
    }
    bail!("unrecognized date: {raw:?}")
}

/// 전화번호가 숫자 셀로 export된 경우 ("9876543210.0") 정수 부분만 남긴다
fn clean_phone(raw: &str) -> String {
    raw.trim().strip_suffix(".0").unwrap_or(raw.trim()).to_string()
}

fn whole(value: f64, field: &str) -> Result<i32> {
    if value.fract() != 0.0 || value < 0.0 || value > i32::MAX as f64 {
        bail!("{field} must be a non-negative whole number, got {value}");
    }
    Ok(value as i32)
}

impl CustomerRow {
    fn into_customer(self) -> Result<Customer> {
        Ok(Customer {
            id: self.customer_id,
            first_name: self.first_name,
            last_name: self.last_name,
            age: whole(self.age, "age")?,
            phone_number: clean_phone(&self.phone_number),
            monthly_salary: self.monthly_salary,
            approved_limit: self.approved_limit.round() as i64,
            current_debt: 0.0,
        })
    }
}

impl LoanRow {
    fn into_loan(self) -> Result<Loan> {
        Ok(Loan {
            id: self.loan_id,
            customer_id: self.customer_id,
            loan_amount: self.loan_amount,
            interest_rate: self.interest_rate,
            tenure: whole(self.tenure, "tenure")?,
            monthly_installment: self.monthly_payment,
            emis_paid_on_time: whole(self.emis_paid_on_time, "emis_paid_on_time")?,
            start_date: parse_date(&self.date_of_approval)
                .context("invalid date_of_approval")?,
            end_date: parse_date(&self.end_date).context("invalid end_date")?,
        })
    }
}

pub fn read_customers<R: Read>(source: R) -> Result<Vec<Customer>> {
    let mut reader = reader_with_normalized_headers(source)?;
    reader
        .deserialize::<CustomerRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(anyhow::Error::from)
                .and_then(CustomerRow::into_customer)
                .with_context(|| format!("customer row {}", i + 2))
        })
        .collect()
}

pub fn read_loans<R: Read>(source: R) -> Result<Vec<Loan>> {
    let mut reader = reader_with_normalized_headers(source)?;
    reader
        .deserialize::<LoanRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(anyhow::Error::from)
                .and_then(LoanRow::into_loan)
                .with_context(|| format!("loan row {}", i + 2))
        })
        .collect()
}

// ============ Sheet Loading ============

/// 시트 파일을 CSV 바이트로 읽는다. 워크북이면 첫 시트를 변환한다.
pub fn load_sheet(path: &Path) -> Result<Vec<u8>> {
    if is_workbook(path) {
        workbook_to_csv(path)
    } else {
        std::fs::read(path).with_context(|| format!("cannot open {}", path.display()))
    }
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)))
}

fn workbook_to_csv(path: &Path) -> Result<Vec<u8>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("cannot open workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("{} has no sheets", path.display()))?
        .with_context(|| format!("cannot read first sheet of {}", path.display()))?;
    rows_to_csv(range.rows())
}

/// 셀 행 -> CSV. 완전히 빈 행은 버린다.
fn rows_to_csv<'a>(rows: impl Iterator<Item = &'a [Data]>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush sheet rows: {}", e.error()))
}

/// 날짜 셀은 `YYYY-MM-DD`, 숫자 셀은 `9876543210.0`이 아닌 `9876543210` 형태
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// 고객 -> 대출 순서로 적재하고 id 시퀀스를 맞춘다
pub async fn ingest<C: Read, L: Read>(
    store: &dyn CreditRepository,
    customers: C,
    loans: L,
) -> Result<IngestReport> {
    let customers = read_customers(customers)?;
    let loans = read_loans(loans)?;
    let mut report = IngestReport::default();

    for customer in &customers {
        if store.import_customer(customer).await? {
            report.customers_inserted += 1;
        } else {
            report.customers_skipped += 1;
        }
    }
    tracing::info!(
        inserted = report.customers_inserted,
        skipped = report.customers_skipped,
        "Customers ingested"
    );

    for loan in &loans {
        if store.find_customer(loan.customer_id).await?.is_none() {
            tracing::warn!(
                loan_id = loan.id,
                customer_id = loan.customer_id,
                "Skipping loan for unknown customer"
            );
            report.loans_orphaned += 1;
            continue;
        }
        if store.import_loan(loan).await? {
            report.loans_inserted += 1;
        } else {
            report.loans_skipped += 1;
        }
    }
    tracing::info!(
        inserted = report.loans_inserted,
        skipped = report.loans_skipped,
        orphaned = report.loans_orphaned,
        "Loans ingested"
    );

    store.resync_id_sequences().await?;
    Ok(report)
}
