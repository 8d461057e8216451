//! Common Types Module
//!
//! 요청 파싱/검증에 쓰이는 공통 타입

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldErrors};

/// 요청 본문은 JSON 객체여야 한다
pub fn json_object(body: &Value) -> Result<&Map<String, Value>, ApiError> {
    body.as_object()
        .ok_or_else(|| ApiError::ValidationError("request body must be a JSON object".to_string()))
}

/// 전화번호. JSON 문자열과 숫자 모두 허용한다.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PhoneNumber {
    Text(String),
    Number(u64),
}

impl PhoneNumber {
    pub fn normalized(&self) -> String {
        match self {
            PhoneNumber::Text(s) => s.trim().to_string(),
            PhoneNumber::Number(n) => n.to_string(),
        }
    }

    /// 선택적 `+` 뒤 6~15자리 숫자
    pub fn is_valid(&self) -> bool {
        let normalized = self.normalized();
        let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
        (6..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
    }
}

/// 필드 검증 에러 수집기
///
/// ```rust,ignore
/// let mut v = Validator::new();
/// v.check(req.tenure >= 1, "tenure", "must be at least 1");
/// v.finish()?;
/// ```
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        }
        self
    }

    /// 필드 하나를 꺼내 역직렬화. 누락/null/타입 불일치는 해당 필드 에러로 쌓는다.
    pub fn field<T: DeserializeOwned>(&mut self, body: &Map<String, Value>, name: &str) -> Option<T> {
        match body.get(name) {
            None | Some(Value::Null) => {
                self.check(false, name, "This field is required.");
                None
            }
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    self.check(false, name, &e.to_string());
                    None
                }
            },
        }
    }

    pub fn positive(&mut self, value: f64, field: &str) -> &mut Self {
        self.check(value.is_finite() && value > 0.0, field, "must be a positive number")
    }

    pub fn non_negative(&mut self, value: f64, field: &str) -> &mut Self {
        self.check(value.is_finite() && value >= 0.0, field, "must be zero or greater")
    }

    pub fn not_blank(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "may not be blank")
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::InvalidFields(std::mem::take(&mut self.errors)))
        }
    }
}
