// 💰 Contribution Entity - One monthly payment by one member
//
// (member_id, month) is UNIQUE: a member pays at most once per calendar month.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Member;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: i64,
    pub member_id: i64,
    pub amount: f64,
    pub month: String,
}

/// Body of `POST /contributions/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContribution {
    pub member_id: i64,
    pub amount: f64,
    pub month: String,
}

impl NewContribution {
    pub fn new(member_id: i64, amount: f64, month: &str) -> Self {
        NewContribution {
            member_id,
            amount,
            month: month.to_string(),
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(LedgerError::Invalid(format!(
                "amount must be a non-negative number, got {}",
                self.amount
            )));
        }
        if !is_calendar_month(&self.month) {
            return Err(LedgerError::Invalid(format!(
                "month must look like YYYY-MM, got '{}'",
                self.month
            )));
        }
        Ok(())
    }
}

/// "2023-10" style token naming a real month
pub fn is_calendar_month(month: &str) -> bool {
    let bytes = month.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    if !bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || b.is_ascii_digit())
    {
        return false;
    }
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").is_ok()
}

// ============================================================================
// JOIN VIEW
// ============================================================================

/// Row of `GET /members/{id}/contributions`.
/// `member_id` carries the member's national_id, not the internal numeric id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberContribution {
    pub id: i64,
    pub member_name: String,
    pub member_id: String,
    pub amount: f64,
    pub month: String,
}

impl MemberContribution {
    pub fn from_parts(contribution: Contribution, member: &Member) -> Self {
        MemberContribution {
            id: contribution.id,
            member_name: member.name.clone(),
            member_id: member.national_id.clone(),
            amount: contribution.amount,
            month: contribution.month,
        }
    }
}
