// 👤 Member Entity - Club participant with a unique national identifier
//
// `id` is assigned by storage and never changes.
// `national_id` is externally issued and UNIQUE across all members.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// MEMBER RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub national_id: String,
    pub date_joined: NaiveDate,
}

impl Member {
    /// Apply only the fields present in `patch`
    pub fn apply(&mut self, patch: MemberPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(national_id) = patch.national_id {
            self.national_id = national_id;
        }
        if let Some(date_joined) = patch.date_joined {
            self.date_joined = date_joined;
        }
    }
}

// ============================================================================
// INPUTS
// ============================================================================

/// Body of `POST /members`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub national_id: String,
    pub date_joined: NaiveDate,
}

impl NewMember {
    pub fn new(name: &str, national_id: &str, date_joined: NaiveDate) -> Self {
        NewMember {
            name: name.to_string(),
            national_id: national_id.to_string(),
            date_joined,
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        require_text("name", &self.name)?;
        require_text("national_id", &self.national_id)
    }
}

/// Body of `PUT|PATCH /members/{id}`. Absent (or null) fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberPatch {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub national_id: Option<String>,

    #[serde(default)]
    pub date_joined: Option<NaiveDate>,
}

impl MemberPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.national_id.is_none() && self.date_joined.is_none()
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(national_id) = &self.national_id {
            require_text("national_id", national_id)?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> LedgerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::Invalid(format!("{} must not be blank", field)));
    }
    Ok(())
}
