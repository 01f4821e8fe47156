// 📒 Ledger - Domain validation around every storage call
//
// Each operation validates input, runs in exactly one transaction, and returns
// either the persisted record or a classified LedgerError. Nothing above this
// layer sees a rusqlite error.

use tracing::{error, info, warn};

use crate::db::{self, Database};
use crate::entities::{
    Contribution, Member, MemberContribution, MemberPatch, NewContribution, NewMember,
};
use crate::error::{classify, LedgerError, LedgerResult};

pub const DEFAULT_SKIP: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 10;

const MEMBER_NOT_FOUND: &str = "Member not found";
const CONTRIBUTION_NOT_FOUND: &str = "Contribution not found";
const NO_CONTRIBUTIONS: &str = "No contributions found for this member";

pub struct Ledger {
    db: Database,
}

impl Ledger {
    pub fn new(db: Database) -> Self {
        Ledger { db }
    }

    /// Ledger over a fresh in-memory store
    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Ledger::new(Database::open_in_memory()?))
    }

    /// Release the underlying store
    pub fn close(self) -> anyhow::Result<()> {
        self.db.close()
    }

    // ========================================================================
    // MEMBERS
    // ========================================================================

    pub fn create_member(&self, input: NewMember) -> LedgerResult<Member> {
        input.validate()?;

        let result = self.db.with_transaction(|tx| {
            db::insert_member(tx, &input).map_err(|e| {
                classify(e, || {
                    format!("Member with national_id '{}' already exists", input.national_id)
                })
            })
        });

        log_outcome("create_member", &result);
        if let Ok(member) = &result {
            info!(member_id = member.id, "member created");
        }
        result
    }

    pub fn list_members(&self, skip: i64, limit: i64) -> LedgerResult<Vec<Member>> {
        if skip < 0 {
            return Err(LedgerError::Invalid("skip must be >= 0".to_string()));
        }
        if limit < 1 {
            return Err(LedgerError::Invalid("limit must be >= 1".to_string()));
        }

        self.db
            .with_transaction(|tx| Ok(db::list_members(tx, skip, limit)?))
    }

    pub fn get_member(&self, id: i64) -> LedgerResult<Member> {
        self.db.with_transaction(|tx| {
            db::get_member(tx, id)?.ok_or_else(|| LedgerError::NotFound(MEMBER_NOT_FOUND.to_string()))
        })
    }

    /// Partial update: fields absent from `patch` keep their stored value
    pub fn update_member(&self, id: i64, patch: MemberPatch) -> LedgerResult<Member> {
        patch.validate()?;
        let new_national_id = patch.national_id.clone();

        let result = self.db.with_transaction(|tx| {
            db::update_member(tx, id, patch)
                .map_err(|e| {
                    classify(e, || {
                        format!(
                            "Member with national_id '{}' already exists",
                            new_national_id.as_deref().unwrap_or_default()
                        )
                    })
                })?
                .ok_or_else(|| LedgerError::NotFound(MEMBER_NOT_FOUND.to_string()))
        });

        log_outcome("update_member", &result);
        result
    }

    /// Removes the member and, by cascade, all of their contributions
    pub fn delete_member(&self, id: i64) -> LedgerResult<()> {
        let result = self.db.with_transaction(|tx| {
            if db::delete_member(tx, id)? {
                Ok(())
            } else {
                Err(LedgerError::NotFound(MEMBER_NOT_FOUND.to_string()))
            }
        });

        log_outcome("delete_member", &result);
        if result.is_ok() {
            info!(member_id = id, "member deleted");
        }
        result
    }

    // ========================================================================
    // CONTRIBUTIONS
    // ========================================================================

    /// The member must exist; a missing member is NotFound whatever the amount
    /// or month, and never a constraint error
    pub fn add_contribution(&self, input: NewContribution) -> LedgerResult<Contribution> {
        let result = self.db.with_transaction(|tx| {
            if db::get_member(tx, input.member_id)?.is_none() {
                return Err(LedgerError::NotFound(MEMBER_NOT_FOUND.to_string()));
            }
            input.validate()?;

            db::insert_contribution(tx, &input).map_err(|e| {
                classify(e, || {
                    format!(
                        "Duplicate contribution for member_id '{}' for month '{}' with amount '{}': a contribution for this month already exists",
                        input.member_id, input.month, input.amount
                    )
                })
            })
        });

        log_outcome("add_contribution", &result);
        if let Ok(contribution) = &result {
            info!(
                contribution_id = contribution.id,
                member_id = contribution.member_id,
                month = %contribution.month,
                "contribution recorded"
            );
        }
        result
    }

    pub fn get_contribution(&self, id: i64) -> LedgerResult<Contribution> {
        self.db.with_transaction(|tx| {
            db::get_contribution(tx, id)?
                .ok_or_else(|| LedgerError::NotFound(CONTRIBUTION_NOT_FOUND.to_string()))
        })
    }

    /// Join view of a member's contributions.
    ///
    /// A member with zero contributions is reported as NotFound, the same as a
    /// member that does not exist.
    pub fn member_contributions(&self, member_id: i64) -> LedgerResult<Vec<MemberContribution>> {
        self.db.with_transaction(|tx| {
            let not_found = || LedgerError::NotFound(NO_CONTRIBUTIONS.to_string());

            let member = db::get_member(tx, member_id)?.ok_or_else(not_found)?;
            let contributions = db::get_contributions_for_member(tx, member_id)?;
            if contributions.is_empty() {
                return Err(not_found());
            }

            Ok(contributions
                .into_iter()
                .map(|c| MemberContribution::from_parts(c, &member))
                .collect())
        })
    }
}

fn log_outcome<T>(operation: &str, result: &LedgerResult<T>) {
    match result {
        Err(LedgerError::Internal(msg)) => error!(operation, error = %msg, "storage failure"),
        Err(err) => warn!(operation, kind = err.kind(), error = %err, "request rejected"),
        Ok(_) => {}
    }
}
