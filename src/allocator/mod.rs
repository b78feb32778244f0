//! Account allocation
//!
//! Turns (owner key, request type) into a row of a cached partition.
//!
//! ## Direct mode
//!
//! When the request names a row (explicit row index, user id, uid, user
//! name or email) the row is looked up through the partition indices and
//! returned as-is after a quality check. Nothing is mutated.
//!
//! ## Auto mode
//!
//! Otherwise the [`groups`] for the request type are walked in rank order.
//! Each group's candidates are its status bucket, filtered to rows the
//! caller already owns or to unowned rows depending on the group. The first
//! candidate that passes [`quality::check_quality`] wins; lower ranks
//! always preempt higher ones.
//!
//! Candidates are read under the partition's shared lock. Claiming an
//! unowned row takes the exclusive lock and re-checks that the row is still
//! unowned before writing the owner key, so two racing callers can never
//! both claim it; the loser moves on to its next candidate.
//!
//! Rows that fail the quality check are flagged `Attention` with a note
//! naming the missing field and queued for write-back, which takes them out
//! of rotation.

pub mod groups;
pub mod quality;

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

pub use groups::{
    groups_for, response_for, stale_statuses, AccountStatus, PriorityGroup, RequestType,
    ResponseType,
};
pub use quality::{check_quality, MissingField};

use crate::cache::{IdentityField, Partition, PartitionData};
use crate::normalize::fold;
use crate::queue::WriteBackQueue;
use crate::record::columns::{EMAIL, NOTE, STATUS};
use crate::record::note::{self, NoteMode};
use crate::record::CellValue;

/// Explicit row selectors for direct mode.
#[derive(Debug, Clone, Default)]
pub struct DirectTarget {
    /// 1-based sheet row, the same coordinate responses report
    pub row_number: Option<usize>,
    pub user_id: Option<String>,
    pub uid: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
}

impl DirectTarget {
    /// True when any selector is present.
    pub fn is_set(&self) -> bool {
        self.row_number.is_some()
            || self.identities().any(|(_, v)| !fold(v).is_empty())
    }

    fn identities(&self) -> impl Iterator<Item = (IdentityField, &str)> {
        [
            (IdentityField::UserId, self.user_id.as_deref()),
            (IdentityField::Uid, self.uid.as_deref()),
            (IdentityField::UserName, self.user_name.as_deref()),
            (IdentityField::Email, self.email.as_deref()),
        ]
        .into_iter()
        .filter_map(|(f, v)| v.map(|v| (f, v)))
    }

    /// Resolve to a row offset. Row number wins, then identity keys in
    /// declaration order. Rows above the partition's data start or past its
    /// end resolve to nothing.
    pub fn resolve(&self, partition: &Partition, data: &PartitionData) -> Option<usize> {
        if let Some(row_number) = self.row_number {
            return partition
                .offset_of(row_number)
                .filter(|&index| index < data.len());
        }
        self.identities()
            .map(|(field, value)| (field, fold(value)))
            .filter(|(_, value)| !value.is_empty())
            .find_map(|(field, value)| data.find_identity(field, &value))
    }
}

/// One allocation request.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    /// Caller's owner key, raw form (written to the sheet as given)
    pub owner_key: String,
    pub request_type: RequestType,
    pub is_reset: bool,
    pub target: DirectTarget,
}

/// A row handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub row_index: usize,
    pub response_type: ResponseType,
    /// Set when the row's mailbox lives on a domain this service can read
    pub system_email_domain: Option<String>,
    /// Other rows of the same owner still marked live
    pub cleanup_indices: Vec<usize>,
    /// True when this request took ownership of a previously unowned row
    pub claimed: bool,
    /// True for direct-mode lookups
    pub direct: bool,
}

/// Result of [`Allocator::allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    Allocated(Allocation),
    /// No eligible row; a normal answer, not an error
    NotFound { reason: String },
}

/// Priority search plus optimistic claim.
#[derive(Debug, Clone, Default)]
pub struct Allocator {
    /// Folded domains whose mailboxes the service can read
    system_email_domains: Vec<String>,
}

impl Allocator {
    pub fn new(system_email_domains: &[String]) -> Self {
        Self {
            system_email_domains: system_email_domains
                .iter()
                .map(|d| fold(d.trim_start_matches('@')))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub async fn allocate(
        &self,
        partition: &Partition,
        request: &AllocationRequest,
        queue: &Arc<WriteBackQueue>,
    ) -> AllocationOutcome {
        if request.target.is_set() {
            self.allocate_direct(partition, request).await
        } else {
            self.allocate_auto(partition, request, queue).await
        }
    }

    async fn allocate_direct(
        &self,
        partition: &Partition,
        request: &AllocationRequest,
    ) -> AllocationOutcome {
        let data = partition.read().await;

        let Some(index) = request.target.resolve(partition, &data) else {
            return AllocationOutcome::NotFound {
                reason: "account not found".to_string(),
            };
        };
        let Some(record) = data.record(index) else {
            return AllocationOutcome::NotFound {
                reason: "account not found".to_string(),
            };
        };

        let response_type = response_for(data.status_of(index), request.request_type);
        if let Err(missing) = check_quality(record, request.request_type, response_type) {
            debug!(partition = %partition.key(), index, %missing, "Direct target failed quality check");
            return AllocationOutcome::NotFound {
                reason: format!("account is missing {}", missing),
            };
        }

        AllocationOutcome::Allocated(Allocation {
            row_index: index,
            response_type,
            system_email_domain: self.system_domain(&data, index),
            cleanup_indices: Vec::new(),
            claimed: false,
            direct: true,
        })
    }

    async fn allocate_auto(
        &self,
        partition: &Partition,
        request: &AllocationRequest,
        queue: &Arc<WriteBackQueue>,
    ) -> AllocationOutcome {
        let owner = fold(&request.owner_key);

        for group in groups_for(request.request_type) {
            let response_type = group
                .status
                .response_type()
                .unwrap_or_else(|| request.request_type.default_response());

            // Shared-lock pass: eligible candidates and their quality verdicts.
            let candidates: Vec<(usize, Result<(), MissingField>)> = {
                let data = partition.read().await;
                data.status_bucket(group.status.key())
                    .iter()
                    .copied()
                    .filter(|&i| {
                        let row_owner = data.owner_of(i);
                        if group.ownership_required {
                            row_owner == owner
                        } else {
                            row_owner.is_empty()
                        }
                    })
                    .filter_map(|i| {
                        data.record(i)
                            .map(|r| (i, check_quality(r, request.request_type, response_type)))
                    })
                    .collect()
            };

            for (index, verdict) in candidates {
                if let Err(missing) = verdict {
                    self.flag(partition, index, group.status, missing, queue).await;
                    continue;
                }

                let claimed = if group.ownership_required {
                    false
                } else {
                    let mut data = partition.write().await;
                    if data.status_of(index) != group.status.key() || !data.claim(index, &request.owner_key) {
                        debug!(partition = %partition.key(), index, "Lost claim race, trying next candidate");
                        continue;
                    }
                    true
                };

                let data = partition.read().await;
                let cleanup_indices =
                    data.owned_rows_with_status(&owner, &stale_statuses(request.is_reset), index);

                info!(
                    partition = %partition.key(),
                    index,
                    rank = group.rank,
                    status = group.status.key(),
                    claimed,
                    cleanup = cleanup_indices.len(),
                    "Account allocated"
                );

                return AllocationOutcome::Allocated(Allocation {
                    row_index: index,
                    response_type,
                    system_email_domain: self.system_domain(&data, index),
                    cleanup_indices,
                    claimed,
                    direct: false,
                });
            }
        }

        AllocationOutcome::NotFound {
            reason: "no account available".to_string(),
        }
    }

    /// Take a row that failed the quality check out of rotation.
    async fn flag(
        &self,
        partition: &Partition,
        index: usize,
        expected: AccountStatus,
        missing: MissingField,
        queue: &Arc<WriteBackQueue>,
    ) {
        let record = {
            let mut data = partition.write().await;
            // Another request may already have flagged or moved it.
            if data.status_of(index) != expected.key() {
                return;
            }
            let current_note = data.record(index).map(|r| r.text(NOTE)).unwrap_or_default();
            let note = note::rewrite(
                &current_note,
                &format!("Missing {}", missing),
                NoteMode::Updated,
                Local::now().naive_local(),
            );
            data.set_cell(index, STATUS, CellValue::text(AccountStatus::Attention.label()));
            data.set_cell(index, NOTE, CellValue::text(note));
            data.record(index).cloned()
        };

        if let Some(record) = record {
            warn!(partition = %partition.key(), index, %missing, "Account flagged for attention");
            queue.enqueue_update(&partition.key().sheet, index, record);
        }
    }

    fn system_domain(&self, data: &PartitionData, index: usize) -> Option<String> {
        let email = data.clean(index)?.get(EMAIL);
        let (_, domain) = email.rsplit_once('@')?;
        self.system_email_domains
            .iter()
            .any(|d| d == domain)
            .then(|| domain.to_string())
    }
}
