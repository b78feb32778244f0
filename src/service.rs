//! Account service
//!
//! Request-level operations on top of the cache, allocator and write-back
//! queues: lookup-or-claim, mutate and cache clear. Each operation verifies
//! the caller's token and validates its input before touching the cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::allocator::{
    AccountStatus, Allocation, AllocationOutcome, AllocationRequest, Allocator, DirectTarget,
    RequestType, ResponseType,
};
use crate::auth::{AuthVerdict, Authenticator};
use crate::cache::{CacheStats, Partition, PartitionCache};
use crate::normalize::fold;
use crate::queue::{QueueStats, WriteBackRegistry};
use crate::record::columns::{column_index, NOTE, STATUS};
use crate::record::note::{self, NoteMode};
use crate::record::{CellValue, Record, RecordView};
use crate::types::{GatehouseError, Result};

// ============================================================================
// Requests
// ============================================================================

/// Body of a lookup-or-claim request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_id: Option<String>,
    #[serde(default, rename = "type")]
    pub request_type: Option<String>,
    #[serde(default)]
    pub sheet: Option<String>,
    /// 1-based sheet row, as returned in `row_number`
    #[serde(default)]
    pub row_index: Option<usize>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default)]
    pub reset: bool,
}

impl ClaimRequest {
    fn target(&self) -> DirectTarget {
        DirectTarget {
            row_number: self.row_index,
            user_id: self.user_id.clone(),
            uid: self.uid.clone(),
            user_name: self.user_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Body of a mutate request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub sheet: Option<String>,
    /// 1-based sheet row, as returned in `row_number`
    #[serde(default)]
    pub row_index: Option<usize>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    /// Column name -> new value
    #[serde(default)]
    pub updates: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub note: Option<String>,
}

impl UpdateRequest {
    fn target(&self) -> DirectTarget {
        DirectTarget {
            row_number: self.row_index,
            user_id: self.user_id.clone(),
            uid: self.uid.clone(),
            user_name: self.user_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Body of a cache clear request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub token: String,
}

/// Accept identity values sent as strings, numbers or booleans.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

// ============================================================================
// Responses
// ============================================================================

/// Answer to claim and mutate requests
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub status: bool,
    pub message: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_email_domain: Option<String>,
    #[serde(flatten)]
    pub record: Option<RecordView>,
}

impl AccountResponse {
    pub fn success(
        message: impl Into<String>,
        response_type: Option<ResponseType>,
        row_number: usize,
        record: &Record,
    ) -> Self {
        Self {
            status: true,
            message: message.into(),
            response_type,
            row_number: Some(row_number),
            system_email_domain: None,
            record: Some(record.view()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            response_type: None,
            row_number: None,
            system_email_domain: None,
            record: None,
        }
    }
}

/// Answer to a cache clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub status: bool,
    pub message: String,
    pub partitions_dropped: usize,
    pub rows_flushed: usize,
    pub failed_sheets: Vec<String>,
}

/// Cache and queue counters
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub cache: CacheStats,
    pub queues: Vec<QueueStats>,
}

// ============================================================================
// Service
// ============================================================================

/// Account operations shared by all request handlers
pub struct AccountService {
    cache: Arc<PartitionCache>,
    queues: Arc<WriteBackRegistry>,
    auth: Arc<dyn Authenticator>,
    allocator: Allocator,
    default_sheet: String,
}

impl AccountService {
    pub fn new(
        cache: Arc<PartitionCache>,
        queues: Arc<WriteBackRegistry>,
        auth: Arc<dyn Authenticator>,
        allocator: Allocator,
        default_sheet: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            queues,
            auth,
            allocator,
            default_sheet: default_sheet.into(),
        }
    }

    pub fn cache(&self) -> &Arc<PartitionCache> {
        &self.cache
    }

    pub fn queues(&self) -> &Arc<WriteBackRegistry> {
        &self.queues
    }

    /// Lookup-or-claim.
    ///
    /// An empty pool is not an error: it answers `status: false` with
    /// "no account available".
    pub async fn claim(&self, request: ClaimRequest) -> Result<AccountResponse> {
        let verdict = self.authorize(&request.token).await?;

        let owner_key = request
            .device_id
            .as_deref()
            .map(str::trim)
            .filter(|d| !fold(d).is_empty())
            .ok_or_else(|| GatehouseError::BadRequest("device_id is required".into()))?
            .to_string();
        let request_type = match request.request_type.as_deref() {
            None => RequestType::Auto,
            Some(raw) => RequestType::parse(raw)
                .ok_or_else(|| GatehouseError::BadRequest(format!("unknown type: {}", raw)))?,
        };
        let sheet = self.sheet_name(request.sheet.as_deref());

        let partition = self.cache.get(&verdict.store_id, &sheet, false).await?;
        let queue = self.queues.queue(&verdict.store_id);

        let allocation_request = AllocationRequest {
            owner_key: owner_key.clone(),
            request_type,
            is_reset: request.reset,
            target: request.target(),
        };

        let allocation = match self
            .allocator
            .allocate(&partition, &allocation_request, &queue)
            .await
        {
            AllocationOutcome::Allocated(allocation) => allocation,
            AllocationOutcome::NotFound { reason } => {
                debug!(store_id = %verdict.store_id, %sheet, %reason, "No account allocated");
                return Ok(AccountResponse::failure(reason));
            }
        };

        if allocation.direct {
            let data = partition.read().await;
            let record = data
                .record(allocation.row_index)
                .ok_or_else(|| GatehouseError::Internal("allocated row vanished".into()))?;
            let mut response = AccountResponse::success(
                "account found",
                Some(allocation.response_type),
                partition.row_number(allocation.row_index),
                record,
            );
            response.system_email_domain = allocation.system_email_domain;
            return Ok(response);
        }

        let Some(winner) = self
            .commit_claim(&partition, &owner_key, &allocation, request.reset, &queue)
            .await
        else {
            return Ok(AccountResponse::failure("no account available"));
        };

        info!(
            store_id = %verdict.store_id,
            %sheet,
            row = partition.row_number(allocation.row_index),
            claimed = allocation.claimed,
            released = allocation.cleanup_indices.len(),
            "Account handed out"
        );

        let mut response = AccountResponse::success(
            "account allocated",
            Some(allocation.response_type),
            partition.row_number(allocation.row_index),
            &winner,
        );
        response.system_email_domain = allocation.system_email_domain;
        Ok(response)
    }

    /// Mark the allocated row active, release the caller's stale rows and
    /// queue everything that changed. Returns the winner's new state, or
    /// `None` if the row no longer belongs to the caller.
    async fn commit_claim(
        &self,
        partition: &Partition,
        owner_key: &str,
        allocation: &Allocation,
        is_reset: bool,
        queue: &Arc<crate::queue::WriteBackQueue>,
    ) -> Option<Record> {
        let owner = fold(owner_key);
        let now = Local::now().naive_local();
        let mode = if is_reset { NoteMode::Reset } else { NoteMode::Claim };
        let active = AccountStatus::active_for(allocation.response_type);

        let (winner, released) = {
            let mut data = partition.write().await;
            let index = allocation.row_index;
            if data.owner_of(index) != owner {
                warn!(partition = %partition.key(), index, "Allocated row changed owner before commit");
                return None;
            }

            let current = data.record(index).map(|r| r.text(NOTE)).unwrap_or_default();
            let status_line = format!("{} on {}", active.label(), owner_key);
            data.set_cell(index, STATUS, CellValue::text(active.label()));
            data.set_cell(index, NOTE, CellValue::text(note::rewrite(&current, &status_line, mode, now)));

            let mut released = Vec::new();
            for &stale in &allocation.cleanup_indices {
                if data.owner_of(stale) != owner {
                    continue;
                }
                let Some(status) = AccountStatus::from_key(data.status_of(stale)) else {
                    continue;
                };
                let downgraded = status.downgraded();
                let current = data.record(stale).map(|r| r.text(NOTE)).unwrap_or_default();
                data.set_cell(stale, STATUS, CellValue::text(downgraded.label()));
                data.set_cell(
                    stale,
                    NOTE,
                    CellValue::text(note::rewrite(&current, downgraded.label(), NoteMode::New, now)),
                );
                if let Some(record) = data.record(stale) {
                    released.push((stale, record.clone()));
                }
            }

            (data.record(index).cloned()?, released)
        };

        let sheet = &partition.key().sheet;
        queue.enqueue_update(sheet, allocation.row_index, winner.clone());
        for (index, record) in released {
            queue.enqueue_update(sheet, index, record);
        }
        Some(winner)
    }

    /// Apply column updates to one located row.
    pub async fn mutate(&self, request: UpdateRequest) -> Result<AccountResponse> {
        let verdict = self.authorize(&request.token).await?;

        if request.updates.is_empty() && request.note.is_none() {
            return Err(GatehouseError::BadRequest("nothing to update".into()));
        }
        let target = request.target();
        if !target.is_set() {
            return Err(GatehouseError::BadRequest(
                "row_index or a search key is required".into(),
            ));
        }
        let updates: Vec<(usize, CellValue)> = request
            .updates
            .iter()
            .map(|(name, value)| {
                column_index(name)
                    .map(|column| (column, CellValue::from_json(value)))
                    .ok_or_else(|| GatehouseError::BadRequest(format!("unknown column: {}", name)))
            })
            .collect::<Result<_>>()?;
        let sheet = self.sheet_name(request.sheet.as_deref());

        let partition = self.cache.get(&verdict.store_id, &sheet, false).await?;
        let queue = self.queues.queue(&verdict.store_id);

        let (index, record) = {
            let mut data = partition.write().await;
            let index = target
                .resolve(&partition, &data)
                .ok_or_else(|| GatehouseError::NotFound("account not found".into()))?;

            for (column, value) in updates {
                data.set_cell(index, column, value);
            }
            if let Some(text) = request.note.as_deref() {
                let current = data.record(index).map(|r| r.text(NOTE)).unwrap_or_default();
                let rewritten =
                    note::rewrite(&current, text, NoteMode::Updated, Local::now().naive_local());
                data.set_cell(index, NOTE, CellValue::text(rewritten));
            }

            let record = data
                .record(index)
                .cloned()
                .ok_or_else(|| GatehouseError::Internal("located row vanished".into()))?;
            (index, record)
        };

        queue.enqueue_update(&sheet, index, record.clone());
        info!(
            store_id = %verdict.store_id,
            %sheet,
            row = partition.row_number(index),
            columns = request.updates.len(),
            "Account updated"
        );

        Ok(AccountResponse::success(
            "account updated",
            None,
            partition.row_number(index),
            &record,
        ))
    }

    /// Flush pending writes for the caller's store, then drop its partitions.
    pub async fn clear_cache(&self, request: ClearRequest) -> Result<ClearResponse> {
        let verdict = self.authorize(&request.token).await?;
        if !verdict.is_admin() {
            return Err(GatehouseError::Forbidden("admin role required".into()));
        }

        let report = self
            .queues
            .flush_store(&verdict.store_id)
            .await
            .unwrap_or_default();
        let dropped = self.cache.clear_store(&verdict.store_id);

        info!(
            store_id = %verdict.store_id,
            partitions = dropped,
            rows_flushed = report.rows_written + report.rows_appended,
            "Cache cleared"
        );

        Ok(ClearResponse {
            status: true,
            message: "cache cleared".to_string(),
            partitions_dropped: dropped,
            rows_flushed: report.rows_written + report.rows_appended,
            failed_sheets: report.failed_sheets,
        })
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            cache: self.cache.stats(),
            queues: self.queues.stats(),
        }
    }

    async fn authorize(&self, token: &str) -> Result<AuthVerdict> {
        let verdict = self.auth.verify(token).await;
        if verdict.valid {
            Ok(verdict)
        } else {
            Err(GatehouseError::Unauthorized(verdict.message))
        }
    }

    fn sheet_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_sheet)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, TokenRegistry};
    use crate::cache::CacheConfig;
    use crate::queue::QueueConfig;
    use crate::record::columns::{DEVICE_ID, EMAIL, PASSWORD, USER_ID};
    use crate::store::{MemoryStore, Row};
    use std::time::Duration;

    const SHEET: &str = "Accounts";

    fn row(status: &str, owner: &str, email: &str) -> Row {
        let mut record = Record::blank();
        record.set(STATUS, CellValue::text(status));
        record.set(DEVICE_ID, CellValue::text(owner));
        record.set(EMAIL, CellValue::text(email));
        record.set(PASSWORD, CellValue::text("pw"));
        record.cells().to_vec()
    }

    async fn service(rows: Vec<Row>) -> (AccountService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.seed("s1", SHEET, 11, rows).await;

        let registry = TokenRegistry::dev("admin-token", "s1");
        registry.insert("op-token", "s1", Role::Operator);

        let queues = Arc::new(WriteBackRegistry::new(
            store.clone(),
            QueueConfig {
                flush_delay: Duration::from_secs(60),
                data_start_row: 11,
            },
        ));
        let cache = Arc::new(
            PartitionCache::new(store.clone(), CacheConfig::default())
                .with_write_back(Arc::clone(&queues)),
        );
        let service = AccountService::new(
            cache,
            queues,
            Arc::new(registry),
            Allocator::default(),
            SHEET,
        );
        (service, store)
    }

    fn claim(device: &str, kind: &str) -> ClaimRequest {
        ClaimRequest {
            token: "op-token".into(),
            device_id: Some(device.into()),
            request_type: Some(kind.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_claim_marks_row_running_and_queues_it() {
        let (service, store) = service(vec![
            row("Waiting", "", "a@x.com"),
            row("Waiting", "", "b@x.com"),
        ])
        .await;

        let response = service.claim(claim("dev-1", "login")).await.unwrap();
        assert!(response.status);
        assert_eq!(response.row_number, Some(11));
        assert_eq!(response.response_type, Some(ResponseType::Login));
        let view = response.record.unwrap();
        assert_eq!(view.auth["status"], "Running");
        assert_eq!(view.auth["device_id"], "dev-1");
        assert!(view.auth["note"].starts_with("Running on dev-1\n#1 | "));

        // nothing written until the queue flushes
        assert_eq!(store.update_calls(), 0);
        service.queues().flush_store("s1").await.unwrap();
        let written = store.row("s1", SHEET, 11).await.unwrap();
        assert_eq!(written[STATUS], CellValue::text("Running"));
        assert_eq!(written[DEVICE_ID], CellValue::text("dev-1"));
    }

    #[tokio::test]
    async fn test_claimed_row_stays_claimed_across_reload() {
        let (service, store) = service(vec![row("Waiting", "", "a@x.com")]).await;

        let first = service.claim(claim("dev-1", "login")).await.unwrap();
        assert_eq!(first.row_number, Some(11));

        service.cache().get("s1", SHEET, true).await.unwrap();
        assert_eq!(store.fetch_calls(), 2);

        let second = service.claim(claim("dev-2", "login")).await.unwrap();
        assert!(!second.status);
        assert_eq!(second.message, "no account available");

        // the first device still gets its row back
        let again = service.claim(claim("dev-1", "login")).await.unwrap();
        assert_eq!(again.row_number, Some(11));
    }

    #[tokio::test]
    async fn test_claimed_row_number_addresses_same_row_on_update() {
        let rows = (0..15)
            .map(|i| row("Waiting", "", &format!("u{}@x.com", i)))
            .collect();
        let (service, _store) = service(rows).await;

        let claimed = service.claim(claim("dev-1", "login")).await.unwrap();
        let row_number = claimed.row_number.unwrap();
        assert_eq!(claimed.record.unwrap().auth["email"], "u0@x.com");

        let mut update = UpdateRequest {
            token: "op-token".into(),
            row_index: Some(row_number),
            ..Default::default()
        };
        update.updates.insert("status".into(), serde_json::json!("Completed"));
        let updated = service.mutate(update).await.unwrap();

        assert_eq!(updated.row_number, Some(row_number));
        let view = updated.record.unwrap();
        assert_eq!(view.auth["email"], "u0@x.com");
        assert_eq!(view.auth["status"], "Completed");
    }

    #[tokio::test]
    async fn test_repeat_claim_bumps_counter_on_same_row() {
        let (service, _store) = service(vec![row("Waiting", "", "a@x.com")]).await;

        service.claim(claim("dev-1", "login")).await.unwrap();
        let again = service.claim(claim("dev-1", "login")).await.unwrap();

        assert_eq!(again.row_number, Some(11));
        let note = &again.record.unwrap().auth["note"];
        assert!(note.contains("#2 | "), "note was {:?}", note);
    }

    #[tokio::test]
    async fn test_claim_releases_stale_rows() {
        let (service, _store) = service(vec![
            row("Registering", "dev-1", "a@x.com"),
            row("Waiting", "", "b@x.com"),
        ])
        .await;

        let response = service.claim(claim("dev-1", "login")).await.unwrap();
        assert_eq!(response.row_number, Some(12));

        let partition = service.cache().get("s1", SHEET, false).await.unwrap();
        let data = partition.read().await;
        assert_eq!(data.status_of(0), "waiting registration");
        assert_eq!(data.record(0).unwrap().text(NOTE), "Waiting registration");
        assert_eq!(data.status_of(1), "running");
        drop(data);

        let stats = &service.status().queues[0];
        assert_eq!(stats.pending_updates, 2);
    }

    #[tokio::test]
    async fn test_claim_empty_pool_is_not_an_error() {
        let (service, _store) = service(vec![row("Completed", "", "a@x.com")]).await;
        let response = service.claim(claim("dev-1", "login")).await.unwrap();
        assert!(!response.status);
        assert_eq!(response.message, "no account available");
        assert!(response.record.is_none());
    }

    #[tokio::test]
    async fn test_claim_validation_happens_before_cache_work() {
        let (service, store) = service(vec![row("Waiting", "", "a@x.com")]).await;

        let mut missing_device = claim("  ", "login");
        missing_device.device_id = Some("  ".into());
        assert!(matches!(
            service.claim(missing_device).await,
            Err(GatehouseError::BadRequest(_))
        ));
        assert!(matches!(
            service.claim(claim("dev-1", "teleport")).await,
            Err(GatehouseError::BadRequest(_))
        ));
        let mut bad_token = claim("dev-1", "login");
        bad_token.token = "nope".into();
        assert!(matches!(
            service.claim(bad_token).await,
            Err(GatehouseError::Unauthorized(_))
        ));

        assert_eq!(store.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_direct_lookup_by_user_id() {
        let mut target = row("Running", "dev-9", "a@x.com");
        target[USER_ID] = CellValue::Number(777.0);
        let (service, _store) = service(vec![row("Waiting", "", "b@x.com"), target]).await;

        let request: ClaimRequest = serde_json::from_value(serde_json::json!({
            "token": "op-token",
            "device_id": "dev-1",
            "type": "login",
            "user_id": 777
        }))
        .unwrap();
        let response = service.claim(request).await.unwrap();

        assert!(response.status);
        assert_eq!(response.row_number, Some(12));
        let view = response.record.unwrap();
        assert_eq!(view.auth["device_id"], "dev-9");
        assert_eq!(service.status().queues.len(), 1);
        assert_eq!(service.status().queues[0].pending_updates, 0);
    }

    #[tokio::test]
    async fn test_mutate_updates_columns_and_note() {
        let (service, store) = service(vec![row("Running", "dev-1", "a@x.com")]).await;

        let request: UpdateRequest = serde_json::from_value(serde_json::json!({
            "token": "op-token",
            "email": "A@X.com",
            "updates": { "Status": "Completed", "posts_today": 12 },
            "note": "Done for today"
        }))
        .unwrap();
        let response = service.mutate(request).await.unwrap();
        assert!(response.status);
        let view = response.record.unwrap();
        assert_eq!(view.auth["status"], "Completed");
        assert_eq!(view.activity["posts_today"], "12");
        assert!(view.auth["note"].starts_with("Done for today\n#1 | "));

        service.queues().flush_store("s1").await.unwrap();
        let written = store.row("s1", SHEET, 11).await.unwrap();
        assert_eq!(written[STATUS], CellValue::text("Completed"));
    }

    #[tokio::test]
    async fn test_mutate_rejects_unknown_column_and_missing_row() {
        let (service, _store) = service(vec![row("Running", "dev-1", "a@x.com")]).await;

        let mut request = UpdateRequest {
            token: "op-token".into(),
            row_index: Some(11),
            ..Default::default()
        };
        request.updates.insert("not_a_column".into(), serde_json::json!("x"));
        assert!(matches!(
            service.mutate(request.clone()).await,
            Err(GatehouseError::BadRequest(_))
        ));

        request.updates.clear();
        request.updates.insert("status".into(), serde_json::json!("Waiting"));
        request.row_index = Some(40);
        assert!(matches!(
            service.mutate(request).await,
            Err(GatehouseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_cache_requires_admin_and_flushes_first() {
        let (service, store) = service(vec![row("Waiting", "", "a@x.com")]).await;
        service.claim(claim("dev-1", "login")).await.unwrap();
        assert_eq!(service.status().cache.partitions, 1);

        let denied = service
            .clear_cache(ClearRequest {
                token: "op-token".into(),
            })
            .await;
        assert!(matches!(denied, Err(GatehouseError::Forbidden(_))));

        let cleared = service
            .clear_cache(ClearRequest {
                token: "admin-token".into(),
            })
            .await
            .unwrap();
        assert_eq!(cleared.partitions_dropped, 1);
        assert_eq!(cleared.rows_flushed, 1);
        assert_eq!(service.status().cache.partitions, 0);
        assert_eq!(store.update_calls(), 1);
    }

    #[test]
    fn test_failure_response_shape() {
        let body = serde_json::to_value(AccountResponse::failure("no account available")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "status": false, "message": "no account available" })
        );
    }
}
