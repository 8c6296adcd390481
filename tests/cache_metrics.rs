use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use talentdesk::application::repos::RepoError;
use talentdesk::application::snapshots::{CacheAsideRepository, SnapshotSource};
use talentdesk::cache::{CacheStore, MemoryCacheStore};
use talentdesk::domain::entities::{AdminProfile, AdminRecord, UserSummary};
use time::OffsetDateTime;
use uuid::Uuid;

struct SingleAdmin {
    user_id: Uuid,
}

#[async_trait]
impl SnapshotSource<AdminProfile> for SingleAdmin {
    async fn load_snapshot(&self, user_id: Uuid) -> Result<Option<AdminProfile>, RepoError> {
        if user_id != self.user_id {
            return Ok(None);
        }

        let now = OffsetDateTime::now_utc();
        Ok(Some(AdminProfile {
            admin: AdminRecord {
                id: Uuid::new_v4(),
                user_id,
                deleted: false,
                created_at: now,
                updated_at: now,
            },
            user: UserSummary {
                id: user_id,
                first_name: "Metrics".to_string(),
                last_name: "Admin".to_string(),
                email: "metrics@example.com".to_string(),
                field: None,
                level: None,
                is_email_verified: true,
                is_agreement_accepted: true,
                need_email_notification: false,
                created_at: now,
                updated_at: now,
            },
            information: None,
            roles: Vec::new(),
        }))
    }
}

#[tokio::test]
async fn snapshot_reads_emit_cache_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let user_id = Uuid::new_v4();
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
    let repo = CacheAsideRepository::new(Arc::new(SingleAdmin { user_id }), cache.clone());

    // miss then warm, hit, explicit refresh
    repo.get_or_warm(user_id).await.expect("warm");
    repo.get_or_warm(user_id).await.expect("hit");
    repo.refresh_cache(user_id).await.expect("refresh");

    // undecodable entries count as misses
    cache
        .set(&format!("admin-{user_id}"), "not json".to_string())
        .await
        .expect("overwrite");
    repo.get_by_id(user_id).await.expect("fallback read");

    let counters: Vec<(String, u64)> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((composite_key.key().name().to_string(), count)),
            _ => None,
        })
        .collect();
    let names: HashSet<&str> = counters.iter().map(|(name, _)| name.as_str()).collect();

    for metric in [
        "talentdesk_cache_hit_total",
        "talentdesk_cache_miss_total",
        "talentdesk_cache_refresh_total",
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }

    let total = |name: &str| -> u64 {
        counters
            .iter()
            .filter(|(metric, _)| metric == name)
            .map(|(_, count)| *count)
            .sum()
    };
    assert_eq!(total("talentdesk_cache_hit_total"), 1);
    assert_eq!(total("talentdesk_cache_miss_total"), 2);
    assert_eq!(total("talentdesk_cache_refresh_total"), 2);
}
