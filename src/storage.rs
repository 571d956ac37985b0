use crate::errors::StoreError;
use crate::models::{
    new_user_id, DomainRecord, GlobalAggregate, SiteConfig, StoreData, StreakData, UserSettings,
};
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::{env, path::PathBuf, sync::Arc};
use tokio::{fs, sync::Mutex};
use tracing::error;

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("STREAK_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/streaks.json"))
}

#[derive(Clone)]
pub struct StreakStore {
    pub path: PathBuf,
    pub data: Arc<Mutex<StoreData>>,
}

impl StreakStore {
    pub fn new(path: PathBuf, data: StoreData) -> Self {
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn load(path: PathBuf) -> Self {
        let today = Local::now().date_naive();
        let data = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<StoreData>(&bytes) {
                Ok(mut data) => {
                    if data.user_id.is_empty() {
                        data.user_id = new_user_id();
                    }
                    data
                }
                Err(err) => {
                    error!("failed to parse streak data file: {err}");
                    StoreData::initial(today)
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::initial(today),
            Err(err) => {
                error!("failed to read streak data file: {err}");
                StoreData::initial(today)
            }
        };

        Self::new(path, data)
    }

    pub async fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(data)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> StoreData {
        self.data.lock().await.clone()
    }

    pub async fn record(&self, domain: &str) -> Option<DomainRecord> {
        self.data
            .lock()
            .await
            .streak_data
            .domains
            .get(domain)
            .cloned()
    }

    pub async fn config(&self, domain: &str) -> Option<SiteConfig> {
        self.data.lock().await.website_settings.get(domain).cloned()
    }

    pub async fn configs(&self) -> BTreeMap<String, SiteConfig> {
        self.data.lock().await.website_settings.clone()
    }

    pub async fn aggregate(&self) -> GlobalAggregate {
        self.data.lock().await.streak_data.aggregate.clone()
    }

    pub async fn settings(&self) -> UserSettings {
        self.data.lock().await.user_settings.clone()
    }

    // The local user id survives a wholesale overwrite from remote state.
    pub async fn replace(&self, incoming: StoreData) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let user_id = std::mem::take(&mut data.user_id);
        *data = incoming;
        if data.user_id.is_empty() {
            data.user_id = user_id;
        }
        self.persist(&data).await
    }

    pub async fn reset_all(&self, today: NaiveDate) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        data.streak_data = StreakData::initial(today);
        self.persist(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn temp_data_path() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "streak_store_{}_{}.json",
            std::process::id(),
            nanos
        ));
        path
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(offset)
    }

    #[tokio::test]
    async fn load_missing_file_starts_fresh() {
        let store = StreakStore::load(temp_data_path()).await;
        let data = store.snapshot().await;

        assert!(data.streak_data.domains.is_empty());
        assert!(data.website_settings.is_empty());
        assert!(data.user_settings.sync_enabled);
        assert!(data.user_id.starts_with("user-"));
    }

    #[tokio::test]
    async fn load_corrupt_file_starts_fresh() {
        let path = temp_data_path();
        fs::write(&path, b"not json").await.unwrap();

        let store = StreakStore::load(path).await;
        let data = store.snapshot().await;
        assert!(data.streak_data.domains.is_empty());
        assert!(!data.user_id.is_empty());
    }

    #[tokio::test]
    async fn persist_then_load_roundtrip() {
        let path = temp_data_path();
        let mut data = StoreData::initial(day(0));
        data.streak_data.domains.insert(
            "a.com".to_string(),
            DomainRecord {
                current_streak: 3,
                longest_streak: 5,
                total_days: 9,
                last_marked_date: Some(day(10)),
                history: Vec::new(),
                at_risk_warned: None,
            },
        );
        let user_id = data.user_id.clone();

        let store = StreakStore::new(path.clone(), data);
        let snapshot = store.snapshot().await;
        store.persist(&snapshot).await.unwrap();

        let reloaded = StreakStore::load(path).await;
        let record = reloaded.record("a.com").await.unwrap();
        assert_eq!(record.current_streak, 3);
        assert_eq!(record.longest_streak, 5);
        assert_eq!(record.last_marked_date, Some(day(10)));
        assert_eq!(reloaded.snapshot().await.user_id, user_id);
    }

    #[tokio::test]
    async fn reset_all_clears_records_but_keeps_configs() {
        let mut data = StoreData::initial(day(0));
        data.streak_data.domains.insert(
            "a.com".to_string(),
            DomainRecord {
                current_streak: 2,
                ..DomainRecord::default()
            },
        );
        data.streak_data.aggregate.total_days = 2;
        data.website_settings
            .insert("a.com".to_string(), SiteConfig::new(Utc::now()));
        data.user_settings.notifications_enabled = false;
        let user_id = data.user_id.clone();

        let store = StreakStore::new(temp_data_path(), data);
        store.reset_all(day(7)).await.unwrap();

        let data = store.snapshot().await;
        assert!(data.streak_data.domains.is_empty());
        assert_eq!(data.streak_data.aggregate.total_days, 0);
        assert_eq!(data.streak_data.aggregate.start_date, day(7));
        assert!(data.website_settings.contains_key("a.com"));
        assert!(!data.user_settings.notifications_enabled);
        assert_eq!(data.user_id, user_id);
    }

    #[tokio::test]
    async fn replace_retains_local_user_id() {
        let store = StreakStore::new(temp_data_path(), StoreData::initial(day(0)));
        let user_id = store.snapshot().await.user_id;

        let mut incoming = StoreData::initial(day(3));
        incoming.user_id = String::new();
        incoming.streak_data.aggregate.total_days = 12;
        store.replace(incoming).await.unwrap();

        let data = store.snapshot().await;
        assert_eq!(data.streak_data.aggregate.total_days, 12);
        assert_eq!(data.user_id, user_id);
    }
}
