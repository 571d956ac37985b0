use crate::errors::SyncError;
use crate::models::{SiteConfig, StoreData, StreakData, UserSettings};
use crate::storage::StreakStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub streak_data: StreakData,
    pub website_settings: BTreeMap<String, SiteConfig>,
    pub user_settings: UserSettings,
    pub last_sync: DateTime<Utc>,
}

impl RemoteDocument {
    pub fn from_store(data: &StoreData, now: DateTime<Utc>) -> Self {
        Self {
            streak_data: data.streak_data.clone(),
            website_settings: data.website_settings.clone(),
            user_settings: data.user_settings.clone(),
            last_sync: now,
        }
    }

    pub fn into_store_data(self) -> StoreData {
        StoreData {
            streak_data: self.streak_data,
            website_settings: self.website_settings,
            user_settings: self.user_settings,
            user_id: String::new(),
        }
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<Option<RemoteDocument>, SyncError>;
    async fn merge(&self, user_id: &str, document: &RemoteDocument) -> Result<(), SyncError>;
}

pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn document_url(&self, user_id: &str) -> String {
        format!("{}/users/{user_id}", self.base_url)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self, user_id: &str) -> Result<Option<RemoteDocument>, SyncError> {
        let response = self.client.get(self.document_url(user_id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SyncError::Status(response.status()));
        }
        Ok(Some(response.json().await?))
    }

    async fn merge(&self, user_id: &str, document: &RemoteDocument) -> Result<(), SyncError> {
        let response = self
            .client
            .patch(self.document_url(user_id))
            .json(document)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SyncError::Status(response.status()));
        }
        Ok(())
    }
}

pub struct SyncHandle {
    tx: watch::Sender<u64>,
}

impl SyncHandle {
    // No worker attached; requests are accepted and dropped.
    pub fn detached() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    pub fn request_push(&self) {
        self.tx.send_modify(|generation| *generation += 1);
    }
}

// Requests made while an upload is in flight collapse into a single
// follow-up push of the latest snapshot.
pub fn spawn_push_worker(
    store: StreakStore,
    remote: Arc<dyn RemoteStore>,
) -> (SyncHandle, JoinHandle<()>) {
    let (tx, mut rx) = watch::channel(0u64);
    let task = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let data = store.snapshot().await;
            if !data.user_settings.sync_enabled {
                debug!("remote sync disabled in settings, push skipped");
                continue;
            }
            let document = RemoteDocument::from_store(&data, Utc::now());
            match remote.merge(&data.user_id, &document).await {
                Ok(()) => debug!("pushed streak state for {}", data.user_id),
                Err(err) => warn!("remote sync push failed: {err}"),
            }
        }
    });
    (SyncHandle { tx }, task)
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    enum FetchBehavior {
        #[default]
        Absent,
        Document(RemoteDocument),
        Fail,
    }

    #[derive(Default)]
    pub struct RecordingRemote {
        fetch_behavior: Mutex<FetchBehavior>,
        merged: Mutex<Vec<(String, RemoteDocument)>>,
    }

    impl RecordingRemote {
        pub fn with_document(document: RemoteDocument) -> Self {
            Self {
                fetch_behavior: Mutex::new(FetchBehavior::Document(document)),
                merged: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fetch_behavior: Mutex::new(FetchBehavior::Fail),
                merged: Mutex::new(Vec::new()),
            }
        }

        pub fn pushed(&self) -> Vec<(String, RemoteDocument)> {
            self.merged.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteStore for RecordingRemote {
        async fn fetch(&self, _user_id: &str) -> Result<Option<RemoteDocument>, SyncError> {
            match &*self.fetch_behavior.lock().unwrap() {
                FetchBehavior::Absent => Ok(None),
                FetchBehavior::Document(document) => Ok(Some(document.clone())),
                FetchBehavior::Fail => Err(SyncError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
            }
        }

        async fn merge(&self, user_id: &str, document: &RemoteDocument) -> Result<(), SyncError> {
            self.merged
                .lock()
                .unwrap()
                .push((user_id.to_string(), document.clone()));
            Ok(())
        }
    }
}
