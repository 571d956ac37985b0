use crate::errors::StoreError;
use crate::models::{
    DomainRecord, GlobalAggregate, HistoryEntry, MarkResponse, RecordResponse, SettingsUpdate,
    SiteConfig, StatusResponse, StoreData, StreakStatus, UserSettings,
};
use crate::notify::Notifier;
use crate::storage::StreakStore;
use crate::sync::{RemoteStore, SyncHandle};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const HISTORY_LIMIT: usize = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkDenial {
    NotEnabled,
    AlreadyMarked,
}

impl MarkDenial {
    pub fn message(self) -> &'static str {
        match self {
            MarkDenial::NotEnabled => "Streak tracking not enabled for this website",
            MarkDenial::AlreadyMarked => "Already marked for today on this website!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRiskStreak {
    pub domain: String,
    pub current_streak: u32,
}

pub fn mark_domain(
    data: &mut StoreData,
    domain: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<DomainRecord, MarkDenial> {
    let enabled = data
        .website_settings
        .get(domain)
        .map(|config| config.enabled)
        .unwrap_or(false);
    if !enabled {
        return Err(MarkDenial::NotEnabled);
    }

    let record = data
        .streak_data
        .domains
        .entry(domain.to_string())
        .or_default();
    if record.last_marked_date.is_some_and(|last| last >= today) {
        return Err(MarkDenial::AlreadyMarked);
    }

    let yesterday = today - Duration::days(1);
    match record.last_marked_date {
        Some(last) if last == yesterday => {
            record.current_streak = record.current_streak.saturating_add(1);
        }
        None => {
            record.current_streak = 1;
        }
        Some(_) if record.current_streak == 0 => {
            record.current_streak = 1;
        }
        Some(last) => {
            let gap_days = ((today - last).num_days() - 1).max(0) as u32;
            data.streak_data.aggregate.missed_days = data
                .streak_data
                .aggregate
                .missed_days
                .saturating_add(gap_days);
            record.current_streak = 1;
        }
    }

    record.last_marked_date = Some(today);
    record.total_days = record.total_days.saturating_add(1);
    record.longest_streak = record.longest_streak.max(record.current_streak);
    record.history.push(HistoryEntry {
        date: today,
        streak_day: record.current_streak,
        timestamp: now,
    });
    if record.history.len() > HISTORY_LIMIT {
        let excess = record.history.len() - HISTORY_LIMIT;
        record.history.drain(..excess);
    }
    let updated = record.clone();

    let aggregate = &mut data.streak_data.aggregate;
    aggregate.total_days = aggregate.total_days.saturating_add(1);
    aggregate.longest_streak = aggregate.longest_streak.max(updated.current_streak);
    aggregate.button_shown_today = true;
    aggregate.last_button_show_date = Some(today);

    if let Some(config) = data.website_settings.get_mut(domain) {
        config.total_marks = config.total_marks.saturating_add(1);
        config.last_marked = Some(today);
    }

    Ok(updated)
}

pub fn compute_status(data: &StoreData, domain: &str, today: NaiveDate) -> StatusResponse {
    let record = data
        .streak_data
        .domains
        .get(domain)
        .cloned()
        .unwrap_or_default();
    let enabled = data
        .website_settings
        .get(domain)
        .map(|config| config.enabled)
        .unwrap_or(false);
    let yesterday = today - Duration::days(1);

    let status = if record.last_marked_date == Some(today) {
        StreakStatus::Active
    } else if record.current_streak > 0 {
        if record.last_marked_date == Some(yesterday) {
            StreakStatus::Pending
        } else {
            StreakStatus::Broken
        }
    } else {
        StreakStatus::Inactive
    };

    let aggregate = &data.streak_data.aggregate;
    let days_since_start = ((today - aggregate.start_date).num_days() + 1).max(1) as u32;
    let success_rate = if record.total_days == 0 {
        0
    } else {
        ((f64::from(record.total_days) / f64::from(days_since_start)) * 100.0).round() as u32
    };

    StatusResponse {
        domain: domain.to_string(),
        status,
        current_streak: record.current_streak,
        longest_streak: record.longest_streak,
        total_days: record.total_days,
        success_rate,
        days_since_start,
        can_mark_today: record.last_marked_date != Some(today),
        enabled,
    }
}

pub fn should_prompt(data: &StoreData, domain: &str, today: NaiveDate) -> bool {
    let enabled = data
        .website_settings
        .get(domain)
        .map(|config| config.enabled)
        .unwrap_or(false);
    if !enabled {
        return false;
    }

    let marked_today = data
        .streak_data
        .domains
        .get(domain)
        .is_some_and(|record| record.last_marked_date == Some(today));
    if marked_today {
        return false;
    }

    let aggregate = &data.streak_data.aggregate;
    if aggregate.button_shown_today && aggregate.last_button_show_date == Some(today) {
        return false;
    }

    true
}

pub fn apply_rollover(data: &mut StoreData, today: NaiveDate) -> Option<Vec<AtRiskStreak>> {
    let aggregate = &mut data.streak_data.aggregate;
    if aggregate.last_rollover_date == Some(today) {
        return None;
    }
    aggregate.button_shown_today = false;
    aggregate.last_button_show_date = None;
    aggregate.last_rollover_date = Some(today);

    let yesterday = today - Duration::days(1);
    let mut at_risk = Vec::new();
    for (domain, record) in &mut data.streak_data.domains {
        if record.current_streak == 0 {
            continue;
        }
        let Some(last) = record.last_marked_date else {
            continue;
        };
        if last == today || last == yesterday {
            continue;
        }
        // One warning per lapse, not one per day of the lapse.
        if record.at_risk_warned == Some(last) {
            continue;
        }
        record.at_risk_warned = Some(last);
        at_risk.push(AtRiskStreak {
            domain: domain.clone(),
            current_streak: record.current_streak,
        });
    }

    Some(at_risk)
}

pub struct StreakEngine {
    store: StreakStore,
    notifier: Arc<dyn Notifier>,
    remote: Option<Arc<dyn RemoteStore>>,
    sync: SyncHandle,
}

impl StreakEngine {
    pub fn new(
        store: StreakStore,
        notifier: Arc<dyn Notifier>,
        remote: Option<Arc<dyn RemoteStore>>,
        sync: SyncHandle,
    ) -> Self {
        Self {
            store,
            notifier,
            remote,
            sync,
        }
    }

    pub async fn mark(&self, domain: &str) -> Result<MarkResponse, StoreError> {
        self.mark_on(domain, local_today(), Utc::now()).await
    }

    pub async fn mark_on(
        &self,
        domain: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<MarkResponse, StoreError> {
        let outcome = {
            let mut data = self.store.data.lock().await;
            match mark_domain(&mut data, domain, today, now) {
                Ok(record) => {
                    self.store.persist(&data).await?;
                    Ok((record, data.user_settings.notifications_enabled))
                }
                Err(denial) => Err(denial),
            }
        };

        match outcome {
            Ok((record, notifications_enabled)) => {
                if notifications_enabled {
                    self.notifier
                        .notify(
                            "Streak Marked!",
                            &format!("Day {} on {domain}!", record.current_streak),
                        )
                        .await;
                }
                self.sync.request_push();
                Ok(MarkResponse {
                    success: true,
                    message: format!("Streak marked! Day {}", record.current_streak),
                    record: Some(record),
                })
            }
            Err(denial) => {
                debug!("mark denied for {domain}: {}", denial.message());
                Ok(MarkResponse {
                    success: false,
                    message: denial.message().to_string(),
                    record: None,
                })
            }
        }
    }

    pub async fn status(&self, domain: &str) -> StatusResponse {
        self.status_on(domain, local_today()).await
    }

    pub async fn status_on(&self, domain: &str, today: NaiveDate) -> StatusResponse {
        let data = self.store.data.lock().await;
        compute_status(&data, domain, today)
    }

    pub async fn record(&self, domain: &str) -> RecordResponse {
        let data = self.store.data.lock().await;
        RecordResponse {
            domain: domain.to_string(),
            enabled: data
                .website_settings
                .get(domain)
                .map(|config| config.enabled)
                .unwrap_or(false),
            record: data
                .streak_data
                .domains
                .get(domain)
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub async fn prompt(&self, domain: &str) -> bool {
        self.prompt_on(domain, local_today()).await
    }

    pub async fn prompt_on(&self, domain: &str, today: NaiveDate) -> bool {
        let data = self.store.data.lock().await;
        should_prompt(&data, domain, today)
    }

    pub async fn list_configs(&self) -> BTreeMap<String, SiteConfig> {
        self.store.configs().await
    }

    pub async fn aggregate(&self) -> GlobalAggregate {
        self.store.aggregate().await
    }

    pub async fn settings(&self) -> UserSettings {
        self.store.settings().await
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<UserSettings, StoreError> {
        let settings = {
            let mut data = self.store.data.lock().await;
            if let Some(sync_enabled) = update.sync_enabled {
                data.user_settings.sync_enabled = sync_enabled;
            }
            if let Some(notifications_enabled) = update.notifications_enabled {
                data.user_settings.notifications_enabled = notifications_enabled;
            }
            if let Some(theme) = update.theme {
                data.user_settings.theme = theme;
            }
            self.store.persist(&data).await?;
            data.user_settings.clone()
        };
        self.sync.request_push();
        Ok(settings)
    }

    pub async fn set_enabled(&self, domain: &str, enabled: bool) -> Result<SiteConfig, StoreError> {
        let config = {
            let mut data = self.store.data.lock().await;
            let entry = data
                .website_settings
                .entry(domain.to_string())
                .or_insert_with(|| SiteConfig::new(Utc::now()));
            entry.enabled = enabled;
            let config = entry.clone();
            self.store.persist(&data).await?;
            config
        };
        self.sync.request_push();
        Ok(config)
    }

    pub async fn daily_rollover(&self) -> Result<(), StoreError> {
        self.daily_rollover_on(local_today()).await
    }

    pub async fn daily_rollover_on(&self, today: NaiveDate) -> Result<(), StoreError> {
        let outcome = {
            let mut data = self.store.data.lock().await;
            match apply_rollover(&mut data, today) {
                Some(at_risk) => {
                    self.store.persist(&data).await?;
                    Some((at_risk, data.user_settings.notifications_enabled))
                }
                None => None,
            }
        };

        let Some((at_risk, notifications_enabled)) = outcome else {
            debug!("daily rollover already ran for {today}");
            return Ok(());
        };

        if notifications_enabled {
            for streak in &at_risk {
                self.notifier
                    .notify(
                        "Streak at Risk!",
                        &format!(
                            "Your {}-day streak on {} needs attention!",
                            streak.current_streak, streak.domain
                        ),
                    )
                    .await;
            }
        }
        self.sync.request_push();
        Ok(())
    }

    pub async fn reset_all(&self) -> Result<(), StoreError> {
        self.reset_all_on(local_today()).await
    }

    pub async fn reset_all_on(&self, today: NaiveDate) -> Result<(), StoreError> {
        self.store.reset_all(today).await?;
        info!("streak data reset");
        self.sync.request_push();
        Ok(())
    }

    pub fn push_remote(&self) -> bool {
        if self.remote.is_none() {
            debug!("remote sync not configured, push skipped");
            return false;
        }
        self.sync.request_push();
        true
    }

    pub async fn pull_remote(&self) -> Result<bool, StoreError> {
        let Some(remote) = self.remote.as_ref() else {
            debug!("remote sync not configured, pull skipped");
            return Ok(false);
        };
        let user_id = self.store.data.lock().await.user_id.clone();
        match remote.fetch(&user_id).await {
            Ok(Some(document)) => {
                self.store.replace(document.into_store_data()).await?;
                info!("local streak state overwritten from remote");
                Ok(true)
            }
            Ok(None) => {
                debug!("no remote document for this user yet");
                Ok(false)
            }
            Err(err) => {
                warn!("remote sync pull failed: {err}");
                Ok(false)
            }
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
