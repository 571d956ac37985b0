use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub streak_day: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DomainRecord {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: u32,
    pub last_marked_date: Option<NaiveDate>,
    pub history: Vec<HistoryEntry>,
    pub at_risk_warned: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalAggregate {
    pub total_days: u32,
    pub longest_streak: u32,
    pub missed_days: u32,
    pub start_date: NaiveDate,
    pub button_shown_today: bool,
    pub last_button_show_date: Option<NaiveDate>,
    pub last_rollover_date: Option<NaiveDate>,
}

impl GlobalAggregate {
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            start_date: today,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub enabled: bool,
    pub date_added: DateTime<Utc>,
    pub total_marks: u32,
    pub last_marked: Option<NaiveDate>,
}

impl SiteConfig {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            enabled: false,
            date_added: now,
            total_marks: 0,
            last_marked: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub sync_enabled: bool,
    pub notifications_enabled: bool,
    pub theme: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            notifications_enabled: true,
            theme: "duolingo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StreakData {
    pub aggregate: GlobalAggregate,
    pub domains: BTreeMap<String, DomainRecord>,
}

impl StreakData {
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            aggregate: GlobalAggregate::initial(today),
            domains: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreData {
    pub streak_data: StreakData,
    pub website_settings: BTreeMap<String, SiteConfig>,
    pub user_settings: UserSettings,
    pub user_id: String,
}

impl StoreData {
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            streak_data: StreakData::initial(today),
            website_settings: BTreeMap::new(),
            user_settings: UserSettings::default(),
            user_id: new_user_id(),
        }
    }
}

pub fn new_user_id() -> String {
    format!("user-{}", Uuid::new_v4())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakStatus {
    Active,
    Pending,
    Broken,
    Inactive,
}

#[derive(Debug, Deserialize)]
pub struct EnableRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub sync_enabled: Option<bool>,
    pub notifications_enabled: Option<bool>,
    pub theme: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkResponse {
    pub success: bool,
    pub message: String,
    pub record: Option<DomainRecord>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub domain: String,
    pub status: StreakStatus,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: u32,
    pub success_rate: u32,
    pub days_since_start: u32,
    pub can_mark_today: bool,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub domain: String,
    pub enabled: bool,
    pub record: DomainRecord,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub should_prompt: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncPushResponse {
    pub queued: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncPullResponse {
    pub pulled: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub reset: bool,
}
