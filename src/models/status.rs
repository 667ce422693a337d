use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 创建记录使用的操作人标记
pub const SYSTEM_ACTOR: &str = "system";

/// 申请状态
///
/// 三个状态之间任意可达, `Closed` 也可以重新打开。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum RequestStatus {
    #[serde(rename = "Open")]
    #[strum(serialize = "Open")]
    Open,
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    #[serde(rename = "Closed")]
    #[strum(serialize = "Closed")]
    Closed,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Open
    }
}

/// 状态历史 (只追加, 不修改)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub from_status: Option<RequestStatus>,
    pub to_status: RequestStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

/// 待写入的状态变更
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub from: Option<RequestStatus>,
    pub to: RequestStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

impl StatusChange {
    /// 创建申请时的首条记录: none -> Open, 操作人为 system
    pub fn creation(now: DateTime<Utc>) -> Self {
        Self {
            from: None,
            to: RequestStatus::Open,
            changed_at: now,
            changed_by: SYSTEM_ACTOR.to_string(),
        }
    }

    /// 计算状态迁移; 新旧状态相同时返回 None (不记录历史, 不更新时间)
    pub fn transition(
        current: RequestStatus,
        next: RequestStatus,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if current == next {
            return None;
        }
        Some(Self {
            from: Some(current),
            to: next,
            changed_at: now,
            changed_by: actor.to_string(),
        })
    }

    pub fn into_entry(self, id: i64) -> StatusHistoryEntry {
        StatusHistoryEntry {
            id,
            from_status: self.from,
            to_status: self.to,
            changed_at: self.changed_at,
            changed_by: self.changed_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_text_round_trips_through_strum() {
        assert_eq!(RequestStatus::InProgress.to_string(), "In Progress");
        assert_eq!(RequestStatus::from_str("Closed").unwrap(), RequestStatus::Closed);
        assert!(RequestStatus::from_str("closed").is_err());
    }

    #[test]
    fn status_serializes_with_display_names() {
        let json = serde_json::to_string(&RequestStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
    }

    #[test]
    fn creation_entry_has_no_previous_status() {
        let change = StatusChange::creation(Utc::now());
        assert_eq!(change.from, None);
        assert_eq!(change.to, RequestStatus::Open);
        assert_eq!(change.changed_by, SYSTEM_ACTOR);
    }

    #[test]
    fn same_status_is_a_noop() {
        let now = Utc::now();
        assert!(StatusChange::transition(RequestStatus::Open, RequestStatus::Open, "alice", now).is_none());
    }

    #[test]
    fn closed_can_be_reopened() {
        let change =
            StatusChange::transition(RequestStatus::Closed, RequestStatus::Open, "bob", Utc::now()).unwrap();
        assert_eq!(change.from, Some(RequestStatus::Closed));
        assert_eq!(change.to, RequestStatus::Open);
        assert_eq!(change.changed_by, "bob");
    }
}
