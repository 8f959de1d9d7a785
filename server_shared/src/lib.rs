use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod constants {
    pub const DEFAULT_LAST_ID: i64 = -1;
    pub const DEFAULT_LIMIT: i64 = 100;
}

/// Frames exchanged on `/api/websocket`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub enum PhaticMessage {
    Status(Event),
    Request(ListOptions),
    StatusList(EventList),
    TagRequest(TagListOptions),
    TagList(TagList),
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Event {
    pub message: String,
    pub tags: Vec<String>,
    pub app: String,

    pub epoch_seconds: i64,
}

impl Event {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.epoch_seconds, 0)
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct EventList {
    pub events: Vec<Event>,
    pub last_id: i64,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ListOptions {
    pub last_id: Option<i64>,
    pub limit: Option<i64>,
    /// Seconds the server may hold the request while nothing newer exists.
    pub wait: Option<u64>,
}

impl ListOptions {
    pub fn last_id_or_default(&self) -> i64 {
        self.last_id.unwrap_or(constants::DEFAULT_LAST_ID)
    }

    pub fn limit_or_default(&self) -> i64 {
        self.limit.unwrap_or(constants::DEFAULT_LIMIT)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TagListOptions {
    pub limit: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct TagList {
    pub tags: Vec<String>,
}

pub fn serialize<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

pub fn deserialize<'a, T: Deserialize<'a>>(value: &'a str) -> serde_json::Result<T> {
    serde_json::from_str(value)
}
