use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The authenticated teacher a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub user_id: String,
    pub class_id: Option<String>,
    pub name: String,
    pub birthday: Option<NaiveDate>,
    pub photo: Option<String>,
    pub parent_contact: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub grade: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    YesNo,
    Count,
    Number,
}

impl MissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionKind::YesNo => "yes_no",
            MissionKind::Count => "count",
            MissionKind::Number => "number",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes_no" => Some(MissionKind::YesNo),
            "count" => Some(MissionKind::Count),
            "number" => Some(MissionKind::Number),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionConfig {
    #[serde(rename = "type")]
    pub kind: MissionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub config: MissionConfig,
    pub talent_reward: i64,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A recorded result value: counts and numbers arrive as JSON numbers,
/// yes/no answers sometimes as booleans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Bool(bool),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ResultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionCompletion {
    pub id: String,
    pub student_id: String,
    pub mission_id: String,
    pub user_id: String,
    pub completion_date: NaiveDate,
    pub result: CompletionResult,
    pub talent_earned: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalentEntryKind {
    Earned,
    Spent,
}

impl TalentEntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TalentEntryKind::Earned => "earned",
            TalentEntryKind::Spent => "spent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalentSource {
    Mission,
    Other,
}

impl TalentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            TalentSource::Mission => "mission",
            TalentSource::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TalentHistoryEntry {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TalentEntryKind,
    pub amount: i64,
    pub source: TalentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Talent {
    pub id: String,
    pub student_id: String,
    pub user_id: String,
    pub total_talents: i64,
    pub earned_talents: i64,
    pub spent_talents: i64,
    pub history: Vec<TalentHistoryEntry>,
    pub talent_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub user_id: String,
    pub attendance_date: NaiveDate,
    pub is_present: bool,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
