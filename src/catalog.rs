use crate::error::{AppError, AppResult, FieldError};
use crate::model::{Mission, MissionConfig, MissionKind};
use crate::repo::missions::{self, MissionDraft};
use rusqlite::Connection;

/// Largest reward a mission may carry.
pub const MAX_TALENT_REWARD: i64 = i32::MAX as i64;

struct DefaultMission {
    name: &'static str,
    description: &'static str,
    kind: MissionKind,
    unit: Option<&'static str>,
    max_value: Option<f64>,
    default_value: Option<f64>,
    talent_reward: i64,
    sort_order: i64,
}

const DEFAULT_MISSIONS: &[DefaultMission] = &[
    DefaultMission {
        name: "Bring a Bible",
        description: "Checks whether the student brought their Bible.",
        kind: MissionKind::YesNo,
        unit: None,
        max_value: None,
        default_value: None,
        talent_reward: 1,
        sort_order: 1,
    },
    DefaultMission {
        name: "Bible reading",
        description: "Records how many times the student read the Bible.",
        kind: MissionKind::Count,
        unit: Some("times"),
        max_value: Some(10.0),
        default_value: Some(1.0),
        talent_reward: 1,
        sort_order: 2,
    },
    DefaultMission {
        name: "Evangelism",
        description: "Records how many people the student invited.",
        kind: MissionKind::Number,
        unit: Some("people"),
        max_value: Some(50.0),
        default_value: Some(1.0),
        talent_reward: 5,
        sort_order: 3,
    },
    DefaultMission {
        name: "Choir",
        description: "Checks whether the student sang in the choir.",
        kind: MissionKind::YesNo,
        unit: None,
        max_value: None,
        default_value: None,
        talent_reward: 1,
        sort_order: 4,
    },
];

/// Inserts the default missions that are not present yet, matched by name.
pub fn seed_defaults(conn: &Connection) -> AppResult<usize> {
    let mut inserted = 0;
    for d in DEFAULT_MISSIONS {
        if missions::exists_by_name(conn, d.name)? {
            continue;
        }
        missions::insert(
            conn,
            &MissionDraft {
                name: d.name.to_string(),
                description: Some(d.description.to_string()),
                config: MissionConfig {
                    kind: d.kind,
                    unit: d.unit.map(str::to_string),
                    max_value: d.max_value,
                    default_value: d.default_value,
                },
                talent_reward: d.talent_reward,
                is_active: true,
                sort_order: d.sort_order,
            },
        )?;
        inserted += 1;
    }
    if inserted > 0 {
        tracing::info!(inserted, "seeded default missions");
    }
    Ok(inserted)
}

/// Active missions in display order. An empty catalog is seeded first.
pub fn list_active(conn: &Connection) -> AppResult<Vec<Mission>> {
    let list = missions::list_active(conn)?;
    if !list.is_empty() {
        return Ok(list);
    }
    seed_defaults(conn)?;
    missions::list_active(conn)
}

pub fn validate_draft(d: &MissionDraft) -> AppResult<()> {
    let mut errors = Vec::new();
    let mut fail = |field: &str, message: &str| {
        errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        })
    };
    if d.name.trim().is_empty() {
        fail("name", "must not be empty");
    }
    if d.talent_reward < 0 {
        fail("talentReward", "must be >= 0");
    } else if d.talent_reward > MAX_TALENT_REWARD {
        fail("talentReward", "must be <= 2147483647");
    }
    if d.config.max_value.is_some_and(|v| v < 0.0) {
        fail("config.maxValue", "must be >= 0");
    }
    if let (Some(default), Some(max)) = (d.config.default_value, d.config.max_value) {
        if default > max {
            fail("config.defaultValue", "must not exceed maxValue");
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn create(conn: &Connection, draft: &MissionDraft) -> AppResult<Mission> {
    validate_draft(draft)?;
    missions::insert(conn, draft)
}

pub fn update(conn: &Connection, mission: &Mission) -> AppResult<Mission> {
    validate_draft(&MissionDraft {
        name: mission.name.clone(),
        description: mission.description.clone(),
        config: mission.config.clone(),
        talent_reward: mission.talent_reward,
        is_active: mission.is_active,
        sort_order: mission.sort_order,
    })?;
    missions::update(conn, mission)?;
    missions::get(conn, &mission.id)
}

/// Missions referenced by completions cannot be removed; deactivate them.
pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
    missions::get(conn, id)?;
    let used = missions::completion_count(conn, id)?;
    if used > 0 {
        return Err(AppError::Conflict(format!(
            "mission has {} completion(s); deactivate it instead",
            used
        )));
    }
    missions::delete(conn, id)
}
