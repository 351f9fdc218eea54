//! Mission completion reconciliation and the per-student talent ledger.
//!
//! A completion stores a snapshot of the talents it earned. Whenever a
//! completion is created, changed or bulk-applied the difference between the
//! new snapshot and the old one is pushed into the student's ledger, so the
//! ledger always equals the sum of its history.
//!
//! Each public operation runs in a single transaction covering the
//! completion rows and the ledger read-modify-write.

use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::model::{
    CompletionResult, Mission, MissionCompletion, MissionKind, Principal, ResultValue, Talent,
    TalentEntryKind, TalentHistoryEntry, TalentSource,
};
use crate::repo::{completions, missions, students, talents};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

/// Talents earned by `result` for `mission`.
///
/// The reward is all-or-nothing: for count and number missions `value` only
/// gates the reward, a count of 5 earns the same as a count of 1.
pub fn compute_delta(mission: &Mission, result: &CompletionResult) -> i64 {
    if !result.completed {
        return 0;
    }
    match mission.config.kind {
        MissionKind::YesNo => mission.talent_reward,
        MissionKind::Count | MissionKind::Number => {
            if value_fires(result.value) {
                mission.talent_reward
            } else {
                0
            }
        }
    }
}

fn ledger_overflow() -> AppError {
    AppError::bad_param("talentReward", "talent total out of range")
}

fn value_fires(value: Option<ResultValue>) -> bool {
    match value {
        Some(ResultValue::Number(n)) => n > 0.0,
        Some(ResultValue::Bool(b)) => b,
        None => false,
    }
}

/// Applies a signed talent change to the student's ledger.
///
/// Positive deltas count as earned, negative ones as spent; `total` stays
/// `earned - spent`. A zero delta touches nothing and returns the current
/// ledger, which may not exist yet.
pub fn apply_delta(
    conn: &Connection,
    student_id: &str,
    delta: i64,
    source_mission_id: Option<&str>,
) -> AppResult<Option<Talent>> {
    if delta == 0 {
        return talents::find_for_student(conn, student_id);
    }
    let mut talent = talents::get_or_create(conn, student_id)?;
    let amount = delta.checked_abs().ok_or_else(ledger_overflow)?;
    let kind = if delta > 0 {
        talent.earned_talents = talent
            .earned_talents
            .checked_add(amount)
            .ok_or_else(ledger_overflow)?;
        TalentEntryKind::Earned
    } else {
        talent.spent_talents = talent
            .spent_talents
            .checked_add(amount)
            .ok_or_else(ledger_overflow)?;
        TalentEntryKind::Spent
    };
    talent.total_talents = talent
        .total_talents
        .checked_add(delta)
        .ok_or_else(ledger_overflow)?;

    let entry = TalentHistoryEntry {
        date: crate::db::today(),
        kind,
        amount,
        source: if source_mission_id.is_some() {
            TalentSource::Mission
        } else {
            TalentSource::Other
        },
        mission_id: source_mission_id.map(str::to_string),
    };
    talents::save_with_entry(conn, &talent, &entry)?;
    tracing::info!(
        student_id,
        delta,
        total = talent.total_talents,
        "talent ledger updated"
    );
    talent.history.push(entry);
    Ok(Some(talent))
}

#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub student_id: String,
    pub mission_id: String,
    pub completion_date: NaiveDate,
    pub result: CompletionResult,
}

/// Records a first completion for (student, mission, date). A second
/// submission for the same day is rejected and leaves the stored row as is.
pub fn create_completion(
    conn: &Connection,
    principal: &Principal,
    input: &NewCompletion,
) -> AppResult<MissionCompletion> {
    let tx = conn.unchecked_transaction()?;
    students::get(&tx, &principal.user_id, &input.student_id)?;
    let mission = missions::get(&tx, &input.mission_id)?;

    if completions::find_existing(
        &tx,
        &input.student_id,
        &input.mission_id,
        input.completion_date,
    )?
    .is_some()
    {
        tracing::warn!(
            student_id = %input.student_id,
            mission_id = %input.mission_id,
            date = %input.completion_date,
            "duplicate mission completion rejected"
        );
        return Err(AppError::Conflict(
            "mission already completed on this date".to_string(),
        ));
    }

    let earned = compute_delta(&mission, &input.result);
    let saved = completions::insert(
        &tx,
        &principal.user_id,
        &input.student_id,
        &mission.id,
        input.completion_date,
        &input.result,
        earned,
    )?;
    apply_delta(&tx, &input.student_id, earned, Some(&mission.id))?;
    tx.commit()?;
    Ok(saved)
}

/// Replaces the result of a completion the principal recorded. The ledger
/// receives `new - old`, which is negative when a mission is un-completed.
pub fn update_completion(
    conn: &Connection,
    principal: &Principal,
    completion_id: &str,
    result: &CompletionResult,
) -> AppResult<MissionCompletion> {
    let tx = conn.unchecked_transaction()?;
    let existing = completions::get_owned(&tx, &principal.user_id, completion_id)?;
    let mission = missions::get(&tx, &existing.mission_id)?;

    let earned = compute_delta(&mission, result);
    let difference = earned
        .checked_sub(existing.talent_earned)
        .ok_or_else(ledger_overflow)?;
    if difference != 0 {
        apply_delta(&tx, &existing.student_id, difference, Some(&mission.id))?;
    }
    let saved = completions::update_result(&tx, &existing, result, earned)?;
    tx.commit()?;
    Ok(saved)
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub mission_id: String,
    pub result: CompletionResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub completions: Vec<MissionCompletion>,
    pub talent_delta: i64,
}

/// Upserts one day's completions for a student.
///
/// Existing completions are overwritten rather than rejected. The ledger is
/// mutated once with the summed delta of the whole batch. Any failing item
/// aborts the batch and nothing is stored.
pub fn apply_batch(
    conn: &Connection,
    principal: &Principal,
    student_id: &str,
    date: NaiveDate,
    items: &[BatchItem],
) -> AppResult<BatchOutcome> {
    let tx = conn.unchecked_transaction()?;
    students::get(&tx, &principal.user_id, student_id)?;

    let mut saved = Vec::with_capacity(items.len());
    let mut batch_delta = 0i64;
    for item in items {
        let mission = missions::get(&tx, &item.mission_id)?;
        let earned = compute_delta(&mission, &item.result);
        match completions::find_existing(&tx, student_id, &mission.id, date)? {
            Some(existing) => {
                let change = earned
                    .checked_sub(existing.talent_earned)
                    .ok_or_else(ledger_overflow)?;
                batch_delta = batch_delta.checked_add(change).ok_or_else(ledger_overflow)?;
                saved.push(completions::update_result(
                    &tx,
                    &existing,
                    &item.result,
                    earned,
                )?);
            }
            None => {
                batch_delta = batch_delta.checked_add(earned).ok_or_else(ledger_overflow)?;
                saved.push(completions::insert(
                    &tx,
                    &principal.user_id,
                    student_id,
                    &mission.id,
                    date,
                    &item.result,
                    earned,
                )?);
            }
        }
    }

    apply_delta(&tx, student_id, batch_delta, None)?;
    tx.commit()?;
    tracing::info!(student_id, items = items.len(), batch_delta, "mission batch applied");
    Ok(BatchOutcome {
        completions: saved,
        talent_delta: batch_delta,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDayStatus {
    pub mission: Mission,
    pub completion: Option<MissionCompletion>,
    pub is_completed: bool,
    pub talent_earned: i64,
}

/// Every active mission paired with what the student did on `date`.
pub fn student_day(
    conn: &Connection,
    principal: &Principal,
    student_id: &str,
    date: NaiveDate,
) -> AppResult<Vec<MissionDayStatus>> {
    students::get(conn, &principal.user_id, student_id)?;
    let mut done = completions::list_for_student_day(conn, student_id, date)?;
    let catalog = catalog::list_active(conn)?;
    Ok(catalog
        .into_iter()
        .map(|mission| {
            let completion = done
                .iter()
                .position(|c| c.mission_id == mission.id)
                .map(|i| done.swap_remove(i));
            MissionDayStatus {
                is_completed: completion.as_ref().is_some_and(|c| c.result.completed),
                talent_earned: completion.as_ref().map_or(0, |c| c.talent_earned),
                completion,
                mission,
            }
        })
        .collect())
}

/// The student's ledger, created empty on first access.
pub fn student_talents(
    conn: &Connection,
    principal: &Principal,
    student_id: &str,
) -> AppResult<Talent> {
    students::get(conn, &principal.user_id, student_id)?;
    talents::get_or_create(conn, student_id)
}
