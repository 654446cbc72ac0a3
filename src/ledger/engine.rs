//! Health Ledger
//!
//! Owns the canonical `LedgerState` and is the only thing that mutates it:
//! - Rollover: archive the live day into history when the calendar date changes
//! - Write path: rollover check → mutate a copy → persist → swap in
//! - Read path: rollover check → derive read model
//!
//! Every operation runs to completion before returning, so callers that
//! serialize access (one `Mutex` in the API layer) never observe a
//! half-applied change.

use crate::ledger::clock::Clock;
use crate::ledger::error::{LedgerError, LedgerResult};
use crate::ledger::store::{merge_with_defaults, LedgerStore};
use crate::ledger::types::{
    ActivityDelta, DailyRecord, DailyStats, Goal, LedgerState, ProgressEntry, Profile,
    WeeklyHistory, PROGRESS_DATE_FORMAT, SHORT_DATE_FORMAT,
};
use chrono::{Duration, NaiveDate};
use rand::Rng;
use std::sync::Arc;

/// Fewest steps a single wearable sync reports
pub const MIN_SYNC_STEPS: u32 = 50;

/// Most steps a single wearable sync reports
pub const MAX_SYNC_STEPS: u32 = 500;

/// Calories burned per step
pub const CALORIES_PER_STEP: f64 = 0.04;

/// Length of the weekly history window
pub const WEEK_DAYS: i64 = 7;

/// The daily health ledger
pub struct HealthLedger {
    state: LedgerState,
    store: Box<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl HealthLedger {
    /// Open the ledger from `store`, falling back to defaults
    ///
    /// A missing or unreadable document is not an error: the ledger starts
    /// from the default state. The rollover check runs before returning.
    pub fn open(store: Box<dyn LedgerStore>, clock: Arc<dyn Clock>) -> LedgerResult<Self> {
        let today = clock.today();
        let defaults = LedgerState::with_defaults(today);

        let state = match store.load() {
            Ok(Some(document)) => match merge_with_defaults(&defaults, document) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored ledger is unusable, starting from defaults");
                    defaults
                }
            },
            Ok(None) => {
                tracing::debug!("No stored ledger, starting from defaults");
                defaults
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load ledger, starting from defaults");
                defaults
            }
        };

        let mut ledger = Self {
            state,
            store,
            clock,
        };
        ledger.rollover(today)?;
        Ok(ledger)
    }

    /// Archive the live day if `today` is a new calendar date
    ///
    /// Returns `true` when a rollover happened. Only the single most recent
    /// day is archived; days on which the ledger was never opened get no
    /// history entry at all.
    pub fn rollover(&mut self, today: NaiveDate) -> LedgerResult<bool> {
        if self.state.current_date == Some(today) {
            return Ok(false);
        }

        let previous = self.state.current_date;
        self.apply(|state| {
            if let Some(previous) = previous {
                state.history.insert(previous, state.today.archived());
            }
            // Clock moved backwards onto an archived day: that day is live again
            state.today = state.history.remove(&today).unwrap_or_default();
            state.current_date = Some(today);
            Ok(())
        })?;

        match previous {
            Some(previous) => tracing::info!(
                archived = %previous,
                today = %today,
                "Rolled ledger over to a new day"
            ),
            None => tracing::info!(today = %today, "Started ledger day"),
        }
        Ok(true)
    }

    /// Add a meal to today's intake
    ///
    /// Values are truncated to whole calories/grams. Negative or non-finite
    /// values are rejected without touching the ledger.
    pub fn log_meal(
        &mut self,
        name: &str,
        calories: f64,
        protein: f64,
        carbs: f64,
        fats: f64,
    ) -> LedgerResult<()> {
        let calories = whole_amount("calories", calories)?;
        let protein = whole_amount("protein", protein)?;
        let carbs = whole_amount("carbs", carbs)?;
        let fats = whole_amount("fats", fats)?;

        self.check_rollover()?;
        self.apply(|state| {
            let today = &mut state.today;
            today.consumed = today.consumed.saturating_add(calories);
            today.protein = today.protein.saturating_add(protein);
            today.carbs = today.carbs.saturating_add(carbs);
            today.fats = today.fats.saturating_add(fats);
            Ok(())
        })?;

        tracing::info!(meal = %name, calories, protein, carbs, fats, "Logged meal");
        Ok(())
    }

    /// Pull a synthetic step count from the wearable
    pub fn sync_activity(&mut self) -> LedgerResult<ActivityDelta> {
        self.sync_activity_with(&mut rand::thread_rng())
    }

    /// Wearable sync drawing steps from `rng`
    ///
    /// Returns the delta added, not the new daily totals.
    pub fn sync_activity_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> LedgerResult<ActivityDelta> {
        self.check_rollover()?;

        let steps = rng.gen_range(MIN_SYNC_STEPS..=MAX_SYNC_STEPS);
        let burned = (f64::from(steps) * CALORIES_PER_STEP).floor() as u32;
        let synced_at = self.clock.now().format("%H:%M:%S").to_string();

        self.apply(|state| {
            state.today.steps = state.today.steps.saturating_add(steps);
            state.today.burned = state.today.burned.saturating_add(burned);
            state.last_sync = synced_at;
            Ok(())
        })?;

        tracing::debug!(steps, burned, "Synced wearable activity");
        Ok(ActivityDelta { steps, burned })
    }

    /// Zero today's accumulators, leaving history untouched
    pub fn reset_today(&mut self) -> LedgerResult<()> {
        self.check_rollover()?;
        self.apply(|state| {
            state.today = DailyRecord::default();
            Ok(())
        })?;
        tracing::info!("Reset today's totals");
        Ok(())
    }

    /// Enter recovery mode for `description`; an empty description clears it
    pub fn set_recovery_mode(&mut self, description: &str) -> LedgerResult<()> {
        let description = description.trim().to_string();
        self.check_rollover()?;
        self.apply(|state| {
            state.recovery_mode = !description.is_empty();
            state.active_strain = description;
            Ok(())
        })
    }

    pub fn clear_recovery_mode(&mut self) -> LedgerResult<()> {
        self.set_recovery_mode("")
    }

    /// Replace the profile fields
    pub fn update_profile(
        &mut self,
        name: &str,
        location: &str,
        goal: Goal,
        target_weight: &str,
    ) -> LedgerResult<()> {
        let name = required("name", name)?;
        let location = required("location", location)?;
        let target_weight = parse_weight(target_weight)?;

        self.check_rollover()?;
        self.apply(|state| {
            state.name = name;
            state.location = location;
            state.goal = goal;
            state.target_weight = target_weight;
            Ok(())
        })?;

        tracing::info!(goal = %goal, "Updated profile");
        Ok(())
    }

    /// Append a progress photo entry dated today
    pub fn log_progress(&mut self, reference: &str, weight: &str) -> LedgerResult<ProgressEntry> {
        let reference = required("photo reference", reference)?;
        let weight = canonical_decimal(parse_weight(weight)?);

        self.check_rollover()?;
        let entry = ProgressEntry {
            date: self.clock.today().format(PROGRESS_DATE_FORMAT).to_string(),
            reference,
            weight,
        };

        let logged = entry.clone();
        self.apply(|state| {
            if state
                .progress_log
                .iter()
                .any(|existing| existing.reference == logged.reference)
            {
                return Err(LedgerError::Validation(format!(
                    "photo reference {:?} is already logged",
                    logged.reference
                )));
            }
            state.progress_log.push(logged);
            Ok(())
        })?;

        tracing::info!(reference = %entry.reference, weight = %entry.weight, "Logged progress photo");
        Ok(entry)
    }

    /// Remove every progress entry with `reference`; returns whether any matched
    pub fn delete_progress(&mut self, reference: &str) -> LedgerResult<bool> {
        self.check_rollover()?;
        let removed = self.apply(|state| {
            let before = state.progress_log.len();
            state.progress_log.retain(|entry| entry.reference != reference);
            Ok(state.progress_log.len() != before)
        })?;

        if removed {
            tracing::info!(reference = %reference, "Deleted progress photo");
        }
        Ok(removed)
    }

    /// Today's totals and remaining calorie allowance
    pub fn stats(&mut self) -> LedgerResult<DailyStats> {
        let today_date = self.clock.today();
        let state = self.snapshot()?;
        let today = state.today;
        let allowance = state.target.saturating_add(today.burned);

        Ok(DailyStats {
            date: state.current_date.unwrap_or(today_date),
            target: state.target,
            today,
            remaining: allowance.saturating_sub(today.consumed),
            last_sync: state.last_sync.clone(),
            recovery_mode: state.recovery_mode,
            active_strain: state.active_strain.clone(),
        })
    }

    /// The seven days ending today, oldest first, zero-filled
    pub fn weekly_history(&mut self) -> LedgerResult<WeeklyHistory> {
        let today = self.clock.today();
        let state = self.snapshot()?;

        let days: Vec<NaiveDate> = (0..WEEK_DAYS)
            .rev()
            .map(|offset| today - Duration::days(offset))
            .collect();
        let records: Vec<DailyRecord> = days.iter().map(|&d| state.record_for(d)).collect();

        Ok(WeeklyHistory {
            dates: days
                .iter()
                .map(|d| d.format(SHORT_DATE_FORMAT).to_string())
                .collect(),
            consumed: records.iter().map(|r| r.consumed).collect(),
            protein: records.iter().map(|r| r.protein).collect(),
            carbs: records.iter().map(|r| r.carbs).collect(),
            fats: records.iter().map(|r| r.fats).collect(),
            days,
        })
    }

    pub fn progress_log(&mut self) -> LedgerResult<Vec<ProgressEntry>> {
        Ok(self.snapshot()?.progress_log.clone())
    }

    pub fn profile(&mut self) -> LedgerResult<Profile> {
        Ok(self.snapshot()?.profile())
    }

    /// One-line summary handed to the chat coach
    pub fn coach_context(&mut self) -> LedgerResult<String> {
        let state = self.snapshot()?;
        Ok(format!(
            "User: {}. Loc: {}. Goal: {}. Cals: {}/{}.",
            state.name, state.location, state.goal, state.today.consumed, state.target
        ))
    }

    /// Current state after the rollover check
    pub fn snapshot(&mut self) -> LedgerResult<&LedgerState> {
        self.check_rollover()?;
        Ok(&self.state)
    }

    /// Current state without a rollover check
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    fn check_rollover(&mut self) -> LedgerResult<bool> {
        let today = self.clock.today();
        self.rollover(today)
    }

    /// Apply `change` to a copy, persist it, then make it current
    fn apply<T>(
        &mut self,
        change: impl FnOnce(&mut LedgerState) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut next = self.state.clone();
        let output = change(&mut next)?;
        self.store.save(&next)?;
        self.state = next;
        Ok(output)
    }
}

impl std::fmt::Debug for HealthLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthLedger")
            .field("current_date", &self.state.current_date)
            .field("history_days", &self.state.history.len())
            .field("progress_entries", &self.state.progress_log.len())
            .finish()
    }
}

fn whole_amount(field: &str, value: f64) -> LedgerResult<u32> {
    if !value.is_finite() || value < 0.0 {
        return Err(LedgerError::Validation(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(value.trunc() as u32)
}

fn required(field: &str, value: &str) -> LedgerResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(value.to_string())
}

fn parse_weight(text: &str) -> LedgerResult<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(weight) if weight.is_finite() => Ok(weight),
        _ => Err(LedgerError::Validation(format!(
            "weight must be a valid number (e.g. 70 or 75.5), got {:?}",
            text
        ))),
    }
}

/// `75` → "75.0", `72.25` → "72.25"
fn canonical_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
