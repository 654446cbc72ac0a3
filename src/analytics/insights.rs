//! Insight Engine
//!
//! Read-side facade over the ledger: weekly intake series, lifestyle
//! correlations and the weight forecast, each computed on demand.

use crate::analytics::correlations::{lifestyle_insights, CorrelationReport};
use crate::analytics::error::AnalyticsResult;
use crate::analytics::forecast::{forecast_weight, weight_samples, ForecastOutcome};
use crate::ledger::{DailyRecord, HealthLedger, WeeklyHistory};
use std::collections::BTreeMap;

/// Derive analytics from a borrowed ledger
pub struct InsightEngine<'a> {
    ledger: &'a mut HealthLedger,
}

impl<'a> InsightEngine<'a> {
    pub fn new(ledger: &'a mut HealthLedger) -> Self {
        Self { ledger }
    }

    /// The seven days ending today
    pub fn weekly_history(&mut self) -> AnalyticsResult<WeeklyHistory> {
        Ok(self.ledger.weekly_history()?)
    }

    /// Correlation rules over every logged day, today included
    pub fn lifestyle_insights(&mut self) -> AnalyticsResult<CorrelationReport> {
        let state = self.ledger.snapshot()?;

        let mut days: BTreeMap<_, DailyRecord> = state.history.clone();
        if let Some(today) = state.current_date {
            days.insert(today, state.today);
        }

        Ok(lifestyle_insights(days.values()))
    }

    /// Weight trend from the progress log
    pub fn weight_forecast(&mut self) -> AnalyticsResult<ForecastOutcome> {
        let log = self.ledger.progress_log()?;
        Ok(forecast_weight(&weight_samples(&log)))
    }
}
