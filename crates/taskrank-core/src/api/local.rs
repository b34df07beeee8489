//! In-process scoring service for offline use.
//!
//! Applies the same validation, cycle check and scoring as the remote
//! service, and reports failures as the remote service would (HTTP 400
//! with a message).

use async_trait::async_trait;
use chrono::{Local, NaiveDate};

use super::traits::{ScoringApi, SubmissionPayload};
use crate::error::TransportError;
use crate::scoring::{detect_cycle, validate_tasks, ScoringEngine, ValidatedTask};
use crate::task::{ScoredTask, Strategy};

const SUGGESTION_COUNT: usize = 3;
const BAD_REQUEST: u16 = 400;

#[derive(Debug, Clone, Default)]
pub struct LocalScoringService {
    today: Option<NaiveDate>,
}

impl LocalScoringService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin "today" for urgency calculations.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn validated(&self, payload: &SubmissionPayload) -> Result<Vec<ValidatedTask>, TransportError> {
        validate_tasks(payload.items(), self.today()).map_err(|errors| TransportError::Rejected {
            status: BAD_REQUEST,
            message: errors.summary(),
        })
    }
}

fn format_path(path: &[i64]) -> String {
    let ids: Vec<String> = path.iter().map(|id| id.to_string()).collect();
    format!("[{}]", ids.join(", "))
}

#[async_trait]
impl ScoringApi for LocalScoringService {
    fn name(&self) -> &str {
        "local"
    }

    async fn analyze(
        &self,
        payload: &SubmissionPayload,
        strategy: Strategy,
    ) -> Result<Vec<ScoredTask>, TransportError> {
        let tasks = self.validated(payload)?;

        if let Some(path) = detect_cycle(&tasks) {
            return Err(TransportError::Rejected {
                status: BAD_REQUEST,
                message: format!(
                    "Task {} waits for itself via {}",
                    path[0],
                    format_path(&path)
                ),
            });
        }

        Ok(ScoringEngine::new(strategy, self.today()).score_tasks(&tasks))
    }

    async fn suggest(&self, payload: &SubmissionPayload) -> Result<Vec<ScoredTask>, TransportError> {
        let tasks = self.validated(payload)?;

        if detect_cycle(&tasks).is_some() {
            return Err(TransportError::Rejected {
                status: BAD_REQUEST,
                message: "Circular dependency".into(),
            });
        }

        let mut scored = ScoringEngine::new(Strategy::Default, self.today()).score_tasks(&tasks);
        scored.truncate(SUGGESTION_COUNT);
        Ok(scored)
    }
}
