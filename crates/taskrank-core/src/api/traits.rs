use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::task::{ScoredTask, Strategy, Task};

/// JSON array sent to the scoring service: staged tasks followed by the
/// raw entries of the bulk textarea.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionPayload(pub Vec<Value>);

impl SubmissionPayload {
    /// Staged tasks first, in store order, then the bulk entries as pasted.
    pub fn assemble(staged: &[Task], bulk: Vec<Value>) -> Result<Self, serde_json::Error> {
        let mut items = Vec::with_capacity(staged.len() + bulk.len());
        for task in staged {
            items.push(serde_json::to_value(task)?);
        }
        items.extend(bulk);
        Ok(Self(items))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn items(&self) -> &[Value] {
        &self.0
    }
}

/// The two remote operations the client needs.
#[async_trait]
pub trait ScoringApi: Send + Sync {
    /// Short name for logs (e.g. "http", "local").
    fn name(&self) -> &str;

    /// Score and order every task with `strategy`.
    async fn analyze(
        &self,
        payload: &SubmissionPayload,
        strategy: Strategy,
    ) -> Result<Vec<ScoredTask>, TransportError>;

    /// Top picks under the default strategy.
    async fn suggest(&self, payload: &SubmissionPayload) -> Result<Vec<ScoredTask>, TransportError>;
}
