//! Trigger registry: dynamic dispatch by `type` tag (spec §4.D, design
//! note "Dynamic trigger dispatch").

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TriggerError;

/// A registered trigger type. Given the trigger body's type-specific
/// fields, returns the desired task count before clamping.
#[async_trait]
pub trait TriggerEvaluator: Send + Sync {
    async fn desired_count(&self, fields: &serde_json::Map<String, serde_json::Value>) -> Result<u32, TriggerError>;
}

/// Closed variant set resolved at runtime by `trigger.type` (currently
/// just the built-in queue-depth trigger; new types register at
/// startup — the set isn't meant to grow at request time).
#[derive(Default, Clone)]
pub struct TriggerRegistry {
    evaluators: HashMap<String, Arc<dyn TriggerEvaluator>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_tag: impl Into<String>, evaluator: Arc<dyn TriggerEvaluator>) {
        self.evaluators.insert(type_tag.into(), evaluator);
    }

    /// Resolve `type_tag` and evaluate. Returns
    /// [`TriggerError::UnknownType`] if no evaluator is registered — the
    /// fire aborts with a logged warning and no launch (spec §4.D).
    pub async fn evaluate(
        &self,
        type_tag: &str,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<u32, TriggerError> {
        let evaluator = self.evaluators.get(type_tag).ok_or_else(|| TriggerError::UnknownType(type_tag.to_string()))?;
        evaluator.desired_count(fields).await
    }
}
