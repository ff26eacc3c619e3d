use crate::{Behavior, Blackboard, BlackboardValue, Context, Status};

/// Where a [`SetBlackboardValue`] takes its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    Literal(BlackboardValue),
    /// Copies whatever is stored under another key.
    CopyFrom(String),
}

/// Writes a value into the blackboard and succeeds.
#[derive(Debug, Clone)]
pub struct SetBlackboardValue {
    pub key: Option<String>,
    pub source: ValueSource,
}

impl SetBlackboardValue {
    pub fn new(key: impl Into<String>, value: impl Into<BlackboardValue>) -> Self {
        Self {
            key: Some(key.into()),
            source: ValueSource::Literal(value.into()),
        }
    }

    pub fn copy(key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            source: ValueSource::CopyFrom(from.into()),
        }
    }

    fn target_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.is_empty())
    }

    /// A node without a target key can never run.
    pub fn can_execute(&self, _blackboard: &Blackboard) -> bool {
        self.target_key().is_some()
    }

    pub fn description(&self) -> String {
        let key = self.target_key().unwrap_or("None");
        match &self.source {
            ValueSource::Literal(value) => format!("Set BB['{key}'] = {value}"),
            ValueSource::CopyFrom(from) => format!("Set BB['{key}'] = BB['{from}']"),
        }
    }
}

impl Behavior for SetBlackboardValue {
    fn execute(&mut self, ctx: &mut Context<'_>) -> Status {
        let Some(key) = self.target_key() else {
            tracing::warn!("blackboard write has no target key");
            return Status::Failure;
        };

        let value = match &self.source {
            ValueSource::Literal(value) => value.clone(),
            ValueSource::CopyFrom(from) => match ctx.blackboard.value(from) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(key, from = %from, "copy source is missing");
                    return Status::Failure;
                }
            },
        };

        ctx.blackboard.set(key, value);
        Status::Success
    }

    fn name(&self) -> &str {
        "Set Blackboard Value"
    }
}
