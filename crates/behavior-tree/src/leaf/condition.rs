use crate::{Behavior, BlackboardValue, Context, Status};

/// Absolute tolerance for `==` and `!=` on numbers.
pub const EQUALITY_TOLERANCE: f32 = 0.01;

/// Comparison applied between the observed value and the configured operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display)]
pub enum ComparisonOperator {
    #[default]
    #[strum(to_string = "==")]
    Equal,
    #[strum(to_string = "!=")]
    NotEqual,
    #[strum(to_string = ">")]
    Greater,
    #[strum(to_string = ">=")]
    GreaterOrEqual,
    #[strum(to_string = "<")]
    Less,
    #[strum(to_string = "<=")]
    LessOrEqual,
}

impl ComparisonOperator {
    pub fn compare_numbers(self, lhs: f32, rhs: f32) -> bool {
        match self {
            ComparisonOperator::Equal => (lhs - rhs).abs() <= EQUALITY_TOLERANCE,
            ComparisonOperator::NotEqual => (lhs - rhs).abs() > EQUALITY_TOLERANCE,
            ComparisonOperator::Greater => lhs > rhs,
            ComparisonOperator::GreaterOrEqual => lhs >= rhs,
            ComparisonOperator::Less => lhs < rhs,
            ComparisonOperator::LessOrEqual => lhs <= rhs,
        }
    }

    /// Strings only support equality; ordering operators are always false.
    pub fn compare_strings(self, lhs: &str, rhs: &str) -> bool {
        match self {
            ComparisonOperator::Equal => lhs == rhs,
            ComparisonOperator::NotEqual => lhs != rhs,
            _ => false,
        }
    }
}

/// What a [`CheckCondition`] observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKind {
    /// Compares a blackboard entry using its stored type.
    BlackboardValue(String),
    /// Distance from the agent to the current target.
    DistanceToTarget,
    /// Whether a target actor or target location is set.
    HasTarget,
    /// Agent health percentage in `0..=100`.
    HealthPercentage,
    /// Named predicate evaluated by the [`Agent`](crate::Agent).
    Custom(String),
}

/// Evaluates a predicate in a single tick: `Success` when it holds, else
/// `Failure`. Never `Running`.
#[derive(Debug, Clone)]
pub struct CheckCondition {
    pub kind: ConditionKind,
    pub operator: ComparisonOperator,
    /// Numeric operand.
    pub value: f32,
    /// Operand for string and name entries.
    pub text: String,
    pub invert: bool,
}

impl CheckCondition {
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            kind,
            operator: ComparisonOperator::Equal,
            value: 0.0,
            text: String::new(),
            invert: false,
        }
    }

    pub fn blackboard(key: impl Into<String>, operator: ComparisonOperator, value: f32) -> Self {
        Self::new(ConditionKind::BlackboardValue(key.into())).compare(operator, value)
    }

    pub fn blackboard_text(
        key: impl Into<String>,
        operator: ComparisonOperator,
        text: impl Into<String>,
    ) -> Self {
        let mut condition = Self::new(ConditionKind::BlackboardValue(key.into()));
        condition.operator = operator;
        condition.text = text.into();
        condition
    }

    pub fn distance(operator: ComparisonOperator, value: f32) -> Self {
        Self::new(ConditionKind::DistanceToTarget).compare(operator, value)
    }

    pub fn has_target() -> Self {
        Self::new(ConditionKind::HasTarget)
    }

    pub fn health(operator: ComparisonOperator, value: f32) -> Self {
        Self::new(ConditionKind::HealthPercentage).compare(operator, value)
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(ConditionKind::Custom(name.into()))
    }

    pub fn compare(mut self, operator: ComparisonOperator, value: f32) -> Self {
        self.operator = operator;
        self.value = value;
        self
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    /// Evaluates the predicate, inversion included.
    pub fn evaluate(&self, ctx: &Context<'_>) -> bool {
        self.evaluate_raw(ctx) != self.invert
    }

    fn evaluate_raw(&self, ctx: &Context<'_>) -> bool {
        let blackboard = &*ctx.blackboard;
        match &self.kind {
            ConditionKind::BlackboardValue(key) => match blackboard.value(key) {
                None => false,
                Some(BlackboardValue::String(s) | BlackboardValue::Name(s)) => {
                    self.operator.compare_strings(s, &self.text)
                }
                Some(BlackboardValue::Object(object)) => {
                    let present = if object.is_some() { 1.0 } else { 0.0 };
                    self.operator.compare_numbers(present, self.value)
                }
                Some(BlackboardValue::Class(class)) => {
                    let present = if class.is_some() { 1.0 } else { 0.0 };
                    self.operator.compare_numbers(present, self.value)
                }
                Some(other) => other
                    .as_number()
                    .is_some_and(|n| self.operator.compare_numbers(n, self.value)),
            },
            ConditionKind::DistanceToTarget => {
                let target = blackboard
                    .target_actor()
                    .and_then(|actor| ctx.agent.locate(actor))
                    .or_else(|| {
                        let location = blackboard.target_location();
                        (!location.is_zero()).then_some(location)
                    });
                match target {
                    Some(target) => {
                        let distance = ctx.agent.location().distance(target);
                        self.operator.compare_numbers(distance, self.value)
                    }
                    None => false,
                }
            }
            ConditionKind::HasTarget => {
                blackboard.target_actor().is_some() || !blackboard.target_location().is_zero()
            }
            ConditionKind::HealthPercentage => self
                .operator
                .compare_numbers(ctx.agent.health_percentage(), self.value),
            ConditionKind::Custom(name) => ctx.agent.custom_condition(name, blackboard),
        }
    }

    pub fn description(&self) -> String {
        let check = match &self.kind {
            ConditionKind::BlackboardValue(key) if !self.text.is_empty() => {
                format!("Check: BB['{key}'] {} '{}'", self.operator, self.text)
            }
            ConditionKind::BlackboardValue(key) => {
                format!("Check: BB['{key}'] {} {:.1}", self.operator, self.value)
            }
            ConditionKind::DistanceToTarget => {
                format!("Check: Distance {} {:.1}", self.operator, self.value)
            }
            ConditionKind::HasTarget => "Check: Has Target".to_owned(),
            ConditionKind::HealthPercentage => {
                format!("Check: Health {} {:.1}%", self.operator, self.value)
            }
            ConditionKind::Custom(name) => format!("Check: Custom: {name}"),
        };
        if self.invert {
            format!("NOT ({check})")
        } else {
            check
        }
    }
}

impl Behavior for CheckCondition {
    fn execute(&mut self, ctx: &mut Context<'_>) -> Status {
        if self.evaluate(ctx) {
            Status::Success
        } else {
            Status::Failure
        }
    }

    fn name(&self) -> &str {
        "Check Condition"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use crate::{ObjectRef, Vec3};
    use ComparisonOperator::*;

    fn check(h: &mut Harness, mut node: CheckCondition) -> Status {
        node.execute(&mut h.ctx())
    }

    #[test]
    fn numeric_equality_uses_tolerance() {
        assert!(Equal.compare_numbers(1.0, 1.005));
        assert!(!Equal.compare_numbers(1.0, 1.02));
        assert!(NotEqual.compare_numbers(1.0, 1.02));
        assert!(GreaterOrEqual.compare_numbers(2.0, 2.0));
        assert!(!Less.compare_numbers(2.0, 2.0));
    }

    #[test]
    fn string_ordering_is_always_false() {
        assert!(Equal.compare_strings("Patrol", "Patrol"));
        assert!(NotEqual.compare_strings("Patrol", "Combat"));
        assert!(!Greater.compare_strings("b", "a"));
        assert!(!LessOrEqual.compare_strings("a", "a"));
    }

    #[test]
    fn blackboard_numeric_types() {
        let mut h = Harness::new();
        h.blackboard.set("Alert", true);
        h.blackboard.set("Ammo", 3_i32);
        h.blackboard.set("Fear", 0.75_f32);

        assert_eq!(check(&mut h, CheckCondition::blackboard("Alert", Equal, 1.0)), Status::Success);
        assert_eq!(check(&mut h, CheckCondition::blackboard("Ammo", Greater, 2.0)), Status::Success);
        assert_eq!(check(&mut h, CheckCondition::blackboard("Fear", Less, 0.5)), Status::Failure);
    }

    #[test]
    fn blackboard_missing_key_is_false() {
        let mut h = Harness::new();
        assert_eq!(check(&mut h, CheckCondition::blackboard("Nope", NotEqual, 0.0)), Status::Failure);
        assert_eq!(
            check(&mut h, CheckCondition::blackboard("Nope", NotEqual, 0.0).inverted()),
            Status::Success
        );
    }

    #[test]
    fn blackboard_strings_and_names() {
        let mut h = Harness::new();
        h.blackboard.set_current_state("Patrol");
        h.blackboard.set("Faction", "Bandits");

        let state = CheckCondition::blackboard_text(crate::CURRENT_STATE_KEY, Equal, "Patrol");
        assert_eq!(check(&mut h, state), Status::Success);

        let faction = CheckCondition::blackboard_text("Faction", NotEqual, "Guards");
        assert_eq!(check(&mut h, faction), Status::Success);
    }

    #[test]
    fn object_entries_compare_as_presence() {
        let mut h = Harness::new();
        h.blackboard.set("Ally", Some(ObjectRef(3)));
        h.blackboard.set("Enemy", None::<ObjectRef>);

        assert_eq!(check(&mut h, CheckCondition::blackboard("Ally", Equal, 1.0)), Status::Success);
        assert_eq!(check(&mut h, CheckCondition::blackboard("Enemy", Equal, 0.0)), Status::Success);
    }

    #[test]
    fn has_target_checks_actor_or_location() {
        let mut h = Harness::new();
        assert_eq!(check(&mut h, CheckCondition::has_target()), Status::Failure);

        h.blackboard.set_target_location(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(check(&mut h, CheckCondition::has_target()), Status::Success);

        h.blackboard.set_target_location(Vec3::ZERO);
        h.blackboard.set_target_actor(Some(ObjectRef(1)));
        assert_eq!(check(&mut h, CheckCondition::has_target()), Status::Success);
    }

    #[test]
    fn distance_prefers_actor_then_location() {
        let mut h = Harness::new();
        h.agent.location = Vec3::ZERO;
        h.agent.place(ObjectRef(5), Vec3::new(300.0, 0.0, 0.0));
        h.blackboard.set_target_location(Vec3::new(100.0, 0.0, 0.0));

        assert_eq!(check(&mut h, CheckCondition::distance(Less, 150.0)), Status::Success);

        h.blackboard.set_target_actor(Some(ObjectRef(5)));
        assert_eq!(check(&mut h, CheckCondition::distance(Less, 150.0)), Status::Failure);
        assert_eq!(check(&mut h, CheckCondition::distance(Greater, 250.0)), Status::Success);
    }

    #[test]
    fn distance_without_target_is_false() {
        let mut h = Harness::new();
        assert_eq!(check(&mut h, CheckCondition::distance(Greater, -1.0)), Status::Failure);
    }

    #[test]
    fn health_and_custom_delegate_to_agent() {
        let mut h = Harness::new();
        h.agent.health = 25.0;
        h.agent.conditions.insert("CanSeePlayer".to_owned(), true);

        assert_eq!(check(&mut h, CheckCondition::health(LessOrEqual, 30.0)), Status::Success);
        assert_eq!(check(&mut h, CheckCondition::custom("CanSeePlayer")), Status::Success);
        assert_eq!(check(&mut h, CheckCondition::custom("IsHungry")), Status::Failure);
    }

    #[test]
    fn description_reads_like_the_check() {
        assert_eq!(
            CheckCondition::health(Less, 30.0).inverted().description(),
            "NOT (Check: Health < 30.0%)"
        );
        assert_eq!(
            CheckCondition::blackboard("Ammo", GreaterOrEqual, 1.0).description(),
            "Check: BB['Ammo'] >= 1.0"
        );
    }
}
