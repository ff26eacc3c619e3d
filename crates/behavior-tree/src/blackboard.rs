//! Shared typed key/value memory for one agent's behavior tree.
//!
//! Every node of a tree reads and writes the same [`Blackboard`]. Writes are
//! broadcast synchronously to registered listeners, in-line with the call to
//! [`Blackboard::set`], so other systems can react to AI state changes.

use std::collections::HashMap;

use crate::value::{BlackboardValue, FromBlackboardValue, ObjectRef, TypeRef, ValueType};
use crate::Vec3;

/// Key under which the current target actor is stored.
pub const TARGET_ACTOR_KEY: &str = "TargetActor";
/// Key under which the current target location is stored.
pub const TARGET_LOCATION_KEY: &str = "TargetLocation";
/// Key under which the current state name is stored.
pub const CURRENT_STATE_KEY: &str = "CurrentState";

/// Handle returned by [`Blackboard::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&str, &BlackboardValue)>;

/// Typed key/value store shared by all nodes of one tree.
#[derive(Default)]
pub struct Blackboard {
    values: HashMap<String, BlackboardValue>,
    owner: Option<ObjectRef>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a blackboard that belongs to the given agent.
    pub fn with_owner(owner: ObjectRef) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Generic access
    // ------------------------------------------------------------------

    /// Stores `value` under `key`, replacing any previous entry, and notifies
    /// every listener before returning.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<BlackboardValue>) {
        let key = key.into();
        let value = value.into();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&key, &value);
        }
        self.values.insert(key, value);
    }

    /// Returns the value under `key` if it exists and has the requested type,
    /// otherwise `default`.
    pub fn get_or<T: FromBlackboardValue>(&self, key: &str, default: T) -> T {
        self.values
            .get(key)
            .and_then(T::from_value)
            .unwrap_or(default)
    }

    /// Returns the raw stored value.
    pub fn value(&self, key: &str) -> Option<&BlackboardValue> {
        self.values.get(key)
    }

    /// Returns the type of the value stored under `key`.
    pub fn value_type(&self, key: &str) -> Option<ValueType> {
        self.values.get(key).map(BlackboardValue::value_type)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<BlackboardValue> {
        self.values.remove(key)
    }

    /// Removes every entry. Listeners and the owner are kept.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// All keys currently stored, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ------------------------------------------------------------------
    // Typed access
    // ------------------------------------------------------------------

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_or(key, default)
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get_or(key, default)
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.get_or(key, default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(BlackboardValue::String(s)) => s.clone(),
            _ => default.to_owned(),
        }
    }

    /// Symbolic names are stored separately from strings and only match
    /// [`BlackboardValue::Name`].
    pub fn get_name(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(BlackboardValue::Name(n)) => Some(n),
            _ => None,
        }
    }

    pub fn get_vector(&self, key: &str, default: Vec3) -> Vec3 {
        self.get_or(key, default)
    }

    pub fn get_object(&self, key: &str) -> Option<ObjectRef> {
        self.get_or(key, None)
    }

    pub fn get_class(&self, key: &str) -> Option<TypeRef> {
        self.get_or(key, None)
    }

    // ------------------------------------------------------------------
    // Well-known keys
    // ------------------------------------------------------------------

    pub fn set_target_actor(&mut self, target: Option<ObjectRef>) {
        self.set(TARGET_ACTOR_KEY, target);
    }

    pub fn target_actor(&self) -> Option<ObjectRef> {
        self.get_object(TARGET_ACTOR_KEY)
    }

    pub fn set_target_location(&mut self, location: Vec3) {
        self.set(TARGET_LOCATION_KEY, location);
    }

    pub fn target_location(&self) -> Vec3 {
        self.get_vector(TARGET_LOCATION_KEY, Vec3::ZERO)
    }

    pub fn set_current_state(&mut self, state: impl Into<String>) {
        self.set(CURRENT_STATE_KEY, BlackboardValue::name(state));
    }

    pub fn current_state(&self) -> Option<&str> {
        self.get_name(CURRENT_STATE_KEY)
    }

    /// Returns `true` if the current state name equals `state`.
    pub fn is_in_state(&self, state: &str) -> bool {
        self.current_state() == Some(state)
    }

    // ------------------------------------------------------------------
    // Owner
    // ------------------------------------------------------------------

    pub fn set_owner(&mut self, owner: Option<ObjectRef>) {
        self.owner = owner;
    }

    /// The agent this blackboard belongs to. The blackboard never keeps the
    /// agent alive.
    pub fn owner(&self) -> Option<ObjectRef> {
        self.owner
    }

    // ------------------------------------------------------------------
    // Change notification
    // ------------------------------------------------------------------

    /// Registers a listener called with `(key, new_value)` on every `set`.
    pub fn subscribe(&mut self, listener: impl FnMut(&str, &BlackboardValue) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    // ------------------------------------------------------------------
    // Debug
    // ------------------------------------------------------------------

    /// Renders all entries as `key=value, ...`, sorted by key.
    pub fn debug_string(&self) -> String {
        let mut entries: Vec<_> = self.values.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Emits every entry at debug level.
    pub fn log_values(&self) {
        for (key, value) in &self.values {
            tracing::debug!(key = %key, value = %value, kind = %value.value_type(), "blackboard entry");
        }
    }
}

impl std::fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blackboard")
            .field("values", &self.values)
            .field("owner", &self.owner)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
