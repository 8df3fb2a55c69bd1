//! Cross-session causal index.
//!
//! Entries point at messages rather than rows, so a reflow never invalidates them.

use std::collections::{BTreeSet, HashMap, HashSet};

use agent_events::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageRef {
    pub session_id: SessionId,
    pub message_index: usize,
}

impl MessageRef {
    pub fn new(session_id: SessionId, message_index: usize) -> Self {
        Self {
            session_id,
            message_index,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorrelationGraph {
    /// Messages carrying each correlation id.
    origins: HashMap<String, BTreeSet<MessageRef>>,
    /// Messages that observed each correlation id.
    observers: HashMap<String, BTreeSet<MessageRef>>,
    /// Every id each message carries, its chunk ids included.
    carried: HashMap<MessageRef, BTreeSet<String>>,
}

impl CorrelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the ids a message carries and the ids it observed. Re-registering is
    /// idempotent, so a growing message can be registered after every chunk.
    pub fn register<'a>(
        &mut self,
        message: &MessageRef,
        correlation_ids: impl IntoIterator<Item = &'a str>,
        observed: &[String],
    ) {
        for id in correlation_ids.into_iter().filter(|id| !id.is_empty()) {
            self.origins
                .entry(id.to_string())
                .or_default()
                .insert(message.clone());
            self.carried
                .entry(message.clone())
                .or_default()
                .insert(id.to_string());
        }
        for id in observed.iter().filter(|id| !id.is_empty()) {
            self.observers
                .entry(id.clone())
                .or_default()
                .insert(message.clone());
        }
    }

    pub fn origins(&self, correlation_id: &str) -> impl Iterator<Item = &MessageRef> {
        self.origins.get(correlation_id).into_iter().flatten()
    }

    pub fn observers(&self, correlation_id: &str) -> impl Iterator<Item = &MessageRef> {
        self.observers.get(correlation_id).into_iter().flatten()
    }

    /// Ids carried by `message`, chunk ids included.
    pub fn carried_ids(&self, message: &MessageRef) -> impl Iterator<Item = &str> {
        self.carried
            .get(message)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Messages to highlight when `correlation_id` is selected: its origins and the
    /// direct observers of any id those origins carry. Observers of observers are
    /// not followed.
    pub fn highlight_set(&self, correlation_id: &str) -> HighlightSet {
        let origins: Vec<&MessageRef> = self.origins(correlation_id).collect();
        let aliases: BTreeSet<&str> = std::iter::once(correlation_id)
            .chain(origins.iter().flat_map(|origin| self.carried_ids(origin)))
            .collect();

        origins
            .into_iter()
            .chain(aliases.into_iter().flat_map(|id| self.observers(id)))
            .cloned()
            .collect()
    }

    pub fn remove_session(&mut self, session_id: &SessionId) {
        for index in [&mut self.origins, &mut self.observers] {
            index.retain(|_, refs| {
                refs.retain(|message| &message.session_id != session_id);
                !refs.is_empty()
            });
        }
        self.carried.retain(|message, _| &message.session_id != session_id);
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty() && self.observers.is_empty() && self.carried.is_empty()
    }
}

/// Selected messages grouped by session for constant-time row checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet {
    members: HashMap<SessionId, HashSet<usize>>,
}

impl FromIterator<MessageRef> for HighlightSet {
    fn from_iter<I: IntoIterator<Item = MessageRef>>(refs: I) -> Self {
        let mut members: HashMap<SessionId, HashSet<usize>> = HashMap::new();
        for message in refs {
            members
                .entry(message.session_id)
                .or_default()
                .insert(message.message_index);
        }
        Self { members }
    }
}

impl HighlightSet {
    pub fn contains(&self, session_id: &SessionId, message_index: usize) -> bool {
        self.members
            .get(session_id)
            .is_some_and(|indices| indices.contains(&message_index))
    }

    /// Members in session then message order.
    pub fn sorted(&self) -> Vec<MessageRef> {
        let mut refs: Vec<MessageRef> = self
            .members
            .iter()
            .flat_map(|(session_id, indices)| {
                indices
                    .iter()
                    .map(|index| MessageRef::new(session_id.clone(), *index))
            })
            .collect();
        refs.sort();
        refs
    }

    pub fn len(&self) -> usize {
        self.members.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(session: &str, index: usize) -> MessageRef {
        MessageRef::new(SessionId::from(session), index)
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn highlight_is_origins_plus_direct_observers() {
        let mut graph = CorrelationGraph::new();
        graph.register(&at("a", 0), Some("a1"), &[]);
        graph.register(&at("b", 3), Some("b7"), &ids(&["a1"]));
        graph.register(&at("c", 1), Some("c2"), &ids(&["b7"]));

        let set = graph.highlight_set("a1");
        assert_eq!(set.sorted(), vec![at("a", 0), at("b", 3)]);
        assert!(!set.contains(&SessionId::from("c"), 1));
    }

    #[test]
    fn observers_of_a_chunk_id_light_up_with_the_whole_message() {
        let mut graph = CorrelationGraph::new();
        graph.register(&at("a", 0), ["a1", "a2"], &[]);
        graph.register(&at("b", 0), Some("b1"), &ids(&["a2"]));
        graph.register(&at("c", 0), Some("c1"), &ids(&["b1"]));

        assert_eq!(graph.highlight_set("a1").sorted(), vec![at("a", 0), at("b", 0)]);
        assert_eq!(graph.highlight_set("a2").sorted(), vec![at("a", 0), at("b", 0)]);
        assert_eq!(graph.highlight_set("b1").sorted(), vec![at("b", 0), at("c", 0)]);
    }

    #[test]
    fn unknown_id_highlights_nothing() {
        let graph = CorrelationGraph::new();
        assert!(graph.highlight_set("missing").is_empty());
    }

    #[test]
    fn registering_twice_is_idempotent() {
        let mut graph = CorrelationGraph::new();
        graph.register(&at("a", 0), Some("a1"), &ids(&["x"]));
        graph.register(&at("a", 0), Some("a1"), &ids(&["x"]));
        assert_eq!(graph.origins("a1").count(), 1);
        assert_eq!(graph.observers("x").count(), 1);
    }

    #[test]
    fn removing_a_session_purges_its_entries() {
        let mut graph = CorrelationGraph::new();
        graph.register(&at("a", 0), Some("a1"), &[]);
        graph.register(&at("b", 0), Some("b1"), &ids(&["a1"]));

        graph.remove_session(&SessionId::from("b"));
        assert_eq!(graph.observers("a1").count(), 0);
        assert_eq!(graph.origins("b1").count(), 0);
        assert_eq!(graph.highlight_set("a1").len(), 1);

        graph.remove_session(&SessionId::from("a"));
        assert!(graph.is_empty());
    }
}
