/// Topic names are opaque, case-sensitive strings compared by exact equality.
pub type Topic = String;

/// Outcome of a toggle: the topic and whether it is now selected.
///
/// This is also the notification a presentation layer receives to flip the
/// topic's selected marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub topic: Topic,
    pub selected: bool,
}

/// The set of topics the operator currently has selected.
///
/// Membership is unique; iteration follows insertion order so repeated
/// snapshots of the same set build the same filter.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionSet {
    topics: Vec<Topic>,
}

impl SubscriptionSet {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self { topics: Vec::new() }
    }

    /// Removes `topic` if present, otherwise appends it.
    pub fn toggle(&mut self, topic: &str) -> SelectionChange {
        let selected = if self.remove(topic) {
            false
        } else {
            self.topics.push(topic.to_string());
            true
        };

        SelectionChange {
            topic: topic.to_string(),
            selected,
        }
    }

    /// Adds `topic` unless it is already selected. Returns whether it was added.
    pub fn add(&mut self, topic: &str) -> bool {
        if self.contains(topic) {
            return false;
        }
        self.topics.push(topic.to_string());
        true
    }

    /// Removes `topic`. Returns whether it was selected.
    pub fn remove(&mut self, topic: &str) -> bool {
        match self.topics.iter().position(|t| t == topic) {
            Some(idx) => {
                self.topics.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Whether `topic` is selected, by exact string equality.
    pub fn contains(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }

    /// An owned copy of the selection in insertion order.
    pub fn snapshot(&self) -> Vec<Topic> {
        self.topics.clone()
    }

    /// Whether no topic is selected. An empty selection means no connection.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Number of selected topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }
}
