use crate::state::ChatTurn;

/// Ordered, append-only log of chat turns.
///
/// Single owner: the pipeline holds it and only ever mutates it from the
/// host's event loop.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Turns in insertion order.
    pub fn all(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.append(ChatTurn::user("first"));
        transcript.append(ChatTurn::assistant("second"));
        transcript.append(ChatTurn::user("third"));

        let contents: Vec<&str> = transcript.all().iter().map(|t| t.content()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(transcript.last().map(|t| t.role()), Some(ChatRole::User));
    }

    #[test]
    fn test_clear_empties() {
        let mut transcript = Transcript::new();
        transcript.append(ChatTurn::user("hello"));
        transcript.clear();
        assert!(transcript.is_empty());
        assert_eq!(transcript.len(), 0);
    }

    #[test]
    fn test_all_is_stable_without_mutation() {
        let mut transcript = Transcript::new();
        transcript.append(ChatTurn::assistant("welcome"));
        let first = transcript.all().to_vec();
        let second = transcript.all().to_vec();
        assert_eq!(first, second);
    }
}
