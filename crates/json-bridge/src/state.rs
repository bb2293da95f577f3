//! Per-call traversal state.
//!
//! A [`SerializerState`] lives for exactly one top-level marshal, unmarshal or
//! scoring call. On marshal it records where every object was first written,
//! which objects are still being visited (for cycle detection) and the fixups
//! for every repeat. On unmarshal it maps JSON locations to the natives built
//! there so that back-reference markers can be resolved to the same instance.

use json_bridge_pointer::{format_json_pointer, Path, PathStep};
use rustc_hash::FxHashMap;

use crate::fixup::FixUp;
use crate::native::{Native, ObjectId};
use crate::score::MatchScore;

#[derive(Debug, Default)]
pub struct SerializerState {
    /// First (canonical) location of every object seen so far.
    processed: FxHashMap<ObjectId, Path>,
    /// Objects whose children are currently being visited.
    ancestors: Vec<ObjectId>,
    location: Path,
    fixups: Vec<FixUp>,
    /// Unmarshal side: natives keyed by the JSON pointer they were built at.
    serialized: FxHashMap<String, Native>,
    /// Scoring side: scores keyed by JSON pointer.
    scores: FxHashMap<String, MatchScore>,
}

impl SerializerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current location relative to the document root.
    pub fn location(&self) -> &[PathStep] {
        &self.location
    }

    pub fn pointer(&self) -> String {
        format_json_pointer(&self.location)
    }

    pub fn push_step(&mut self, step: PathStep) {
        self.location.push(step);
    }

    pub fn pop_step(&mut self) {
        self.location.pop();
    }

    /// Where `id` was first marshalled, if it has been seen.
    pub fn processed_location(&self, id: ObjectId) -> Option<&Path> {
        self.processed.get(&id)
    }

    /// Whether `id` is on the current visit chain, i.e. reaching it again is
    /// a cycle rather than a duplicate.
    pub fn is_ancestor(&self, id: ObjectId) -> bool {
        self.ancestors.contains(&id)
    }

    /// Starts visiting `id` at the current location. The first location an
    /// object is entered at stays its canonical one.
    pub fn enter(&mut self, id: ObjectId) {
        self.processed
            .entry(id)
            .or_insert_with(|| self.location.clone());
        self.ancestors.push(id);
    }

    pub fn leave(&mut self, id: ObjectId) {
        debug_assert_eq!(self.ancestors.last(), Some(&id));
        self.ancestors.pop();
    }

    /// Records that the value at the current location repeats `original`.
    pub fn add_fixup(&mut self, original: Path) {
        self.fixups.push(FixUp {
            location: self.location.clone(),
            original,
        });
    }

    pub fn fixups(&self) -> &[FixUp] {
        &self.fixups
    }

    pub fn into_fixups(self) -> Vec<FixUp> {
        self.fixups
    }

    /// Registers the native built at the current location.
    pub fn set_serialized(&mut self, value: Native) {
        self.serialized.insert(self.pointer(), value);
    }

    /// The native built at `pointer`.
    pub fn serialized(&self, pointer: &str) -> Option<&Native> {
        self.serialized.get(pointer)
    }

    /// Records the score for the current location.
    pub fn set_score(&mut self, score: MatchScore) {
        self.scores.insert(self.pointer(), score);
    }

    pub fn score_at(&self, pointer: &str) -> Option<MatchScore> {
        self.scores.get(pointer).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_keeps_first_location() {
        let mut state = SerializerState::new();
        let id = ObjectId::from_raw(7);
        state.push_step(PathStep::from("a"));
        state.enter(id);
        assert!(state.is_ancestor(id));
        state.leave(id);
        state.pop_step();
        assert!(!state.is_ancestor(id));

        state.push_step(PathStep::from("b"));
        state.enter(id);
        state.leave(id);
        assert_eq!(
            state.processed_location(id),
            Some(&vec![PathStep::from("a")])
        );
    }

    #[test]
    fn test_add_fixup_uses_current_location() {
        let mut state = SerializerState::new();
        state.push_step(PathStep::from("list"));
        state.push_step(PathStep::Index(3));
        state.add_fixup(vec![PathStep::from("list"), PathStep::Index(0)]);
        assert_eq!(
            state.into_fixups(),
            vec![FixUp {
                location: vec![PathStep::from("list"), PathStep::Index(3)],
                original: vec![PathStep::from("list"), PathStep::Index(0)],
            }]
        );
    }

    #[test]
    fn test_serialized_by_pointer() {
        let mut state = SerializerState::new();
        state.set_serialized(Native::Ref(ObjectId::from_raw(0)));
        state.push_step(PathStep::from("child"));
        state.set_serialized(Native::Ref(ObjectId::from_raw(1)));
        state.set_score(MatchScore::SIMILAR);
        assert_eq!(state.serialized(""), Some(&Native::Ref(ObjectId::from_raw(0))));
        assert_eq!(
            state.serialized("/child"),
            Some(&Native::Ref(ObjectId::from_raw(1)))
        );
        assert_eq!(state.score_at("/child"), Some(MatchScore::SIMILAR));
        assert_eq!(state.score_at(""), None);
    }
}
