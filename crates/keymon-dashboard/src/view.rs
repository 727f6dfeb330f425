//! Pure rendering from a panel snapshot to per-key detail views

use crate::snapshot::PanelSnapshot;
use keymon_core::RefreshToken;
use std::collections::HashMap;

/// Parameters handed to one detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailProps {
    /// Identity hint for the rendering layer
    pub key: String,

    /// The API key the view displays history for
    pub apikey: String,

    /// Token the view compares to decide whether to reload
    pub refresh_token: RefreshToken,
}

/// Rendered panel: one entry per active key, in snapshot order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelView {
    /// Props for each child, in order
    pub children: Vec<DetailProps>,
}

/// Renders a single key's details
pub trait DetailView {
    /// Render one child
    fn render(&self, props: &DetailProps) -> String;
}

/// Map a snapshot to the children it should show
#[must_use]
pub fn render(snapshot: &PanelSnapshot) -> PanelView {
    let children = snapshot
        .keys
        .iter()
        .map(|key| DetailProps {
            key: key.clone(),
            apikey: key.clone(),
            refresh_token: snapshot.refresh_token,
        })
        .collect();

    PanelView { children }
}

impl PanelView {
    /// Number of child views
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether no key is shown
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Render every child through `view`, one output per child
    pub fn draw(&self, view: &dyn DetailView) -> Vec<String> {
        self.children.iter().map(|props| view.render(props)).collect()
    }
}

/// One line per key, used by the terminal binary
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyLineView;

impl DetailView for KeyLineView {
    fn render(&self, props: &DetailProps) -> String {
        format!("{}  (refresh #{})", props.apikey, props.refresh_token)
    }
}

/// Tracks the last token each key was loaded at
///
/// Stateful detail views use this to reload only when their token moved.
#[derive(Debug, Default)]
pub struct ReloadTracker {
    seen: HashMap<String, RefreshToken>,
}

impl ReloadTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys whose view must reload for `view`, in view order
    ///
    /// Records the new tokens and forgets keys that left the panel.
    pub fn reconcile(&mut self, view: &PanelView) -> Vec<String> {
        let mut stale = Vec::new();
        let mut current = HashMap::with_capacity(view.children.len());

        for child in &view.children {
            if current.contains_key(&child.key) {
                continue;
            }
            if self.seen.get(&child.key) != Some(&child.refresh_token) {
                stale.push(child.key.clone());
            }
            current.insert(child.key.clone(), child.refresh_token);
        }

        self.seen = current;
        stale
    }

    /// Number of keys currently tracked
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Phase;
    use pretty_assertions::assert_eq;

    fn snapshot(keys: &[&str], token: u64) -> PanelSnapshot {
        PanelSnapshot {
            keys: keys.iter().map(ToString::to_string).collect(),
            refresh_token: RefreshToken::new(token),
            phase: Phase::Waiting,
        }
    }

    #[test]
    fn test_render_one_child_per_key_in_order() {
        let view = render(&snapshot(&["k1", "k2", "k3"], 4));

        assert_eq!(view.len(), 3);
        let apikeys: Vec<_> = view.children.iter().map(|c| c.apikey.as_str()).collect();
        assert_eq!(apikeys, vec!["k1", "k2", "k3"]);
        for child in &view.children {
            assert_eq!(child.key, child.apikey);
            assert_eq!(child.refresh_token.get(), 4);
        }
    }

    #[test]
    fn test_render_keeps_duplicates() {
        let view = render(&snapshot(&["a", "a"], 0));
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_render_empty() {
        let view = render(&PanelSnapshot::initial());
        assert!(view.is_empty());
        assert!(view.draw(&KeyLineView).is_empty());
    }

    #[test]
    fn test_key_line_view() {
        let view = render(&snapshot(&["k1", "k2"], 0));
        assert_eq!(
            view.draw(&KeyLineView),
            vec!["k1  (refresh #0)", "k2  (refresh #0)"]
        );
    }

    #[test]
    fn test_reload_tracker_first_sight_and_token_change() {
        let mut tracker = ReloadTracker::new();

        let first = render(&snapshot(&["a", "b"], 0));
        assert_eq!(tracker.reconcile(&first), vec!["a", "b"]);
        assert_eq!(tracker.reconcile(&first), Vec::<String>::new());

        let advanced = render(&snapshot(&["a", "b"], 1));
        assert_eq!(tracker.reconcile(&advanced), vec!["a", "b"]);
    }

    #[test]
    fn test_reload_tracker_forgets_departed_keys() {
        let mut tracker = ReloadTracker::new();
        tracker.reconcile(&render(&snapshot(&["a", "b"], 0)));

        let only_c = render(&snapshot(&["c"], 0));
        assert_eq!(tracker.reconcile(&only_c), vec!["c"]);
        assert_eq!(tracker.len(), 1);

        // "a" comes back at the same token: it was forgotten, so it reloads
        let back = render(&snapshot(&["a", "c"], 0));
        assert_eq!(tracker.reconcile(&back), vec!["a"]);
    }

    #[test]
    fn test_reload_tracker_duplicate_keys_reported_once() {
        let mut tracker = ReloadTracker::new();
        let view = render(&snapshot(&["a", "a"], 0));
        assert_eq!(tracker.reconcile(&view), vec!["a"]);
    }
}
