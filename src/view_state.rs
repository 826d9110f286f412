//! Which panel the reader is looking at.
//!
//! The list is always available; at most one of the detail panel and the
//! creation form is open on top of it.

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Browsing,
    Viewing(String),
    Creating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    List,
    Detail,
    CreateForm,
}

impl ViewState {
    pub fn selected_id(&self) -> Option<&str> {
        match self {
            ViewState::Viewing(id) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn is_creating(&self) -> bool {
        matches!(self, ViewState::Creating)
    }

    pub fn panel(&self) -> Panel {
        match self {
            ViewState::Browsing => Panel::List,
            ViewState::Viewing(_) => Panel::Detail,
            ViewState::Creating => Panel::CreateForm,
        }
    }
}

type ViewListener = Box<dyn FnMut(&ViewState)>;

/// Owns the current [`ViewState`] and applies user-driven transitions.
///
/// Every transition returns whether the state changed; listeners are only
/// called on change.
#[derive(Default)]
pub struct ViewController {
    state: ViewState,
    listeners: Vec<ViewListener>,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn panel(&self) -> Panel {
        self.state.panel()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.state.selected_id()
    }

    pub fn on_change<L>(&mut self, listener: L)
    where
        L: FnMut(&ViewState) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Opens an article, or closes it when it is already open.
    pub fn select_article(&mut self, id: &str) -> bool {
        let next = match &self.state {
            ViewState::Viewing(current) if current == id => ViewState::Browsing,
            _ => ViewState::Viewing(id.to_string()),
        };
        self.transition(next)
    }

    pub fn start_create(&mut self) -> bool {
        self.transition(ViewState::Creating)
    }

    pub fn cancel_create(&mut self) -> bool {
        self.leave_create()
    }

    pub fn create_succeeded(&mut self) -> bool {
        self.leave_create()
    }

    /// Closes the detail panel if it shows the article that was just deleted.
    pub fn delete_succeeded(&mut self, id: &str) -> bool {
        if self.state.selected_id() == Some(id) {
            self.transition(ViewState::Browsing)
        } else {
            false
        }
    }

    /// Back to the plain list from anywhere.
    pub fn go_home(&mut self) -> bool {
        self.transition(ViewState::Browsing)
    }

    fn leave_create(&mut self) -> bool {
        if self.state.is_creating() {
            self.transition(ViewState::Browsing)
        } else {
            false
        }
    }

    fn transition(&mut self, next: ViewState) -> bool {
        if self.state == next {
            return false;
        }
        debug!(from = ?self.state, to = ?next, "view transition");
        self.state = next;
        for listener in &mut self.listeners {
            listener(&self.state);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn starts_browsing() {
        let view = ViewController::new();
        assert_eq!(view.state(), &ViewState::Browsing);
        assert_eq!(view.panel(), Panel::List);
        assert_eq!(view.selected_id(), None);
    }

    #[test]
    fn selecting_same_article_twice_toggles_back() {
        let mut view = ViewController::new();
        assert!(view.select_article("1"));
        assert_eq!(view.state(), &ViewState::Viewing("1".to_string()));
        assert_eq!(view.panel(), Panel::Detail);

        assert!(view.select_article("1"));
        assert_eq!(view.state(), &ViewState::Browsing);
    }

    #[test]
    fn selecting_another_article_switches_detail() {
        let mut view = ViewController::new();
        view.select_article("1");
        view.select_article("2");
        assert_eq!(view.selected_id(), Some("2"));
    }

    #[test]
    fn selecting_exits_creating() {
        let mut view = ViewController::new();
        view.start_create();
        view.select_article("1");
        assert_eq!(view.state(), &ViewState::Viewing("1".to_string()));
    }

    #[test]
    fn create_panel_is_left_only_by_cancel_or_success() {
        let mut view = ViewController::new();
        view.select_article("1");
        assert!(view.start_create());
        assert_eq!(view.panel(), Panel::CreateForm);

        assert!(!view.delete_succeeded("1"));
        assert!(view.state().is_creating());

        assert!(view.create_succeeded());
        assert_eq!(view.state(), &ViewState::Browsing);

        view.start_create();
        assert!(view.cancel_create());
        assert_eq!(view.state(), &ViewState::Browsing);
    }

    #[test]
    fn cancel_outside_creating_is_noop() {
        let mut view = ViewController::new();
        view.select_article("1");
        assert!(!view.cancel_create());
        assert!(!view.create_succeeded());
        assert_eq!(view.selected_id(), Some("1"));
    }

    #[test]
    fn delete_succeeded_clears_only_the_deleted_selection() {
        let mut view = ViewController::new();
        view.select_article("1");
        assert!(!view.delete_succeeded("2"));
        assert_eq!(view.selected_id(), Some("1"));

        assert!(view.delete_succeeded("1"));
        assert_eq!(view.state(), &ViewState::Browsing);
    }

    #[test]
    fn go_home_resets_everything() {
        let mut view = ViewController::new();
        view.start_create();
        assert!(view.go_home());
        assert!(!view.go_home());
        assert_eq!(view.state(), &ViewState::Browsing);
    }

    #[test]
    fn listeners_fire_only_on_change() {
        let mut view = ViewController::new();
        let seen: Rc<RefCell<Vec<ViewState>>> = Rc::default();
        let sink = seen.clone();
        view.on_change(move |state| sink.borrow_mut().push(state.clone()));

        view.start_create();
        view.start_create();
        view.cancel_create();

        assert_eq!(
            *seen.borrow(),
            vec![ViewState::Creating, ViewState::Browsing]
        );
    }
}
