//! Property-based tests using proptest
//!
//! These tests drive the view controller and the draft editor with arbitrary
//! action sequences and check the invariants that must hold after each step.

use blog_reader::models::{Article, CreateArticleInput};
use blog_reader::{Panel, ViewController, ViewState};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    Select(u8),
    StartCreate,
    CancelCreate,
    CreateSucceeded,
    DeleteSucceeded(u8),
    GoHome,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..4).prop_map(Action::Select),
        Just(Action::StartCreate),
        Just(Action::CancelCreate),
        Just(Action::CreateSucceeded),
        (0u8..4).prop_map(Action::DeleteSucceeded),
        Just(Action::GoHome),
    ]
}

fn apply(view: &mut ViewController, action: &Action) -> bool {
    match action {
        Action::Select(id) => view.select_article(&id.to_string()),
        Action::StartCreate => view.start_create(),
        Action::CancelCreate => view.cancel_create(),
        Action::CreateSucceeded => view.create_succeeded(),
        Action::DeleteSucceeded(id) => view.delete_succeeded(&id.to_string()),
        Action::GoHome => view.go_home(),
    }
}

// =============================================================================
// 1. ViewController - transitions
// =============================================================================

proptest! {
    #[test]
    fn prop_panel_matches_state(actions in prop::collection::vec(action(), 0..40)) {
        let mut view = ViewController::new();
        for action in &actions {
            apply(&mut view, action);

            let expected = match view.state() {
                ViewState::Browsing => Panel::List,
                ViewState::Viewing(_) => Panel::Detail,
                ViewState::Creating => Panel::CreateForm,
            };
            prop_assert_eq!(view.panel(), expected);
            prop_assert_eq!(view.selected_id().is_some(), expected == Panel::Detail);
        }
    }

    #[test]
    fn prop_reported_change_matches_state_change(actions in prop::collection::vec(action(), 0..40)) {
        let mut view = ViewController::new();
        for action in &actions {
            let before = view.state().clone();
            let changed = apply(&mut view, action);
            prop_assert_eq!(changed, &before != view.state(), "action {:?}", action);
        }
    }

    #[test]
    fn prop_selecting_twice_restores_browsing(prefix in prop::collection::vec(action(), 0..20), id in 0u8..4) {
        let mut view = ViewController::new();
        for action in &prefix {
            apply(&mut view, action);
        }
        view.go_home();

        let id = id.to_string();
        view.select_article(&id);
        prop_assert_eq!(view.selected_id(), Some(id.as_str()));
        view.select_article(&id);
        prop_assert_eq!(view.state(), &ViewState::Browsing);
    }

    #[test]
    fn prop_start_create_always_opens_form(prefix in prop::collection::vec(action(), 0..20)) {
        let mut view = ViewController::new();
        for action in &prefix {
            apply(&mut view, action);
        }
        view.start_create();
        prop_assert!(view.state().is_creating());
    }

    #[test]
    fn prop_deletes_never_close_the_form(ids in prop::collection::vec(0u8..4, 0..10)) {
        let mut view = ViewController::new();
        view.start_create();
        for id in ids {
            prop_assert!(!view.delete_succeeded(&id.to_string()));
            prop_assert!(!view.start_create());
            prop_assert!(view.state().is_creating());
        }
    }
}

// =============================================================================
// 2. CreateArticleInput - category tags
// =============================================================================

proptest! {
    #[test]
    fn prop_categories_stay_normalized_and_unique(raw in prop::collection::vec("[ a-zA-Z]{0,10}", 0..20)) {
        let mut draft = CreateArticleInput::default();
        for tag in &raw {
            let before = draft.categories.len();
            let added = draft.add_category(tag);
            prop_assert_eq!(added, draft.categories.len() == before + 1);
        }

        for (i, category) in draft.categories.iter().enumerate() {
            prop_assert!(!category.is_empty());
            prop_assert_eq!(category.trim(), category.as_str());
            prop_assert_eq!(&category.to_uppercase(), category);
            prop_assert!(!draft.categories[i + 1..].contains(category));
        }
    }

    #[test]
    fn prop_removed_category_is_gone(raw in prop::collection::vec("[A-Z]{1,6}", 1..10), pick in any::<prop::sample::Index>()) {
        let mut draft = CreateArticleInput::default();
        for tag in &raw {
            draft.add_category(tag);
        }
        let victim = draft.categories[pick.index(draft.categories.len())].clone();
        draft.remove_category(&victim);
        prop_assert!(!draft.categories.contains(&victim));
    }
}

// =============================================================================
// 3. Article presentation helpers
// =============================================================================

proptest! {
    #[test]
    fn prop_read_time_is_at_least_one_minute(content in ".{0,2000}") {
        let article = Article {
            id: "1".to_string(),
            title: "Title".to_string(),
            categories: vec![],
            description: String::new(),
            date: String::new(),
            cover_image: String::new(),
            content,
        };
        let words = article.content.split_whitespace().count();
        let minutes = article.read_time_minutes();
        prop_assert!(minutes >= 1);
        prop_assert!(minutes * 200 >= words);
    }

    #[test]
    fn prop_sections_are_never_blank(content in "[a-z .\n\"]{0,300}") {
        let article = Article {
            id: "1".to_string(),
            title: "Title".to_string(),
            categories: vec![],
            description: String::new(),
            date: String::new(),
            cover_image: String::new(),
            content,
        };
        for section in article.sections() {
            let text = match section {
                blog_reader::models::ContentSection::Heading(text)
                | blog_reader::models::ContentSection::Quote(text)
                | blog_reader::models::ContentSection::Paragraph(text) => text,
            };
            prop_assert!(!text.trim().is_empty());
        }
    }

    #[test]
    fn prop_relative_time_never_panics(date in ".{0,30}") {
        let article = Article {
            id: "1".to_string(),
            title: "Title".to_string(),
            categories: vec![],
            description: String::new(),
            date,
            cover_image: String::new(),
            content: String::new(),
        };
        let _ = article.relative_time();
        let _ = article.formatted_date();
    }
}
