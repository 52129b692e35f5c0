use archive_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    for msg in [Msg::NoOp, Msg::Tick] {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(state, next);
        assert!(effects.is_empty());
    }
}

#[test]
fn browse_screen_is_default() {
    let (mut state, effects) = update(AppState::new(), Msg::BrowseOpened);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}
