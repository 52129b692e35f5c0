use std::sync::Once;

use archive_core::{
    update, AppState, Effect, Generation, Message, Msg, NotificationLevel, ResultCount,
    SearchRequest, SearchResult, SiteId, SortMode, Source, MATCH_ALL_QUERY, PAGE_SIZE,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(archive_logging::initialize_for_tests);
}

fn sites() -> Vec<Source> {
    vec![
        Source {
            id: SiteId(1),
            name: "Morning News".to_string(),
            file_name: "/archives/news.zip".to_string(),
        },
        Source {
            id: SiteId(2),
            name: "Cats Daily".to_string(),
            file_name: "/archives/cats.zip".to_string(),
        },
    ]
}

fn message(site: i64, text: &str) -> Message {
    Message {
        site_id: SiteId(site),
        date: "2022-03-01T10:00:00".to_string(),
        text: text.to_string(),
        ..Message::default()
    }
}

fn result(total: u64, texts: &[&str]) -> SearchResult {
    SearchResult {
        total,
        messages: texts.iter().map(|t| message(1, t)).collect(),
    }
}

/// Starts a session with sites loaded, returning the generation of the initial search.
fn started(location: Option<&str>) -> (AppState, Generation) {
    let (state, effects) = update(
        AppState::new(),
        Msg::Started {
            location: location.map(str::to_string),
        },
    );
    let generation = last_search(&effects).expect("initial search").0;
    let (state, _) = update(state, Msg::SitesLoaded(Ok(sites())));
    (state, generation)
}

fn last_search(effects: &[Effect]) -> Option<(Generation, SearchRequest)> {
    effects.iter().rev().find_map(|effect| match effect {
        Effect::Search {
            generation,
            request,
        } => Some((*generation, request.clone())),
        _ => None,
    })
}

fn respond(state: AppState, generation: Generation, result: SearchResult) -> AppState {
    let (state, effects) = update(
        state,
        Msg::SearchCompleted {
            generation,
            result: Ok(result),
        },
    );
    assert!(effects.is_empty());
    state
}

/// Applies `msg` and answers its search immediately with `result`.
fn step(state: AppState, msg: Msg, result: SearchResult) -> AppState {
    let (state, effects) = update(state, msg);
    match last_search(&effects) {
        Some((generation, _)) => respond(state, generation, result),
        None => state,
    }
}

#[test]
fn start_fetches_sites_and_issues_default_search() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::Started { location: None });

    assert_eq!(
        effects,
        vec![
            Effect::FetchSites,
            Effect::PublishLocation(String::new()),
            Effect::Search {
                generation: Generation(1),
                request: SearchRequest {
                    site_id: None,
                    sort: SortMode::Date,
                    query: MATCH_ALL_QUERY.to_string(),
                    skip: 0,
                },
            },
        ]
    );
    assert!(state.view().browse.loading);
    assert!(state.view().browse.searching);
}

#[test]
fn second_start_is_ignored() {
    init_logging();
    let (state, _) = started(None);
    let (_, effects) = update(state, Msg::Started { location: None });
    assert!(effects.is_empty());
}

#[test]
fn restored_query_without_sort_defaults_to_date() {
    init_logging();
    let (state, generation) = started(Some("query=test"));
    let query = state.query();
    assert_eq!(query.query.as_deref(), Some("test"));
    assert_eq!(query.sort, SortMode::Date);
    assert_eq!(generation, Generation(1));
}

#[test]
fn restored_location_reproduces_request() {
    init_logging();
    let (_, effects) = update(
        AppState::new(),
        Msg::Started {
            location: Some("site_id=2&query=cat&sort=relevance&skip=20".to_string()),
        },
    );
    let (_, request) = last_search(&effects).unwrap();
    assert_eq!(
        request,
        SearchRequest {
            site_id: Some(SiteId(2)),
            sort: SortMode::Relevance,
            query: "cat".to_string(),
            skip: 20,
        }
    );
}

#[test]
fn submitting_query_selects_relevance_and_clearing_restores_date() {
    init_logging();
    let (state, generation) = started(Some("skip=30"));
    let state = respond(state, generation, result(100, &["a"]));

    let (state, effects) = update(state, Msg::QuerySubmitted("cats".to_string()));
    let (_, request) = last_search(&effects).unwrap();
    assert_eq!(request.sort, SortMode::Relevance);
    assert_eq!(request.skip, 0);
    assert_eq!(request.query, "cats");
    assert!(effects.contains(&Effect::PublishLocation(
        "query=cats&sort=relevance".to_string()
    )));

    let (state, effects) = update(state, Msg::QueryCleared);
    let (_, request) = last_search(&effects).unwrap();
    assert_eq!(request.sort, SortMode::Date);
    assert_eq!(request.skip, 0);
    assert_eq!(request.query, MATCH_ALL_QUERY);
    assert_eq!(state.location(), "");
}

#[test]
fn resubmitting_same_query_forces_relevance_again() {
    init_logging();
    let (state, generation) = started(Some("query=cats&sort=relevance"));
    let state = respond(state, generation, result(30, &["a"]));
    let state = step(state, Msg::SortSelected(SortMode::Date), result(30, &["a"]));
    assert_eq!(state.query().sort, SortMode::Date);

    let (state, _) = update(state, Msg::QuerySubmitted("cats".to_string()));
    assert_eq!(state.query().sort, SortMode::Relevance);
}

#[test]
fn blank_query_counts_as_cleared() {
    init_logging();
    let (state, _) = started(Some("query=cats&sort=relevance"));
    let (state, _) = update(state, Msg::QuerySubmitted("   ".to_string()));
    let query = state.query();
    assert_eq!(query.query, None);
    assert_eq!(query.sort, SortMode::Date);
}

#[test]
fn latest_response_wins_when_responses_arrive_out_of_order() {
    init_logging();
    let (state, _) = started(None);
    let (state, effects) = update(state, Msg::QuerySubmitted("r1".to_string()));
    let (g1, _) = last_search(&effects).unwrap();
    let (state, effects) = update(state, Msg::QuerySubmitted("r2".to_string()));
    let (g2, _) = last_search(&effects).unwrap();
    assert!(g2 > g1);

    let state = respond(state, g2, result(1, &["from r2"]));
    let state = respond(state, g1, result(1, &["from r1"]));

    let view = state.view();
    assert_eq!(view.browse.messages.len(), 1);
    assert_eq!(view.browse.messages[0].text.plain_text(), "from r2");
    assert!(!view.browse.searching);
}

#[test]
fn navigation_stays_on_page_grid_and_within_total() {
    init_logging();
    let (state, generation) = started(None);
    let total = 35;
    let mut state = respond(state, generation, result(total, &["x"]));

    for _ in 0..10 {
        state = step(state, Msg::OlderClicked, result(total, &["x"]));
        let skip = state.query().skip;
        assert_eq!(skip % PAGE_SIZE, 0);
        assert!(skip < total);
    }
    assert_eq!(state.query().skip, 30);
    assert!(!state.view().browse.can_go_older);
    assert!(state.view().browse.can_go_newer);

    for _ in 0..10 {
        state = step(state, Msg::NewerClicked, result(total, &["x"]));
    }
    assert_eq!(state.query().skip, 0);
    assert!(!state.view().browse.can_go_newer);
}

#[test]
fn empty_result_disables_navigation() {
    init_logging();
    let (state, generation) = started(None);
    let state = respond(state, generation, result(0, &[]));
    let (state, effects) = update(state, Msg::OlderClicked);
    assert!(effects.is_empty());
    assert_eq!(state.query().skip, 0);
    assert_eq!(state.view().browse.result_count, ResultCount::Nothing);
}

#[test]
fn out_of_range_restored_skip_yields_empty_page() {
    init_logging();
    let (state, generation) = started(Some("skip=990"));
    let state = respond(state, generation, result(20, &[]));
    let view = state.view();
    assert!(view.browse.messages.is_empty());
    assert!(view.browse.can_go_newer);
    assert!(!view.browse.can_go_older);
}

#[test]
fn site_change_clears_results_before_response() {
    init_logging();
    let (state, generation) = started(Some("skip=10"));
    let state = respond(state, generation, result(50, &["old"]));

    let (state, effects) = update(state, Msg::SiteSelected(Some(SiteId(2))));
    assert!(state.view().browse.messages.is_empty());
    let (_, request) = last_search(&effects).unwrap();
    assert_eq!(request.site_id, Some(SiteId(2)));
    assert_eq!(request.skip, 0);
    assert_eq!(state.view().browse.selected_site.as_deref(), Some("Cats Daily"));
}

#[test]
fn older_waits_for_new_site_total() {
    init_logging();
    let (state, generation) = started(None);
    let state = respond(state, generation, result(500, &["old"]));

    let (state, effects) = update(state, Msg::SiteSelected(Some(SiteId(2))));
    let (generation, _) = last_search(&effects).unwrap();
    let view = state.view();
    assert!(!view.browse.can_go_older);
    assert_eq!(view.browse.result_count, ResultCount::Nothing);

    let (state, effects) = update(state, Msg::OlderClicked);
    assert!(effects.is_empty());
    assert_eq!(state.query().skip, 0);

    let state = respond(state, generation, result(3, &["new"]));
    assert_eq!(state.query().skip, 0);
    assert!(!state.view().browse.can_go_older);
}

#[test]
fn unknown_site_selects_all_sources() {
    init_logging();
    let (state, _) = started(Some("site_id=1"));
    let (state, effects) = update(state, Msg::SiteSelected(Some(SiteId(77))));
    let (_, request) = last_search(&effects).unwrap();
    assert_eq!(request.site_id, None);
    assert_eq!(state.location(), "");
}

#[test]
fn failed_search_notifies_and_keeps_results() {
    init_logging();
    let (state, generation) = started(None);
    let state = respond(state, generation, result(12, &["kept"]));

    let (state, effects) = update(state, Msg::OlderClicked);
    let (generation, _) = last_search(&effects).unwrap();
    let (state, effects) = update(
        state,
        Msg::SearchCompleted {
            generation,
            result: Err("connection refused".to_string()),
        },
    );

    match effects.as_slice() {
        [Effect::Notify(notification)] => {
            assert_eq!(notification.level, NotificationLevel::Error);
            assert!(notification.message.contains("connection refused"));
        }
        other => panic!("unexpected effects {other:?}"),
    }
    let view = state.view();
    assert_eq!(view.browse.result_count, ResultCount::Exact(12));
    assert_eq!(view.browse.messages[0].text.plain_text(), "kept");
    assert!(!view.browse.searching);

    // Any later state change retries.
    let (_, effects) = update(state, Msg::NewerClicked);
    assert!(last_search(&effects).is_some());
}

#[test]
fn relevance_is_unavailable_without_query() {
    init_logging();
    let (state, generation) = started(None);
    let state = respond(state, generation, result(5, &["a"]));
    let (state, effects) = update(state, Msg::SortSelected(SortMode::Relevance));
    assert!(effects.is_empty());
    assert_eq!(state.query().sort, SortMode::Date);

    let options = state.view().browse.sort_options;
    assert!(options[0].enabled && options[0].selected);
    assert!(!options[1].enabled);
}

#[test]
fn capped_total_is_shown_as_more_than() {
    init_logging();
    let (state, generation) = started(None);
    let state = respond(state, generation, result(10_000, &["a"]));
    let label = state.view().browse.result_count.label();
    assert_eq!(label, "more than 10000");
}

#[test]
fn message_site_name_falls_back_to_message_source() {
    init_logging();
    let (state, generation) = started(None);
    let state = respond(
        state,
        generation,
        SearchResult {
            total: 2,
            messages: vec![message(2, "meow"), message(9, "orphan")],
        },
    );
    let view = state.view();
    assert_eq!(view.browse.messages[0].site_name.as_deref(), Some("Cats Daily"));
    assert_eq!(view.browse.messages[1].site_name, None);
}

#[test]
fn highlights_are_merged_into_displayed_text() {
    init_logging();
    let (state, generation) = started(Some("query=world"));
    let mut hit = message(1, "hello world");
    hit.highlight = Some(vec!["<em>world</em>".to_string()]);
    let state = respond(
        state,
        generation,
        SearchResult {
            total: 1,
            messages: vec![hit],
        },
    );
    let text = &state.view().browse.messages[0].text;
    assert_eq!(text.html, "hello <em>world</em>");
}

#[test]
fn location_restore_replaces_state() {
    init_logging();
    let (state, _) = started(Some("query=cats&sort=relevance&skip=10"));
    let (state, effects) = update(state, Msg::LocationRestored("?site_id=1".to_string()));
    assert!(effects.contains(&Effect::PublishLocation("site_id=1".to_string())));
    let query = state.query();
    assert_eq!(query.site_id, Some(SiteId(1)));
    assert_eq!(query.query, None);
    assert_eq!(query.skip, 0);
}
