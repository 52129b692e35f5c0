//! Line commands in, plain-text views out.
use std::fmt::Write as _;

use archive_core::{
    AdminViewModel, AppViewModel, BrowseViewModel, MediaKind, MessageView, Msg, Notification,
    NotificationLevel, Screen, SiteId, SortMode,
};
use chrono::NaiveDateTime;

pub(crate) const HELP: &str = "\
commands:
  site <id>|all            filter by source
  search <text>            full-text search
  clear                    drop the search text
  sort date|relevance      change ordering
  newer | older            page through results
  open <location>          jump to a saved location
  admin | browse           switch screens
  reindex <file>           rebuild the index of an archive
  download <url> <file>    fetch an archive into storage
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Dispatch(Msg),
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let msg = match word.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Ok(Some(Command::Quit)),
        "help" | "?" => return Ok(Some(Command::Help)),
        "site" => match rest {
            "" => return Err("usage: site <id>|all".to_string()),
            "all" => Msg::SiteSelected(None),
            id => {
                let id = id
                    .parse::<i64>()
                    .map_err(|_| format!("not a source id: {id}"))?;
                Msg::SiteSelected(Some(SiteId(id)))
            }
        },
        "search" if rest.is_empty() => return Err("usage: search <text>".to_string()),
        "search" => Msg::QuerySubmitted(rest.to_string()),
        "clear" => Msg::QueryCleared,
        "sort" => match SortMode::parse(rest) {
            Some(mode) => Msg::SortSelected(mode),
            None => return Err("usage: sort date|relevance".to_string()),
        },
        "newer" => Msg::NewerClicked,
        "older" => Msg::OlderClicked,
        "open" => Msg::LocationRestored(rest.to_string()),
        "admin" => Msg::AdminOpened,
        "browse" => Msg::BrowseOpened,
        "reindex" if rest.is_empty() => return Err("usage: reindex <file>".to_string()),
        "reindex" => Msg::ReindexClicked {
            file_name: rest.to_string(),
        },
        "download" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [url, file_name] => Msg::DownloadRequested {
                url: url.to_string(),
                file_name: file_name.to_string(),
            },
            _ => return Err("usage: download <url> <file>".to_string()),
        },
        other => return Err(format!("unknown command {other:?}; try help")),
    };
    Ok(Some(Command::Dispatch(msg)))
}

pub(crate) fn render(view: &AppViewModel, location: &str) -> String {
    match view.screen {
        Screen::Browse => render_browse(&view.browse, location),
        Screen::Admin => render_admin(&view.admin),
    }
}

pub(crate) fn render_notification(notification: &Notification) -> String {
    match notification.level {
        NotificationLevel::Info => format!("note: {}", notification.message),
        NotificationLevel::Error => format!("error: {}", notification.message),
    }
}

fn render_browse(view: &BrowseViewModel, location: &str) -> String {
    let mut out = String::new();
    if view.loading {
        out.push_str("loading sources...\n");
    }
    let site = view.selected_site.as_deref().unwrap_or("all sources");
    let query = view.query.as_deref().unwrap_or("");
    let _ = writeln!(out, "== {site} | search: {query:?} | ?{location}");

    let sorts: Vec<String> = view
        .sort_options
        .iter()
        .map(|option| match (option.selected, option.enabled) {
            (true, _) => format!("[{}]", option.label),
            (false, true) => option.label.to_string(),
            (false, false) => format!("({})", option.label),
        })
        .collect();
    let _ = writeln!(
        out,
        "sort: {} | {}{}",
        sorts.join(" "),
        view.result_count.label(),
        if view.searching { " | searching..." } else { "" }
    );

    for message in &view.messages {
        render_message(&mut out, message);
    }

    let _ = writeln!(
        out,
        "page {} {}{}",
        view.page,
        if view.can_go_newer { "<newer " } else { "" },
        if view.can_go_older { "older>" } else { "" }
    );
    out
}

fn render_message(out: &mut String, message: &MessageView) {
    let site = message.site_name.as_deref().unwrap_or("?");
    let _ = writeln!(out, "-- {} | {}", site, display_date(&message.date));
    let text: String = message
        .text
        .segments()
        .into_iter()
        .map(|segment| {
            if segment.emphasized {
                format!("*{}*", segment.text)
            } else {
                segment.text
            }
        })
        .collect();
    for line in text.lines() {
        let _ = writeln!(out, "   {line}");
    }
    for media in &message.media {
        let kind = match media.kind {
            MediaKind::Photo => "photo",
            MediaKind::Thumbnail => "video",
            MediaKind::File => "file",
        };
        let path = media.path.as_deref().unwrap_or("(missing from archive)");
        match &media.target {
            Some(target) => {
                let _ = writeln!(out, "   [{kind}] {path} -> {target}");
            }
            None => {
                let _ = writeln!(out, "   [{kind}] {path}");
            }
        }
    }
    for link in &message.links {
        let _ = writeln!(out, "   link: {link}");
    }
}

/// Backend dates are ISO 8601 without zone; shown to the minute.
fn display_date(raw: &str) -> String {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn render_admin(view: &AdminViewModel) -> String {
    let mut out = String::new();
    let mut flags = Vec::new();
    if view.refreshing {
        flags.push("refreshing");
    }
    if view.polling {
        flags.push("jobs running");
    }
    let _ = writeln!(out, "== archives {}", flags.join(", "));
    if view.loading {
        out.push_str("loading...\n");
        return out;
    }
    for row in &view.rows {
        let _ = writeln!(
            out,
            "{:<32} {:<20} {:>9}  {}",
            row.file_name,
            row.source_name.as_deref().unwrap_or("-"),
            row.size_label,
            row.status.label()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use archive_core::{update, AppState, Generation, Message, SearchResult};

    use super::*;

    fn dispatch(line: &str) -> Msg {
        match parse_command(line) {
            Ok(Some(Command::Dispatch(msg))) => msg,
            other => panic!("{line}: {other:?}"),
        }
    }

    #[test]
    fn commands_map_to_messages() {
        assert_eq!(dispatch("site 4"), Msg::SiteSelected(Some(SiteId(4))));
        assert_eq!(dispatch("site all"), Msg::SiteSelected(None));
        assert_eq!(
            dispatch("search  black cat "),
            Msg::QuerySubmitted("black cat".to_string())
        );
        assert_eq!(dispatch("SORT relevance"), Msg::SortSelected(SortMode::Relevance));
        assert_eq!(dispatch("older"), Msg::OlderClicked);
        assert_eq!(
            dispatch("open site_id=1&skip=10"),
            Msg::LocationRestored("site_id=1&skip=10".to_string())
        );
        assert_eq!(
            dispatch("download https://x.org/a.zip a.zip"),
            Msg::DownloadRequested {
                url: "https://x.org/a.zip".to_string(),
                file_name: "a.zip".to_string(),
            }
        );
        assert_eq!(parse_command("quit"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn malformed_commands_explain_usage() {
        for line in ["site", "site abc", "search", "sort newest", "download a.zip", "frobnicate"] {
            assert!(parse_command(line).is_err(), "{line}");
        }
    }

    #[test]
    fn browse_view_renders_highlights_and_navigation() {
        let (state, _) = update(
            AppState::new(),
            Msg::Started {
                location: Some("query=cat".to_string()),
            },
        );
        let (state, _) = update(
            state,
            Msg::SearchCompleted {
                generation: Generation(1),
                result: Ok(SearchResult {
                    total: 25,
                    messages: vec![Message {
                        date: "2021-05-01T12:34:56".to_string(),
                        text: "a cat sat".to_string(),
                        highlight: Some(vec!["a <em>cat</em>".to_string()]),
                        ..Message::default()
                    }],
                }),
            },
        );

        let text = render(&state.view(), state.location());
        assert!(text.contains("?query=cat"), "{text}");
        assert!(text.contains("found: 25"), "{text}");
        assert!(text.contains("2021-05-01 12:34"), "{text}");
        assert!(text.contains("a *cat* sat"), "{text}");
        assert!(text.contains("older>"), "{text}");
        assert!(!text.contains("<newer"), "{text}");
    }

    #[test]
    fn unparsable_dates_are_shown_raw() {
        assert_eq!(display_date("yesterday"), "yesterday");
    }
}
