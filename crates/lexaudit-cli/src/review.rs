//! Interactive review loop (`lexaudit review`).
//!
//! Reads one command per line from stdin while the poller refreshes the
//! pending list in the background. The badge is reprinted whenever the
//! pending count changes and poll failures are shown as they happen.

use anyhow::{Context, Result};
use lexaudit_core::UpdateId;
use lexaudit_store::badge_label;
use lexaudit_sync::{Notice, RefreshOutcome, ResolveOutcome, ReviewSession, SkipReason};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::display;

const HELP: &str = "\
commands:
  refresh          fetch the pending list now
  list             show pending updates (* = selected)
  select <id>      select an update
  show [<id>]      show the selected update, or fetch <id> from the server
  accept           accept the selected update
  reject           reject the selected update
  crawl <url>      crawl a government page for new rates
  notices          list notices
  dismiss          dismiss the oldest notice
  help             show this help
  quit             leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Refresh,
    List,
    Select(UpdateId),
    Show(Option<UpdateId>),
    Accept,
    Reject,
    Crawl(String),
    Notices,
    Dismiss,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word {
        "" => return Ok(None),
        "refresh" | "r" => Command::Refresh,
        "list" | "ls" => Command::List,
        "select" | "s" if rest.is_empty() => return Err("usage: select <id>".into()),
        "select" | "s" => Command::Select(UpdateId::new(rest)),
        "show" => Command::Show((!rest.is_empty()).then(|| UpdateId::new(rest))),
        "accept" | "a" => Command::Accept,
        "reject" => Command::Reject,
        // Blank URLs are passed through and rejected by the session.
        "crawl" => Command::Crawl(rest.to_string()),
        "notices" => Command::Notices,
        "dismiss" | "d" => Command::Dismiss,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command {other:?} (try `help`)")),
    };
    Ok(Some(command))
}

pub async fn run(session: ReviewSession) -> Result<()> {
    let mut counter = session.counter();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    session.start();
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => execute(&session, command).await,
                    Ok(None) => {}
                    Err(usage) => println!("{usage}"),
                }
            }
            Some(count) = counter.changed() => print_badge(count),
            Some(notice) = session.next_notice() => println!("{notice}"),
        }
    }

    session.stop();
    debug!("review session ended");
    Ok(())
}

async fn execute(session: &ReviewSession, command: Command) {
    // Failures are already queued as notices; echo them once here.
    let failure = match command {
        Command::Refresh => match session.refresh().await {
            Ok(RefreshOutcome::Applied { count }) => {
                print_badge(count);
                None
            }
            Ok(RefreshOutcome::Coalesced) => {
                println!("Refresh already in progress.");
                None
            }
            Ok(RefreshOutcome::Discarded | RefreshOutcome::Stopped) => None,
            Err(err) => Some(err),
        },
        Command::List => {
            let snap = session.store().snapshot();
            display::print_update_list(&snap.updates, snap.selected.as_ref());
            None
        }
        Command::Select(id) => {
            if !session.select(&id) {
                println!("Update {id} is not pending.");
            }
            None
        }
        Command::Show(None) => {
            match session.store().snapshot().selected_update() {
                Some(update) => display::print_update_card(update),
                None => println!("No update selected."),
            }
            None
        }
        Command::Show(Some(id)) => match session.update_detail(&id).await {
            Ok(update) => {
                display::print_update_card(&update);
                None
            }
            Err(err) => Some(err),
        },
        Command::Accept => report_resolution(session.accept().await),
        Command::Reject => report_resolution(session.reject().await),
        Command::Crawl(url) => {
            println!("Crawling {url} ...");
            match session.trigger_crawl(&url).await {
                Ok(summary) => {
                    display::print_crawl_summary(&summary);
                    None
                }
                Err(err) => Some(err),
            }
        }
        Command::Notices => {
            let notices = session.notices();
            if notices.is_empty() {
                println!("No notices.");
            }
            for notice in notices {
                println!("{notice}");
            }
            None
        }
        Command::Dismiss => {
            match session.dismiss() {
                Some(notice) => println!("Dismissed: {}", notice.message),
                None => println!("No notices."),
            }
            None
        }
        Command::Help => {
            println!("{HELP}");
            None
        }
        Command::Quit => None,
    };
    if let Some(err) = failure {
        println!("{}", Notice::from(&err));
    }
}

fn report_resolution(
    result: Result<ResolveOutcome, lexaudit_sync::ReviewError>,
) -> Option<lexaudit_sync::ReviewError> {
    match result {
        Ok(ResolveOutcome::Resolved { id, decision, .. }) => {
            println!("Update {id}: {decision}ed.");
        }
        Ok(ResolveOutcome::AlreadyResolved { id }) => {
            println!("Update {id} was already resolved.");
        }
        Ok(ResolveOutcome::Skipped(SkipReason::NoSelection)) => println!("No update selected."),
        Ok(ResolveOutcome::Skipped(SkipReason::Busy)) => {
            println!("Another decision is still in progress.");
        }
        Ok(ResolveOutcome::Skipped(SkipReason::NotPending(id))) => {
            println!("Update {id} is no longer pending.");
        }
        Err(err) => return Some(err),
    }
    None
}

fn print_badge(count: usize) {
    match badge_label(count) {
        Some(label) => println!("[{label}]"),
        None => println!("[no pending updates]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(parse("  list "), Ok(Some(Command::List)));
        assert_eq!(
            parse("select 42"),
            Ok(Some(Command::Select(UpdateId::new("42"))))
        );
        assert_eq!(parse("show"), Ok(Some(Command::Show(None))));
        assert_eq!(
            parse("show 7"),
            Ok(Some(Command::Show(Some(UpdateId::new("7")))))
        );
        assert_eq!(
            parse("crawl https://gov.example/notices"),
            Ok(Some(Command::Crawl("https://gov.example/notices".into())))
        );
        assert_eq!(parse("q"), Ok(Some(Command::Quit)));
        assert_eq!(parse(""), Ok(None));
    }

    #[test]
    fn blank_crawl_reaches_session_validation() {
        assert_eq!(parse("crawl   "), Ok(Some(Command::Crawl(String::new()))));
    }

    #[test]
    fn rejects_unknown_and_incomplete_commands() {
        assert!(parse("select").is_err());
        assert!(parse("approve 3").unwrap_err().contains("unknown command"));
    }
}
