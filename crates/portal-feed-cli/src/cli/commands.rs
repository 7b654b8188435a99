use std::future::Future;
use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use portal_feed_core::feed::{badge_label, counts_by_type, Preview};
use portal_feed_core::services::MarkOutcome;
use portal_feed_core::{EventStore, FeedPageState, FeedSession, FilterState};

use super::render;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedCommand {
    Feed(FilterState),
    Stats,
    Notifications { limit: Option<usize> },
    Unread,
    MarkRead { id: String },
    MarkAllRead,
    Watch,
}

/// Rendered output of a one-shot command. `failed` is set when the command
/// completed but has an error state to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub failed: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            failed: false,
        }
    }
}

pub async fn execute<S: EventStore>(
    session: &FeedSession<S>,
    command: &FeedCommand,
    json: bool,
) -> Result<CommandOutput> {
    debug!(?command, json, "executing command");

    match command {
        FeedCommand::Feed(filter) => {
            // A failed fetch is rendered through the page state
            let _ = session.refresh().await;
            let page = session.page(filter);
            let failed = matches!(page, FeedPageState::Error { .. });
            let text = if json {
                serde_json::to_string_pretty(&render::page_json(&page))?
            } else {
                render::render_page(&page, filter, session.calendar())
            };
            Ok(CommandOutput { text, failed })
        }
        FeedCommand::Stats => {
            session.refresh().await.context("Failed to load activities")?;
            let stats = session.stats().unwrap_or_default();
            let activities = session.activities();
            let text = if json {
                serde_json::to_string_pretty(&json!({
                    "stats": stats,
                    "byType": counts_by_type(&activities)
                        .into_iter()
                        .map(|(t, n)| json!({ "type": t, "count": n }))
                        .collect::<Vec<_>>(),
                }))?
            } else {
                let breakdown = render::render_type_breakdown(&activities);
                if breakdown.is_empty() {
                    render::render_stats(&stats)
                } else {
                    format!("{}\n\nBy type:\n{}", render::render_stats(&stats), breakdown)
                }
            };
            Ok(CommandOutput::ok(text))
        }
        FeedCommand::Notifications { limit } => {
            session.refresh().await.context("Failed to load notifications")?;
            session.refresh_unread().await.context("Failed to load unread count")?;
            let limit = limit.unwrap_or(session.config().preview_limit);
            let preview = Preview::build(&session.notifications(), limit, session.unread_count());
            let text = if json {
                serde_json::to_string_pretty(&render::preview_json(&preview))?
            } else {
                render::render_preview(&preview, Utc::now(), session.calendar())
            };
            Ok(CommandOutput::ok(text))
        }
        FeedCommand::Unread => {
            let count = session
                .refresh_unread()
                .await
                .context("Failed to load unread count")?;
            let text = if json {
                serde_json::to_string(&json!({ "unread": count, "badge": badge_label(count) }))?
            } else {
                render::render_unread(count)
            };
            Ok(CommandOutput::ok(text))
        }
        FeedCommand::MarkRead { id } => {
            session.refresh().await.context("Failed to load notifications")?;
            session.refresh_unread().await.context("Failed to load unread count")?;
            let outcome = session.mark_read(id).await?;
            info!(id = %id, ?outcome, "mark read finished");
            mark_output(session, outcome, id, json)
        }
        FeedCommand::MarkAllRead => {
            session.refresh().await.context("Failed to load notifications")?;
            session.refresh_unread().await.context("Failed to load unread count")?;
            let outcome = session.mark_all_read().await?;
            mark_output(session, outcome, "all", json)
        }
        FeedCommand::Watch => bail!("watch streams updates and must be run through watch()"),
    }
}

fn mark_output<S: EventStore>(
    session: &FeedSession<S>,
    outcome: MarkOutcome,
    target: &str,
    json: bool,
) -> Result<CommandOutput> {
    let unread = session.unread_count();
    let pending = session.pending_writes();
    let text = if json {
        serde_json::to_string(&json!({
            "target": target,
            "marked": outcome == MarkOutcome::Marked,
            "unread": unread,
            "pending": pending,
        }))?
    } else {
        let mut text = match outcome {
            MarkOutcome::Marked if target == "all" => "Marked all notifications as read".to_string(),
            MarkOutcome::Marked => format!("Marked {} as read", target),
            MarkOutcome::AlreadyRead if target == "all" => "Nothing to mark".to_string(),
            MarkOutcome::AlreadyRead => format!("{} was already read", target),
        };
        text.push('\n');
        text.push_str(&render::render_unread(unread));
        if !pending.is_empty() {
            text.push_str(&format!("\nQueued for retry: {}", pending.join(", ")));
        }
        text
    };
    Ok(CommandOutput {
        text,
        failed: !pending.is_empty(),
    })
}

/// Print the badge every time the shared unread counter moves, until
/// `shutdown` resolves or polling stops for good.
pub async fn watch<S, W, F>(session: &FeedSession<S>, json: bool, out: &mut W, shutdown: F) -> Result<()>
where
    S: EventStore,
    W: Write,
    F: Future<Output = ()>,
{
    let mut view = session.unread_view();
    session.start()?;
    let mut ticker = tokio::time::interval(session.config().poll_interval());
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            _ = &mut shutdown => break Ok(()),
            changed = view.changed() => match changed {
                Ok(count) => {
                    if json {
                        writeln!(out, "{}", json!({ "unread": count, "badge": badge_label(count) }))?;
                    } else {
                        writeln!(out, "{}", render::render_unread(count))?;
                    }
                    out.flush()?;
                }
                Err(_) => break Ok(()),
            },
            _ = ticker.tick() => {
                if !session.is_polling() {
                    break match session.last_unread_error() {
                        Some(err) => Err(anyhow::Error::new(err).context("Unread count polling stopped")),
                        None => Ok(()),
                    };
                }
            }
        }
    };

    session.shutdown();
    result
}
