//! Plain-text and JSON rendering of feed views.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use portal_feed_core::calendar::Calendar;
use portal_feed_core::feed::{badge_label, counts_by_type, relative_time_label, FeedStats, Preview};
use portal_feed_core::models::{Activity, FilterState};
use portal_feed_core::{FeedPageState, FeedView};

pub fn render_stats(stats: &FeedStats) -> String {
    format!(
        "Total: {}  New: {}  Critical: {}  Today: {}",
        stats.total, stats.new, stats.critical, stats.today
    )
}

pub fn render_type_breakdown(activities: &[Activity]) -> String {
    counts_by_type(activities)
        .into_iter()
        .map(|(activity_type, count)| format!("  {:<22} {}", activity_type.label(), count))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_activity(activity: &Activity, calendar: &Calendar) -> String {
    let time = activity.timestamp.with_timezone(&calendar.offset()).format("%H:%M");
    format!(
        "  {}  [{}] {} ({}, {})",
        time,
        activity.activity_type.label(),
        activity.title,
        activity.priority,
        activity.status
    )
}

fn render_view(view: &FeedView, calendar: &Calendar, lines: &mut Vec<String>) {
    for bucket in view.buckets.iter() {
        lines.push(bucket.header());
        for activity in &bucket.items {
            lines.push(render_activity(activity, calendar));
        }
    }
}

pub fn render_page(page: &FeedPageState, filter: &FilterState, calendar: &Calendar) -> String {
    let mut lines = Vec::new();
    if !filter.is_cleared() {
        lines.push(format!("Filters: {} ({})", filter, filter.time_range.label()));
    }

    match page {
        FeedPageState::Loading => lines.push("Loading...".to_string()),
        FeedPageState::Ready(view) => {
            lines.push(render_stats(&view.stats));
            lines.push(String::new());
            render_view(view, calendar, &mut lines);
        }
        FeedPageState::Empty {
            stats,
            filtered_out,
        } => {
            lines.push(render_stats(stats));
            lines.push(String::new());
            if *filtered_out {
                lines.push("No activities match the current filters.".to_string());
            } else {
                lines.push("No activities yet.".to_string());
            }
        }
        FeedPageState::Error { error, stale } => {
            let hint = if page.is_retryable() {
                "run the command again to retry"
            } else {
                "sign in again"
            };
            lines.push(format!("Error: {} ({})", error, hint));
            if let Some(view) = stale {
                lines.push(format!(
                    "Showing stale data from {}",
                    view.fetched_at.with_timezone(&calendar.offset()).format("%Y-%m-%d %H:%M")
                ));
                lines.push(render_stats(&view.stats));
                lines.push(String::new());
                render_view(view, calendar, &mut lines);
            }
        }
    }

    lines.join("\n")
}

pub fn render_preview(preview: &Preview, now: DateTime<Utc>, calendar: &Calendar) -> String {
    let mut lines = Vec::new();
    let badge = preview.badge();
    if badge.is_empty() {
        lines.push("Notifications".to_string());
    } else {
        lines.push(format!("Notifications ({} unread)", badge));
    }

    if preview.is_empty() {
        lines.push("  No notifications".to_string());
    }
    for n in &preview.items {
        let marker = if n.is_read { " " } else { "*" };
        lines.push(format!(
            "{} {:<10} {} - {}",
            marker,
            relative_time_label(n.created_at, now, calendar),
            n.title,
            n.id
        ));
    }

    lines.join("\n")
}

pub fn render_unread(count: u64) -> String {
    match badge_label(count).as_str() {
        "" => "No unread notifications".to_string(),
        badge => format!("{} unread", badge),
    }
}

fn view_json(view: &FeedView) -> Value {
    json!({
        "stats": view.stats,
        "matched": view.matched,
        "fetchedAt": view.fetched_at,
        "buckets": view.buckets.iter().map(|b| json!({
            "label": b.label.to_string(),
            "count": b.count(),
            "items": b.items,
        })).collect::<Vec<_>>(),
    })
}

pub fn page_json(page: &FeedPageState) -> Value {
    match page {
        FeedPageState::Loading => json!({ "state": "loading" }),
        FeedPageState::Ready(view) => {
            let mut value = view_json(view);
            value["state"] = json!("ready");
            value
        }
        FeedPageState::Empty {
            stats,
            filtered_out,
        } => json!({ "state": "empty", "stats": stats, "filteredOut": filtered_out }),
        FeedPageState::Error { error, stale } => json!({
            "state": "error",
            "error": error.to_string(),
            "retryable": page.is_retryable(),
            "stale": stale.as_ref().map(view_json),
        }),
    }
}

pub fn preview_json(preview: &Preview) -> Value {
    json!({
        "unread": preview.unread,
        "badge": preview.badge(),
        "items": preview.items,
    })
}
