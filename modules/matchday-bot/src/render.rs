//! Chat message formatting. Pure functions over match records so every
//! reply can be asserted on without a live chat.

use chrono::{DateTime, Utc};

use matchday_common::MatchRecord;

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y %H:%M UTC").to_string()
}

pub fn greeting(team: &str, first_name: &str) -> String {
    format!(
        "Hey {first_name}! 👋\n\nI track *{team}*'s match calendar.\n\
         Pick something from the menu below, or use the / commands."
    )
}

pub fn upcoming_list(team: &str, matches: &[MatchRecord]) -> String {
    if matches.is_empty() {
        return format!("No upcoming *{team}* matches on the calendar right now.");
    }

    let mut out = format!("📅 *Upcoming {team} matches*\n");
    for record in matches {
        out.push_str(&format!(
            "\n⏰ {}\n⚔️ vs *{}*\n🏆 {}\n",
            format_date(&record.date),
            record.opponent,
            record.tournament
        ));
        if let Some(stage) = &record.stage {
            out.push_str(&format!("📍 {stage}\n"));
        }
        if let Some(link) = &record.stream_link {
            out.push_str(&format!("🔴 [Watch live]({link})\n"));
        }
    }
    out
}

pub fn results_list(team: &str, matches: &[MatchRecord]) -> String {
    if matches.is_empty() {
        return format!("No recent *{team}* results yet.");
    }

    let mut out = format!("🏆 *Latest {team} results*\n");
    for record in matches {
        out.push_str(&format!(
            "\n📆 {}\n⚔️ vs *{}*\n🔢 {}\n🏆 {}\n",
            format_date(&record.date),
            record.opponent,
            record.score.as_deref().unwrap_or("?"),
            record.tournament
        ));
    }
    out
}

/// Upcoming matches that have an announced stream.
pub fn watch_list(matches: &[MatchRecord]) -> String {
    let with_links: Vec<&MatchRecord> = matches
        .iter()
        .filter(|r| r.stream_link.is_some())
        .collect();

    if with_links.is_empty() {
        return "No streams announced for the next matches yet.".to_string();
    }

    let mut out = String::from("📺 *Announced streams*\n");
    for record in with_links {
        if let Some(link) = &record.stream_link {
            out.push_str(&format!(
                "\n{} vs *{}*\n[Watch here]({})\n",
                format_date(&record.date),
                record.opponent,
                link
            ));
        }
    }
    out
}
