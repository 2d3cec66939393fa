//! HTML extraction for the team matches page.
//!
//! Two passes over the same document: scheduled fixtures out of the
//! upcoming-matches block, finished ones out of the results block. Entries
//! missing a required field are skipped individually so one malformed row
//! never sinks the rest of the page.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use matchday_common::{MatchRecord, SOURCE_HLTV};

const ORIGIN: &str = "https://www.hltv.org";

/// Extract every recognizable match record, upcoming first.
pub fn parse(html: &str) -> Vec<MatchRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();
    collect_upcoming(&document, &mut records);
    collect_results(&document, &mut records);
    records
}

fn collect_upcoming(document: &Html, records: &mut Vec<MatchRecord>) {
    let entries = sel(".upcoming-matches .upcoming-match");
    let team = sel(".team .team-name");
    let event = sel(".event .event-name");
    let time = sel(".match-time");
    let stream = sel(".stream-box");

    for (index, entry) in document.select(&entries).enumerate() {
        let (Some(opponent), Some(tournament), Some(date)) = (
            select_text(entry, &team),
            select_text(entry, &event),
            select_unix(entry, &time),
        ) else {
            debug!(index, "Skipping upcoming entry with missing fields");
            continue;
        };

        let stream_link = select_attr(entry, &stream, "data-stream-embed").map(absolute_link);

        records.push(MatchRecord {
            date,
            opponent,
            tournament,
            stage: None,
            stream_link,
            score: None,
            is_completed: false,
            source: SOURCE_HLTV.to_string(),
        });
    }
}

fn collect_results(document: &Html, records: &mut Vec<MatchRecord>) {
    let entries = sel(".results .result");
    let team = sel(".team .team-name");
    let event = sel(".event-name");
    let score = sel(".score");
    let date = sel(".date");

    for (index, entry) in document.select(&entries).enumerate() {
        let (Some(opponent), Some(tournament), Some(raw_score), Some(date)) = (
            select_text(entry, &team),
            select_text(entry, &event),
            select_text(entry, &score),
            select_unix(entry, &date),
        ) else {
            debug!(index, "Skipping result entry with missing fields");
            continue;
        };

        records.push(MatchRecord {
            date,
            opponent,
            tournament,
            stage: None,
            stream_link: None,
            score: Some(collapse_whitespace(&raw_score)),
            is_completed: true,
            source: SOURCE_HLTV.to_string(),
        });
    }
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// First matching descendant's text, trimmed; `None` when absent or blank.
fn select_text(scope: ElementRef, selector: &Selector) -> Option<String> {
    let text = scope.select(selector).next()?.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn select_attr(scope: ElementRef, selector: &Selector, name: &str) -> Option<String> {
    scope
        .select(selector)
        .next()?
        .value()
        .attr(name)
        .map(str::to_string)
}

/// The page publishes times as a `data-unix` attribute in epoch milliseconds.
fn select_unix(scope: ElementRef, selector: &Selector) -> Option<DateTime<Utc>> {
    let raw = select_attr(scope, selector, "data-unix")?;
    let millis = raw.parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis)
}

fn absolute_link(raw: String) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw;
    }
    match url::Url::parse(ORIGIN).and_then(|base| base.join(&raw)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => raw,
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"
        <html><body>
        <div class="upcoming-matches">
            <div class="upcoming-match">
                <div class="match-time" data-unix="1789066800000">19:00</div>
                <div class="team"><span class="team-name">Team Vitality</span></div>
                <div class="event"><span class="event-name">ESL Pro League Season 19</span></div>
                <div class="stream-box" data-stream-embed="/live?stream=esl_cs2">Stream</div>
            </div>
            <div class="upcoming-match">
                <div class="match-time" data-unix="1789239600000">17:30</div>
                <div class="team"><span class="team-name">Natus Vincere</span></div>
                <div class="event"><span class="event-name">BLAST Premier</span></div>
            </div>
        </div>
        <div class="results">
            <div class="result">
                <div class="team"><span class="team-name">FaZe</span></div>
                <span class="event-name">IEM Katowice</span>
                <div class="score">2
                    -   1</div>
                <div class="date" data-unix="1788480000000">result date</div>
            </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn extracts_upcoming_then_results() {
        let records = parse(SAMPLE_PAGE);
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.opponent, "Team Vitality");
        assert_eq!(first.tournament, "ESL Pro League Season 19");
        assert_eq!(
            first.date,
            DateTime::from_timestamp_millis(1789066800000).unwrap()
        );
        assert_eq!(
            first.stream_link.as_deref(),
            Some("https://www.hltv.org/live?stream=esl_cs2")
        );
        assert!(!first.is_completed);
        assert_eq!(first.score, None);
        assert_eq!(first.stage, None);
        assert_eq!(first.source, SOURCE_HLTV);

        let second = &records[1];
        assert_eq!(second.opponent, "Natus Vincere");
        assert_eq!(second.stream_link, None);

        let result = &records[2];
        assert_eq!(result.opponent, "FaZe");
        assert_eq!(result.tournament, "IEM Katowice");
        assert!(result.is_completed);
        assert_eq!(
            result.date,
            DateTime::from_timestamp_millis(1788480000000).unwrap()
        );
    }

    #[test]
    fn result_score_whitespace_is_collapsed() {
        let records = parse(SAMPLE_PAGE);
        assert_eq!(records[2].score.as_deref(), Some("2 - 1"));
    }

    #[test]
    fn entry_without_timestamp_is_skipped() {
        let html = r#"
            <div class="upcoming-matches">
                <div class="upcoming-match">
                    <div class="match-time">TBD</div>
                    <div class="team"><span class="team-name">MOUZ</span></div>
                    <div class="event"><span class="event-name">Cup</span></div>
                </div>
                <div class="upcoming-match">
                    <div class="match-time" data-unix="1789066800000">19:00</div>
                    <div class="team"><span class="team-name">G2</span></div>
                    <div class="event"><span class="event-name">Cup</span></div>
                </div>
            </div>
        "#;

        let records = parse(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].opponent, "G2");
    }

    #[test]
    fn entry_with_unparseable_timestamp_is_skipped() {
        let html = r#"
            <div class="upcoming-matches">
                <div class="upcoming-match">
                    <div class="match-time" data-unix="soon">19:00</div>
                    <div class="team"><span class="team-name">MOUZ</span></div>
                    <div class="event"><span class="event-name">Cup</span></div>
                </div>
            </div>
        "#;

        assert!(parse(html).is_empty());
    }

    #[test]
    fn entry_without_opponent_is_skipped() {
        let html = r#"
            <div class="results">
                <div class="result">
                    <span class="event-name">IEM Katowice</span>
                    <div class="score">0 - 2</div>
                    <div class="date" data-unix="1788480000000">x</div>
                </div>
            </div>
        "#;

        assert!(parse(html).is_empty());
    }

    #[test]
    fn absolute_stream_links_pass_through() {
        let html = r#"
            <div class="upcoming-matches">
                <div class="upcoming-match">
                    <div class="match-time" data-unix="1789066800000">19:00</div>
                    <div class="team"><span class="team-name">G2</span></div>
                    <div class="event"><span class="event-name">Cup</span></div>
                    <div class="stream-box" data-stream-embed="https://www.twitch.tv/esl_cs2"></div>
                </div>
            </div>
        "#;

        let records = parse(html);
        assert_eq!(
            records[0].stream_link.as_deref(),
            Some("https://www.twitch.tv/esl_cs2")
        );
    }

    #[test]
    fn pages_with_neither_section_yield_nothing() {
        assert!(parse("<html><body><p>maintenance</p></body></html>").is_empty());
        assert!(parse("").is_empty());
        assert!(parse("not html at all <<<>>>").is_empty());
    }
}
