//! LRC lyric parsing and playback-time synchronization.

use std::time::Duration;

/// A single lyric line with its start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub time: Duration,
    pub text: String,
}

/// Ascending-sorted sequence of lyric lines derived from LRC text.
#[derive(Debug, Clone, Default)]
pub struct LyricTimeline {
    lines: Vec<LyricLine>,
}

impl LyricTimeline {
    /// Parse LRC text into a timeline.
    ///
    /// Each input line may carry any number of `[mm:ss.ff]` timestamp tags
    /// (2 or 3 fraction digits), anywhere in the line. All tags are stripped
    /// to obtain the line's text; lines whose stripped text is empty produce
    /// nothing. A line with several tags yields one entry per tag, all
    /// sharing the same text. The result is sorted ascending by time, stable
    /// for equal times.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut lines = Vec::new();

        for raw in input.lines() {
            let (times, text) = strip_timestamp_tags(raw);
            if text.is_empty() {
                continue;
            }
            for time in times {
                lines.push(LyricLine {
                    time,
                    text: text.clone(),
                });
            }
        }

        lines.sort_by_key(|l| l.time);
        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the greatest-time entry whose time is `<=` the playback
    /// position, or `None` if no entry has started yet (including the empty
    /// timeline). Entries are sorted, so this is a binary search.
    #[must_use]
    pub fn current_line_index(&self, position: Duration) -> Option<usize> {
        let upcoming = self.lines.partition_point(|l| l.time <= position);
        upcoming.checked_sub(1)
    }

    /// The lyric line active at the given playback position.
    #[must_use]
    pub fn current_line(&self, position: Duration) -> Option<&LyricLine> {
        self.current_line_index(position).map(|i| &self.lines[i])
    }
}

/// Remove every `[mm:ss.ff]` tag from a line, collecting the tag times and
/// returning the trimmed remainder.
fn strip_timestamp_tags(line: &str) -> (Vec<Duration>, String) {
    let mut times = Vec::new();
    let mut text = String::new();
    let mut rest = line;

    while !rest.is_empty() {
        if rest.starts_with('[') {
            if let Some((time, consumed)) = parse_timestamp_tag(rest) {
                times.push(time);
                rest = &rest[consumed..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            text.push(ch);
        }
        rest = chars.as_str();
    }

    (times, text.trim().to_string())
}

/// Parse one `[mm:ss.ff]` tag at the start of `input`, returning the decoded
/// time and the tag's byte length. `mm` and `ss` are exactly two digits; the
/// fraction is two or three digits.
fn parse_timestamp_tag(input: &str) -> Option<(Duration, usize)> {
    let end = input.find(']')?;
    let inner = &input[1..end];

    let (minutes, rest) = inner.split_once(':')?;
    let (seconds, fraction) = rest.split_once('.')?;

    if minutes.len() != 2 || seconds.len() != 2 || !(2..=3).contains(&fraction.len()) {
        return None;
    }
    if !is_all_digits(minutes) || !is_all_digits(seconds) || !is_all_digits(fraction) {
        return None;
    }

    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    let fraction_value: u64 = fraction.parse().ok()?;
    let fraction_ms = if fraction.len() == 2 {
        fraction_value * 10
    } else {
        fraction_value
    };

    let millis = (minutes * 60 + seconds) * 1000 + fraction_ms;
    Some((Duration::from_millis(millis), end + 1))
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
