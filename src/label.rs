pub const BREADCRUMB_SEPARATOR: &str = " / ";
const ELLIPSIS: &str = "…";

/// Greedily packs `segments` into lines no wider than `max_width`, joining the
/// segments of one line with `separator`. A segment wider than the limit gets a
/// line of its own.
pub fn wrap_segments<S, F>(
    segments: &[S],
    separator: &str,
    max_width: f32,
    measure: F,
) -> Vec<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut line = String::new();

    for segment in segments {
        let segment = segment.as_ref();
        if line.is_empty() {
            line.push_str(segment);
            continue;
        }

        let candidate = format!("{line}{separator}{segment}");
        if measure(&candidate) > max_width {
            lines.push(std::mem::take(&mut line));
            line.push_str(segment);
        } else {
            line = candidate;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

pub fn wrap_words<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let words = text.split_whitespace().collect::<Vec<_>>();
    wrap_segments(&words, " ", max_width, measure)
}

/// Breadcrumb lines for the center circle. A single name too wide for the
/// circle is broken between its words.
pub fn breadcrumb_lines<S, F>(names: &[S], max_width: f32, measure: F) -> Vec<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> f32,
{
    wrap_segments(names, BREADCRUMB_SEPARATOR, max_width, &measure)
        .into_iter()
        .flat_map(|line| {
            if measure(&line) > max_width {
                wrap_words(&line, max_width, &measure)
            } else {
                vec![line]
            }
        })
        .collect()
}

/// Shortens `text` with a trailing ellipsis until it fits `max_width`.
/// Returns `None` when not even the ellipsis fits.
pub fn ellipsize<F>(text: &str, max_width: f32, measure: F) -> Option<String>
where
    F: Fn(&str) -> f32,
{
    if measure(text) <= max_width {
        return Some(text.to_owned());
    }

    let mut chars = text.chars().collect::<Vec<_>>();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}{ELLIPSIS}", chars.iter().collect::<String>().trim_end());
        if measure(&candidate) <= max_width {
            return Some(candidate);
        }
    }

    (measure(ELLIPSIS) <= max_width).then(|| ELLIPSIS.to_owned())
}
