/// Greedy word wrap against a pixel metric.
///
/// Words accumulate into a line while the measured width of the candidate
/// line stays within `max_width`; otherwise the line is flushed and the word
/// starts the next one. A word wider than `max_width` gets a line of its own
/// rather than being split. The measure function is supplied by the caller
/// so wrapping is exact for proportional fonts and testable without a
/// display.
pub fn wrap_text<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };

        if line.is_empty() || measure(&candidate) <= max_width {
            line = candidate;
        } else {
            lines.push(line);
            line = word.to_string();
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines
}
