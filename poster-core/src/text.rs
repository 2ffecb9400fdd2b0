//! Approximate text metrics.
//!
//! Text blocks have no persisted height; it follows from content, font size
//! and block width. Hit-testing on the edit surface and line layout on the
//! export surface share these metrics so both agree on where lines break.

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.25;

/// Average glyph advance for a font size and weight.
#[must_use]
pub fn advance(font_size: f32, font_weight: u16) -> f32 {
    let factor = if font_weight >= 600 { 0.6 } else { 0.55 };
    font_size * factor
}

/// Estimated rendered width of a single line.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn measure(line: &str, font_size: f32, font_weight: u16) -> f32 {
    line.chars().count() as f32 * advance(font_size, font_weight)
}

/// Greedy word wrap into `width`.
///
/// Explicit newlines start a new line; words wider than the block are broken
/// by character.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn wrap(text: &str, font_size: f32, font_weight: u16, width: f32) -> Vec<String> {
    let adv = advance(font_size, font_weight).max(f32::EPSILON);
    let max_chars = ((width / adv).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = chars.split_off(max_chars);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }
            let word_len = chars.len();
            if current_len > 0 && current_len + 1 + word_len > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(chars);
            current_len += word_len;
        }
        lines.push(current);
    }
    lines
}

/// Estimated height of a wrapped text block; at least one line.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn block_height(text: &str, font_size: f32, font_weight: u16, width: f32) -> f32 {
    let lines = wrap(text, font_size, font_weight, width).len().max(1);
    lines as f32 * font_size * LINE_HEIGHT
}
