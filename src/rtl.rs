//! Visual reordering for right-to-left scripts.
//!
//! The host lays text out strictly left to right, so right-to-left text has
//! to be stored in visual order: word order is reversed and each word is
//! reversed, except that runs of ASCII letters and digits (numbers, Latin
//! names) keep their reading order. Applying the transform twice gives back
//! the input.

/// Reorders `text` for display, line by line.
pub fn reverse_for_display(text: &str) -> String {
    text.split('\n')
        .map(reverse_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn reverse_line(line: &str) -> String {
    line.split(' ')
        .rev()
        .map(reverse_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn reverse_word(word: &str) -> String {
    let mut runs: Vec<(bool, String)> = Vec::new();
    for ch in word.chars() {
        let latin = ch.is_ascii_alphanumeric();
        match runs.last_mut() {
            Some((kind, run)) if *kind == latin => run.push(ch),
            _ => runs.push((latin, ch.to_string())),
        }
    }

    let mut out = String::with_capacity(word.len());
    for (latin, run) in runs.into_iter().rev() {
        if latin {
            out.push_str(&run);
        } else {
            out.extend(run.chars().rev());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_words_and_characters() {
        assert_eq!(reverse_for_display("مرحبا بك"), "كب ابحرم");
    }

    #[test]
    fn keeps_numbers_in_reading_order() {
        assert_eq!(reverse_for_display("عام 2024"), "2024 ماع");
        assert_eq!(reverse_for_display("ABC123-x"), "x-ABC123");
    }

    #[test]
    fn lines_are_reordered_independently() {
        assert_eq!(reverse_for_display("اب\nجد"), "با\nدج");
    }

    #[test]
    fn transform_is_an_involution() {
        let input = "شارك 3 صور مع Figma!";
        assert_eq!(reverse_for_display(&reverse_for_display(input)), input);
    }
}
