use crate::geometry::Position;

/// `info!` that drops ANSI colour codes unless `colorful` is set
#[macro_export]
macro_rules! cinfo {
    ($colorful:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        if $colorful {
            log::info!("{}", message);
        } else {
            log::info!("{}", $crate::utils::strip_ansi(&message));
        }
    }};
}

/// Removes `ESC [ ... <letter>` sequences
pub fn strip_ansi(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for code in chars.by_ref() {
                if code.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            stripped.push(c);
        }
    }
    stripped
}

pub fn display_generation_legend() -> String {
    format!(
        "\x1b[2;97m{:>6} | {:>14} | {:>14} | {:>10}\x1b[0m",
        "gen", "max fitness", "mean fitness", "stagnation"
    )
}

/// One line per generation; a new global best is highlighted
pub fn display_generation(
    generation: usize,
    max_fitness: f64,
    mean_fitness: f64,
    stagnation: usize,
    max_stagnation: usize,
    improved: bool,
) -> String {
    let (color, marker) = if improved { ("\x1b[1;92m", " *") } else { ("\x1b[0m", "") };
    format!(
        "{}{:>6} | {:>14.4} | {:>14.4} | {:>5}/{:<4}{}\x1b[0m",
        color, generation, max_fitness, mean_fitness, stagnation, max_stagnation, marker
    )
}

pub fn format_layout(positions: &[Position]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;92mbest\x1b[0m run"), "best run");
        assert_eq!(strip_ansi("plain"), "plain");
        assert_eq!(strip_ansi(&display_generation_legend()).trim_start(), "gen |    max fitness |   mean fitness | stagnation");
    }

    #[test]
    fn test_display_generation_marks_improvement() {
        let improved = strip_ansi(&display_generation(3, 12.5, 4.25, 0, 10, true));
        assert!(improved.ends_with(" *"), "{}", improved);
        assert!(improved.contains("12.5000"));
        assert!(improved.contains("4.2500"));

        let flat = strip_ansi(&display_generation(4, 12.5, 5.0, 1, 10, false));
        assert!(!flat.contains('*'));
        assert!(flat.contains("1/10"));
    }

    #[test]
    fn test_format_layout() {
        let positions = vec![Position::new(1, 2), Position::new(30, 4)];
        assert_eq!(format_layout(&positions), "(1, 2) (30, 4)");
        assert_eq!(format_layout(&[]), "");
    }
}
