//! Style roles expressed as an enum + macro mapping logical names to `colored::Color`.
//!
//! Coloring is applied only when the `enabled` flag passed to `paint()` is
//! true, so callers decide once (TTY detection, `--no-color`) and pass it down.
//!
//! ```
//! use relayq::core::styles::StyleRole;
//! let plain = StyleRole::Queue.paint("jobs", false);
//! assert_eq!(plain, "jobs");
//! let colored = StyleRole::Queue.paint("jobs", true);
//! assert!(colored.starts_with("\x1b["));
//! assert!(colored.ends_with("\x1b[0m"));
//! ```

use colored::Color;

macro_rules! style {
    ( $( $variant:ident => $color:expr ),+ $(,)? ) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum StyleRole { $( $variant ),+ }

        impl StyleRole {
            pub fn color(self) -> Option<Color> {
                match self { $( StyleRole::$variant => $color ),+ }
            }

            pub fn paint(self, text: &str, enabled: bool) -> String {
                if !enabled {
                    return text.to_string();
                }
                match self.color().and_then(ansi_code) {
                    Some(code) => format!("\x1b[{}m{}\x1b[0m", code, text),
                    None => text.to_string(),
                }
            }
        }
    };
}

style! {
    Timestamp => Some(Color::BrightBlack),
    Queue => Some(Color::Cyan),
    Payload => None,
    Returned => Some(Color::Yellow),
    Summary => Some(Color::Green),
}

fn ansi_code(color: Color) -> Option<String> {
    let code = match color {
        Color::Black => "30",
        Color::Red => "31",
        Color::Green => "32",
        Color::Yellow => "33",
        Color::Blue => "34",
        Color::Magenta => "35",
        Color::Cyan => "36",
        Color::White => "37",
        Color::BrightBlack => "90",
        Color::BrightRed => "91",
        Color::BrightGreen => "92",
        Color::BrightYellow => "93",
        Color::BrightBlue => "94",
        Color::BrightMagenta => "95",
        Color::BrightCyan => "96",
        Color::BrightWhite => "97",
        Color::TrueColor { r, g, b } => return Some(format!("38;2;{};{};{}", r, g, b)),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(code.to_string())
}
