use crossterm::style::{Attribute, Color, ContentStyle, StyledContent};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Prompt,
    Assistant,
    Info,
    Muted,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Colours are on unless `NO_COLOR` is set to anything non-empty.
    pub fn from_env() -> Self {
        let no_color = env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
        Self::new(!no_color)
    }

    pub fn style(&self, tone: Tone) -> ContentStyle {
        if !self.enabled {
            return ContentStyle::new();
        }

        let mut style = ContentStyle::new();
        match tone {
            Tone::Prompt => {
                style.foreground_color = Some(Color::Rgb {
                    r: 158,
                    g: 206,
                    b: 106,
                });
                style.attributes.set(Attribute::Bold);
            }
            Tone::Assistant => {
                style.foreground_color = Some(Color::Rgb {
                    r: 192,
                    g: 202,
                    b: 245,
                });
            }
            Tone::Info => {
                style.foreground_color = Some(Color::Rgb {
                    r: 86,
                    g: 95,
                    b: 137,
                });
            }
            Tone::Muted => {
                style.foreground_color = Some(Color::Rgb {
                    r: 138,
                    g: 138,
                    b: 138,
                });
                style.attributes.set(Attribute::Italic);
            }
            Tone::Error => {
                style.foreground_color = Some(Color::Rgb {
                    r: 247,
                    g: 118,
                    b: 142,
                });
                style.attributes.set(Attribute::Bold);
            }
        }
        style
    }

    pub fn paint(&self, tone: Tone, text: &str) -> String {
        StyledContent::new(self.style(tone), text).to_string()
    }
}
