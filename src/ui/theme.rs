use ratatui::style::Color;

// Panel colors
pub const REASONING: Color = Color::Rgb(229, 192, 123);   // Warm amber
pub const RESPONSE: Color = Color::Rgb(134, 188, 111);    // Soft green
pub const USER: Color = Color::Rgb(97, 175, 239);         // Blue
pub const INTRO: Color = Color::Rgb(218, 112, 214);       // Orchid
pub const COPY: Color = Color::Rgb(218, 118, 89);         // #DA7659 - warm orange

// Status colors
pub const SUCCESS: Color = Color::Rgb(134, 188, 111);
pub const WARNING: Color = Color::Rgb(229, 192, 123);
pub const ERROR: Color = Color::Rgb(224, 108, 117);       // Soft red

// Text colors
pub const TEXT: Color = Color::Rgb(240, 240, 240);        // #f0f0f0 - primary text
pub const TEXT_SECONDARY: Color = Color::Rgb(180, 180, 180);
pub const MUTED: Color = Color::Rgb(144, 144, 144);       // #909090 - muted text

// Markdown accents
pub const ACCENT: Color = Color::Rgb(218, 118, 89);
pub const ACCENT_DIM: Color = Color::Rgb(178, 98, 69);
pub const CODE: Color = Color::Rgb(229, 192, 123);
pub const BORDER: Color = Color::Rgb(66, 66, 64);
