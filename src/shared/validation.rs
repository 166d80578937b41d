use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating category color hints
    /// Must be a CSS hex color in short or long form
    /// - Valid: "#fff", "#1A2B3C"
    /// - Invalid: "fff", "#ffff", "#12345g", "red"
    pub static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
}
