//! Formatting helpers for dates, money and device detection.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{calculate_days_between, capitalize, category_color, format_currency, format_date};
