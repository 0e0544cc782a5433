//! DOM utilities used by the page controller and the app's templates.
//!
//! - `feedback`: Loading indicator and toast messages
//! - `forms`: Required-field validation, reset and date prefill
//! - `tabs`: Tab switching persisted to local storage
//! - `chart`: Bar chart of expenses per category

pub mod chart;
pub mod feedback;
pub mod forms;
pub mod tabs;

pub use chart::{create_expense_chart, Expense};
pub use feedback::{hide_loading, show_loading, show_toast, ToastKind};
pub use forms::{clear_form, prefill_date_inputs, validate_form};
pub use tabs::{handle_tab_click, initialize_tabs, switch_to_tab};
