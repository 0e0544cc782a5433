//! Expense bar chart.

use miviaje_core::utils::{capitalize, category_color, format_currency};
use serde::{Deserialize, Serialize};

use crate::dom::{Document, Element};

/// Currency the chart labels amounts in
const CHART_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub categoria: String,
    pub monto: f64,
}

/// Sum amounts per category, keeping first-seen order.
fn totals_by_category(expenses: &[Expense]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for expense in expenses {
        match totals.iter_mut().find(|(c, _)| *c == expense.categoria) {
            Some((_, total)) => *total += expense.monto,
            None => totals.push((expense.categoria.clone(), expense.monto)),
        }
    }
    totals
}

/// Render one bar per category into `container_id`, replacing its contents.
pub fn create_expense_chart(doc: &mut Document, expenses: &[Expense], container_id: &str) {
    let Some(container) = doc.get_element_by_id(container_id) else {
        return;
    };
    if expenses.is_empty() {
        return;
    }

    let totals = totals_by_category(expenses);
    let total: f64 = totals.iter().map(|(_, amount)| amount).sum();

    doc.clear_children(container);
    for (category, amount) in totals {
        let percentage = amount / total * 100.0;
        let bar = doc.insert(container, Element::new("div").with_class("chart-bar"));
        doc.insert(
            bar,
            Element::new("div")
                .with_class("chart-label")
                .with_text(&capitalize(&category)),
        );
        doc.insert(
            bar,
            Element::new("div").with_class("chart-bar-fill").with_attribute(
                "style",
                &format!(
                    "width: {}%; background-color: {}",
                    percentage,
                    category_color(&category)
                ),
            ),
        );
        doc.insert(
            bar,
            Element::new("div")
                .with_class("chart-value")
                .with_text(&format_currency(amount, CHART_CURRENCY)),
        );
    }
}
