//! The page for recording and browsing expenses.
//!
//! The page is a static shell; `/static/app.js` fills the table from the JSON
//! API and submits the form with an idempotency key.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, base,
    },
};

/// Render the expenses page.
pub async fn get_index_page() -> Response {
    index_view().into_response()
}

fn index_view() -> Markup {
    let content = html! {
        h1 { "Expenses" }

        (expense_form_view())

        section
        {
            h2 { "History" }

            label for="category-filter" class=(FORM_LABEL_STYLE) { "Category" }
            select
                id="category-filter"
                name="category"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "All Categories" }
            }

            table class="w-full"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                    }
                }
                tbody id="expense-table" {}
            }

            p id="total" { "Total: 0.00" }
        }
    };

    base("Expenses", &content)
}

fn expense_form_view() -> Markup {
    html! {
        form
            id="expense-form"
            data-endpoint=(endpoints::EXPENSES)
        {
            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                input
                    id="category"
                    type="text"
                    name="category"
                    maxlength="100"
                    placeholder="Food"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                input
                    id="description"
                    type="text"
                    name="description"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    id="date"
                    type="date"
                    name="date"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            p id="form-error" class="error" {}

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Expense" }
        }
    }
}

#[cfg(test)]
mod index_page_tests {
    use scraper::Selector;

    use crate::{
        expense::get_index_page,
        test_utils::{assert_content_type, assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_index_page().await;

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form_selector = Selector::parse("form#expense-form").unwrap();
        let form = html
            .select(&form_selector)
            .next()
            .expect("page should contain the expense form");
        assert_eq!(form.value().attr("data-endpoint"), Some("/expenses/"));

        for (name, input_type) in [
            ("amount", "number"),
            ("category", "text"),
            ("description", "text"),
            ("date", "date"),
        ] {
            let selector = Selector::parse(&format!("input[name={name}]")).unwrap();
            let input = form
                .select(&selector)
                .next()
                .unwrap_or_else(|| panic!("form should have an input named {name}"));
            assert_eq!(input.value().attr("type"), Some(input_type));
        }

        let table_selector = Selector::parse("tbody#expense-table").unwrap();
        assert!(html.select(&table_selector).next().is_some());

        let script_selector = Selector::parse("script[src='/static/app.js']").unwrap();
        assert!(html.select(&script_selector).next().is_some());
    }
}
