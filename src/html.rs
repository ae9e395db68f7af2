use maud::{DOCTYPE, Markup, html};

// Form styles
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2 rounded border text-sm";
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 rounded text-white bg-blue";

// Table styles
pub const TABLE_HEADER_STYLE: &str = "text-xs uppercase";
pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Expense Tracker" }

                style
                {
                    r#"
                    body { font-family: sans-serif; margin: 0 auto; max-width: 48rem; padding: 1rem; }
                    .block { display: block; }
                    .w-full { width: 100%; box-sizing: border-box; }
                    .rounded { border-radius: 0.25rem; }
                    .border { border: 1px solid #d1d5db; }
                    .p-2 { padding: 0.5rem; }
                    .px-4 { padding-left: 1rem; padding-right: 1rem; }
                    .py-2 { padding-top: 0.5rem; padding-bottom: 0.5rem; }
                    .px-6 { padding-left: 1.5rem; padding-right: 1.5rem; }
                    .py-4 { padding-top: 1rem; padding-bottom: 1rem; }
                    .mb-2 { margin-bottom: 0.5rem; }
                    .text-sm { font-size: 0.875rem; }
                    .text-xs { font-size: 0.75rem; }
                    .uppercase { text-transform: uppercase; }
                    .font-medium { font-weight: 500; }
                    .text-white { color: white; }
                    .bg-blue { background: #2563eb; border: none; cursor: pointer; }
                    .error { color: #dc2626; }
                    "#
                }

                script src="/static/app.js" defer {}
            }

            body
            {
                (content)
            }
        }
    }
}
