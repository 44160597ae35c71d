const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const MESSAGE_SLOT: &str = "{{message}}";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// The form page, with an optional status line under the form.
pub fn render_index(message: Option<&str>) -> String {
    let slot = match message {
        Some(msg) => format!("<p class=\"msg\">{}</p>", escape_html(msg)),
        None => String::new(),
    };
    INDEX_TEMPLATE.replace(MESSAGE_SLOT, &slot)
}
