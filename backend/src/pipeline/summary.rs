/// Ordered `(label, value)` pairs collected while text fields are appended,
/// rendered to the notification body as a separate step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    entries: Vec<(String, String)>,
}

impl ReportSummary {
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.entries.push((label.into(), value.into()));
    }

    /// Renders `<ul><li>label: value</li>...</ul>`.
    ///
    /// Labels and values are HTML-escaped, so an item can differ from the
    /// document heading text (`A & B` becomes `A &amp; B`).
    pub fn render_html(&self) -> String {
        let items: String = self
            .entries
            .iter()
            .map(|(label, value)| {
                format!("<li>{}: {}</li>", escape_html(label), escape_html(value))
            })
            .collect();
        format!("<ul>{}</ul>", items)
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
