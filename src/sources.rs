use std::collections::HashSet;

/// How collected source links are presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Itemized `<ul>` markup for the web page.
    Html,
    /// One URL per line for the terminal.
    Plain,
}

/// URLs visited while answering a single query, in visit order.
///
/// Duplicates are kept until the list is rendered; rendering deduplicates
/// (first occurrence wins) and leaves the collection empty for the next query.
#[derive(Debug, Default, Clone)]
pub struct SourceLinks {
    links: Vec<String>,
}

impl SourceLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: impl Into<String>) {
        self.links.push(url.into());
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn render_and_clear(&mut self, format: SourceFormat) -> String {
        let links = dedup_preserving_order(std::mem::take(&mut self.links));

        match format {
            SourceFormat::Html => {
                let mut sources = String::from("<ul id='sources' class='sources'>\n");
                for link in &links {
                    let link = escape_html(link);
                    sources.push_str(&format!(
                        "<li class='source-item'><a href='{link}' target='_blank' class='source-link'>{link}</a></li>\n"
                    ));
                }
                sources.push_str("</ul>");
                sources
            }
            SourceFormat::Plain => links.iter().map(|link| format!("{link}\n")).collect(),
        }
    }
}

fn dedup_preserving_order(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
