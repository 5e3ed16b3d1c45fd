use crate::error::{LaiserError, LaiserResult};
use crate::providers::{NewsRecord, SearchRecord, SummaryRecord};

const FENCE: &str = "```";
const QUERY_PLACEHOLDER: &str = "{query}";
const DATA_PLACEHOLDER: &str = "{search_data}";

pub const DEFAULT_TEMPLATE: &str = "I performed a web search for `{query}`.\n\
Formulate a response based upon my search results:\n\n\
{search_data}\n\
In addition, separately answer my question of `{query}` directly without \
considering the information I provided previously. Finally, provide a summary \
which considers both of your answers.\n";

/// One provider's contribution to the prompt.
#[derive(Debug, Clone, Copy)]
pub enum Block<'a> {
    Search(&'a [SearchRecord]),
    News(&'a [NewsRecord]),
    Wikipedia(&'a SummaryRecord),
}

impl Block<'_> {
    pub fn header(&self) -> &'static str {
        match self {
            Block::Search(_) => "Web search results:",
            Block::News(_) => "News search results:",
            Block::Wikipedia(_) => "Wikipedia:",
        }
    }

    /// Renders the header, the fenced body and one stanza per record.
    ///
    /// An empty record list still yields the header and both fences.
    pub fn render(&self) -> String {
        let mut block = format!("{}\n{FENCE}\n", self.header());

        match self {
            Block::Search(records) => {
                for record in records.iter() {
                    block.push_str(&format!("Page title: {}\n", record.title));
                    block.push_str(&format!("URL: {}\n", record.url));
                    block.push_str(&format!("Page meta: {}\n", record.snippet));
                    block.push('\n');
                }
            }
            Block::News(records) => {
                for record in records.iter() {
                    block.push_str(&format!("Page title: {}\n", record.title));
                    block.push_str(&format!("URL: {}\n", record.url));
                    block.push_str(&format!("Page meta: {}\n", record.snippet));
                    block.push_str(&format!("News source: {}\n", record.source));
                    block.push('\n');
                }
            }
            Block::Wikipedia(summary) => {
                block.push_str(&summary.summary);
                block.push('\n');
            }
        }

        block.push_str(FENCE);
        block.push('\n');
        block
    }
}

/// Everything the providers returned for one query.
#[derive(Debug, Clone)]
pub struct Gathered {
    pub summary: SummaryRecord,
    pub search: Vec<SearchRecord>,
    pub news: Vec<NewsRecord>,
}

impl Gathered {
    /// Encyclopedia, web and news blocks, in that order, blank-line separated.
    pub fn search_data(&self) -> String {
        format!(
            "{}\n{}\n{}\n",
            Block::Wikipedia(&self.summary).render(),
            Block::Search(&self.search).render(),
            Block::News(&self.news).render()
        )
    }
}

/// Instruction wrapped around the search data.
///
/// Must contain `{search_data}` once and `{query}` at least once.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(template: &str) -> LaiserResult<Self> {
        if template.matches(DATA_PLACEHOLDER).count() != 1 {
            return Err(LaiserError::config(
                "prompt.template",
                format!("must contain {DATA_PLACEHOLDER} exactly once"),
            ));
        }
        if !template.contains(QUERY_PLACEHOLDER) {
            return Err(LaiserError::config(
                "prompt.template",
                format!("must contain {QUERY_PLACEHOLDER}"),
            ));
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    pub fn assemble(&self, query: &str, gathered: &Gathered) -> String {
        let search_data = gathered.search_data();

        // Substitute the query only into template text so that placeholder-like
        // strings inside the query or the search data are left alone.
        self.template
            .split(DATA_PLACEHOLDER)
            .map(|part| part.replace(QUERY_PLACEHOLDER, query))
            .collect::<Vec<_>>()
            .join(&search_data)
    }
}
