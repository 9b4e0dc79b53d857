//! Problem service - problem listings and parsed problem content

use super::{ServiceError, ServiceResult};
use crate::models::{Block, PaginationConfig, ProblemContent, ResponseKind};
use crate::parser::{self, FragmentPolicy};
use crate::store::{descendants, ContentResolver};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Section id -> kind tag -> problem ids
pub type SectionProblems = IndexMap<String, IndexMap<String, Vec<String>>>;

/// A problem reference: a bare id, or an id pinned to a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProblemRef {
    Id(String),
    Versioned {
        id: String,
        #[serde(default)]
        version: Option<String>,
    },
}

impl ProblemRef {
    pub fn id(&self) -> &str {
        match self {
            ProblemRef::Id(id) | ProblemRef::Versioned { id, .. } => id,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            ProblemRef::Id(_) => None,
            ProblemRef::Versioned { version, .. } => version.as_deref(),
        }
    }
}

impl From<&str> for ProblemRef {
    fn from(id: &str) -> Self {
        ProblemRef::Id(id.to_string())
    }
}

/// Filters of a problem listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemQuery {
    pub block_id: String,
    /// Keep problems declaring exactly this kind
    #[serde(default)]
    pub problem_type: Option<String>,
    /// Regular expression matched against the raw markup
    #[serde(default)]
    pub text: Option<String>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Cut page `page` (1-based) of `page_size` out of `items`
    ///
    /// Page 1 always exists; any other page past the end is an error.
    pub fn paginate(items: Vec<T>, page: usize, page_size: usize) -> ServiceResult<Self> {
        let page_size = page_size.max(1);
        let count = items.len();
        let pages = count.div_ceil(page_size).max(1);
        if page == 0 || page > pages {
            return Err(ServiceError::InvalidPage(page));
        }

        let results = items
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        Ok(Self {
            count,
            next: (page < pages).then_some(page + 1),
            previous: (page > 1).then_some(page - 1),
            results,
        })
    }
}

/// Ids of the single-kind problems under each section, grouped by the requested kinds
pub fn section_problems<R>(
    resolver: &R,
    sections: &[String],
    types: &[String],
) -> ServiceResult<SectionProblems>
where
    R: ContentResolver + ?Sized,
{
    let mut result = SectionProblems::new();
    for section in sections {
        let problems: Vec<&Block> = descendants(resolver, section)?
            .into_iter()
            .filter(|block| block.is_problem())
            .collect();

        let mut by_kind = IndexMap::new();
        for kind in types {
            let ids = problems
                .iter()
                .filter(|block| block.kinds().is_some_and(|kinds| kinds.is_exactly(kind)))
                .map(|block| block.usage_id.clone())
                .collect();
            by_kind.insert(kind.clone(), ids);
        }
        result.insert(section.clone(), by_kind);
    }
    Ok(result)
}

/// Parsed content of each referenced problem, in request order
pub fn problem_details<R>(
    resolver: &R,
    problems: &[ProblemRef],
    policy: FragmentPolicy,
) -> ServiceResult<Vec<Option<ProblemContent>>>
where
    R: ContentResolver + ?Sized,
{
    problems
        .iter()
        .map(|problem| problem_content(resolver, problem.id(), problem.version(), policy))
        .collect()
}

fn problem_content<R>(
    resolver: &R,
    id: &str,
    version: Option<&str>,
    policy: FragmentPolicy,
) -> ServiceResult<Option<ProblemContent>>
where
    R: ContentResolver + ?Sized,
{
    let content = resolver.resolve(id, version)?;
    let parsed = parser::parse(
        &content.markup,
        &content.kinds,
        &content.version,
        &content.id,
        policy,
    )?;
    Ok(parsed)
}

/// Paginated, parsed problems under a block
///
/// Keeps problem blocks with at least one supported kind (and exactly
/// `problem_type` when given), whose markup matches `text`, and that hold a
/// single problem. Results stay in breadth-first order.
pub fn list_problems<R>(
    resolver: &R,
    query: &ProblemQuery,
    pagination: &PaginationConfig,
    policy: FragmentPolicy,
) -> ServiceResult<Page<Option<ProblemContent>>>
where
    R: ContentResolver + ?Sized,
{
    if let Some(kind) = &query.problem_type {
        if ResponseKind::from_tag(kind).is_none() {
            return Err(ServiceError::InvalidArgument(format!(
                "Unknown problem type: {}",
                kind
            )));
        }
    }
    let search = query.text.as_deref().map(Regex::new).transpose()?;
    let blocks = descendants(resolver, &query.block_id)?;

    let mut matched: Vec<&Block> = Vec::new();
    for block in blocks {
        let Some(problem) = block.problem.as_ref().filter(|_| block.is_problem()) else {
            continue;
        };
        if let Some(kind) = &query.problem_type {
            if !problem.kinds.is_exactly(kind) {
                continue;
            }
        }
        if !problem.kinds.any_supported() {
            continue;
        }
        if let Some(search) = &search {
            if !search.is_match(&problem.markup) {
                continue;
            }
        }
        match parser::has_multiple_markup(&problem.markup, &problem.kinds) {
            Ok(false) => matched.push(block),
            Ok(true) => {}
            Err(e) => {
                tracing::warn!(problem = %block.usage_id, "Skipping unparsable problem: {}", e);
            }
        }
    }

    let page_size = pagination.effective_page_size(query.page_size);
    let page = Page::paginate(matched, query.page.unwrap_or(1), page_size)?;

    let mut results = Vec::with_capacity(page.results.len());
    for block in &page.results {
        results.push(problem_content(resolver, &block.usage_id, None, policy)?);
    }

    tracing::debug!(
        block = %query.block_id,
        count = page.count,
        returned = results.len(),
        "Listed problems"
    );
    Ok(Page {
        count: page.count,
        next: page.next,
        previous: page.previous,
        results,
    })
}
