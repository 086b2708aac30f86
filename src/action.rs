use crate::error::AppError;
use crate::types::{Issue, IssueQuery, RepositoryInfo};

#[derive(Debug, Clone)]
pub enum Action {
    Back,
    ScrollUp,
    ScrollDown,
    Tick,

    // Loading
    Load,
    Refresh,
    RepositoryLoaded {
        repository: RepositoryInfo,
        issues: Vec<Issue>,
        query: IssueQuery,
        load_id: u64,
    },
    IssuesLoaded {
        issues: Vec<Issue>,
        query: IssueQuery,
        load_id: u64,
    },
    LoadFailed {
        error: AppError,
        load_id: u64,
    },

    // Filter tabs
    SelectFilter(usize),
    NextFilter,
    PrevFilter,

    // Pagination
    NextPage,
    PrevPage,

    // Issue link
    OpenInBrowser,
    YankUrl,

    None,
}
