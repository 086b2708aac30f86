use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::error::AppError;
use crate::event::Event;
use crate::service::RepoService;
use crate::types::{Issue, IssueFilter, IssueQuery, RepoId, RepositoryInfo};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Failed(AppError),
}

/// Everything the repository screen shows. Repository and issue fields are
/// only meaningful while `status` is `Ready`.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub repository: Option<RepositoryInfo>,
    pub issues: Vec<Issue>,
    pub status: LoadStatus,
    /// Filter of the issues currently shown
    pub filter_index: usize,
    /// Filter the user last asked for; differs from `filter_index` while
    /// its page is in flight
    pub requested_filter: usize,
    pub current_page: u32,
    per_page: u8,
}

impl ViewState {
    pub fn new(per_page: u8) -> Self {
        Self {
            repository: None,
            issues: Vec::new(),
            status: LoadStatus::Uninitialized,
            filter_index: 0,
            requested_filter: 0,
            current_page: 1,
            per_page,
        }
    }

    pub fn per_page(&self) -> u8 {
        self.per_page
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, LoadStatus::Uninitialized | LoadStatus::Loading)
    }

    pub fn filter(&self) -> IssueFilter {
        IssueFilter::from_index(self.filter_index).unwrap_or_default()
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }

    /// No total count is available, so a short page marks the end
    pub fn is_last_page(&self) -> bool {
        self.issues.len() < self.per_page as usize
    }

    fn query(&self, filter_index: usize, page: u32) -> IssueQuery {
        IssueQuery {
            filter: IssueFilter::from_index(filter_index).unwrap_or_default(),
            page,
            per_page: self.per_page,
        }
    }
}

pub struct App {
    pub repo: RepoId,
    pub view: ViewState,
    pub selected: usize,
    pub error: Option<String>,
    pub should_quit: bool,
    pub spinner: usize,
    load_id: u64,
    service: Arc<dyn RepoService>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
}

impl App {
    pub fn new(
        repo: RepoId,
        service: Arc<dyn RepoService>,
        per_page: u8,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            repo,
            view: ViewState::new(per_page),
            selected: 0,
            error: None,
            should_quit: false,
            spinner: 0,
            load_id: 0,
            service,
            action_tx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::Load,
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Back,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('l') | KeyCode::Tab => Action::NextFilter,
            KeyCode::Char('h') | KeyCode::BackTab => Action::PrevFilter,
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if index < IssueFilter::ALL.len() {
                    Action::SelectFilter(index)
                } else {
                    Action::None
                }
            }
            KeyCode::Char('n') | KeyCode::Right => Action::NextPage,
            KeyCode::Char('p') | KeyCode::Left => Action::PrevPage,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('o') | KeyCode::Enter => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::YankUrl,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.error.is_some() && !matches!(action, Action::Tick | Action::None) {
            self.error = None;
        }

        match action {
            Action::Back => {
                self.cancel.cancel();
                self.should_quit = true;
            }
            Action::ScrollUp => {
                self.selected = self.selected.saturating_sub(1);
            }
            Action::ScrollDown => {
                if !self.view.issues.is_empty() && self.selected < self.view.issues.len() - 1 {
                    self.selected += 1;
                }
            }
            Action::Tick => {
                if self.view.is_loading() {
                    self.spinner = self.spinner.wrapping_add(1);
                }
            }

            Action::Load => self.initial_load(),
            Action::Refresh => self.refresh(),
            Action::RepositoryLoaded {
                repository,
                issues,
                query,
                load_id,
            } => {
                if self.is_stale(load_id) {
                    return;
                }
                self.view.repository = Some(repository);
                self.apply_issues(issues, query);
            }
            Action::IssuesLoaded {
                issues,
                query,
                load_id,
            } => {
                if self.is_stale(load_id) {
                    return;
                }
                self.apply_issues(issues, query);
            }
            Action::LoadFailed { error, load_id } => {
                if self.is_stale(load_id) {
                    return;
                }
                tracing::warn!(load_id, %error, "load failed");
                self.view.requested_filter = self.view.filter_index;
                self.view.status = LoadStatus::Failed(error);
            }

            Action::SelectFilter(index) => self.change_filter(index),
            Action::NextFilter => {
                let count = IssueFilter::ALL.len();
                self.change_filter((self.view.requested_filter + 1) % count);
            }
            Action::PrevFilter => {
                let count = IssueFilter::ALL.len();
                self.change_filter((self.view.requested_filter + count - 1) % count);
            }

            Action::NextPage => {
                if self.view.is_last_page() && self.view.status == LoadStatus::Ready {
                    return;
                }
                self.change_page(i64::from(self.view.current_page) + 1);
            }
            Action::PrevPage => self.change_page(i64::from(self.view.current_page) - 1),

            Action::OpenInBrowser => {
                if let Some(url) = self.selected_url() {
                    if let Err(e) = open::that(&url) {
                        self.error = Some(format!("Failed to open browser: {}", e));
                    }
                }
            }
            Action::YankUrl => {
                if let Some(url) = self.selected_url() {
                    match arboard::Clipboard::new().and_then(|mut c| c.set_text(url)) {
                        Ok(()) => tracing::debug!("copied issue url"),
                        Err(e) => self.error = Some(format!("Clipboard unavailable: {}", e)),
                    }
                }
            }

            Action::None => {}
        }
    }

    /// Fetch repository metadata and the first issue page together. The view
    /// stays loading until both have answered.
    pub fn initial_load(&mut self) {
        self.view.status = LoadStatus::Loading;
        let load_id = self.next_load_id();
        let query = self
            .view
            .query(self.view.requested_filter, self.view.current_page);
        self.spawn_load_repository(query, load_id);
    }

    pub fn change_filter(&mut self, index: usize) {
        if IssueFilter::from_index(index).is_none() {
            tracing::warn!(index, "ignoring out-of-range filter index");
            return;
        }

        self.view.requested_filter = index;
        if self.view.repository.is_none() {
            self.initial_load();
            return;
        }

        // The current page is kept across filter changes.
        self.view.status = LoadStatus::Loading;
        let load_id = self.next_load_id();
        let query = self.view.query(index, self.view.current_page);
        self.spawn_load_issues(query, load_id);
    }

    /// Pages below 1 are clamped to 1. Asking for the page already shown
    /// does nothing.
    pub fn change_page(&mut self, page: i64) {
        let page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
        if page == self.view.current_page && self.view.status == LoadStatus::Ready {
            return;
        }

        self.view.current_page = page;
        if self.view.repository.is_none() {
            self.initial_load();
            return;
        }

        self.view.status = LoadStatus::Loading;
        let load_id = self.next_load_id();
        let query = self.view.query(self.view.requested_filter, page);
        self.spawn_load_issues(query, load_id);
    }

    /// Re-fetch whatever the screen should be showing
    pub fn refresh(&mut self) {
        if self.view.repository.is_none() {
            self.initial_load();
            return;
        }

        self.view.status = LoadStatus::Loading;
        let load_id = self.next_load_id();
        let query = self
            .view
            .query(self.view.requested_filter, self.view.current_page);
        self.spawn_load_issues(query, load_id);
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        if self.view.status != LoadStatus::Ready {
            return None;
        }
        self.view.issues.get(self.selected)
    }

    fn selected_url(&self) -> Option<String> {
        self.selected_issue().map(|issue| issue.html_url.clone())
    }

    fn apply_issues(&mut self, issues: Vec<Issue>, query: IssueQuery) {
        self.view.filter_index = query.filter.index();
        self.view.requested_filter = self.view.filter_index;
        self.view.current_page = query.page;
        self.view.issues = issues;
        self.view.status = LoadStatus::Ready;
        self.selected = 0;
    }

    fn next_load_id(&mut self) -> u64 {
        self.load_id += 1;
        self.load_id
    }

    fn is_stale(&self, load_id: u64) -> bool {
        let stale = load_id != self.load_id;
        if stale {
            tracing::debug!(load_id, latest = self.load_id, "discarding stale response");
        }
        stale
    }

    fn spawn_load_repository(&self, query: IssueQuery, load_id: u64) {
        let tx = self.action_tx.clone();
        let service = Arc::clone(&self.service);
        let repo = self.repo.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let load = async {
                tokio::join!(
                    service.get_repository(&repo),
                    service.list_issues(&repo, &query)
                )
            };

            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(load_id, "repository load cancelled");
                    return;
                }
                results = load => results,
            };

            let action = match results {
                (Ok(repository), Ok(issues)) => Action::RepositoryLoaded {
                    repository,
                    issues,
                    query,
                    load_id,
                },
                (Err(error), _) | (_, Err(error)) => Action::LoadFailed { error, load_id },
            };
            tx.send(action).ok();
        });
    }

    fn spawn_load_issues(&self, query: IssueQuery, load_id: u64) {
        let tx = self.action_tx.clone();
        let service = Arc::clone(&self.service);
        let repo = self.repo.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(load_id, "issues load cancelled");
                    return;
                }
                result = service.list_issues(&repo, &query) => result,
            };

            let action = match result {
                Ok(issues) => Action::IssuesLoaded {
                    issues,
                    query,
                    load_id,
                },
                Err(error) => Action::LoadFailed { error, load_id },
            };
            tx.send(action).ok();
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    use super::*;
    use crate::error::Result;
    use crate::types::{Label, User};

    pub(crate) fn make_issue(id: u64) -> Issue {
        Issue {
            id,
            number: id,
            title: format!("Issue {}", id),
            html_url: format!("https://github.com/facebook/react/issues/{}", id),
            user: User {
                login: "octocat".to_string(),
                avatar_url: "https://avatars/1".to_string(),
            },
            labels: vec![Label {
                id: 1,
                name: "bug".to_string(),
                color: None,
            }],
            pull_request: false,
        }
    }

    pub(crate) fn make_repository() -> RepositoryInfo {
        RepositoryInfo {
            name: "react".to_string(),
            description: Some("The library for web and native user interfaces".to_string()),
            owner: User {
                login: "facebook".to_string(),
                avatar_url: "https://avatars/2".to_string(),
            },
            html_url: "https://github.com/facebook/react".to_string(),
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct FakeService {
        page_len: usize,
        repo_gate: Option<Arc<Notify>>,
        repo_error: Option<AppError>,
        issues_error: Mutex<Option<AppError>>,
        repo_calls: Mutex<usize>,
        queries: Mutex<Vec<IssueQuery>>,
    }

    impl FakeService {
        pub(crate) fn with_page_len(page_len: usize) -> Self {
            Self {
                page_len,
                ..Self::default()
            }
        }

        fn fail_issues_with(&self, error: AppError) {
            *self.issues_error.lock().unwrap() = Some(error);
        }

        fn queries(&self) -> Vec<IssueQuery> {
            self.queries.lock().unwrap().clone()
        }

        fn repo_calls(&self) -> usize {
            *self.repo_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl RepoService for FakeService {
        fn name(&self) -> &str {
            "fake"
        }

        async fn get_repository(&self, _repo: &RepoId) -> Result<RepositoryInfo> {
            *self.repo_calls.lock().unwrap() += 1;
            if let Some(gate) = &self.repo_gate {
                gate.notified().await;
            }
            match &self.repo_error {
                Some(err) => Err(err.clone()),
                None => Ok(make_repository()),
            }
        }

        async fn list_issues(&self, _repo: &RepoId, query: &IssueQuery) -> Result<Vec<Issue>> {
            self.queries.lock().unwrap().push(*query);
            if let Some(err) = self.issues_error.lock().unwrap().clone() {
                return Err(err);
            }
            let base = u64::from(query.page) * 100;
            Ok((0..self.page_len as u64).map(|i| make_issue(base + i)).collect())
        }
    }

    fn setup(service: FakeService) -> (App, mpsc::UnboundedReceiver<Action>, Arc<FakeService>) {
        let service = Arc::new(service);
        let (tx, rx) = mpsc::unbounded_channel();
        let repo = RepoId::decode("facebook/react").unwrap();
        let app = App::new(repo, service.clone(), 5, tx);
        (app, rx, service)
    }

    async fn settle(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Action>) {
        let action = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("load should finish")
            .expect("channel open");
        app.update(action);
    }

    async fn mounted(page_len: usize) -> (App, mpsc::UnboundedReceiver<Action>, Arc<FakeService>) {
        let (mut app, mut rx, service) = setup(FakeService::with_page_len(page_len));
        app.update(Action::Load);
        settle(&mut app, &mut rx).await;
        (app, rx, service)
    }

    fn query(filter: IssueFilter, page: u32) -> IssueQuery {
        IssueQuery {
            filter,
            page,
            per_page: 5,
        }
    }

    #[test]
    fn fresh_state_has_placeholder_defaults() {
        let view = ViewState::new(5);
        assert!(view.repository.is_none());
        assert!(view.issues.is_empty());
        assert!(view.is_loading());
        assert_eq!(view.filter_index, 0);
        assert_eq!(view.current_page, 1);
        assert_eq!(view.per_page(), 5);
    }

    #[test]
    fn short_page_marks_the_end() {
        let mut view = ViewState::new(5);
        view.issues = (0..3).map(make_issue).collect();
        assert!(view.is_last_page());
        view.issues = (0..5).map(make_issue).collect();
        assert!(!view.is_last_page());
    }

    #[test]
    fn prev_page_needs_page_above_one() {
        let mut view = ViewState::new(5);
        assert!(!view.has_prev_page());
        view.current_page = 2;
        assert!(view.has_prev_page());
    }

    #[tokio::test]
    async fn initial_load_fetches_repository_and_first_page() {
        let (mut app, mut rx, service) = setup(FakeService::with_page_len(5));

        app.update(Action::Load);
        assert!(app.view.is_loading());
        settle(&mut app, &mut rx).await;

        assert_eq!(service.repo_calls(), 1);
        assert_eq!(service.queries(), vec![query(IssueFilter::All, 1)]);
        assert_eq!(app.view.status, LoadStatus::Ready);
        assert_eq!(app.view.repository, Some(make_repository()));
        assert_eq!(app.view.issues.len(), 5);
        assert_eq!(app.view.filter_index, 0);
        assert_eq!(app.view.current_page, 1);
    }

    #[tokio::test]
    async fn initial_load_waits_for_both_requests() {
        let gate = Arc::new(Notify::new());
        let (mut app, mut rx, service) = setup(FakeService {
            repo_gate: Some(gate.clone()),
            ..FakeService::with_page_len(5)
        });

        app.update(Action::Load);

        // Issues answer immediately; the repository is held back.
        let early = timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(early.is_err(), "nothing may land before both requests finish");
        assert_eq!(service.queries().len(), 1);
        assert!(app.view.is_loading());

        gate.notify_one();
        settle(&mut app, &mut rx).await;
        assert!(!app.view.is_loading());
    }

    #[tokio::test]
    async fn filter_change_keeps_current_page() {
        let (mut app, mut rx, service) = mounted(5).await;

        app.update(Action::NextPage);
        settle(&mut app, &mut rx).await;
        app.update(Action::NextPage);
        settle(&mut app, &mut rx).await;
        assert_eq!(app.view.current_page, 3);

        app.update(Action::SelectFilter(2));
        assert!(app.view.is_loading());
        assert_eq!(app.view.requested_filter, 2);
        settle(&mut app, &mut rx).await;

        assert_eq!(service.queries().last(), Some(&query(IssueFilter::Closed, 3)));
        assert!(!app.view.is_loading());
        assert_eq!(app.view.filter_index, 2);
        assert_eq!(app.view.current_page, 3);
    }

    #[tokio::test]
    async fn every_request_uses_the_mount_page_size() {
        let (mut app, mut rx, service) = mounted(5).await;

        for action in [
            Action::SelectFilter(1),
            Action::NextPage,
            Action::PrevFilter,
            Action::PrevPage,
            Action::Refresh,
        ] {
            app.update(action);
            settle(&mut app, &mut rx).await;
        }

        let queries = service.queries();
        assert_eq!(queries.len(), 6);
        assert!(queries.iter().all(|q| q.per_page == 5));
    }

    #[tokio::test]
    async fn filter_state_matches_filter_index() {
        let (mut app, mut rx, service) = mounted(5).await;

        for index in [1, 2, 0, 2] {
            app.update(Action::SelectFilter(index));
            settle(&mut app, &mut rx).await;
            assert!(app.view.filter_index < IssueFilter::ALL.len());
            let last = *service.queries().last().unwrap();
            assert_eq!(last.filter.as_api_str(), IssueFilter::ALL[app.view.filter_index].as_api_str());
        }
    }

    #[tokio::test]
    async fn out_of_range_filter_is_ignored() {
        let (mut app, _rx, service) = mounted(5).await;

        app.update(Action::SelectFilter(3));

        assert_eq!(app.view.status, LoadStatus::Ready);
        assert_eq!(app.view.filter_index, 0);
        assert_eq!(service.queries().len(), 1);
    }

    #[tokio::test]
    async fn filter_cycling_wraps() {
        let (mut app, mut rx, _service) = mounted(5).await;

        app.update(Action::PrevFilter);
        settle(&mut app, &mut rx).await;
        assert_eq!(app.view.filter(), IssueFilter::Closed);

        app.update(Action::NextFilter);
        settle(&mut app, &mut rx).await;
        assert_eq!(app.view.filter(), IssueFilter::All);
    }

    #[tokio::test]
    async fn prev_from_first_page_is_clamped() {
        let (mut app, _rx, service) = mounted(5).await;

        app.change_page(0);

        assert_eq!(app.view.current_page, 1);
        assert_eq!(app.view.status, LoadStatus::Ready);
        assert_eq!(service.queries().len(), 1, "no request for a clamped no-op");
    }

    #[tokio::test]
    async fn page_change_sets_page_before_response() {
        let (mut app, mut rx, service) = mounted(5).await;

        app.update(Action::NextPage);
        assert_eq!(app.view.current_page, 2);
        assert!(app.view.is_loading());
        settle(&mut app, &mut rx).await;

        assert_eq!(service.queries().last(), Some(&query(IssueFilter::All, 2)));
        assert_eq!(app.view.issues[0].id, 200);
        assert!(!app.view.is_loading());
    }

    #[tokio::test]
    async fn next_page_is_blocked_on_short_page() {
        let (mut app, _rx, service) = mounted(3).await;
        assert!(app.view.is_last_page());

        app.update(Action::NextPage);

        assert_eq!(app.view.current_page, 1);
        assert_eq!(service.queries().len(), 1);
    }

    #[tokio::test]
    async fn stale_responses_are_discarded() {
        let (mut app, mut rx, _service) = mounted(5).await;

        app.update(Action::SelectFilter(1));
        app.update(Action::NextPage);

        // Both tasks answer; only the latest request may land.
        settle(&mut app, &mut rx).await;
        settle(&mut app, &mut rx).await;

        assert_eq!(app.view.filter(), IssueFilter::Open);
        assert_eq!(app.view.current_page, 2);
        assert_eq!(app.view.issues[0].id, 200);
        assert_eq!(app.view.status, LoadStatus::Ready);
    }

    #[tokio::test]
    async fn late_response_after_newer_request_is_ignored() {
        let (mut app, _rx, _service) = mounted(5).await;
        let before = app.view.issues.clone();

        app.update(Action::NextPage);
        let stale_id = app.load_id - 1;
        app.update(Action::IssuesLoaded {
            issues: vec![make_issue(999)],
            query: query(IssueFilter::Closed, 7),
            load_id: stale_id,
        });

        assert!(app.view.is_loading());
        assert_eq!(app.view.issues, before);
        assert_eq!(app.view.filter_index, 0);
    }

    #[tokio::test]
    async fn failed_initial_load_exits_loading() {
        let (mut app, mut rx, _service) = setup(FakeService {
            repo_error: Some(AppError::NotFound("/repos/facebook/react".to_string())),
            ..FakeService::with_page_len(5)
        });

        app.update(Action::Load);
        settle(&mut app, &mut rx).await;

        assert!(!app.view.is_loading());
        assert!(matches!(app.view.status, LoadStatus::Failed(AppError::NotFound(_))));
        assert!(app.selected_issue().is_none());
    }

    #[tokio::test]
    async fn failed_issue_load_surfaces_error() {
        let (mut app, mut rx, _service) = setup(FakeService {
            issues_error: Mutex::new(Some(AppError::Network("connection reset".to_string()))),
            ..FakeService::with_page_len(5)
        });

        app.update(Action::Load);
        settle(&mut app, &mut rx).await;

        assert_eq!(
            app.view.status,
            LoadStatus::Failed(AppError::Network("connection reset".to_string()))
        );
    }

    #[tokio::test]
    async fn failed_filter_change_rolls_back_requested_filter() {
        let (mut app, mut rx, service) = mounted(5).await;
        service.fail_issues_with(AppError::Network("connection reset".to_string()));

        app.update(Action::SelectFilter(2));
        assert_eq!(app.view.requested_filter, 2);
        settle(&mut app, &mut rx).await;

        assert!(matches!(app.view.status, LoadStatus::Failed(AppError::Network(_))));
        assert!(!app.view.is_loading());
        assert_eq!(app.view.filter_index, 0);
        assert_eq!(app.view.requested_filter, 0);
        assert_eq!(app.view.current_page, 1);
        assert_eq!(service.queries().last(), Some(&query(IssueFilter::Closed, 1)));
    }

    #[tokio::test]
    async fn failed_page_change_keeps_requested_page_for_retry() {
        let (mut app, mut rx, service) = mounted(5).await;
        service.fail_issues_with(AppError::Api {
            status: 502,
            message: "Bad Gateway".to_string(),
        });

        app.update(Action::NextPage);
        settle(&mut app, &mut rx).await;

        assert!(matches!(app.view.status, LoadStatus::Failed(AppError::Api { status: 502, .. })));
        assert!(!app.view.is_loading());
        assert_eq!(app.view.current_page, 2);
        assert_eq!(app.view.filter_index, 0);
        assert!(app.selected_issue().is_none());

        // Once the service recovers, a manual refresh fetches the same page.
        *service.issues_error.lock().unwrap() = None;
        app.update(Action::Refresh);
        settle(&mut app, &mut rx).await;

        assert_eq!(app.view.status, LoadStatus::Ready);
        assert_eq!(service.queries().last(), Some(&query(IssueFilter::All, 2)));
        assert_eq!(app.view.issues[0].id, 200);
    }

    #[tokio::test]
    async fn filter_change_before_mount_reloads_everything() {
        let (mut app, mut rx, service) = setup(FakeService::with_page_len(5));

        app.update(Action::SelectFilter(1));
        settle(&mut app, &mut rx).await;

        assert_eq!(service.repo_calls(), 1);
        assert_eq!(service.queries(), vec![query(IssueFilter::Open, 1)]);
        assert!(app.view.repository.is_some());
        assert_eq!(app.view.filter(), IssueFilter::Open);
    }

    #[tokio::test]
    async fn refresh_retries_after_failure() {
        let (mut app, mut rx, service) = mounted(5).await;

        app.update(Action::LoadFailed {
            error: AppError::Network("timeout".to_string()),
            load_id: app.load_id,
        });
        assert!(matches!(app.view.status, LoadStatus::Failed(_)));

        app.update(Action::Refresh);
        settle(&mut app, &mut rx).await;

        assert_eq!(app.view.status, LoadStatus::Ready);
        assert_eq!(service.queries().len(), 2);
    }

    #[tokio::test]
    async fn selection_resets_on_new_page() {
        let (mut app, mut rx, _service) = mounted(5).await;

        app.update(Action::ScrollDown);
        app.update(Action::ScrollDown);
        assert_eq!(app.selected, 2);
        assert_eq!(app.selected_issue().map(|i| i.id), Some(102));

        app.update(Action::NextPage);
        settle(&mut app, &mut rx).await;
        assert_eq!(app.selected, 0);
    }

    #[tokio::test]
    async fn scrolling_stays_in_bounds() {
        let (mut app, _rx, _service) = mounted(2).await;

        app.update(Action::ScrollUp);
        assert_eq!(app.selected, 0);
        for _ in 0..5 {
            app.update(Action::ScrollDown);
        }
        assert_eq!(app.selected, 1);
    }

    #[tokio::test]
    async fn back_cancels_in_flight_loads() {
        let gate = Arc::new(Notify::new());
        let (mut app, mut rx, _service) = setup(FakeService {
            repo_gate: Some(gate.clone()),
            ..FakeService::with_page_len(5)
        });

        app.update(Action::Load);
        app.update(Action::Back);
        assert!(app.should_quit);

        gate.notify_one();
        let late = timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(!matches!(late, Ok(Some(_))), "cancelled load must not report");
    }

    #[tokio::test]
    async fn keys_map_to_actions() {
        use crossterm::event::KeyModifiers;

        let (app, _rx, _service) = setup(FakeService::default());
        let key = |code| Event::Key(KeyEvent::new(code, KeyModifiers::NONE));

        assert!(matches!(app.handle_event(key(KeyCode::Char('3'))), Action::SelectFilter(2)));
        assert!(matches!(app.handle_event(key(KeyCode::Char('4'))), Action::None));
        assert!(matches!(app.handle_event(key(KeyCode::Char('n'))), Action::NextPage));
        assert!(matches!(app.handle_event(key(KeyCode::Left)), Action::PrevPage));
        assert!(matches!(app.handle_event(key(KeyCode::Tab)), Action::NextFilter));
        assert!(matches!(app.handle_event(key(KeyCode::Esc)), Action::Back));
        assert!(matches!(app.handle_event(Event::Init), Action::Load));
    }

    #[tokio::test]
    async fn mount_hits_expected_endpoints() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&make_repository()))
            .expect(1)
            .mount(&server)
            .await;
        let issues: Vec<Issue> = (1..=5).map(make_issue).collect();
        Mock::given(method("GET"))
            .and(path("/repos/facebook/react/issues"))
            .and(query_param("state", "all"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&issues))
            .expect(1)
            .mount(&server)
            .await;

        let github = crate::github::GitHub::new(&server.uri(), None).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let repo = RepoId::decode("facebook%2Freact").unwrap();
        let mut app = App::new(repo, Arc::new(github), 5, tx);

        app.update(Action::Load);
        settle(&mut app, &mut rx).await;

        assert_eq!(app.view.status, LoadStatus::Ready);
        assert_eq!(app.view.issues, issues);
        assert_eq!(app.view.filter_index, 0);
        assert_eq!(app.view.current_page, 1);
    }
}
