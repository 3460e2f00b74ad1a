use crate::{
    errors::{DashboardError, DashboardResult},
    notify::{BufferedNotifier, Notifier},
    render,
    session::{Session, SessionStore},
    storage::{MemoryStorage, Storage},
    validate,
};
use learnhub_client::{
    CourseDraft, LearningApi, LoginRequest, RegisterRequest, Role, VerifyEmailRequest, VideoUpload,
};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often a dashboard view refreshes its data while it stays active.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// The role-specific dashboard variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Admin,
    Teacher,
    Student,
}

impl DashboardView {
    /// Pure role-to-view mapping used on login and on session restore.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Teacher => Self::Teacher,
            Role::Student => Self::Student,
        }
    }
}

/// The page state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Login,
    Register,
    Verify { email: String },
    Dashboard(DashboardView),
}

/// Rendered fragments per dashboard region. A region untouched by the current
/// view stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    pub courses: Option<String>,
    pub catalog: Option<String>,
    pub enrollments: Option<String>,
    pub students: Option<String>,
    pub stats: Option<String>,
}

/// Proof that the user confirmed a destructive delete. Constructed only by
/// the confirmation step, so the request cannot be issued without it.
#[derive(Debug, Clone, Copy)]
pub struct DeleteConfirmed;

/// Parameters to construct a [`Dashboard`].
/// # Default Values
/// - `storage`: fresh [`MemoryStorage`]
/// - `notifier`: fresh [`BufferedNotifier`]
pub struct DashboardParams {
    pub api: Arc<dyn LearningApi>,
    pub storage: Arc<dyn Storage>,
    pub notifier: Arc<dyn Notifier>,
}

impl DashboardParams {
    pub fn new(api: Arc<dyn LearningApi>) -> Self {
        Self {
            api,
            storage: Arc::new(MemoryStorage::new()),
            notifier: Arc::new(BufferedNotifier::new()),
        }
    }

    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<Dashboard> {
        Dashboard::new(self)
    }
}

struct ControllerState {
    page: Page,
    session: Option<Session>,
    fragments: Fragments,
    /// Bumped on every dashboard entry and exit. A data load tagged with a
    /// stale epoch is skipped before it issues any request.
    epoch: u64,
    online: bool,
    refresh_task: Option<JoinHandle<()>>,
}

/// One parameterized controller for the admin, teacher, and student
/// dashboards. Owns the current page, the active session, and the rendered
/// fragments; all backend traffic goes through the [`LearningApi`] seam.
pub struct Dashboard {
    api: Arc<dyn LearningApi>,
    notifier: Arc<dyn Notifier>,
    sessions: SessionStore,
    state: Mutex<ControllerState>,
    /// Handed to the refresh task so it never keeps the controller alive.
    weak: Weak<Self>,
}

impl Dashboard {
    #[must_use]
    pub fn new(params: DashboardParams) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            api: params.api,
            notifier: params.notifier,
            sessions: SessionStore::new(params.storage),
            state: Mutex::new(ControllerState {
                page: Page::Login,
                session: None,
                fragments: Fragments::default(),
                epoch: 0,
                online: true,
                refresh_task: None,
            }),
            weak: weak.clone(),
        })
    }

    pub fn page(&self) -> Page {
        self.lock().page.clone()
    }

    pub fn fragments(&self) -> Fragments {
        self.lock().fragments.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    /// Re-enter the persisted session's dashboard on startup, if one exists.
    /// A corrupt persisted session starts at the login page.
    pub async fn restore(&self) {
        if let Some(session) = self.sessions.load() {
            self.enter_dashboard(session).await;
        }
    }

    pub fn show_register(&self) {
        self.lock().page = Page::Register;
    }

    pub fn show_login(&self) {
        self.lock().page = Page::Login;
    }

    pub async fn login(&self, email: &str, password: &str) -> DashboardResult<()> {
        if let Err(e) = validate::validate_login(email, password) {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        let response = self
            .api
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .inspect_err(|e| self.notifier.error(&e.to_string()))?;

        // Token without user (or the reverse) is treated as logged out.
        let (Some(token), Some(user)) = (response.access_token, response.user) else {
            let message = "Login response was missing the token or the user";
            self.notifier.error(message);
            return Err(DashboardError::Invariant(message.to_string()));
        };
        self.notifier
            .success(response.message.as_deref().unwrap_or("Login successful"));
        let session = Session { token, user };
        self.sessions.save(&session);
        self.enter_dashboard(session).await;
        Ok(())
    }

    pub async fn register(&self, request: RegisterRequest) -> DashboardResult<()> {
        if let Err(e) = validate::validate_registration(&request) {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        let email = request.email.clone();
        let response = self
            .api
            .register(request)
            .await
            .inspect_err(|e| self.notifier.error(&e.to_string()))?;
        self.notifier
            .success(response.message.as_deref().unwrap_or("Registered"));
        self.lock().page = Page::Verify { email };
        Ok(())
    }

    pub async fn verify_email(&self, email: &str, otp: &str) -> DashboardResult<()> {
        if let Err(e) = validate::validate_otp(otp) {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        let response = self
            .api
            .verify_email(VerifyEmailRequest {
                email: email.to_string(),
                otp: otp.to_string(),
            })
            .await
            .inspect_err(|e| self.notifier.error(&e.to_string()))?;
        self.notifier.success(&response.message);
        self.lock().page = Page::Login;
        Ok(())
    }

    /// Clear the session and return to the login page. The session is cleared
    /// even when the backend logout call fails; the failure is only notified.
    pub async fn logout(&self) -> DashboardResult<()> {
        let user_id = {
            let state = self.lock();
            state.session.as_ref().map(|s| s.user.id.clone())
        };
        let Some(user_id) = user_id else {
            return Ok(());
        };
        let backend = self.api.logout(&user_id).await;
        self.leave_dashboard();
        self.sessions.clear();
        match backend {
            Ok(response) => self.notifier.success(&response.message),
            Err(e) => self.notifier.error(&e.to_string()),
        }
        Ok(())
    }

    /// Refresh the data for the current dashboard view.
    pub async fn refresh(&self) {
        let target = {
            let state = self.lock();
            match state.page {
                Page::Dashboard(view) => Some((view, state.epoch)),
                _ => None,
            }
        };
        if let Some((view, epoch)) = target {
            self.load_view(view, epoch).await;
        }
    }

    /// Refresh tagged with a dashboard-entry epoch. Skipped entirely, with no
    /// request issued, once the controller has left that dashboard state.
    pub async fn refresh_epoch(&self, epoch: u64) {
        let target = {
            let state = self.lock();
            match state.page {
                Page::Dashboard(view) if state.epoch == epoch => Some(view),
                _ => None,
            }
        };
        if let Some(view) = target {
            self.load_view(view, epoch).await;
        }
    }

    pub async fn create_course(&self, draft: CourseDraft) -> DashboardResult<()> {
        let token = self.require_session()?.token;
        if let Err(e) = validate::validate_course(&draft) {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        self.api
            .create_course(&token, draft)
            .await
            .inspect_err(|e| self.notifier.error(&e.to_string()))?;
        self.notifier.success("Course created successfully");
        self.refresh().await;
        Ok(())
    }

    pub async fn update_course(&self, course_id: &str, draft: CourseDraft) -> DashboardResult<()> {
        let token = self.require_session()?.token;
        if let Err(e) = validate::validate_course(&draft) {
            self.notifier.error(&e.to_string());
            return Err(e);
        }
        self.api
            .update_course(&token, course_id, draft)
            .await
            .inspect_err(|e| self.notifier.error(&e.to_string()))?;
        self.notifier.success("Course updated successfully");
        self.refresh().await;
        Ok(())
    }

    /// Delete a course. The [`DeleteConfirmed`] token forces the confirmation
    /// step to happen before the request can be issued.
    pub async fn delete_course(
        &self,
        course_id: &str,
        _confirmed: DeleteConfirmed,
    ) -> DashboardResult<()> {
        let token = self.require_session()?.token;
        self.api
            .delete_course(&token, course_id)
            .await
            .inspect_err(|e| self.notifier.error(&e.to_string()))?;
        self.notifier.success("Course deleted successfully");
        self.refresh().await;
        Ok(())
    }

    /// Fetch the current admin course list and return the named course as an
    /// editable draft.
    pub async fn course_for_edit(&self, course_id: &str) -> DashboardResult<CourseDraft> {
        let token = self.require_session()?.token;
        let courses = self
            .api
            .list_courses(&token)
            .await
            .inspect_err(|_| self.notifier.error("Failed to load course data"))?;
        let Some(course) = courses.into_iter().find(|course| course.id == course_id) else {
            self.notifier.error("Course not found");
            return Err(DashboardError::Validation("Course not found".to_string()));
        };
        Ok(CourseDraft {
            title: course.title,
            description: course.description,
            price: course.price,
            teacher_id: course.teacher_id.unwrap_or_default(),
            visible: course.visible.unwrap_or(true),
            thumbnail: None,
        })
    }

    /// Upload a batch of videos strictly in order. Each file's success is
    /// notified before the next upload begins; the first failure aborts the
    /// remainder of the batch, leaving earlier uploads committed.
    pub async fn upload_videos(&self, uploads: Vec<VideoUpload>) -> DashboardResult<()> {
        let token = self.require_session()?.token;
        for upload in uploads {
            if let Err(e) = validate::validate_video(&upload) {
                self.notifier.error(&e.to_string());
                return Err(e);
            }
            self.api
                .add_video(&token, upload)
                .await
                .inspect_err(|e| self.notifier.error(&e.to_string()))?;
            self.notifier.success("Video uploaded successfully");
        }
        self.refresh().await;
        Ok(())
    }

    /// Search the catalog. An empty query falls back to the full catalog.
    pub async fn search(&self, query: &str) -> DashboardResult<()> {
        let epoch = self.lock().epoch;
        let result = if query.trim().is_empty() {
            self.api.all_courses().await
        } else {
            self.api.search_courses(query).await
        };
        match result {
            Ok(courses) => {
                self.apply(epoch, |fragments| {
                    fragments.catalog = Some(render::render_catalog(&courses));
                });
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Search failed");
                Err(e.into())
            }
        }
    }

    /// Record a connectivity change; notifies only on transitions.
    pub fn set_online(&self, online: bool) {
        let changed = {
            let mut state = self.lock();
            let changed = state.online != online;
            state.online = online;
            changed
        };
        if changed {
            if online {
                self.notifier.success("Connection restored");
            } else {
                self.notifier
                    .warning("Connection lost. Please check your internet connection.");
            }
        }
    }

    async fn enter_dashboard(&self, session: Session) {
        let view = DashboardView::for_role(session.user.role);
        let epoch = {
            let mut state = self.lock();
            if let Some(task) = state.refresh_task.take() {
                task.abort();
            }
            state.session = Some(session);
            state.page = Page::Dashboard(view);
            state.fragments = Fragments::default();
            state.epoch += 1;
            state.epoch
        };
        tracing::debug!(?view, epoch, "entering dashboard");
        self.load_view(view, epoch).await;
        self.start_refresh(epoch);
    }

    fn leave_dashboard(&self) {
        let mut state = self.lock();
        if let Some(task) = state.refresh_task.take() {
            task.abort();
        }
        state.session = None;
        state.page = Page::Login;
        state.fragments = Fragments::default();
        state.epoch += 1;
    }

    fn start_refresh(&self, epoch: u64) {
        let weak = self.weak.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(REFRESH_INTERVAL).await;
                let Some(dashboard) = weak.upgrade() else {
                    break;
                };
                dashboard.refresh_epoch(epoch).await;
            }
        });
        self.lock().refresh_task = Some(task);
    }

    async fn load_view(&self, view: DashboardView, epoch: u64) {
        let Some(session) = self.session_for(epoch) else {
            return;
        };
        match view {
            DashboardView::Admin => {
                match self.api.list_courses(&session.token).await {
                    Ok(courses) => self.apply(epoch, |fragments| {
                        fragments.courses = Some(render::render_courses(&courses));
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "course list load failed");
                        self.notifier.error("Failed to load courses");
                    }
                }
                match self.api.user_stats().await {
                    Ok(stats) => self.apply(epoch, |fragments| {
                        fragments.stats = Some(render::render_user_stats(&stats));
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "user stats load failed");
                        self.notifier.error("Failed to load user statistics");
                    }
                }
            }
            DashboardView::Teacher => {
                match self.api.teacher_courses(&session.user.id).await {
                    Ok(courses) => self.apply(epoch, |fragments| {
                        fragments.courses = Some(render::render_courses(&courses));
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "teacher course load failed");
                        self.notifier.error("Failed to load courses");
                    }
                }
                match self.api.students().await {
                    Ok(students) => self.apply(epoch, |fragments| {
                        fragments.students = Some(render::render_students(&students));
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "student list load failed");
                        self.notifier.error("Failed to load students");
                    }
                }
            }
            DashboardView::Student => {
                match self.api.student_enrollments(&session.user.id).await {
                    Ok(enrollments) => self.apply(epoch, |fragments| {
                        fragments.enrollments = Some(render::render_enrollments(&enrollments));
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "enrollment load failed");
                        self.notifier.error("Failed to load enrolled courses");
                    }
                }
                match self.api.all_courses().await {
                    Ok(courses) => self.apply(epoch, |fragments| {
                        fragments.catalog = Some(render::render_catalog(&courses));
                    }),
                    Err(e) => {
                        tracing::warn!(error = %e, "catalog load failed");
                        self.notifier.error("Failed to load courses");
                    }
                }
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().expect("controller state poisoned")
    }

    fn session_for(&self, epoch: u64) -> Option<Session> {
        let state = self.lock();
        if state.epoch == epoch {
            state.session.clone()
        } else {
            None
        }
    }

    fn apply<F: FnOnce(&mut Fragments)>(&self, epoch: u64, f: F) {
        let mut state = self.lock();
        // Overlapping refreshes tolerated; only entries from the current
        // dashboard lifetime land.
        if state.epoch == epoch {
            f(&mut state.fragments);
        }
    }

    fn require_session(&self) -> DashboardResult<Session> {
        self.session().ok_or_else(|| {
            DashboardError::Validation("You must be logged in for this action".to_string())
        })
    }
}
