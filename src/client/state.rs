use reqwest::Url;

use super::api::{ApiError, TodoApi};
use super::location::{filter_from_url, url_with_filter};
use crate::models::{FieldErrors, Todo, TodoFilter, TodoInput};
use crate::validation::{format_date_for_input, now_timestamp, validate_todo};

const LOADING: &str = "Loading todos...";
const EMPTY: &str = "No todos yet. Create your first one.";
const LOAD_FAILED: &str = "Failed to load todos.";
const SAVE_REJECTED: &str = "Unable to save.";
const SAVE_FAILED: &str = "Unable to save your changes.";
const UPDATE_FAILED: &str = "Unable to update todo.";
const DELETE_FAILED: &str = "Unable to delete todo.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    DueDate,
}

impl FormField {
    /// Key used for this field in error maps.
    pub fn key(self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Description => "description",
            FormField::DueDate => "dueDate",
        }
    }
}

/// The create/edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoForm {
    /// `None` when creating.
    pub editing: Option<Todo>,
    pub values: TodoInput,
    pub errors: FieldErrors,
}

impl TodoForm {
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(field.key()).map(String::as_str)
    }
}

/// A completion flip already applied locally, waiting on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    /// The row as it was before the flip.
    pub snapshot: Todo,
    pub completed: bool,
}

impl PendingToggle {
    pub fn id(&self) -> i64 {
        self.snapshot.id
    }

    /// Body fields for the update call.
    pub fn input(&self) -> TodoInput {
        TodoInput {
            title: self.snapshot.title.clone(),
            description: self.snapshot.description.clone(),
            due_date: self.snapshot.due_date.clone(),
        }
    }
}

/// All client state for one page load.
pub struct TodoClient<A> {
    api: A,
    todos: Vec<Todo>,
    filter: TodoFilter,
    loading: bool,
    error: Option<String>,
    form: Option<TodoForm>,
}

impl<A: TodoApi> TodoClient<A> {
    /// Starts in the loading state with the filter taken from `location`.
    /// Call [`TodoClient::load`] to fetch.
    pub fn new(api: A, location: &Url) -> Self {
        TodoClient {
            api,
            todos: Vec::new(),
            filter: filter_from_url(location),
            loading: true,
            error: None,
            form: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn filter(&self) -> TodoFilter {
        self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn form(&self) -> Option<&TodoForm> {
        self.form.as_ref()
    }

    /// What to show instead of the list, if anything.
    pub fn empty_state(&self) -> Option<&str> {
        if self.loading {
            Some(LOADING)
        } else if let Some(error) = &self.error {
            Some(error.as_str())
        } else if self.todos.is_empty() {
            Some(EMPTY)
        } else {
            None
        }
    }

    /// Replaces the list with the server's view for the current filter.
    /// On failure the previous list stays and the page error is set.
    pub async fn load(&mut self) {
        self.loading = true;
        self.error = None;

        match self.api.list(self.filter).await {
            Ok(todos) => self.todos = todos,
            Err(err) => {
                self.error = Some(err.form_message().unwrap_or(LOAD_FAILED).to_string());
            }
        }

        self.loading = false;
    }

    /// Switches filter, reloads, and returns the URL to show in the address bar.
    pub async fn set_filter(&mut self, filter: TodoFilter, location: &Url) -> Url {
        self.filter = filter;
        let next = url_with_filter(location, filter);
        self.load().await;
        next
    }

    pub fn open_create(&mut self) {
        self.form = Some(TodoForm {
            editing: None,
            values: TodoInput::default(),
            errors: FieldErrors::new(),
        });
    }

    /// Returns `false` if `id` is not in the current list.
    pub fn open_edit(&mut self, id: i64) -> bool {
        let Some(todo) = self.todos.iter().find(|t| t.id == id) else {
            return false;
        };

        self.form = Some(TodoForm {
            values: TodoInput {
                title: todo.title.clone(),
                description: todo.description.clone(),
                due_date: format_date_for_input(Some(&todo.due_date)),
            },
            editing: Some(todo.clone()),
            errors: FieldErrors::new(),
        });
        true
    }

    /// Edits one form value and clears that field's error.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let Some(form) = self.form.as_mut() else {
            return;
        };

        let value = value.into();
        match field {
            FormField::Title => form.values.title = value,
            FormField::Description => form.values.description = value,
            FormField::DueDate => form.values.due_date = value,
        }
        form.errors.remove(field.key());
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Validates locally, then creates or updates. On success the form closes
    /// and the list reloads; otherwise errors land on the form.
    pub async fn save(&mut self) -> bool {
        let Some(form) = self.form.as_mut() else {
            return false;
        };

        let input = match validate_todo(&form.values) {
            Ok(input) => input,
            Err(errors) => {
                form.errors = errors;
                return false;
            }
        };
        let editing = form.editing.as_ref().map(|todo| todo.id);

        let result = match editing {
            Some(id) => self.api.update(id, &input, None).await,
            None => self.api.create(&input).await,
        };

        match result {
            Ok(_) => {
                self.form = None;
                self.load().await;
                true
            }
            Err(err) => {
                let errors = match err {
                    ApiError::Rejected(errors) if !errors.is_empty() => errors,
                    ApiError::Rejected(_) => single_error(FormField::Title, SAVE_REJECTED),
                    ApiError::Transport(_) => single_error(FormField::Title, SAVE_FAILED),
                };
                if let Some(form) = self.form.as_mut() {
                    form.errors = errors;
                }
                false
            }
        }
    }

    /// First phase of a completion toggle: flips the row locally and returns
    /// what is needed to confirm or undo it.
    pub fn begin_toggle(&mut self, id: i64) -> Option<PendingToggle> {
        let todo = self.todos.iter_mut().find(|t| t.id == id)?;
        let pending = PendingToggle {
            snapshot: todo.clone(),
            completed: !todo.is_completed(),
        };

        // Any value marks it completed until the server's record arrives.
        todo.completed_at = pending
            .completed
            .then(|| now_timestamp().unwrap_or_else(|_| todo.updated_at.clone()));
        Some(pending)
    }

    /// Second phase: keep the server's record, or put the snapshot back and
    /// report the failure.
    pub fn finish_toggle(&mut self, pending: PendingToggle, result: Result<Todo, ApiError>) {
        let slot = self.todos.iter_mut().find(|t| t.id == pending.id());

        match result {
            Ok(todo) => {
                if let Some(slot) = slot {
                    *slot = todo;
                }
            }
            Err(err) => {
                if let Some(slot) = slot {
                    *slot = pending.snapshot;
                }
                self.error = Some(err.form_message().unwrap_or(UPDATE_FAILED).to_string());
            }
        }
    }

    pub async fn toggle_complete(&mut self, id: i64) {
        let Some(pending) = self.begin_toggle(id) else {
            return;
        };

        let result = self
            .api
            .update(pending.id(), &pending.input(), Some(pending.completed))
            .await;
        self.finish_toggle(pending, result);
    }

    /// Asks `confirm` with a prompt naming the todo; only a yes reaches the
    /// server. Returns whether the todo was deleted.
    pub async fn delete(&mut self, id: i64, confirm: impl FnOnce(&str) -> bool) -> bool {
        let Some(todo) = self.todos.iter().find(|t| t.id == id) else {
            return false;
        };

        if !confirm(&delete_prompt(todo)) {
            return false;
        }

        match self.api.delete(id).await {
            Ok(()) => {
                self.todos.retain(|t| t.id != id);
                true
            }
            Err(err) => {
                self.error = Some(err.form_message().unwrap_or(DELETE_FAILED).to_string());
                false
            }
        }
    }
}

pub fn delete_prompt(todo: &Todo) -> String {
    format!("Delete \"{}\"? This cannot be undone.", todo.title)
}

fn single_error(field: FormField, message: &str) -> FieldErrors {
    FieldErrors::from([(field.key().to_string(), message.to_string())])
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::CompletionUpdate;

    /// In-memory stand-in for the server with scripted failures.
    #[derive(Default)]
    struct FakeApi {
        inner: Mutex<FakeStore>,
    }

    #[derive(Default)]
    struct FakeStore {
        todos: Vec<Todo>,
        next_id: i64,
        fail_next: Option<ApiError>,
        calls: Vec<String>,
    }

    impl FakeApi {
        fn with_todos(todos: Vec<Todo>) -> Self {
            let next_id = todos.iter().map(|t| t.id).max().unwrap_or(0) + 1;
            FakeApi {
                inner: Mutex::new(FakeStore {
                    todos,
                    next_id,
                    ..FakeStore::default()
                }),
            }
        }

        fn fail_next(&self, err: ApiError) {
            self.inner.lock().unwrap().fail_next = Some(err);
        }

        fn calls(&self) -> Vec<String> {
            self.inner.lock().unwrap().calls.clone()
        }

        fn begin(&self, call: String) -> Result<std::sync::MutexGuard<'_, FakeStore>, ApiError> {
            let mut store = self.inner.lock().unwrap();
            store.calls.push(call);
            let failure = store.fail_next.take();
            match failure {
                Some(err) => Err(err),
                None => Ok(store),
            }
        }
    }

    fn not_found() -> ApiError {
        ApiError::Rejected(FieldErrors::from([(
            "form".to_string(),
            "Todo not found.".to_string(),
        )]))
    }

    impl TodoApi for FakeApi {
        async fn list(&self, filter: TodoFilter) -> Result<Vec<Todo>, ApiError> {
            let store = self.begin(format!("list {filter}"))?;
            Ok(store
                .todos
                .iter()
                .filter(|t| match filter {
                    TodoFilter::All => true,
                    TodoFilter::Active => !t.is_completed(),
                    TodoFilter::Completed => t.is_completed(),
                })
                .cloned()
                .collect())
        }

        async fn create(&self, input: &TodoInput) -> Result<Todo, ApiError> {
            let mut store = self.begin(format!("create {}", input.title))?;
            let input = validate_todo(input).map_err(ApiError::Rejected)?;
            let id = store.next_id;
            store.next_id += 1;
            let todo = todo(id, &input.title, &input.due_date, false);
            store.todos.push(todo.clone());
            Ok(todo)
        }

        async fn update(
            &self,
            id: i64,
            input: &TodoInput,
            completed: Option<bool>,
        ) -> Result<Todo, ApiError> {
            let mut store = self.begin(format!("update {id} {completed:?}"))?;
            let input = validate_todo(input).map_err(ApiError::Rejected)?;
            let todo = store
                .todos
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(not_found)?;
            todo.title = input.title;
            todo.description = input.description;
            todo.due_date = input.due_date;
            let completion = match completed {
                Some(true) => CompletionUpdate::Complete,
                Some(false) => CompletionUpdate::Reopen,
                None => CompletionUpdate::Unchanged,
            };
            match completion {
                CompletionUpdate::Complete => {
                    todo.completed_at = Some("2024-06-01T12:00:00.000Z".into())
                }
                CompletionUpdate::Reopen => todo.completed_at = None,
                CompletionUpdate::Unchanged => {}
            }
            Ok(todo.clone())
        }

        async fn delete(&self, id: i64) -> Result<(), ApiError> {
            let mut store = self.begin(format!("delete {id}"))?;
            let before = store.todos.len();
            store.todos.retain(|t| t.id != id);
            if store.todos.len() == before {
                return Err(not_found());
            }
            Ok(())
        }
    }

    fn todo(id: i64, title: &str, due_date: &str, completed: bool) -> Todo {
        Todo {
            id,
            title: title.into(),
            description: format!("{title} details"),
            due_date: due_date.into(),
            created_at: "2024-01-01T00:00:00.000Z".into(),
            updated_at: "2024-01-01T00:00:00.000Z".into(),
            completed_at: completed.then(|| "2024-01-02T00:00:00.000Z".to_string()),
            deleted_at: None,
        }
    }

    fn page(query: &str) -> Url {
        Url::parse(&format!("http://localhost:3000/{query}")).unwrap()
    }

    async fn loaded(todos: Vec<Todo>) -> TodoClient<FakeApi> {
        let mut client = TodoClient::new(FakeApi::with_todos(todos), &page(""));
        client.load().await;
        client
    }

    #[tokio::test]
    async fn initial_filter_comes_from_url() {
        let api = FakeApi::with_todos(vec![todo(1, "a", "2024-01-01", false)]);
        let mut client = TodoClient::new(api, &page("?filter=completed"));
        assert_eq!(client.filter(), TodoFilter::Completed);
        assert_eq!(client.empty_state(), Some("Loading todos..."));

        client.load().await;
        assert_eq!(client.api().calls(), vec!["list completed"]);
        assert!(client.todos().is_empty());
        assert_eq!(client.empty_state(), Some("No todos yet. Create your first one."));

        let client = TodoClient::new(FakeApi::default(), &page("?filter=later"));
        assert_eq!(client.filter(), TodoFilter::All);
    }

    #[tokio::test]
    async fn set_filter_rewrites_url_and_reloads() {
        let mut client = loaded(vec![
            todo(1, "open", "2024-01-01", false),
            todo(2, "done", "2024-01-01", true),
        ])
        .await;
        assert_eq!(client.empty_state(), None);

        let url = client.set_filter(TodoFilter::Active, &page("")).await;
        assert_eq!(url.as_str(), "http://localhost:3000/?filter=active");
        assert_eq!(client.todos().len(), 1);
        assert_eq!(client.todos()[0].id, 1);

        let url = client.set_filter(TodoFilter::All, &url).await;
        assert_eq!(url.as_str(), "http://localhost:3000/");
        assert_eq!(client.todos().len(), 2);
        assert_eq!(client.api().calls(), vec!["list all", "list active", "list all"]);
    }

    #[tokio::test]
    async fn load_failure_keeps_list_and_reports() {
        let mut client = loaded(vec![todo(1, "a", "2024-01-01", false)]).await;

        client.api().fail_next(ApiError::Transport("connection refused".into()));
        client.load().await;
        assert_eq!(client.todos().len(), 1);
        assert_eq!(client.error(), Some("Failed to load todos."));
        assert_eq!(client.empty_state(), Some("Failed to load todos."));

        client.load().await;
        assert_eq!(client.error(), None);
    }

    #[tokio::test]
    async fn open_edit_normalizes_due_date() {
        let mut stored = todo(1, "a", "2024-03-01", false);
        stored.due_date = "2024-03-01T10:00:00.000Z".into();
        let mut client = loaded(vec![stored]).await;

        assert!(client.open_edit(1));
        let form = client.form().unwrap();
        assert!(form.is_editing());
        assert_eq!(form.values.title, "a");
        assert_eq!(form.values.due_date, "2024-03-01");

        assert!(!client.open_edit(99));
    }

    #[tokio::test]
    async fn save_validates_locally_first() {
        let mut client = loaded(vec![]).await;
        client.open_create();
        client.set_field(FormField::Title, "Buy milk");
        client.set_field(FormField::DueDate, "2024-02-30");

        assert!(!client.save().await);
        let form = client.form().unwrap();
        assert!(!form.is_editing());
        assert_eq!(form.error(FormField::Description), Some("Description is required."));
        assert_eq!(form.error(FormField::DueDate), Some("Use YYYY-MM-DD."));
        assert_eq!(form.error(FormField::Title), None);
        assert_eq!(client.api().calls(), vec!["list all"]);

        client.set_field(FormField::DueDate, "2024-03-01");
        assert_eq!(client.form().unwrap().error(FormField::DueDate), None);
        assert_eq!(
            client.form().unwrap().error(FormField::Description),
            Some("Description is required.")
        );
    }

    #[tokio::test]
    async fn save_creates_closes_and_reloads() {
        let mut client = loaded(vec![]).await;
        client.open_create();
        client.set_field(FormField::Title, " Buy milk ");
        client.set_field(FormField::Description, "2%");
        client.set_field(FormField::DueDate, "2024-03-01");

        assert!(client.save().await);
        assert!(client.form().is_none());
        assert_eq!(client.todos().len(), 1);
        assert_eq!(client.todos()[0].title, "Buy milk");
        assert_eq!(client.api().calls(), vec!["list all", "create Buy milk", "list all"]);
    }

    #[tokio::test]
    async fn save_maps_server_errors_onto_form() {
        let mut client = loaded(vec![todo(1, "a", "2024-01-01", false)]).await;
        assert!(client.open_edit(1));
        client.set_field(FormField::Title, "renamed");

        client.api().fail_next(ApiError::Rejected(FieldErrors::from([(
            "dueDate".to_string(),
            "Use YYYY-MM-DD.".to_string(),
        )])));
        assert!(!client.save().await);
        assert_eq!(client.form().unwrap().error(FormField::DueDate), Some("Use YYYY-MM-DD."));

        client.api().fail_next(ApiError::Rejected(FieldErrors::new()));
        assert!(!client.save().await);
        assert_eq!(client.form().unwrap().error(FormField::Title), Some("Unable to save."));

        client.api().fail_next(ApiError::Transport("reset".into()));
        assert!(!client.save().await);
        assert_eq!(
            client.form().unwrap().error(FormField::Title),
            Some("Unable to save your changes.")
        );

        assert!(client.save().await);
        assert_eq!(client.todos()[0].title, "renamed");
        assert!(client.api().calls().contains(&"update 1 None".to_string()));
    }

    #[tokio::test]
    async fn toggle_is_applied_before_the_server_answers() {
        let mut client = loaded(vec![todo(1, "a", "2024-01-01", false)]).await;

        let pending = client.begin_toggle(1).unwrap();
        assert!(pending.completed);
        assert!(client.todos()[0].completed_at.is_some());
        assert!(pending.snapshot.completed_at.is_none());

        let mut confirmed = pending.snapshot.clone();
        confirmed.completed_at = Some("2024-06-01T12:00:00.000Z".into());
        client.finish_toggle(pending, Ok(confirmed.clone()));
        assert_eq!(client.todos()[0], confirmed);
        assert_eq!(client.error(), None);
    }

    #[tokio::test]
    async fn toggle_failure_restores_snapshot() {
        let original = todo(1, "a", "2024-01-01", true);
        let mut client = loaded(vec![original.clone()]).await;

        client.api().fail_next(ApiError::Transport("offline".into()));
        client.toggle_complete(1).await;
        assert_eq!(client.todos()[0], original);
        assert_eq!(client.error(), Some("Unable to update todo."));

        client.api().fail_next(not_found());
        client.toggle_complete(1).await;
        assert_eq!(client.todos()[0], original);
        assert_eq!(client.error(), Some("Todo not found."));
    }

    #[tokio::test]
    async fn toggle_round_trip() {
        let mut client = loaded(vec![todo(1, "a", "2024-01-01", false)]).await;

        client.toggle_complete(1).await;
        assert_eq!(
            client.todos()[0].completed_at.as_deref(),
            Some("2024-06-01T12:00:00.000Z")
        );

        client.toggle_complete(1).await;
        assert!(client.todos()[0].completed_at.is_none());
        assert_eq!(
            client.api().calls(),
            vec!["list all", "update 1 Some(true)", "update 1 Some(false)"]
        );
        assert!(client.begin_toggle(42).is_none());
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let mut client = loaded(vec![todo(1, "Buy milk", "2024-01-01", false)]).await;

        let mut asked = None;
        let deleted = client
            .delete(1, |prompt| {
                asked = Some(prompt.to_string());
                false
            })
            .await;
        assert!(!deleted);
        assert_eq!(asked.as_deref(), Some("Delete \"Buy milk\"? This cannot be undone."));
        assert_eq!(client.todos().len(), 1);
        assert_eq!(client.api().calls(), vec!["list all"]);

        assert!(client.delete(1, |_| true).await);
        assert!(client.todos().is_empty());
        assert_eq!(client.empty_state(), Some("No todos yet. Create your first one."));
    }

    #[tokio::test]
    async fn delete_failure_leaves_state() {
        let mut client = loaded(vec![todo(1, "a", "2024-01-01", false)]).await;

        client.api().fail_next(ApiError::Transport("offline".into()));
        assert!(!client.delete(1, |_| true).await);
        assert_eq!(client.todos().len(), 1);
        assert_eq!(client.error(), Some("Unable to delete todo."));
    }
}
