use std::future::Future;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::models::{
    AckResponse, DataResponse, ErrorResponse, FieldErrors, Todo, TodoFilter, TodoInput,
    UpdateTodoRequest,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with an error status and this `errors` map.
    Rejected(FieldErrors),
    /// No usable answer: connection failure or an unreadable body.
    Transport(String),
}

impl ApiError {
    /// The form-level message the server gave, if any.
    pub fn form_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected(errors) => errors.get("form").map(String::as_str),
            ApiError::Transport(_) => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Remote operations the client needs from the todo store.
pub trait TodoApi {
    fn list(&self, filter: TodoFilter) -> impl Future<Output = Result<Vec<Todo>, ApiError>> + Send;

    fn create(&self, input: &TodoInput) -> impl Future<Output = Result<Todo, ApiError>> + Send;

    /// `completed: None` leaves completion as it is.
    fn update(
        &self,
        id: i64,
        input: &TodoInput,
        completed: Option<bool>,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send;

    fn delete(&self, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// [`TodoApi`] over HTTP against a running server.
#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    client: Client,
    base_url: String,
}

impl HttpTodoApi {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        HttpTodoApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn todos_url(&self) -> String {
        format!("{}/api/todos", self.base_url)
    }

    fn todo_url(&self, id: i64) -> String {
        format!("{}/api/todos/{id}", self.base_url)
    }
}

impl TodoApi for HttpTodoApi {
    async fn list(&self, filter: TodoFilter) -> Result<Vec<Todo>, ApiError> {
        let url = match filter {
            TodoFilter::All => self.todos_url(),
            other => format!("{}?filter={other}", self.todos_url()),
        };
        let resp = self.client.get(url).send().await?;
        decode::<DataResponse<Vec<Todo>>>(resp).await.map(|body| body.data)
    }

    async fn create(&self, input: &TodoInput) -> Result<Todo, ApiError> {
        let resp = self.client.post(self.todos_url()).json(input).send().await?;
        decode::<DataResponse<Todo>>(resp).await.map(|body| body.data)
    }

    async fn update(
        &self,
        id: i64,
        input: &TodoInput,
        completed: Option<bool>,
    ) -> Result<Todo, ApiError> {
        let resp = self
            .client
            .put(self.todo_url(id))
            .json(&UpdateTodoRequest { input, completed })
            .send()
            .await?;
        decode::<DataResponse<Todo>>(resp).await.map(|body| body.data)
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let resp = self.client.delete(self.todo_url(id)).send().await?;
        decode::<AckResponse>(resp).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&body)
            .map_err(|err| ApiError::Transport(format!("unreadable {status} response: {err}")));
    }

    match serde_json::from_slice::<ErrorResponse>(&body) {
        Ok(body) => Err(ApiError::Rejected(body.errors)),
        Err(_) => Err(ApiError::Transport(format!("unexpected {status} response"))),
    }
}
