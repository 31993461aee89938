//! The browser-side half of the app as a plain state object: the todo list,
//! the filter, the edit form and the page error, kept in sync with the REST
//! API through [`TodoApi`]. Rendering reads this state and nothing else.

mod api;
mod location;
mod state;

pub use api::{ApiError, HttpTodoApi, TodoApi};
pub use location::{filter_from_url, url_with_filter};
pub use state::{delete_prompt, FormField, PendingToggle, TodoClient, TodoForm};

pub use reqwest::Url;
