pub mod chat_completions;
mod http_errors;
