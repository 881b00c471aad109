//! `pdfqa-server` serves a one-page web app for uploading a PDF and asking
//! questions about it, backed by a single [`pdfqa_rag::AnswerEngine`].

pub mod server;

pub use server::{AppState, ServerConfig, app_router, run_server};
