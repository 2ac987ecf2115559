//! The chat page.
//!
//! A single self-contained HTML file with inline CSS and JavaScript, embedded
//! at compile time so the binary has no runtime file dependencies. It keeps
//! the session id in `sessionStorage`, renders the transcript from
//! `GET /sessions/{id}/messages`, sends turns to `POST /chat` and clears with
//! `DELETE /sessions/{id}/messages`.

pub const CHAT_HTML: &str = include_str!("../assets/chat.html");
