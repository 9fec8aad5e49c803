//! # Handlers de la Aplicación
//! src/app/handlers.rs
//!
//! Rutas de la aplicación de ejemplo:
//!
//! - `greet`: saludo con el parámetro `name`
//! - `status`: hora actual y estado
//! - `chat`: tablero de mensajes (GET lo muestra, POST agrega y redirige)

use super::store::MessageStore;
use crate::http::{Method, RequestInfo, Response};
use crate::router::{Handler, RouteTable};
use chrono::Local;
use std::sync::Arc;

/// Escapa el texto para insertarlo en HTML
pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// GET /greet?name=X
pub fn greet_handler(req: &RequestInfo) -> Response {
    let name = req.param("name").unwrap_or("Guest");
    Response::html(&format!("<h1>Hello, {}!</h1>", html_escape(name)))
}

/// GET /status
pub fn status_handler(_req: &RequestInfo) -> Response {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    Response::html(&format!(
        "<h1>Server Status</h1><p>Current Time: {}</p><p>Status: Healthy</p>",
        now
    ))
}

/// Tablero de mensajes
pub struct ChatHandler {
    store: Arc<MessageStore>,
}

impl ChatHandler {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }

    /// Post/Redirect/Get: guarda el mensaje y manda al cliente de vuelta a /chat
    fn post_message(&self, req: &RequestInfo) -> Response {
        let user = req.param("user").unwrap_or("Anonymous").trim();
        let text = req.param("message").unwrap_or("").trim();

        if !user.is_empty() && !text.is_empty() {
            if let Err(e) = self.store.append(user, text) {
                tracing::error!(error = %e, "could not persist chat message");
            }
        }

        Response::redirect("/chat")
    }

    fn render_board(&self) -> Response {
        let mut html = String::from(BOARD_HEADER);

        for message in self.store.snapshot() {
            html.push_str(&format!(
                "<div class='msg'><div class='msg-header'><span class='msg-user'>{}</span>\
                 <span class='msg-time'>{}</span></div><div class='msg-text'>{}</div></div>\n",
                html_escape(&message.user),
                html_escape(&message.timestamp),
                html_escape(&message.text),
            ));
        }

        html.push_str(BOARD_FOOTER);
        Response::html(&html)
    }
}

impl Handler for ChatHandler {
    fn handle(&self, req: &RequestInfo) -> Response {
        match req.method() {
            Method::POST => self.post_message(req),
            _ => self.render_board(),
        }
    }
}

const BOARD_HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Huji-Chat</title>
    <link rel="stylesheet" href="/style.css">
</head>
<body>
    <main class="chat-section">
        <h1>Live Chat Board</h1>
        <div id="chat-box">
"#;

const BOARD_FOOTER: &str = r#"        </div>
        <form method="POST" action="/chat" class="chat-form">
            <input type="text" name="user" placeholder="Your Name" required>
            <textarea name="message" placeholder="Type a message..." required rows="2"></textarea>
            <button type="submit" class="btn">Send Message</button>
        </form>
    </main>
</body>
</html>
"#;

/// Tabla de rutas de la aplicación
pub fn routes(store: Arc<MessageStore>) -> RouteTable {
    let mut routes = RouteTable::new();
    routes.register("greet", greet_handler);
    routes.register("status", status_handler);
    routes.register("chat", ChatHandler::new(store));
    routes
}
