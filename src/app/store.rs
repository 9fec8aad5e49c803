//! # Persistencia del Chat
//! src/app/store.rs
//!
//! Historial de mensajes en memoria respaldado por un archivo JSON lines
//! (un mensaje por línea). Se hidrata al arrancar y cada mensaje nuevo se
//! agrega a memoria y a disco bajo el mismo lock.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Formato del timestamp de cada mensaje
const TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M";

/// Un mensaje del tablero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub user: String,
    pub text: String,
    pub timestamp: String,
}

struct StoreState {
    messages: Vec<Message>,
    path: PathBuf,
}

/// Historial de mensajes compartido entre handlers
pub struct MessageStore {
    state: Mutex<StoreState>,
}

impl MessageStore {
    /// Abre el store, cargando los mensajes que ya estén en `path`
    ///
    /// Si el archivo no existe se empieza vacío. Las líneas que no se
    /// pueden decodificar se saltan.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut messages = Vec::new();

        match File::open(&path) {
            Ok(file) => {
                for line in BufReader::new(file).lines() {
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Message>(&line) {
                        Ok(message) => messages.push(message),
                        Err(e) => tracing::warn!(error = %e, "skipping corrupt chat line"),
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        tracing::info!(count = messages.len(), path = %path.display(), "chat history loaded");
        Ok(Self {
            state: Mutex::new(StoreState { messages, path }),
        })
    }

    /// Agrega un mensaje con el timestamp actual
    pub fn append(&self, user: &str, text: &str) -> io::Result<Message> {
        let message = Message {
            user: user.to_string(),
            text: text.to_string(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        };
        let line = serde_json::to_string(&message).map_err(io::Error::other)?;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&state.path)?;
        writeln!(file, "{}", line)?;
        state.messages.push(message.clone());

        Ok(message)
    }

    /// Copia de todos los mensajes en orden de llegada
    pub fn snapshot(&self) -> Vec<Message> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .messages
            .clone()
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .messages
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::load(dir.path().join("chat.jsonl")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::load(dir.path().join("chat.jsonl")).unwrap();

        let message = store.append("Ann", "hola").unwrap();
        assert_eq!(message.user, "Ann");
        assert_eq!(message.timestamp.len(), "01/02/24 13:45".len());

        assert_eq!(store.snapshot(), vec![message]);
    }

    #[test]
    fn test_persistence_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");

        {
            let store = MessageStore::load(&path).unwrap();
            store.append("Ann", "first").unwrap();
            store.append("Bob", "text with | pipes and \"quotes\"").unwrap();
        }

        let reloaded = MessageStore::load(&path).unwrap();
        let messages = reloaded.snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "first");
        assert_eq!(messages[1].text, "text with | pipes and \"quotes\"");
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        fs::write(
            &path,
            "{\"user\":\"Ann\",\"text\":\"ok\",\"timestamp\":\"01/01/24 10:00\"}\nnot json\n\n",
        )
        .unwrap();

        let store = MessageStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        let store = Arc::new(MessageStore::load(&path).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..10 {
                        store.append(&format!("user{i}"), &format!("msg{j}")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 40);
        assert_eq!(MessageStore::load(&path).unwrap().len(), 40);
    }
}
