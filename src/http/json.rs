//! # Scanner de bodies JSON
//! src/http/json.rs
//!
//! No es un parser JSON. Es una máquina de estados de tres estados que saca
//! pares `"clave": valor` de un objeto plano y los agrega al mapa de
//! parámetros:
//!
//! ```text
//!            '"'              '"'           ',' o '}'
//! Searching ─────► Key ───────────► Value ───────────► Searching
//!                  (acumula clave)  (acumula valor, salta ':' y espacios)
//! ```
//!
//! Los valores string admiten `\"`. Números, booleanos y `null` quedan como
//! su texto literal. Objetos y arrays anidados NO están soportados: sus
//! delimitadores se tratan como caracteres comunes del valor y el primer
//! `,` o `}` interno cierra el par, así que el resultado es un aplanado
//! aproximado, no semánticamente correcto.

use std::collections::HashMap;

/// Estados del scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Buscando la comilla que abre una clave
    Searching,
    /// Dentro de una clave
    Key,
    /// Después de la clave, hasta `,` o `}`
    Value,
}

/// Acción que dispara un byte en un estado dado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAction {
    /// El byte no aporta nada
    Skip,
    /// Cambiar de estado sin guardar el byte
    Enter(ScanState),
    /// Agregar el byte a la clave actual
    PushKey,
    /// Agregar el byte al valor actual
    PushValue,
    /// Leer un string entre comillas y agregarlo al valor
    QuotedValue,
    /// Guardar el par y volver a `Searching`
    Commit,
}

/// Tabla de transiciones del scanner
pub fn transition(state: ScanState, byte: u8) -> ScanAction {
    match (state, byte) {
        (ScanState::Searching, b'"') => ScanAction::Enter(ScanState::Key),
        (ScanState::Searching, _) => ScanAction::Skip,

        (ScanState::Key, b'"') => ScanAction::Enter(ScanState::Value),
        (ScanState::Key, _) => ScanAction::PushKey,

        (ScanState::Value, b':') => ScanAction::Skip,
        (ScanState::Value, b) if b.is_ascii_whitespace() => ScanAction::Skip,
        (ScanState::Value, b',' | b'}') => ScanAction::Commit,
        (ScanState::Value, b'"') => ScanAction::QuotedValue,
        (ScanState::Value, _) => ScanAction::PushValue,
    }
}

/// Escanea `body` y agrega cada par encontrado a `params`
///
/// Un par solo se guarda cuando aparece su `,` o `}` de cierre; claves
/// vacías se descartan.
///
/// # Ejemplo
/// ```
/// use std::collections::HashMap;
/// use huji_server::http::json::scan_json_body;
///
/// let mut params = HashMap::new();
/// scan_json_body(br#"{"user": "Ann", "age": 5}"#, &mut params);
/// assert_eq!(params["user"], "Ann");
/// assert_eq!(params["age"], "5");
/// ```
pub fn scan_json_body(body: &[u8], params: &mut HashMap<String, String>) {
    let mut state = ScanState::Searching;
    let mut key = Vec::new();
    let mut value = Vec::new();
    let mut i = 0;

    while i < body.len() {
        match transition(state, body[i]) {
            ScanAction::Skip => {}
            ScanAction::Enter(next) => state = next,
            ScanAction::PushKey => key.push(body[i]),
            ScanAction::PushValue => value.push(body[i]),
            ScanAction::QuotedValue => i = read_quoted(body, i + 1, &mut value),
            ScanAction::Commit => {
                if !key.is_empty() {
                    params.insert(
                        String::from_utf8_lossy(&key).into_owned(),
                        String::from_utf8_lossy(&value).into_owned(),
                    );
                }
                key.clear();
                value.clear();
                state = ScanState::Searching;
            }
        }
        i += 1;
    }
}

/// Copia un string desde `start` hasta la comilla de cierre (sin incluirla)
///
/// Retorna la posición de la comilla de cierre, o `body.len()` si falta.
fn read_quoted(body: &[u8], start: usize, value: &mut Vec<u8>) -> usize {
    let mut i = start;
    while i < body.len() {
        match body[i] {
            b'\\' if body.get(i + 1) == Some(&b'"') => {
                value.push(b'"');
                i += 2;
            }
            b'"' => return i,
            other => {
                value.push(other);
                i += 1;
            }
        }
    }
    i
}
