//! # Parser de URL, formularios y headers
//! src/http/parser.rs
//!
//! Transformaciones puras sobre bytes ya leídos del socket. Nada en este
//! módulo hace I/O.
//!
//! - `parse_url`: separa path y query, arma el mapa de parámetros
//! - `url_decode`: `+` → espacio, `%XY` → byte
//! - `parse_form_body`: body `application/x-www-form-urlencoded`
//! - `extract_header_value`: busca un header sin materializar todos

use super::request::RequestInfo;
use std::collections::HashMap;

/// Separador entre headers y body
pub const HEADER_DELIMITER: &[u8] = b"\r\n\r\n";

/// Posición donde empieza `\r\n\r\n`, si está
pub fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(HEADER_DELIMITER.len())
        .position(|w| w == HEADER_DELIMITER)
}

/// Parsea el target de la request line
///
/// El primer `?` separa path de query. La query se parte en pares
/// `key=value` separados por `&`, sin decodificar; los pares sin `=` se
/// ignoran y las claves repetidas se sobrescriben. Se quita la `/` inicial
/// del path.
///
/// # Ejemplo
/// ```
/// use huji_server::http::parser::parse_url;
///
/// let info = parse_url("/greet?name=Ann&name=Bob");
/// assert_eq!(info.path(), "greet");
/// assert_eq!(info.query(), "name=Ann&name=Bob");
/// assert_eq!(info.param("name"), Some("Bob"));
/// ```
pub fn parse_url(target: &str) -> RequestInfo {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let mut info = RequestInfo {
        path: path.strip_prefix('/').unwrap_or(path).to_string(),
        query: query.to_string(),
        ..RequestInfo::default()
    };

    for (key, value) in query.split('&').filter_map(|pair| pair.split_once('=')) {
        info.params.insert(key.to_string(), value.to_string());
    }

    info
}

/// Decodifica `+` y secuencias `%XY`
///
/// Una secuencia `%` sin dos dígitos hexadecimales detrás se copia tal cual.
///
/// # Ejemplo
/// ```
/// use huji_server::http::parser::url_decode;
///
/// assert_eq!(url_decode("Ann+Lee%21"), "Ann Lee!");
/// assert_eq!(url_decode("100%"), "100%");
/// ```
pub fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        decoded.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => decoded.push(b'%'),
                }
            }
            other => decoded.push(other),
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Parsea un body `application/x-www-form-urlencoded` dentro de `params`
///
/// Claves y valores se decodifican con [`url_decode`]; el último valor gana.
pub fn parse_form_body(body: &[u8], params: &mut HashMap<String, String>) {
    let body = String::from_utf8_lossy(body);

    for (key, value) in body.split('&').filter_map(|pair| pair.split_once('=')) {
        params.insert(url_decode(key), url_decode(value));
    }
}

/// Busca el valor de un header dentro de `data[..header_end]`
///
/// La comparación del nombre no distingue mayúsculas y solo se hace al
/// inicio de una línea, así `X-Content-Length` no se confunde con
/// `Content-Length`. Se saltan espacios y `:` antes del valor, que termina
/// en el `\r`. Si el header no está se retorna un string vacío.
///
/// # Ejemplo
/// ```
/// use huji_server::http::parser::extract_header_value;
///
/// let raw = b"GET / HTTP/1.1\r\nconnection:  Close\r\n\r\n";
/// assert_eq!(extract_header_value(raw, raw.len() - 4, "Connection"), "Close");
/// assert_eq!(extract_header_value(raw, raw.len() - 4, "Content-Type"), "");
/// ```
pub fn extract_header_value(data: &[u8], header_end: usize, name: &str) -> String {
    let head = &data[..header_end.min(data.len())];
    let name = name.as_bytes();

    // La primera línea es la request line, los headers empiezan después
    for line in head.split(|&b| b == b'\n').skip(1) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.len() <= name.len() || !line[..name.len()].eq_ignore_ascii_case(name) {
            continue;
        }

        let rest = &line[name.len()..];
        let start = rest
            .iter()
            .position(|&b| b != b' ' && b != b':')
            .unwrap_or(rest.len());
        // Exigir el ':' evita que "Connection" coincida con "Connectionx"
        if !rest[..start].contains(&b':') {
            continue;
        }

        return String::from_utf8_lossy(&rest[start..]).trim().to_string();
    }

    String::new()
}
