//! services/template_service.rs
//! Sustitución de placeholders `{Columna}` por los valores de cada fila.

use crate::models::{
    dispatch_model::{MessageTemplate, RenderedMessage},
    recipient_model::RecipientRow,
};

/// Aplica la plantilla a una fila. Nunca falla: una columna ausente o vacía
/// se sustituye por "".
pub fn render(template: &MessageTemplate, row: &RecipientRow) -> RenderedMessage {
    RenderedMessage {
        subject: render_text(&template.subject, row),
        body: render_text(&template.body, row),
    }
}

/// Todo lo que no sea un placeholder se copia tal cual (sin escapar ni normalizar).
pub fn render_text(text: &str, row: &RecipientRow) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('}') else {
            // sin cierre: el resto es literal
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match name.rfind('{') {
            // "{a {b}" -> el primer '{' es literal, se reintenta desde el interno
            Some(inner) => {
                out.push('{');
                out.push_str(&name[..inner]);
                rest = &after[inner..];
            }
            None if name.is_empty() => {
                out.push_str("{}");
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(row.get(name).unwrap_or(""));
                rest = &after[close + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Nombres de los placeholders usados en un texto, en orden de aparición.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        let name = &after[..close];
        match name.rfind('{') {
            Some(inner) => rest = &after[inner..],
            None => {
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &after[close + 1..];
            }
        }
    }
    names
}
