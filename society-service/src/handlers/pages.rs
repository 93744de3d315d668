use axum::response::{Html, IntoResponse, Response};

use crate::services::WorkflowError;
use crate::utils::escape_html;

fn render(title: &str, message: &str, accent: &str) -> String {
    format!(
        "<!DOCTYPE html>\
         <html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>body{{font-family:sans-serif;max-width:600px;margin:40px auto;padding:20px;text-align:center}}\
         h1{{color:{accent}}}</style></head>\
         <body><h1>{title}</h1><p>{message}</p></body></html>",
        title = escape_html(title),
        message = escape_html(message),
        accent = accent,
    )
}

/// Page shown after a successful email-link action.
pub fn confirmation_page(title: &str, message: &str) -> Response {
    Html(render(title, message, "#4CAF50")).into_response()
}

/// Page shown when an email-link action fails, with the error's status.
pub fn error_page(err: WorkflowError) -> Response {
    if let WorkflowError::Internal(e) = &err {
        tracing::error!(error = %e, "Email link action failed");
    }
    let title = match err {
        WorkflowError::NotFound => "Society Not Found",
        WorkflowError::Unauthorized => "Invalid Verification Key",
        WorkflowError::InvalidState(_) => "Verification Not Possible Yet",
        _ => "Verification Failed",
    };
    (err.status(), Html(render(title, &err.public_message(), "#f44336"))).into_response()
}
