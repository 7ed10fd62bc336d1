//! Agent upload command.
//!
//! Sends a PDF to `POST /api/agent/upload` the way a point-of-sale agent does.

use std::path::Path;

use receetly_server::routes::agent::AGENT_SECRET_HEADER;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Upload endpoint URL for a terminal.
fn upload_url(server: &str, terminal: &str, filename: Option<&str>) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(server)?.join("/api/agent/upload")?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("terminalPublicId", terminal);
        if let Some(filename) = filename {
            query.append_pair("filename", filename);
        }
    }
    Ok(url)
}

/// Message to show for a rejected upload.
///
/// Prefers the `{"error"}` field of a JSON body and falls back to the raw
/// text, since proxies in front of the server answer in plain text.
fn rejection_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(serde_json::Value::as_str).map(String::from));

    from_json.unwrap_or_else(|| match body.trim() {
        "" => "unexpected response".to_string(),
        text => text.to_string(),
    })
}

/// Upload `file` as the latest receipt of `terminal`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the request fails, or the
/// server rejects the upload.
pub async fn send(
    server: &str,
    terminal: &str,
    secret: SecretString,
    filename: Option<String>,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = tokio::fs::read(file).await?;
    let filename = filename.or_else(|| {
        file.file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
    });

    let url = upload_url(server, terminal, filename.as_deref())?;
    tracing::info!(%url, size = body.len(), "Uploading receipt");

    let response = reqwest::Client::new()
        .post(url)
        .header(AGENT_SECRET_HEADER, secret.expose_secret())
        .header(reqwest::header::CONTENT_TYPE, "application/pdf")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = rejection_message(&response.text().await.unwrap_or_default());
        return Err(format!("upload rejected ({status}): {message}").into());
    }

    let body: serde_json::Value = response.json().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(())
}
