//! Optional oracle for canonical class suggestions: a language server
//! spoken to over JSON-RPC on stdio.

mod convert;
mod error;
pub mod protocol;
mod session;

pub use convert::{
    suggestions_from_diagnostics, PublishDiagnosticsParams, ServerDiagnostic,
    CANONICAL_CLASSES_CODE,
};
pub use error::{BridgeError, BridgeResult};
pub use session::{BridgeConfig, BridgeState, DiagnosticsBridge};

use std::path::{Path, PathBuf};
use tracing::warn;
use windlint_linter::{merge, suggest, CanonicalSuggestion};

/// Suggestions the server has for `text`. Any bridge failure is logged and
/// yields no suggestions.
pub async fn bridge_suggestions(
    bridge: &DiagnosticsBridge,
    text: &str,
    source_path: &str,
) -> Vec<CanonicalSuggestion> {
    if let Err(error) = bridge.ensure_started().await {
        warn!(%error, "Diagnostics bridge unavailable, using local suggestions");
        return Vec::new();
    }

    let uri = document_uri(source_path);
    let language_id = bridge
        .config()
        .language_id
        .clone()
        .unwrap_or_else(|| language_id_for_path(source_path).to_string());

    match bridge.diagnostics(&uri, &language_id, text).await {
        Ok(diagnostics) => suggestions_from_diagnostics(&diagnostics),
        Err(error) => {
            warn!(%error, path = source_path, "Diagnostics bridge failed, using local suggestions");
            Vec::new()
        }
    }
}

/// Local suggestions merged behind the server's.
pub async fn suggest_with_bridge(
    bridge: &DiagnosticsBridge,
    fragment: &str,
    source_path: &str,
) -> Vec<CanonicalSuggestion> {
    let external = bridge_suggestions(bridge, fragment, source_path).await;
    merge(external, suggest(fragment, source_path))
}

/// `file://` URI for a path, made absolute against the working directory.
pub fn document_uri(path: &str) -> String {
    let absolute = std::path::absolute(Path::new(path)).unwrap_or_else(|_| PathBuf::from(path));
    let normalized = absolute.to_string_lossy().replace('\\', "/");
    let encoded = normalized.replace('%', "%25").replace(' ', "%20");
    if encoded.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

/// Language id announced with `didOpen`, from the file extension.
pub fn language_id_for_path(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "jsx" => "javascriptreact",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "mts" | "cts" => "typescript",
        "vue" => "vue",
        "svelte" => "svelte",
        "astro" => "astro",
        "php" => "php",
        "erb" => "erb",
        "hbs" | "handlebars" => "handlebars",
        "md" | "mdx" => "markdown",
        _ => "html",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_uri() {
        assert_eq!(document_uri("/srv/app/my page.html"), "file:///srv/app/my%20page.html");
        assert!(document_uri("src/a.tsx").starts_with("file:///"));
        assert!(document_uri("src/a.tsx").ends_with("/src/a.tsx"));
    }

    #[test]
    fn test_language_ids() {
        assert_eq!(language_id_for_path("a/B.TSX"), "typescriptreact");
        assert_eq!(language_id_for_path("index.html"), "html");
        assert_eq!(language_id_for_path("Makefile"), "html");
        assert_eq!(language_id_for_path("App.vue"), "vue");
    }
}
