//! Image Resolution Endpoint
//!
//! `GET /api/images/resolve?url=/uploads/logos/x.png&name=Unitel`
//!
//! Tries the URL, then alternate extensions, and returns either the working
//! URL or a deterministic fallback (gradient + initials). The probe is
//! cancelled when the client goes away.
//!
//! Requires a session: each request can cost several outbound probes.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    auth::CurrentUser,
    services::smart_image::{ImageResolution, SmartImageConfig, MAX_FALLBACK_EXTENSIONS},
    AppState,
};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: String,
    pub fallback_color: Option<String>,
    /// 쉼표 구분 확장자 목록 (`png,jpg`)
    pub extensions: Option<String>,
    pub show_name: Option<bool>,
}

impl ResolveQuery {
    fn config(&self) -> SmartImageConfig {
        let mut config = SmartImageConfig {
            fallback_color: self.fallback_color.clone().filter(|c| !c.trim().is_empty()),
            ..SmartImageConfig::default()
        };
        if let Some(exts) = self.extensions.as_deref() {
            config.fallback_extensions = exts
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .take(MAX_FALLBACK_EXTENSIONS)
                .collect();
        }
        if let Some(show) = self.show_name {
            config.show_name_as_fallback = show;
        }
        config
    }
}

// ============ Handlers ============

/// GET /api/images/resolve
pub async fn resolve_image(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ResolveQuery>,
) -> Json<ImageResolution> {
    let cancel = CancellationToken::new();
    // 핸들러 future가 drop되면 진행 중인 probe도 취소
    let _guard = cancel.clone().drop_guard();

    let nonce: u64 = rand::random();
    let resolution = state
        .images
        .resolve(&query.url, &query.name, &query.config(), nonce, &cancel)
        .await;

    Json(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builds_config() {
        let query = ResolveQuery {
            url: "/uploads/logos/a.png".into(),
            name: "Unitel".into(),
            fallback_color: Some("  ".into()),
            extensions: Some("webp, ,svg".into()),
            show_name: Some(false),
        };
        let config = query.config();
        assert_eq!(config.fallback_extensions, vec!["webp", "svg"]);
        assert_eq!(config.fallback_color, None);
        assert!(!config.show_name_as_fallback);
    }

    #[test]
    fn test_query_caps_extension_list() {
        let query = ResolveQuery {
            url: "/uploads/logos/a.png".into(),
            name: "A".into(),
            fallback_color: None,
            extensions: Some((0..200).map(|i| format!("e{}", i)).collect::<Vec<_>>().join(",")),
            show_name: None,
        };
        assert_eq!(query.config().fallback_extensions.len(), MAX_FALLBACK_EXTENSIONS);
    }
}
