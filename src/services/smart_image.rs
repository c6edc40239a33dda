//! Smart Image Resolution
//!
//! Resolves an image URL by probing the original location and then a fixed
//! list of alternate extensions on the same base path. When every candidate
//! fails, a deterministic fallback (gradient background + name text) is
//! returned instead.
//!
//! # Probe Flow
//!
//! ```text
//! /uploads/logos/acme.png?v=<nonce>    ✗
//! /uploads/logos/acme.jpg              ✗
//! /uploads/logos/acme.jpeg             ✓  → Loaded
//! ```
//!
//! Each attempt is bounded by a timeout and the whole probe honours a
//! `CancellationToken`. A cancelled probe ends in `Error` with the attempts
//! made so far.
//!
//! Remote probing is limited to `IMAGE_ALLOWED_HOSTS`, never follows
//! redirects, and refuses hosts that resolve to loopback, private or
//! link-local addresses. At most `MAX_FALLBACK_EXTENSIONS` alternates are
//! tried per request.

use std::net::IpAddr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// 기본 대체 확장자 (순서대로 시도)
pub const DEFAULT_FALLBACK_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "svg"];

/// 요청 하나당 시도할 대체 확장자 상한
pub const MAX_FALLBACK_EXTENSIONS: usize = 8;

/// 이미지 로딩 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Loading,
    Loaded,
    Error,
}

/// 상태 머신: `Loading → Loaded | Error`, 종료 상태에서 더 이상 전이 없음
#[derive(Debug)]
struct ImageState {
    status: ImageStatus,
    image_url: Option<String>,
}

impl ImageState {
    fn new() -> Self {
        Self {
            status: ImageStatus::Loading,
            image_url: None,
        }
    }

    fn loaded(&mut self, url: String) {
        if self.status == ImageStatus::Loading {
            self.status = ImageStatus::Loaded;
            self.image_url = Some(url);
        }
    }

    fn failed(&mut self) {
        if self.status == ImageStatus::Loading {
            self.status = ImageStatus::Error;
        }
    }
}

/// 호출자 옵션
#[derive(Debug, Clone, Deserialize)]
pub struct SmartImageConfig {
    #[serde(default = "default_extensions")]
    pub fallback_extensions: Vec<String>,
    pub fallback_color: Option<String>,
    #[serde(default = "default_true")]
    pub show_name_as_fallback: bool,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_FALLBACK_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for SmartImageConfig {
    fn default() -> Self {
        Self {
            fallback_extensions: default_extensions(),
            fallback_color: None,
            show_name_as_fallback: true,
        }
    }
}

/// 모든 후보가 실패했을 때 보여줄 스타일
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackStyle {
    /// CSS background 값
    pub background: String,
    pub text_color: String,
    /// 표시할 텍스트 (이니셜)
    pub text: Option<String>,
    pub name: String,
}

/// probe 결과
#[derive(Debug, Clone, Serialize)]
pub struct ImageResolution {
    pub status: ImageStatus,
    pub image_url: Option<String>,
    /// 실제로 요청한 URL (진단용)
    pub attempted_urls: Vec<String>,
    pub fallback: Option<FallbackStyle>,
    pub cancelled: bool,
}

/// 리소스 존재 확인 인터페이스
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    /// 리소스를 가져올 수 있으면 true
    async fn exists(&self, url: &str) -> anyhow::Result<bool>;
}

/// 이미지 resolver
pub struct SmartImageResolver<P> {
    probe: P,
    attempt_timeout: Duration,
}

impl<P: ResourceProbe> SmartImageResolver<P> {
    pub fn new(probe: P, attempt_timeout: Duration) -> Self {
        Self {
            probe,
            attempt_timeout,
        }
    }

    /// 원본 → 대체 확장자 순서로 probe
    ///
    /// 원본 URL에는 cache-busting 파라미터(`v=<nonce>`)를 붙여 요청
    pub async fn resolve(
        &self,
        original_url: &str,
        name: &str,
        config: &SmartImageConfig,
        nonce: u64,
        cancel: &CancellationToken,
    ) -> ImageResolution {
        let mut state = ImageState::new();
        let mut attempted_urls = Vec::new();
        let mut cancelled = false;

        let original = original_url.trim();
        if !original.is_empty() {
            let mut candidates = vec![(with_cache_buster(original, nonce), original.to_string())];
            candidates.extend(
                alternate_urls(original, &config.fallback_extensions)
                    .into_iter()
                    .map(|url| (url.clone(), url)),
            );

            for (request_url, clean_url) in candidates {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                attempted_urls.push(request_url.clone());

                let attempt = tokio::time::timeout(self.attempt_timeout, self.probe.exists(&request_url));
                let found = tokio::select! {
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    outcome = attempt => match outcome {
                        Ok(Ok(found)) => found,
                        Ok(Err(e)) => {
                            tracing::debug!(url = %request_url, error = %e, "image probe failed");
                            false
                        }
                        Err(_) => {
                            tracing::debug!(url = %request_url, "image probe timed out");
                            false
                        }
                    },
                };

                if found {
                    state.loaded(clean_url);
                    break;
                }
            }
        }

        state.failed();

        let fallback = match state.status {
            ImageStatus::Loaded => None,
            _ => Some(fallback_style(name, config)),
        };

        ImageResolution {
            status: state.status,
            image_url: state.image_url,
            attempted_urls,
            fallback,
            cancelled,
        }
    }
}

// ============ URL Helpers ============

/// `?v=<nonce>` (또는 `&v=`) 추가
pub fn with_cache_buster(url: &str, nonce: u64) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    match fragment {
        Some(fragment) => format!("{}{}v={}#{}", base, separator, nonce, fragment),
        None => format!("{}{}v={}", base, separator, nonce),
    }
}

/// 확장자를 제거한 경로와 기존 확장자
///
/// 쿼리/프래그먼트는 버림
pub fn split_extension(url: &str) -> (&str, Option<&str>) {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = file_start + dot;
            (&path[..dot], Some(&path[dot + 1..]))
        }
        _ => (path, None),
    }
}

/// 대체 확장자 후보 URL (원본 확장자와 같은 것은 제외, 최대 `MAX_FALLBACK_EXTENSIONS`개)
pub fn alternate_urls(url: &str, extensions: &[String]) -> Vec<String> {
    let (base, current) = split_extension(url);
    let mut seen: Vec<String> = current.map(|c| c.to_lowercase()).into_iter().collect();
    let mut urls = Vec::new();

    for ext in extensions {
        if urls.len() == MAX_FALLBACK_EXTENSIONS {
            break;
        }
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if ext.is_empty() || seen.contains(&ext) {
            continue;
        }
        urls.push(format!("{}.{}", base, ext));
        seen.push(ext);
    }

    urls
}

// ============ Fallback ============

/// 이름에서 이니셜 (최대 2글자)
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .filter(|c| c.is_alphanumeric())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

/// 이름 기반 결정적 그라디언트
///
/// FNV-1a 해시로 hue 결정 → 같은 이름은 항상 같은 색
pub fn fallback_style(name: &str, config: &SmartImageConfig) -> FallbackStyle {
    let background = match config.fallback_color.as_deref().map(str::trim) {
        Some(color) if !color.is_empty() => {
            format!("linear-gradient(135deg, {} 0%, {} 100%)", color, color)
        }
        _ => {
            let hue = name_hue(name);
            format!(
                "linear-gradient(135deg, hsl({}, 65%, 45%) 0%, hsl({}, 65%, 30%) 100%)",
                hue,
                (hue + 40) % 360
            )
        }
    };

    let text = if config.show_name_as_fallback {
        let initials = initials(name);
        (!initials.is_empty()).then_some(initials)
    } else {
        None
    };

    FallbackStyle {
        background,
        text_color: "#FFFFFF".to_string(),
        text,
        name: name.to_string(),
    }
}

fn name_hue(name: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.trim().to_lowercase().bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash % 360
}

// ============ Probes ============

/// `reqwest` HEAD 요청 probe (2xx = 존재)
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// redirect를 따라가지 않는 클라이언트로 생성
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceProbe for HttpProbe {
    async fn exists(&self, url: &str) -> anyhow::Result<bool> {
        let response = self.client.head(url).send().await?;
        if response.status() == reqwest::StatusCode::METHOD_NOT_ALLOWED {
            // HEAD 미지원 서버
            let response = self.client.get(url).send().await?;
            return Ok(response.status().is_success());
        }
        Ok(response.status().is_success())
    }
}

/// 로컬 업로드 디렉토리 probe (`/uploads/...`)
pub struct UploadsProbe {
    root: PathBuf,
}

impl UploadsProbe {
    pub const URL_PREFIX: &'static str = "/uploads/";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// URL → 파일 경로 (`..` 등 디렉토리 탈출은 거부)
    pub fn resolve_path(&self, url: &str) -> Option<PathBuf> {
        let path = url.split(['?', '#']).next()?;
        let relative = path.strip_prefix(Self::URL_PREFIX)?;
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl ResourceProbe for UploadsProbe {
    async fn exists(&self, url: &str) -> anyhow::Result<bool> {
        let Some(path) = self.resolve_path(url) else {
            return Ok(false);
        };
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// 외부 요청을 보내도 되는 주소인지 (loopback / 사설 / link-local 등은 거부)
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || a == 0
                // 100.64.0.0/10 (CGNAT)
                || (a == 100 && (b & 0xc0) == 64))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (first & 0xfe00) == 0xfc00
                // fe80::/10 link-local
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

/// 허용 목록에 있는 http(s) URL이면 (host, port)
///
/// IP 리터럴 host는 허용 목록에 있어도 공인 주소가 아니면 거부
pub fn remote_target(url: &str, allowed_hosts: &[String]) -> Option<(String, u16)> {
    let parsed = reqwest::Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?.to_lowercase();
    if !allowed_hosts.iter().any(|allowed| allowed.eq_ignore_ascii_case(&host)) {
        return None;
    }

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        if !is_public_ip(ip) {
            return None;
        }
    }

    Some((bare.to_string(), parsed.port_or_known_default()?))
}

/// URL 종류에 따라 HTTP / 업로드 probe로 분기
///
/// 원격 URL은 `allowed_hosts`에 있는 host만, 그리고 DNS 결과가 모두 공인
/// 주소일 때만 요청함
pub struct DefaultProbe {
    http: HttpProbe,
    uploads: UploadsProbe,
    allowed_hosts: Vec<String>,
}

impl DefaultProbe {
    pub fn new(http: HttpProbe, uploads: UploadsProbe, allowed_hosts: Vec<String>) -> Self {
        Self {
            http,
            uploads,
            allowed_hosts,
        }
    }
}

#[async_trait]
impl ResourceProbe for DefaultProbe {
    async fn exists(&self, url: &str) -> anyhow::Result<bool> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let Some((host, port)) = remote_target(url, &self.allowed_hosts) else {
                tracing::debug!(url, "remote image host not allowed");
                return Ok(false);
            };

            let mut resolved = tokio::net::lookup_host((host.as_str(), port)).await?.peekable();
            if resolved.peek().is_none() {
                return Ok(false);
            }
            if resolved.any(|addr| !is_public_ip(addr.ip())) {
                tracing::warn!(url, "remote image host resolves to a non-public address");
                return Ok(false);
            }

            self.http.exists(url).await
        } else if url.starts_with(UploadsProbe::URL_PREFIX) {
            self.uploads.exists(url).await
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// 주어진 경로(쿼리 제외)만 존재하는 probe
    struct SetProbe {
        existing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl SetProbe {
        fn new(existing: &[&str]) -> Self {
            Self {
                existing: existing.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl ResourceProbe for SetProbe {
        async fn exists(&self, url: &str) -> anyhow::Result<bool> {
            self.calls.lock().unwrap().push(url.to_string());
            let path = url.split('?').next().unwrap_or(url);
            Ok(self.existing.contains(path))
        }
    }

    /// 절대 끝나지 않는 probe
    struct HangingProbe;

    #[async_trait]
    impl ResourceProbe for HangingProbe {
        async fn exists(&self, _url: &str) -> anyhow::Result<bool> {
            std::future::pending::<()>().await;
            Ok(true)
        }
    }

    fn resolver<P: ResourceProbe>(probe: P) -> SmartImageResolver<P> {
        SmartImageResolver::new(probe, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_original_url_loads() {
        let r = resolver(SetProbe::new(&["/uploads/logos/acme.png"]));
        let res = r
            .resolve("/uploads/logos/acme.png", "Acme", &SmartImageConfig::default(), 7, &CancellationToken::new())
            .await;

        assert_eq!(res.status, ImageStatus::Loaded);
        assert_eq!(res.image_url.as_deref(), Some("/uploads/logos/acme.png"));
        assert_eq!(res.attempted_urls, vec!["/uploads/logos/acme.png?v=7"]);
        assert!(res.fallback.is_none());
    }

    #[tokio::test]
    async fn test_falls_back_to_alternate_extension() {
        let r = resolver(SetProbe::new(&["/uploads/logos/acme.jpeg"]));
        let res = r
            .resolve("/uploads/logos/acme.png", "Acme", &SmartImageConfig::default(), 1, &CancellationToken::new())
            .await;

        assert_eq!(res.status, ImageStatus::Loaded);
        assert_eq!(res.image_url.as_deref(), Some("/uploads/logos/acme.jpeg"));
        assert_eq!(
            res.attempted_urls,
            vec![
                "/uploads/logos/acme.png?v=1",
                "/uploads/logos/acme.jpg",
                "/uploads/logos/acme.jpeg",
            ]
        );
    }

    #[tokio::test]
    async fn test_all_candidates_missing_yields_error_with_fallback() {
        let probe = SetProbe::new(&[]);
        let r = resolver(probe);
        let res = r
            .resolve("/uploads/logos/acme.png", "Empresa Verde", &SmartImageConfig::default(), 1, &CancellationToken::new())
            .await;

        assert_eq!(res.status, ImageStatus::Error);
        assert!(res.image_url.is_none());
        // 원본 + png 제외 4개 확장자
        assert_eq!(res.attempted_urls.len(), 5);
        let fallback = res.fallback.expect("fallback style");
        assert_eq!(fallback.text.as_deref(), Some("EV"));
        assert!(fallback.background.starts_with("linear-gradient"));
    }

    #[tokio::test]
    async fn test_hanging_attempt_times_out() {
        let r = resolver(HangingProbe);
        let config = SmartImageConfig {
            fallback_extensions: vec!["jpg".into()],
            ..Default::default()
        };
        let res = r
            .resolve("https://cdn.example.ao/a.png", "A", &config, 1, &CancellationToken::new())
            .await;

        assert_eq!(res.status, ImageStatus::Error);
        assert_eq!(res.attempted_urls.len(), 2);
        assert!(!res.cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_resolution_stops_early() {
        let r = SmartImageResolver::new(HangingProbe, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let res = r
            .resolve("/uploads/a.png", "A", &SmartImageConfig::default(), 1, &cancel)
            .await;

        assert_eq!(res.status, ImageStatus::Error);
        assert!(res.cancelled);
        assert_eq!(res.attempted_urls.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_url_goes_straight_to_fallback() {
        let r = resolver(SetProbe::new(&[]));
        let res = r
            .resolve("  ", "Fundo Verde", &SmartImageConfig::default(), 1, &CancellationToken::new())
            .await;
        assert_eq!(res.status, ImageStatus::Error);
        assert!(res.attempted_urls.is_empty());
        assert!(res.fallback.is_some());
    }

    #[test]
    fn test_cache_buster() {
        assert_eq!(with_cache_buster("/a.png", 5), "/a.png?v=5");
        assert_eq!(with_cache_buster("/a.png?w=10", 5), "/a.png?w=10&v=5");
        assert_eq!(with_cache_buster("/a.png#top", 5), "/a.png?v=5#top");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("/uploads/x/logo.PNG?v=1"), ("/uploads/x/logo", Some("PNG")));
        assert_eq!(split_extension("/uploads/x.dir/logo"), ("/uploads/x.dir/logo", None));
        assert_eq!(split_extension("/uploads/.hidden"), ("/uploads/.hidden", None));
    }

    #[test]
    fn test_alternate_urls_skip_current_and_duplicates() {
        let exts = vec![".PNG".to_string(), "jpg".into(), "jpg".into(), "".into()];
        assert_eq!(alternate_urls("/p/logo.png", &exts), vec!["/p/logo.jpg"]);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let config = SmartImageConfig::default();
        assert_eq!(fallback_style("Unitel", &config), fallback_style("Unitel", &config));

        let colored = SmartImageConfig {
            fallback_color: Some("#3F7E44".into()),
            show_name_as_fallback: false,
            ..Default::default()
        };
        let style = fallback_style("Unitel", &colored);
        assert!(style.background.contains("#3F7E44"));
        assert!(style.text.is_none());
    }

    #[test]
    fn test_alternates_are_capped() {
        let exts: Vec<String> = (0..200).map(|i| format!("e{}", i)).collect();
        let urls = alternate_urls("/uploads/logos/a.png", &exts);
        assert_eq!(urls.len(), MAX_FALLBACK_EXTENSIONS);
        assert_eq!(urls[0], "/uploads/logos/a.e0");
    }

    #[tokio::test]
    async fn test_many_extensions_bound_attempts() {
        let r = resolver(SetProbe::new(&[]));
        let config = SmartImageConfig {
            fallback_extensions: (0..200).map(|i| format!("e{}", i)).collect(),
            ..Default::default()
        };
        let res = r
            .resolve("/uploads/logos/a.png", "A", &config, 1, &CancellationToken::new())
            .await;
        assert_eq!(res.attempted_urls.len(), 1 + MAX_FALLBACK_EXTENSIONS);
    }

    #[test]
    fn test_public_ip_classification() {
        for internal in [
            "127.0.0.1", "10.1.2.3", "172.16.0.9", "192.168.1.1", "169.254.169.254",
            "0.0.0.0", "100.64.0.1", "::1", "fe80::1", "fd00::1", "::ffff:127.0.0.1",
        ] {
            let ip: IpAddr = internal.parse().unwrap();
            assert!(!is_public_ip(ip), "{} should be refused", internal);
        }
        for public in ["8.8.8.8", "41.63.0.1", "2001:4860:4860::8888"] {
            let ip: IpAddr = public.parse().unwrap();
            assert!(is_public_ip(ip), "{} should be allowed", public);
        }
    }

    #[test]
    fn test_remote_target_requires_allowed_public_host() {
        let allowed = vec!["cdn.fundoverde.ao".to_string(), "127.0.0.1".to_string()];

        assert_eq!(
            remote_target("https://CDN.fundoverde.ao/logo.png", &allowed),
            Some(("cdn.fundoverde.ao".to_string(), 443))
        );
        assert_eq!(remote_target("https://evil.example/logo.png", &allowed), None);
        assert_eq!(remote_target("http://169.254.169.254/latest/meta-data", &allowed), None);
        // 허용 목록에 있어도 loopback은 거부
        assert_eq!(remote_target("http://127.0.0.1:8080/a.png", &allowed), None);
        assert_eq!(remote_target("ftp://cdn.fundoverde.ao/a.png", &allowed), None);
        assert_eq!(remote_target("https://cdn.fundoverde.ao/a.png", &[]), None);
    }

    #[tokio::test]
    async fn test_remote_check_never_contacts_internal_hosts() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();
        tokio::spawn(async move {
            while listener.accept().await.is_ok() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let probe = DefaultProbe::new(
            HttpProbe::new().unwrap(),
            UploadsProbe::new(dir.path()),
            vec!["127.0.0.1".to_string(), "localhost".to_string()],
        );
        let r = SmartImageResolver::new(probe, Duration::from_millis(500));
        let config = SmartImageConfig {
            fallback_extensions: (0..200).map(|i| format!("e{}", i)).collect(),
            ..Default::default()
        };

        for url in [
            format!("http://127.0.0.1:{}/admin/secret.png", port),
            format!("http://localhost:{}/admin/secret.png", port),
        ] {
            let res = r.resolve(&url, "A", &config, 1, &CancellationToken::new()).await;
            assert_eq!(res.status, ImageStatus::Error);
            assert_eq!(res.attempted_urls.len(), 1 + MAX_FALLBACK_EXTENSIONS);
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(connections.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_found_under_alternate_extension() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("logos")).await.unwrap();
        tokio::fs::write(dir.path().join("logos/marca.jpg"), b"jpeg").await.unwrap();

        let probe = DefaultProbe::new(HttpProbe::new().unwrap(), UploadsProbe::new(dir.path()), vec![]);
        let r = SmartImageResolver::new(probe, Duration::from_secs(1));
        let res = r
            .resolve("/uploads/logos/marca.png", "Marca", &SmartImageConfig::default(), 3, &CancellationToken::new())
            .await;

        assert_eq!(res.status, ImageStatus::Loaded);
        assert_eq!(res.image_url.as_deref(), Some("/uploads/logos/marca.jpg"));
        assert!(res.fallback.is_none());
    }

    #[test]
    fn test_uploads_lookup_rejects_traversal() {
        let probe = UploadsProbe::new("/srv/uploads");
        assert_eq!(
            probe.resolve_path("/uploads/logos/a.png?v=1"),
            Some(PathBuf::from("/srv/uploads/logos/a.png"))
        );
        assert_eq!(probe.resolve_path("/uploads/../etc/passwd"), None);
        assert_eq!(probe.resolve_path("/static/a.png"), None);
    }
}
