//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크
//! - `/api/register`, `/api/login`, `/api/logout`, `/api/user` - 계정 / 세션
//! - `/api/sdgs/*`, `/api/projects` - 카탈로그 (DB 오프라인 시 정적 데이터)
//! - `/api/company/*`, `/api/individual/*` - 프로필, 업로드, 소비 기록
//! - `/api/payment-proofs`, `/api/investments` - 보상 결제
//! - `/api/messages/*` - 관리자와의 메시지
//! - `/api/admin/*` - 관리자 전용
//! - `/api/images/resolve` - 이미지 URL 확인 (로그인 사용자)
//! - `/uploads/*` - 업로드 파일 (정적)

pub mod account;
pub mod admin;
pub mod catalog;
pub mod company;
pub mod health;
pub mod images;
pub mod individual;
pub mod leaderboard;
pub mod messages;
pub mod payments;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::{services::uploads::MAX_UPLOAD_BYTES, AppState};

/// 개발 환경 허용 origin
const DEV_ORIGINS: [&str; 3] = [
    "http://localhost:5173", // Vite dev server
    "http://localhost:3000",
    "http://127.0.0.1:5173",
];

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /health
///
/// POST /api/register                          POST /api/login
/// POST /api/logout                            GET  /api/user
///
/// GET  /api/sdgs        GET /api/sdgs/:id     GET  /api/projects?sdg_id=
/// GET  /api/carbon-leaderboard                GET  /api/images/resolve  (세션 필요)
///
/// GET|PUT  /api/company/profile               POST /api/company/logo
/// GET|POST /api/company/consumption
/// GET|PUT  /api/individual/profile            POST /api/individual/profile/photo
///
/// GET|POST /api/payment-proofs                GET  /api/investments
///
/// GET  /api/messages    GET /api/messages/conversations
/// POST /api/messages    POST /api/messages/:user_id/read
///
/// GET  /api/admin/stats                       GET  /api/admin/companies[/:id]
/// GET  /api/admin/payment-proofs?status=      PUT  /api/admin/payment-proofs/:id/status
/// GET  /api/admin/payment-proofs/without-sdg  PUT  /api/admin/payment-proofs/:id/sdg
/// POST /api/admin/investments                 GET  /api/admin/sdg-investments
/// GET|PUT /api/admin/sdg-targets              POST /api/admin/messages/send
/// ```
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);
    // 업로드 파일은 세션 쿠키와 같은 origin: 브라우저가 문서로 실행하지 못하게 막음
    let uploads = Router::new()
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("sandbox"),
        ));

    let api = Router::new()
        // Account
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/logout", post(account::logout))
        .route("/user", get(account::current_user))

        // Catalogue
        .route("/sdgs", get(catalog::list_sdgs))
        .route("/sdgs/:id", get(catalog::get_sdg))
        .route("/projects", get(catalog::list_projects))
        .route("/carbon-leaderboard", get(leaderboard::carbon_leaderboard))
        .route("/images/resolve", get(images::resolve_image))

        // Company
        .route("/company/profile", get(company::get_profile).put(company::update_profile))
        .route("/company/logo", post(company::upload_logo))
        .route(
            "/company/consumption",
            get(company::list_consumption).post(company::add_consumption),
        )

        // Individual
        .route(
            "/individual/profile",
            get(individual::get_profile).put(individual::update_profile),
        )
        .route("/individual/profile/photo", post(individual::upload_photo))

        // Payments
        .route(
            "/payment-proofs",
            get(payments::list_own_proofs).post(payments::create_payment_proof),
        )
        .route("/investments", get(payments::list_own_investments))

        // Messages
        .route("/messages", get(messages::list_messages).post(messages::send_to_admin))
        .route("/messages/conversations", get(messages::list_conversations))
        .route("/messages/:user_id/read", post(messages::mark_read))

        // Admin
        .route("/admin/stats", get(admin::stats))
        .route("/admin/companies", get(admin::list_companies))
        .route("/admin/companies/:id", get(admin::get_company))
        .route("/admin/payment-proofs", get(admin::list_payment_proofs))
        .route("/admin/payment-proofs/without-sdg", get(admin::proofs_without_sdg))
        .route("/admin/payment-proofs/:id/status", put(admin::update_proof_status))
        .route("/admin/payment-proofs/:id/sdg", put(admin::assign_proof_sdg))
        .route("/admin/investments", post(admin::create_investment))
        .route("/admin/sdg-investments", get(admin::sdg_investments))
        .route(
            "/admin/sdg-targets",
            get(admin::get_sdg_targets).put(admin::update_sdg_targets),
        )
        .route("/admin/messages/send", post(messages::admin_send));

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .merge(uploads)

        // 미들웨어
        // multipart 경계 / 필드 여유분을 포함해 파일 한도보다 약간 크게
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}

/// CORS 설정
///
/// 쿠키 세션을 쓰므로 credentials 허용 + origin 명시 필요
/// - 프로덕션: `ALLOWED_ORIGINS`
/// - 개발: localhost
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = if state.config.is_production() {
        state
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect()
    } else {
        DEV_ORIGINS.iter().map(|&o| HeaderValue::from_static(o)).collect()
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
