//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `sdg_targets`: ODS 목표 대비 투자 달성률
//! - `conversations`: 메시지 → 대화 그룹핑
//! - `smart_image`: 이미지 URL 확인 + 대체 확장자 + fallback
//! - `footprint`: 탄소 배출량 / 보상 금액 계산, 리더보드
//! - `sessions`: 비밀번호 해싱, 세션 토큰
//! - `uploads`: 업로드 파일 저장
//! - `static_data`: DB 오프라인 시 정적 카탈로그

pub mod conversations;
pub mod footprint;
pub mod sdg_targets;
pub mod sessions;
pub mod smart_image;
pub mod static_data;
pub mod uploads;

pub use conversations::{load_conversations, Conversation, ConversationView};
pub use sdg_targets::{load_overview, InvestmentOverview, TargetBook};
pub use smart_image::{DefaultProbe, HttpProbe, SmartImageResolver, UploadsProbe};
pub use uploads::{UploadKind, UploadStore};
