//! Upload Storage
//!
//! Files received over multipart are written to
//! `<UPLOAD_DIR>/<kind>/<uuid>.<ext>` and served back under `/uploads`.
//!
//! | Kind | Directory | Extensions |
//! |---|---|---|
//! | Company logo | `logos` | png, jpg, jpeg, gif, webp |
//! | Profile photo | `profile-photos` | png, jpg, jpeg, gif, webp |
//! | Payment proof | `payment-proofs` | images + pdf |
//!
//! SVG는 받지 않음: 업로드 파일은 세션 쿠키와 같은 origin에서 서빙되므로
//! 스크립트를 담을 수 있는 형식은 제외.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use uuid::Uuid;

use crate::error::ApiError;

/// 업로드 최대 크기 (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const PROOF_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "pdf"];

/// 업로드 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Logo,
    ProfilePhoto,
    PaymentProof,
}

impl UploadKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            UploadKind::Logo => "logos",
            UploadKind::ProfilePhoto => "profile-photos",
            UploadKind::PaymentProof => "payment-proofs",
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::PaymentProof => PROOF_EXTENSIONS,
            UploadKind::Logo | UploadKind::ProfilePhoto => IMAGE_EXTENSIONS,
        }
    }
}

/// multipart에서 읽은 파일
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// 파일 필드를 끝까지 읽음 (크기 제한 초과 시 즉시 중단)
pub async fn read_file_field(mut field: Field<'_>, max_bytes: usize) -> Result<UploadedFile, ApiError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if data.len() + chunk.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(max_bytes));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        data,
    })
}

/// 파일명 / content-type에서 확장자 결정 후 허용 목록 검사
pub fn resolve_extension(kind: UploadKind, file: &UploadedFile) -> Result<&'static str, ApiError> {
    let from_name = file
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    let candidate = match from_name {
        Some(ext) => Some(ext),
        None => file
            .content_type
            .as_deref()
            .and_then(extension_for_mime)
            .map(str::to_string),
    };

    let Some(candidate) = candidate else {
        return Err(ApiError::ValidationError(
            "Could not determine file type".to_string(),
        ));
    };

    kind.allowed_extensions()
        .iter()
        .find(|allowed| **allowed == candidate)
        .copied()
        .ok_or_else(|| {
            ApiError::ValidationError(format!(
                "File type .{} not allowed (allowed: {})",
                candidate,
                kind.allowed_extensions().join(", ")
            ))
        })
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.split(';').next().map(str::trim)? {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// 업로드 디렉토리 관리
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// 파일 저장 후 공개 URL 반환 (`/uploads/<kind>/<uuid>.<ext>`)
    pub async fn save(&self, kind: UploadKind, file: &UploadedFile) -> Result<String, ApiError> {
        if file.data.is_empty() {
            return Err(ApiError::ValidationError("Uploaded file is empty".to_string()));
        }
        if file.data.len() > self.max_bytes {
            return Err(ApiError::PayloadTooLarge(self.max_bytes));
        }

        let ext = resolve_extension(kind, file)?;
        let dir = self.root.join(kind.dir_name());
        let file_name = format!("{}.{}", Uuid::new_v4(), ext);

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            tracing::error!("Failed to create upload dir {}: {}", dir.display(), e);
            ApiError::InternalError
        })?;
        tokio::fs::write(dir.join(&file_name), &file.data)
            .await
            .map_err(|e| {
                tracing::error!("Failed to write upload {}: {}", file_name, e);
                ApiError::InternalError
            })?;

        tracing::info!(kind = kind.dir_name(), file = %file_name, bytes = file.data.len(), "Stored upload");

        Ok(format!("/uploads/{}/{}", kind.dir_name(), file_name))
    }
}
