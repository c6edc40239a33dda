//! Conversation Grouping
//!
//! # Interview Q&A
//!
//! Q: 메시지를 어떻게 대화 단위로 묶는가?
//! A: 메시지마다 "상대방" id를 계산해서 그룹핑
//!
//!    ```text
//!    admin 화면:  상대방 = (from == 나) ? to : from
//!    일반 사용자: 상대방 = 고정 관리자 id   → 대화 1개로 합쳐짐
//!    ```
//!
//! Q: 정렬 규칙은?
//! A: 대화 목록은 마지막 메시지 기준 최신순, 대화 안의 메시지는 시간순
//!    - 같은 시각이면 메시지 id, 대화는 상대방 id로 tie-break
//!    - 같은 입력이면 항상 같은 출력 (idempotent)

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde::Serialize;

use crate::db::{Message, MessageRepository, UserSummary};

/// 누가 보고 있는가
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationView {
    /// 관리자: 상대방별로 대화 분리
    Admin,
    /// 회사 / 개인: 모든 메시지를 관리자와의 대화 하나로
    Member { admin_user_id: i64 },
}

/// 상대방별 대화
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub user_id: i64,
    pub user: Option<UserSummary>,
    pub last_message: Message,
    pub unread_count: usize,
    pub messages: Vec<Message>,
}

/// 메시지의 상대방 id
///
/// 현재 사용자와 무관한 메시지면 None
pub fn counterparty(message: &Message, current_user_id: i64, view: ConversationView) -> Option<i64> {
    if message.from_user_id != current_user_id && message.to_user_id != current_user_id {
        return None;
    }
    match view {
        ConversationView::Member { admin_user_id } => Some(admin_user_id),
        ConversationView::Admin => Some(if message.from_user_id == current_user_id {
            message.to_user_id
        } else {
            message.from_user_id
        }),
    }
}

/// 평평한 메시지 목록 → 대화 목록
///
/// 입력 순서와 무관하게 결과가 결정됨
pub fn group_conversations(
    messages: &[Message],
    current_user_id: i64,
    view: ConversationView,
    users: &HashMap<i64, UserSummary>,
) -> Vec<Conversation> {
    let mut threads: BTreeMap<i64, Vec<Message>> = BTreeMap::new();
    for message in messages {
        if let Some(other) = counterparty(message, current_user_id, view) {
            threads.entry(other).or_default().push(message.clone());
        }
    }

    let mut conversations: Vec<Conversation> = threads
        .into_iter()
        .filter_map(|(user_id, mut thread)| {
            thread.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            let last_message = thread.last()?.clone();
            let unread_count = thread
                .iter()
                .filter(|m| m.to_user_id == current_user_id && !m.is_read)
                .count();

            Some(Conversation {
                user_id,
                user: users.get(&user_id).cloned(),
                last_message,
                unread_count,
                messages: thread,
            })
        })
        .collect();

    conversations.sort_by(|a, b| {
        b.last_message
            .created_at
            .cmp(&a.last_message.created_at)
            .then(b.last_message.id.cmp(&a.last_message.id))
            .then(a.user_id.cmp(&b.user_id))
    });

    conversations
}

/// 저장소에서 메시지 / 상대방 정보를 읽어 대화 목록 생성
pub async fn load_conversations<R>(
    repo: &R,
    current_user_id: i64,
    view: ConversationView,
) -> Result<Vec<Conversation>>
where
    R: MessageRepository + ?Sized,
{
    let messages = repo.messages_for_user(current_user_id).await?;

    let mut ids: Vec<i64> = messages
        .iter()
        .filter_map(|m| counterparty(m, current_user_id, view))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let users: HashMap<i64, UserSummary> = repo
        .user_summaries(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(group_conversations(&messages, current_user_id, view, &users))
}
