//! 会话存储抽象层
//!
//! 定义统一的会话管理接口：create / 按会话操作 / destroy。存储独占权威
//! 副本，所有读写都落在同一份可变状态上。内存实现用于单进程部署；
//! 多实例部署可注入其它后端。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::field::Field;
use super::session::{Phase, Session};

/// 会话存储接口
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 创建会话；字段顺序保持调用方给定的顺序，预填答案原样保留
    async fn create(&self, session_id: &str, catalog_id: &str, fields: Vec<Field>);

    /// 会话是否存活
    async fn contains(&self, session_id: &str) -> bool;

    /// 会话阶段；不存在时为 None
    async fn phase(&self, session_id: &str) -> Option<Phase>;

    /// 当前待答字段与全部字段的快照（规整需要读兄弟答案）
    async fn current_field(&self, session_id: &str) -> Option<(Field, Vec<Field>)>;

    /// 写入当前字段答案并前移游标
    async fn store_answer(&self, session_id: &str, answer: String);

    /// 下一个未答字段的问题；顺带推进游标越过已答字段
    async fn next_question(&self, session_id: &str) -> Option<String>;

    /// 所有字段是否都已有答案
    async fn is_complete(&self, session_id: &str) -> bool;

    async fn set_phase(&self, session_id: &str, phase: Phase);

    /// 确认摘要正文
    async fn summary(&self, session_id: &str) -> Option<String>;

    /// 目录 ID 与提交用的 name -> 答案 映射
    async fn collected(&self, session_id: &str) -> Option<(String, Vec<(String, String)>)>;

    /// 字段快照（修正解析用）
    async fn fields(&self, session_id: &str) -> Option<Vec<Field>>;

    /// 就地覆盖指定字段的答案（确认阶段修正）
    async fn apply_correction(&self, session_id: &str, index: usize, value: String);

    /// 整个会话的只读快照
    async fn snapshot(&self, session_id: &str) -> Option<Session>;

    async fn destroy(&self, session_id: &str);

    /// 存活会话数
    async fn active_count(&self) -> usize;
}

/// 内存会话存储
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 对存活会话执行闭包，返回闭包结果；会话不存在时返回 None
    pub async fn with_session<F, R>(&self, session_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(session_id).map(f)
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session_id: &str, catalog_id: &str, fields: Vec<Field>) {
        let session = Session::new(session_id.to_string(), catalog_id.to_string(), fields);
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), session);
    }

    async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    async fn phase(&self, session_id: &str) -> Option<Phase> {
        self.with_session(session_id, |s| s.phase).await
    }

    async fn current_field(&self, session_id: &str) -> Option<(Field, Vec<Field>)> {
        self.with_session(session_id, |s| {
            s.current_field().cloned().map(|f| (f, s.fields.clone()))
        })
        .await
        .flatten()
    }

    async fn store_answer(&self, session_id: &str, answer: String) {
        self.with_session(session_id, |s| s.store_answer(answer))
            .await;
    }

    async fn next_question(&self, session_id: &str) -> Option<String> {
        self.with_session(session_id, |s| s.next_question())
            .await
            .flatten()
    }

    async fn is_complete(&self, session_id: &str) -> bool {
        self.with_session(session_id, |s| s.is_complete())
            .await
            .unwrap_or(false)
    }

    async fn set_phase(&self, session_id: &str, phase: Phase) {
        self.with_session(session_id, |s| s.phase = phase).await;
    }

    async fn summary(&self, session_id: &str) -> Option<String> {
        self.with_session(session_id, |s| s.summary()).await
    }

    async fn collected(&self, session_id: &str) -> Option<(String, Vec<(String, String)>)> {
        self.with_session(session_id, |s| (s.catalog_id.clone(), s.collected_answers()))
            .await
    }

    async fn fields(&self, session_id: &str) -> Option<Vec<Field>> {
        self.with_session(session_id, |s| s.fields.clone()).await
    }

    async fn apply_correction(&self, session_id: &str, index: usize, value: String) {
        self.with_session(session_id, |s| s.set_answer(index, value))
            .await;
    }

    async fn snapshot(&self, session_id: &str) -> Option<Session> {
        self.with_session(session_id, |s| s.clone()).await
    }

    async fn destroy(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::field::FieldKind;

    fn plain_field(name: &str, answer: Option<&str>) -> Field {
        Field {
            name: name.to_string(),
            label: None,
            question: None,
            kind: FieldKind::Plain,
            choices: Vec::new(),
            answer: answer.map(str::to_string),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_create_get_destroy() {
        let store = MemorySessionStore::new();
        assert!(!store.contains("s1").await);

        store
            .create("s1", "cat1", vec![plain_field("a", None)])
            .await;
        assert!(store.contains("s1").await);
        assert_eq!(store.active_count().await, 1);
        assert_eq!(store.phase("s1").await, Some(Phase::AwaitingVariable));

        store.destroy("s1").await;
        assert!(!store.contains("s1").await);
        assert_eq!(store.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_preserves_prefilled_answers_and_order() {
        let store = MemorySessionStore::new();
        store
            .create(
                "s1",
                "cat1",
                vec![
                    plain_field("requested_for", Some("u1")),
                    plain_field("booking_date", None),
                ],
            )
            .await;

        let fields = store.fields("s1").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "requested_for");
        assert_eq!(fields[0].answer.as_deref(), Some("u1"));
        assert!(fields[1].answer.is_none());
    }

    #[tokio::test]
    async fn test_mutations_visible_to_later_reads() {
        let store = MemorySessionStore::new();
        store
            .create("s1", "cat1", vec![plain_field("a", None)])
            .await;

        store.store_answer("s1", "hello".to_string()).await;
        let snapshot = store.snapshot("s1").await.unwrap();
        assert_eq!(snapshot.fields[0].answer.as_deref(), Some("hello"));
        assert_eq!(snapshot.cursor, 1);
        assert!(store.is_complete("s1").await);
    }
}
