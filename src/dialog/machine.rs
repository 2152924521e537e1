//! 对话状态机
//!
//! 每条入站话语驱动一次状态转移：
//! 无会话 →（意图与字段解析）→ 收集中 → 确认中 → 终态（会话销毁）。
//! 同一会话的轮次用按键互斥串行化，轮次内包含提交后的有界状态轮询；
//! 不同会话之间没有共享状态，完全并行。

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Local;
use regex::Regex;
use tokio::sync::Mutex;

use crate::catalog::CatalogService;
use crate::dialog::correction::parse_correction;
use crate::dialog::error::DialogError;
use crate::dialog::field::{Field, REQUESTED_FOR};
use crate::dialog::session::Phase;
use crate::dialog::store::SessionStore;
use crate::normalize::normalize_answer;

static AFFIRM_RE: OnceLock<Regex> = OnceLock::new();

/// 提交后的工单轮询参数
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 24,
        }
    }
}

/// 对话控制器
pub struct DialogMachine {
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn CatalogService>,
    poll: PollPolicy,
    /// 每会话一把轮次锁；条目随进程存活
    turn_gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DialogMachine {
    pub fn new(
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn CatalogService>,
        poll: PollPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            poll,
            turn_gates: Mutex::new(HashMap::new()),
        }
    }

    /// 处理一条话语，返回回复文本
    pub async fn handle_turn(&self, session_id: &str, utterance: &str) -> Result<String, DialogError> {
        let message = utterance.trim();
        if session_id.trim().is_empty() || message.is_empty() {
            return Err(DialogError::InvalidRequest);
        }

        let gate = self.turn_gate(session_id).await;
        let _turn = gate.lock().await;

        tracing::info!("Incoming turn - session={} message=\"{}\"", session_id, message);

        match self.store.phase(session_id).await {
            None => self.start_session(session_id, message).await,
            Some(Phase::AwaitingVariable) => self.collect_answer(session_id, message).await,
            Some(Phase::Confirming) => self.confirm_or_correct(session_id, message).await,
        }
    }

    async fn turn_gate(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut gates = self.turn_gates.lock().await;
        gates
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 无会话：解析意图与字段列表，建会话并问第一个问题
    async fn start_session(&self, session_id: &str, message: &str) -> Result<String, DialogError> {
        let intent = self
            .catalog
            .parse_intent(message)
            .await?
            .ok_or(DialogError::IntentNotUnderstood)?;
        let catalog_id = intent.catalog_id.ok_or(DialogError::NoCatalogMatch)?;

        let defs = self.catalog.variables(&catalog_id).await?;
        let mut fields: Vec<Field> = defs.into_iter().map(Field::from_variable).collect();

        // 申请人：意图结果自带则直接用（即使不完整也不再查询），
        // 只有意图完全没带用户时才查当前登录用户；查询失败只记日志。
        // 没有可用标识就不插合成字段，目录自带的 requested_for 保持原样
        let resolved = match intent.user {
            Some(user) => Some(user),
            None => match self.catalog.logged_in_user().await {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!("Failed to fetch logged-in user: {}", e);
                    None
                }
            },
        };
        if let Some(user) = resolved.filter(|u| !u.id.is_empty()) {
            fields.retain(|f| f.name != REQUESTED_FOR);
            fields.insert(0, Field::requested_for(user));
        }

        self.store.create(session_id, &catalog_id, fields).await;
        tracing::info!("Session created - session={} catalog={}", session_id, catalog_id);

        match self.store.next_question(session_id).await {
            Some(question) => Ok(format!("Sure, to help with that, {}", question)),
            None => {
                // 全部预填：直接进入确认
                self.store.set_phase(session_id, Phase::Confirming).await;
                let summary = self.store.summary(session_id).await.unwrap_or_default();
                Ok(confirm_reply(&summary))
            }
        }
    }

    /// 收集中：规整当前字段的回答，问下一个或进入确认
    async fn collect_answer(&self, session_id: &str, message: &str) -> Result<String, DialogError> {
        if let Some((field, all_fields)) = self.store.current_field(session_id).await {
            let today = Local::now().date_naive();
            let answer = normalize_answer(message, &field, &all_fields, today);
            tracing::info!(
                "Answer stored - session={} field={} raw=\"{}\" value=\"{}\"",
                session_id,
                field.name,
                message,
                answer
            );
            self.store.store_answer(session_id, answer).await;
        }

        if !self.store.is_complete(session_id).await {
            let question = self
                .store
                .next_question(session_id)
                .await
                .unwrap_or_else(|| "Got it. What's next?".to_string());
            return Ok(question);
        }

        self.store.set_phase(session_id, Phase::Confirming).await;
        let summary = self.store.summary(session_id).await.unwrap_or_default();
        Ok(confirm_reply(&summary))
    }

    /// 确认中：肯定则提交，能解析出修正则改值重确认，否则取消
    async fn confirm_or_correct(&self, session_id: &str, message: &str) -> Result<String, DialogError> {
        let affirm = AFFIRM_RE.get_or_init(|| {
            Regex::new(r"(?i)\b(yes|ok|sure|yep|yeah|affirmative|please do)\b").unwrap()
        });
        if affirm.is_match(message) {
            return self.submit(session_id).await;
        }

        let fields = self.store.fields(session_id).await.unwrap_or_default();
        if let Some(correction) = parse_correction(message, &fields) {
            tracing::info!(
                "Correction applied - session={} field={} value=\"{}\"",
                session_id,
                fields[correction.index].name,
                correction.value
            );
            self.store
                .apply_correction(session_id, correction.index, correction.value)
                .await;
            let summary = self.store.summary(session_id).await.unwrap_or_default();
            return Ok(format!("Got it — updated. {}", confirm_reply(&summary)));
        }

        self.store.destroy(session_id).await;
        Ok("Okay, request canceled. Let me know if you need anything else.".to_string())
    }

    /// 提交收齐的答案；无论成败会话到此终止，失败的半程状态不可恢复
    async fn submit(&self, session_id: &str) -> Result<String, DialogError> {
        let Some((catalog_id, answers)) = self.store.collected(session_id).await else {
            return Err(DialogError::InvalidRequest);
        };

        let submitted = self.catalog.submit(&catalog_id, &answers).await;
        self.store.destroy(session_id).await;

        let receipt = match submitted {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!("Submission failed - session={}: {}", session_id, e);
                return Ok(
                    "I'm sorry, something went wrong while submitting. Please try again later."
                        .to_string(),
                );
            }
        };

        let Some(ticket) = receipt.ticket else {
            tracing::warn!("Submission returned no ticket number - session={}", session_id);
            return Ok("Request submitted successfully!".to_string());
        };
        tracing::info!("Catalog request submitted - session={} ticket={}", session_id, ticket);

        match self
            .catalog
            .poll_status(&ticket, self.poll.interval, self.poll.max_attempts)
            .await
        {
            Ok(Some(status)) => Ok(format!(
                "Request submitted successfully! Ticket number: {}. Ticket is {}, the booked space is: {}. Do you want directions?",
                ticket, status.state, status.description
            )),
            Ok(None) => Ok(format!(
                "Request submitted successfully! Ticket number: {}. It's still being fulfilled.",
                ticket
            )),
            Err(e) => {
                tracing::warn!("Status poll failed - ticket={}: {}", ticket, e);
                Ok(format!(
                    "Request submitted successfully! Ticket number: {}.",
                    ticket
                ))
            }
        }
    }
}

fn confirm_reply(summary: &str) -> String {
    format!(
        "Just to confirm, you said: {}. Should I submit this request?",
        summary
    )
}
