//! 对话核心：会话模型与存储、状态机、修正解析

pub mod correction;
pub mod error;
pub mod field;
pub mod machine;
pub mod session;
pub mod store;

pub use correction::{parse_correction, Correction};
pub use error::DialogError;
pub use field::{Choice, Field, FieldKind, REQUESTED_FOR};
pub use machine::{DialogMachine, PollPolicy};
pub use session::{Phase, Session};
pub use store::{MemorySessionStore, SessionStore};
