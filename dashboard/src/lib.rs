mod chat;
mod controller;
mod errors;
mod notify;
pub mod render;
mod session;
mod storage;
pub mod validate;

pub mod payment;

pub use chat::{ChatMessage, ChatRole, ChatSession, QUICK_ACTIONS};
pub use controller::{
    Dashboard, DashboardParams, DashboardView, DeleteConfirmed, Fragments, Page, REFRESH_INTERVAL,
};
pub use errors::*;
pub use notify::{BufferedNotifier, Notification, Notifier, Severity, DISMISS_AFTER};
pub use session::{Session, SessionStore};
pub use storage::{chat_history_key, MemoryStorage, Storage, PENDING_PAYMENT_KEY};
