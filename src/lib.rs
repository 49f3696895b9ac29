pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod orchestration;

pub use config::{BusinessRules, Config};
pub use db::{init_db, Repository};
pub use domain::{Cents, Member, MemberId, MemberStatus, Payment, PaymentStatus, QueueEntry, TimeMs};
pub use error::AppError;
pub use ledger::{Ledger, LedgerError, MockLedger};
pub use orchestration::{QueueService, ServiceError};
