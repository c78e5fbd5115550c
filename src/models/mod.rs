pub mod account;

pub use account::{
    AccountRecord, AccountStatus, AccountSummary, AccountView, ValidatedSession,
    days_until_expiry, normalize_username,
};
