pub mod account_service;
pub use account_service::{AccountError, AccountService, AuthFailure};

pub mod account_service_impl;
pub use account_service_impl::StoreAccountService;

pub mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

pub mod hasher;
pub use hasher::{Argon2Hasher, HashError, SecretHasher};
