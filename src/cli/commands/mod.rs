mod add;
mod deactivate;
mod extend;
mod info;
mod list;
mod remove;

pub use add::cmd_add_account;
pub use deactivate::cmd_deactivate_account;
pub use extend::cmd_extend_account;
pub use info::cmd_account_info;
pub use list::cmd_list_accounts;
pub use remove::cmd_remove_account;
