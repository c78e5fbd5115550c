use crate::models::normalize_username;
use crate::services::AccountService;

pub async fn cmd_remove_account(accounts: &dyn AccountService, username: &str) -> anyhow::Result<()> {
    accounts.delete(username).await?;
    println!("✓ Removed: {}", normalize_username(username));
    Ok(())
}
