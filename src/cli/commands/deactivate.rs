use crate::models::normalize_username;
use crate::services::AccountService;

pub async fn cmd_deactivate_account(
    accounts: &dyn AccountService,
    username: &str,
) -> anyhow::Result<()> {
    accounts.deactivate(username).await?;

    let username = normalize_username(username);
    println!("✓ Deactivated: {username}");
    println!("  Use 'ethicslab extend {username} <days>' to reactivate.");
    Ok(())
}
