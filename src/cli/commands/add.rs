use crate::constants::accounts::CLI_CREATED_BY;
use crate::services::AccountService;

pub async fn cmd_add_account(
    accounts: &dyn AccountService,
    username: &str,
    secret: &str,
    days: i64,
) -> anyhow::Result<()> {
    let account = accounts
        .create(username, secret, days, CLI_CREATED_BY)
        .await?;

    println!("✓ Created: {}", account.username);
    println!("  ID:      {}", account.id);
    println!("  Expires: {}", account.expires_at.format("%Y-%m-%d %H:%M UTC"));

    Ok(())
}
