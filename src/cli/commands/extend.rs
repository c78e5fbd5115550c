use crate::models::normalize_username;
use crate::services::AccountService;

pub async fn cmd_extend_account(
    accounts: &dyn AccountService,
    username: &str,
    days: i64,
) -> anyhow::Result<()> {
    let expires_at = accounts.extend(username, days).await?;

    println!(
        "✓ Extended {} by {} day(s), now expires {}",
        normalize_username(username),
        days,
        expires_at.format("%Y-%m-%d %H:%M UTC")
    );

    Ok(())
}
