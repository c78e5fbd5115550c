use anyhow::bail;

use crate::models::normalize_username;
use crate::services::AccountService;

pub async fn cmd_account_info(accounts: &dyn AccountService, username: &str) -> anyhow::Result<()> {
    let Some(view) = accounts.get(username).await? else {
        bail!("User '{}' not found", normalize_username(username));
    };

    let account = &view.account;
    println!("{}", account.username);
    println!("{:-<40}", "");
    println!("ID:          {}", account.id);
    println!("Status:      {}", view.status);
    println!("Active:      {}", if account.active { "yes" } else { "no" });
    println!("Created:     {}", account.created_at.format("%Y-%m-%d %H:%M UTC"));
    println!("Created by:  {}", account.created_by);
    println!("Expires:     {}", account.expires_at.format("%Y-%m-%d %H:%M UTC"));
    println!("Days left:   {}", view.days_until_expiry);

    Ok(())
}
