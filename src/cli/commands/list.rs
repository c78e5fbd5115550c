//! List accounts command handler

use crate::models::AccountStatus;
use crate::services::AccountService;

const fn status_indicator(status: AccountStatus) -> &'static str {
    match status {
        AccountStatus::Active => "🟢",
        AccountStatus::ExpiringSoon => "🟡",
        AccountStatus::Expired => "🔴",
        AccountStatus::Inactive => "⚪",
    }
}

pub async fn cmd_list_accounts(accounts: &dyn AccountService) -> anyhow::Result<()> {
    let views = accounts.list().await?;

    if views.is_empty() {
        println!("No accounts.");
        println!();
        println!("Add one with: ethicslab add <username> <password> [days]");
        return Ok(());
    }

    println!("Accounts ({} total)", views.len());
    println!("{:-<70}", "");

    for view in &views {
        let account = &view.account;
        println!(
            "{} {} [{}]",
            status_indicator(view.status),
            account.username,
            view.status
        );
        println!(
            "  Expires: {} ({} day(s)) | Created by: {}",
            account.expires_at.format("%Y-%m-%d %H:%M UTC"),
            view.days_until_expiry,
            account.created_by
        );
    }

    println!();
    println!("Legend: 🟢 Active | 🟡 Expiring soon | 🔴 Expired | ⚪ Inactive");

    Ok(())
}
