//! Account management commands.

use super::Context;

pub async fn delete(ctx: &Context, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !yes {
        eprintln!("Refusing to delete the account without --yes.");
        return Ok(());
    }

    ctx.session.delete_account().await?;
    println!("Account deleted.");
    Ok(())
}
