//! Logout command.

use super::Context;

pub async fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    ctx.session.logout().await?;
    println!("Logged out.");
    Ok(())
}
