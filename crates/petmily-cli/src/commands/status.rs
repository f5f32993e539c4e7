//! Session status command.

use super::Context;

pub fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.session.session();
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}
