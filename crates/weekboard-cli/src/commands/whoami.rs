//! Identity inspection.

use crate::common::AppContext;

pub async fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::connect().await?;
    let user = ctx.session.user_id();

    if json {
        let value = serde_json::json!({
            "user_id": user,
            "app_id": ctx.config.app_id,
            "store": ctx.config.store.as_str(),
            "anonymous": ctx.config.auth_token.is_none(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("User: {user}");
        println!("App namespace: {}", ctx.config.app_id);
        println!("Store: {}", ctx.config.store.as_str());
        if ctx.config.auth_token.is_none() {
            println!("Signed in anonymously (identity persisted on this machine).");
        } else {
            println!("Signed in with a configured token.");
        }
    }
    Ok(())
}
