//! Authentication commands.

use anyhow::Result;
use serde_json::json;
use tracing::warn;

use pocketledger_core::models::Credentials;
use pocketledger_core::validation::{self, PasswordChecks, RegistrationForm};
use pocketledger_core::ApiError;

use super::{prompt, Context};
use crate::output::{self, OutputFormat};

/// Remember the email for the next login prompt
fn remember_email(ctx: &mut Context, email: &str) {
    if ctx.config.last_email.as_deref() == Some(email) {
        return;
    }
    ctx.config.last_email = Some(email.to_string());
    if let Err(e) = ctx.config.save() {
        warn!(error = %e, "Failed to save config");
    }
}

/// Login with email and password.
pub async fn login(ctx: &mut Context, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email", ctx.config.last_email.as_deref())?,
    };
    let email = email.trim().to_string();
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }

    // Read password without echo
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    let mut auth = ctx.auth_store();
    let user = auth
        .login(&Credentials {
            email: email.clone(),
            password,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;
    remember_email(ctx, &email);

    match ctx.format {
        OutputFormat::Text => output::print_success(&format!("Logged in as {}", user.display_name()), &ctx.format),
        OutputFormat::Json => output::print_json(&json!({"status": "success", "user": user}))?,
    }
    Ok(())
}

/// Create an account and sign in.
pub async fn register(ctx: &mut Context, name: Option<String>, email: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => prompt("Name", None)?,
    };
    let email = match email {
        Some(email) => email,
        None => prompt("Email", None)?,
    };
    let password = rpassword::prompt_password("Password: ")?;
    let checks = PasswordChecks::of(&password);
    if !checks.all_passed() {
        let missing: Vec<&str> = [
            (checks.has_length, "8+ characters"),
            (checks.has_upper, "an uppercase letter"),
            (checks.has_lower, "a lowercase letter"),
            (checks.has_number, "a number"),
        ]
        .into_iter()
        .filter_map(|(passed, rule)| (!passed).then_some(rule))
        .collect();
        output::print_notice(&format!("Password needs {}", missing.join(", ")));
    }
    let confirm_password = rpassword::prompt_password("Confirm password: ")?;

    let form = RegistrationForm {
        name,
        email,
        password,
        confirm_password,
    };
    let registration = validation::validate_registration(&form)?;

    let mut auth = ctx.auth_store();
    let user = match auth.register(&registration).await {
        Ok(user) => user,
        Err(e @ (ApiError::Network(_) | ApiError::Unauthorized)) => return Err(e.into()),
        Err(e) => return Err(validation::registration_failure(&e.to_string()).into()),
    };
    remember_email(ctx, &registration.email);

    match ctx.format {
        OutputFormat::Text => output::print_success(
            &format!("Welcome, {}! Your account is ready.", user.display_name()),
            &ctx.format,
        ),
        OutputFormat::Json => output::print_json(&json!({"status": "success", "user": user}))?,
    }
    Ok(())
}

/// Logout and clear session.
pub async fn logout(ctx: &Context) -> Result<()> {
    if !ctx.client.has_token() {
        output::print_success("Not logged in", &ctx.format);
        return Ok(());
    }
    let mut auth = ctx.auth_store();
    auth.logout().await;
    ctx.data_store().on_auth_changed(false).await?;
    output::print_success("Logged out successfully", &ctx.format);
    Ok(())
}

/// Request a password reset email.
pub async fn forgot_password(ctx: &Context, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email", ctx.config.last_email.as_deref())?,
    };
    let email = validation::validate_reset_email(&email)?;

    let message = ctx.auth_store().forgot_password(&email).await?;
    let message = if message.is_empty() {
        format!("If an account exists for {}, a reset link is on its way.", email)
    } else {
        message
    };
    output::print_success(&message, &ctx.format);
    Ok(())
}

/// Show the signed-in user.
pub async fn whoami(ctx: &Context) -> Result<()> {
    ctx.require_login()?;
    let mut auth = ctx.auth_store();
    auth.initialize().await;
    let Some(user) = auth.user() else {
        anyhow::bail!(
            "Could not load the current user: {}",
            auth.error().unwrap_or("no user in the server response")
        );
    };

    match ctx.format {
        OutputFormat::Text => {
            output::print_row("Name", user.display_name());
            output::print_row("Email", &user.email);
            output::print_row("ID", &user.id);
        }
        OutputFormat::Json => output::print_json(user)?,
    }
    Ok(())
}

/// Show server, session and offline cache state.
pub async fn status(ctx: &Context) -> Result<()> {
    let server = ctx.config.server_url();
    let logged_in = ctx.client.has_token();
    let store = ctx.data_store();
    let ages = store.cache().map(|cache| cache.get_cache_ages()).unwrap_or_default();
    let stale = store.cache().map(|cache| cache.any_stale()).unwrap_or(true);

    match ctx.format {
        OutputFormat::Text => {
            output::print_row("Server", &server);
            output::print_row("Session", if logged_in { "active" } else { "none" });
            output::print_row("Transactions", ages.transactions.as_deref().unwrap_or("never"));
            output::print_row("Categories", ages.categories.as_deref().unwrap_or("never"));
            output::print_row("Statistics", ages.statistics.as_deref().unwrap_or("never"));
            output::print_row("Last updated", &ages.last_updated());
            if stale {
                println!("\nCached data is stale; it refreshes on the next online command.");
            }
        }
        OutputFormat::Json => output::print_json(&json!({
            "server": server,
            "logged_in": logged_in,
            "cache": {
                "transactions": ages.transactions,
                "categories": ages.categories,
                "statistics": ages.statistics,
                "stale": stale,
            },
        }))?,
    }
    Ok(())
}
