//! Login, logout and session inspection.

use std::collections::BTreeSet;

use merida_auth::{adopt_existing, backfill, missing_attributes, Attributes, AuthError, LoginChallenge};

use crate::cli::LoginArgs;
use crate::context::Context;
use crate::output::{info, output_single, prompt_line, prompt_password, success, warning};
use crate::{CliError, CliResult};

/// Parses `name=value` attribute arguments.
pub fn parse_attributes(raw: &[String]) -> CliResult<Attributes> {
    raw.iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| CliError::InvalidArgument(format!("expected NAME=VALUE, got '{pair}'")))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(CliError::InvalidArgument(format!("empty attribute name in '{pair}'")));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Signs in, walking the user through a new-password challenge.
pub async fn run_login(args: LoginArgs, ctx: &Context) -> CliResult<()> {
    let username = match args.username {
        Some(username) => username,
        None => prompt_line("Username or email: ")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => prompt_password("Password: ")?,
    };
    let mut attributes = parse_attributes(&args.attributes)?;

    let first = ctx
        .session
        .login(&username, &password, args.new_password.as_deref(), Some(&attributes))
        .await;
    let mut challenge = match first {
        Ok(challenge) => challenge,
        Err(AuthError::ChallengeValidation { missing }) => LoginChallenge {
            requires_new_password: true,
            required_attributes: missing,
        },
        Err(e) => return Err(e.into()),
    };

    if challenge.requires_new_password {
        info("A new password is required for this account.");
        let new_password = match args.new_password {
            Some(new_password) => new_password,
            None => prompt_new_password()?,
        };
        let existing = ctx
            .session
            .pending_challenge()
            .map(|pending| pending.existing_attributes)
            .unwrap_or_default();
        prompt_missing(&challenge, &username, &existing, &mut attributes)?;
        challenge = answer(ctx, &username, &password, &new_password, &attributes).await?;
    }

    if challenge.requires_new_password {
        return Err(CliError::Auth(AuthError::ChallengeValidation {
            missing: challenge.required_attributes,
        }));
    }

    let session = ctx.require_session().await?;
    success(&format!("Logged in as {}", session.username));
    Ok(())
}

async fn answer(
    ctx: &Context,
    username: &str,
    password: &str,
    new_password: &str,
    attributes: &Attributes,
) -> CliResult<LoginChallenge> {
    Ok(ctx
        .session
        .login(username, password, Some(new_password), Some(attributes))
        .await?)
}

fn prompt_new_password() -> CliResult<String> {
    let first = prompt_password("New password: ")?;
    let second = prompt_password("Repeat new password: ")?;
    if first != second {
        return Err(CliError::InvalidArgument("passwords do not match".to_string()));
    }
    Ok(first)
}

/// Asks for required attributes that back-fill cannot supply.
fn prompt_missing(
    challenge: &LoginChallenge,
    username: &str,
    existing: &Attributes,
    attributes: &mut Attributes,
) -> CliResult<()> {
    let required: BTreeSet<String> = challenge.required_attributes.iter().cloned().collect();
    let filled = backfill(&required, username, &adopt_existing(&required, existing, attributes));
    for name in missing_attributes(&required, &filled) {
        let value = prompt_line(&format!("{name}: "))?;
        if value.is_empty() {
            warning(&format!("'{name}' left empty"));
        }
        attributes.insert(name, value);
    }
    Ok(())
}

/// Signs out.
pub async fn run_logout(ctx: &Context) -> CliResult<()> {
    ctx.session.logout().await;
    success("Logged out");
    Ok(())
}

/// Shows the active session.
pub async fn run_whoami(ctx: &Context) -> CliResult<()> {
    let session = ctx.require_session().await?;
    output_single(&session, ctx.format)
}
