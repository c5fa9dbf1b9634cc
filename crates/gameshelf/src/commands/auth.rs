//! Auth command handlers.

use dialoguer::Input;
use secrecy::SecretString;

use gameshelf_config::ConfigError;
use gameshelf_core::{LoginForm, SignupForm, UserProfile};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

fn prompt_secret(label: &str) -> Result<SecretString, CliError> {
    Ok(SecretString::from(rpassword::prompt_password(label)?))
}

/// Password from env, keyring, or config; prompt only if none is set.
fn login_password(ctx: &Context) -> Result<SecretString, CliError> {
    match gameshelf_config::resolve_password(&ctx.profile, &ctx.profile_name) {
        Ok(password) => Ok(password),
        Err(ConfigError::NoCredentials { .. }) => prompt_secret("Password: "),
        Err(e) => Err(e.into()),
    }
}

fn profile_detail(user: &UserProfile) -> String {
    let mut pairs = vec![
        ("Email", user.email.clone().unwrap_or_default()),
        ("Username", user.username.clone().unwrap_or_default()),
    ];
    let mut extra: Vec<_> = user.extra.iter().collect();
    extra.sort_by(|a, b| a.0.cmp(b.0));
    let extra: Vec<(&str, String)> = extra
        .into_iter()
        .map(|(k, v)| (k.as_str(), v.as_str().map_or_else(|| v.to_string(), str::to_owned)))
        .collect();
    pairs.extend(extra);
    output::detail(&pairs)
}

pub async fn handle(ctx: &Context, args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let account = ctx.shelf.account();

    match args.command {
        AuthCommand::Login { email } => {
            let email = match email.or_else(|| gameshelf_config::resolve_email(&ctx.profile)) {
                Some(email) => email,
                None => Input::new().with_prompt("Email").interact_text()?,
            };
            let form = LoginForm {
                email,
                password: login_password(ctx)?,
            };

            account.login(&form).await?;
            let who = ctx
                .shelf
                .session()
                .user()
                .and_then(|u| u.email.or(u.username))
                .unwrap_or_else(|| form.email.clone());
            output::success(global, &format!("Logged in as {who} (profile '{}')", ctx.profile_name));
            Ok(())
        }

        AuthCommand::Signup { username, email } => {
            let form = SignupForm {
                username,
                email,
                password: prompt_secret("Password: ")?,
                confirm_password: prompt_secret("Confirm password: ")?,
            };

            account.signup(&form).await?;
            output::success(global, &format!("Account created, logged in as {}", form.username));
            Ok(())
        }

        AuthCommand::Logout => {
            account.logout()?;
            output::success(global, "Logged out");
            Ok(())
        }

        AuthCommand::Whoami => {
            let session = ctx.shelf.session().snapshot();
            if !session.is_logged_in {
                return Err(CliError::NotLoggedIn);
            }
            // Signup stores a token without fetching the profile.
            let user = session.user.unwrap_or_default();
            let out = output::render_single(&global.output, &user, profile_detail, |u| {
                u.email.clone().or_else(|| u.username.clone()).unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
