use folio_core::auth::{AuthSession, AuthUser, SessionPersistence};
use folio_core::util::{normalize_text_option, unix_timestamp_now};

use crate::auth::{clear_stored_session, load_stored_session, FileSessionStore};
use crate::cli::AuthCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login {
            profile,
            user_id,
            access_token,
            email,
            expires_in,
        } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let session = build_session(&user_id, &access_token, email, expires_in)?;

            FileSessionStore::for_profile(&profile_name)
                .and_then(|store| store.save_session(&session))
                .map_err(|error| CliError::Auth(error.to_string()))?;

            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!(
                "Signed in profile '{}' as {} ({})",
                profile_name, session.user.id, email_label
            );
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let session = load_stored_session(&profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;

            match session {
                Some(session) if session.is_expired() => {
                    println!(
                        "Profile '{}' session expired (expires_at={}). Run `folio auth login` again.",
                        profile_name, session.expires_at
                    );
                }
                Some(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!(
                        "Profile '{}' is signed in as {} {} (expires_at={})",
                        profile_name, session.user.id, email_label, session.expires_at
                    );
                }
                None => println!("Profile '{profile_name}' is not signed in."),
            }
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            clear_stored_session(&profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;
            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}

pub fn build_session(
    user_id: &str,
    access_token: &str,
    email: Option<String>,
    expires_in: i64,
) -> Result<AuthSession, CliError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(CliError::Auth("user id must not be empty".to_string()));
    }
    let access_token = access_token.trim();
    if access_token.is_empty() {
        return Err(CliError::Auth("access token must not be empty".to_string()));
    }
    if expires_in <= 0 {
        return Err(CliError::Auth("expires-in must be positive".to_string()));
    }

    Ok(AuthSession {
        access_token: access_token.to_string(),
        refresh_token: String::new(),
        expires_at: unix_timestamp_now().saturating_add(expires_in),
        user: AuthUser {
            id: user_id.to_string(),
            email: normalize_text_option(email),
        },
    })
}
