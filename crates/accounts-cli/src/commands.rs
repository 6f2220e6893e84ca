use accounts_mongo::MongoPasswordStorage;
use anyhow::{Context, Result};

use crate::cli::{AddEmailArgs, EmailArgs, OutputFormat, TokenArgs, UserArgs};
use crate::output::{print_not_found, print_success, print_user};

pub async fn setup_indexes(storage: &MongoPasswordStorage) -> Result<()> {
    storage
        .setup_indexes()
        .await
        .context("Failed to create indexes")?;
    print_success(&format!(
        "Indexes ensured on collection '{}'",
        storage.options().collection_name
    ));
    Ok(())
}

pub async fn find_by_reset_token(
    storage: &MongoPasswordStorage,
    args: &TokenArgs,
    format: OutputFormat,
) -> Result<()> {
    match storage.find_user_by_reset_password_token(&args.token).await? {
        Some(user) => print_user(&user, format),
        None => {
            print_not_found("No user holds this reset token");
            Ok(())
        }
    }
}

pub async fn find_by_verification_token(
    storage: &MongoPasswordStorage,
    args: &TokenArgs,
    format: OutputFormat,
) -> Result<()> {
    match storage
        .find_user_by_email_verification_token(&args.token)
        .await?
    {
        Some(user) => print_user(&user, format),
        None => {
            print_not_found("No user holds this verification token");
            Ok(())
        }
    }
}

pub async fn show(storage: &MongoPasswordStorage, args: &UserArgs, format: OutputFormat) -> Result<()> {
    match storage.find_user_by_id(&args.user_id).await? {
        Some(user) => print_user(&user, format),
        None => anyhow::bail!("User {} not found", args.user_id),
    }
}

pub async fn has_password(storage: &MongoPasswordStorage, args: &UserArgs) -> Result<()> {
    let has = storage.find_password_hash(&args.user_id).await?.is_some();
    println!("{}", if has { "yes" } else { "no" });
    Ok(())
}

pub async fn add_email(storage: &MongoPasswordStorage, args: &AddEmailArgs) -> Result<()> {
    storage
        .add_email(&args.user_id, &args.email, args.verified)
        .await?;
    print_success(&format!("Added {} to user {}", args.email.to_lowercase(), args.user_id));
    Ok(())
}

pub async fn remove_email(storage: &MongoPasswordStorage, args: &EmailArgs) -> Result<()> {
    storage.remove_email(&args.user_id, &args.email).await?;
    print_success(&format!(
        "Removed {} from user {}",
        args.email.to_lowercase(),
        args.user_id
    ));
    Ok(())
}

pub async fn verify_email(storage: &MongoPasswordStorage, args: &EmailArgs) -> Result<()> {
    storage.verify_email(&args.user_id, &args.email).await?;
    print_success(&format!(
        "Verified {} for user {}",
        args.email.to_lowercase(),
        args.user_id
    ));
    Ok(())
}
