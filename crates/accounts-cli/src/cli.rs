use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "accounts-mongo")]
#[command(about = "Manage credential state stored in the accounts MongoDB collection")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML config file with [mongo] and [options] sections
    #[arg(short, long, global = true, env = "ACCOUNTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// MongoDB connection string (overrides the config file)
    #[arg(long, global = true, env = "MONGODB_URI")]
    pub uri: Option<String>,

    /// Database name (overrides the config file)
    #[arg(short, long, global = true, env = "ACCOUNTS_DATABASE")]
    pub database: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the unique indexes on username and emails.address
    SetupIndexes,
    /// Show the user holding a password reset token
    FindByResetToken(TokenArgs),
    /// Show the user holding an email verification token
    FindByVerificationToken(TokenArgs),
    /// Show a user by id (secrets redacted)
    Show(UserArgs),
    /// Report whether a user has a password set
    HasPassword(UserArgs),
    /// Attach an email address to a user
    AddEmail(AddEmailArgs),
    /// Detach an email address from a user
    RemoveEmail(EmailArgs),
    /// Mark a user's email address as verified
    VerifyEmail(EmailArgs),
}

#[derive(clap::Args)]
pub struct TokenArgs {
    /// Token value
    pub token: String,
}

#[derive(clap::Args)]
pub struct UserArgs {
    /// User id
    pub user_id: String,
}

#[derive(clap::Args)]
pub struct EmailArgs {
    /// User id
    pub user_id: String,
    /// Email address (case-insensitive)
    pub email: String,
}

#[derive(clap::Args)]
pub struct AddEmailArgs {
    /// User id
    pub user_id: String,
    /// Email address (case-insensitive)
    pub email: String,
    /// Store the address as already verified
    #[arg(long)]
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_email() {
        let cli = Cli::try_parse_from([
            "accounts-mongo",
            "--database",
            "acc",
            "add-email",
            "65f1c0ffee0000000000beef",
            "A@B.com",
            "--verified",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("acc"));
        match cli.command {
            Commands::AddEmail(args) => {
                assert_eq!(args.email, "A@B.com");
                assert!(args.verified);
            }
            _ => panic!("expected add-email"),
        }
    }

    #[test]
    fn test_parse_format_and_token() {
        let cli = Cli::try_parse_from([
            "accounts-mongo",
            "find-by-reset-token",
            "tok1",
            "--format",
            "table",
        ])
        .unwrap();
        assert!(matches!(cli.format, Some(OutputFormat::Table)));
        assert!(matches!(cli.command, Commands::FindByResetToken(ref t) if t.token == "tok1"));
    }

    #[test]
    fn test_log_level_defaults_to_info() {
        let cli = Cli::try_parse_from(["accounts-mongo", "setup-indexes"]).unwrap();
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["accounts-mongo"]).is_err());
    }
}
