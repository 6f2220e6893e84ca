use accounts_auth::User;
use anyhow::Result;
use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;
use time::format_description::well_known::Rfc3339;

use crate::cli::OutputFormat;

/// Print a user with its secrets removed.
pub fn print_user(user: &User, format: OutputFormat) -> Result<()> {
    let user = user.redacted();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        OutputFormat::Table => {
            println!("{}", user_table(&user));
        }
    }
    Ok(())
}

fn user_table(user: &User) -> String {
    let updated = user
        .updated_at
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string());

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    builder.push_record(["id", user.id.as_str()]);
    builder.push_record(["username", user.username.as_deref().unwrap_or("-")]);
    builder.push_record(["updatedAt", updated.as_str()]);
    for email in &user.emails {
        let status = if email.verified { "verified" } else { "unverified" };
        builder.push_record(["email", format!("{} ({status})", email.address).as_str()]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn print_not_found(what: &str) {
    println!("{} {}", "-".yellow(), what);
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounts_auth::EmailRecord;

    #[test]
    fn test_user_table_lists_emails() {
        let mut user = User::new("u1");
        user.emails.push(EmailRecord::new("a@b.com", true));
        user.emails.push(EmailRecord::new("c@d.com", false));

        let table = user_table(&user);
        assert!(table.contains("a@b.com (verified)"));
        assert!(table.contains("c@d.com (unverified)"));
        assert!(table.contains("u1"));
    }
}
