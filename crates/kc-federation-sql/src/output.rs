//! Output formatting utilities.

use colored::Colorize;
use kc_model::User;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;

/// User representation for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct UserDisplay {
    /// Platform reference.
    pub id: String,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// First name.
    #[tabled(rename = "First Name")]
    pub first_name: String,
    /// Last name.
    #[tabled(rename = "Last Name")]
    pub last_name: String,
}

impl From<&User> for UserDisplay {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone().unwrap_or_default(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Outputs users in the specified format.
pub fn users(users: &[User], format: OutputFormat) -> anyhow::Result<()> {
    let rows: Vec<UserDisplay> = users.iter().map(UserDisplay::from).collect();
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                info("No users found.");
            } else {
                let table = Table::new(&rows).with(Style::rounded()).to_string();
                println!("{table}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}

/// Outputs a single optional user.
pub fn user(user: Option<&User>, format: OutputFormat) -> anyhow::Result<()> {
    match (user, format) {
        (Some(user), OutputFormat::Table) => users(std::slice::from_ref(user), format),
        (Some(user), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(&UserDisplay::from(user))?);
            Ok(())
        }
        (None, OutputFormat::Table) => {
            info("User not found.");
            Ok(())
        }
        (None, OutputFormat::Json) => {
            println!("null");
            Ok(())
        }
    }
}

/// Outputs a named value.
pub fn value<T: Serialize + std::fmt::Display>(
    name: &str,
    value: &T,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => println!("{name}: {value}"),
        OutputFormat::Json => {
            let mut json = serde_json::Map::new();
            json.insert(name.to_string(), serde_json::to_value(value)?);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
