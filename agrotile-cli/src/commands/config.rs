//! `agrotile config path|list`.

use std::path::Path;

use agrotile::config::{config_file_path, ConfigFile};
use clap::Subcommand;

use crate::error::CliError;
use crate::runner::load_config;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// List effective settings (file plus environment, secrets masked)
    List,
}

pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(config_file_path);
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::List => {
            let config = load_config(config_path)?;
            print!("{}", render_listing(&config));
            Ok(())
        }
    }
}

/// Groups `section.key` rows under `[section]` headers.
fn render_listing(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut current_section = "";

    for (name, value) in config.entries() {
        let (section, key) = name.split_once('.').unwrap_or(("", name));
        if section != current_section {
            if !current_section.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            current_section = section;
        }
        out.push_str(&format!("  {} = {}\n", key, value));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_groups_sections() {
        let mut config = ConfigFile::default();
        config.provider.client_secret = Some("top-secret".to_string());

        let listing = render_listing(&config);
        assert!(listing.starts_with("[provider]\n"));
        assert!(listing.contains("\n[cache]\n  memory_size = 512MB\n"));
        assert!(listing.contains("  client_secret = ********\n"));
        assert!(!listing.contains("top-secret"));
        assert_eq!(listing.matches("[preprocess]").count(), 1);
    }
}
