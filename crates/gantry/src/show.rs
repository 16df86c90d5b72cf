// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The config show command.

use gantry_config::model::GantryConfig;

/// Prints the resolved configuration as TOML, with the platform token
/// masked.
pub fn run_show(config: &GantryConfig) {
    match toml::to_string_pretty(&redacted(config)) {
        Ok(rendered) => print!("{rendered}"),
        Err(err) => eprintln!("could not render the configuration: {err}"),
    }
}

/// A copy that is safe to print.
fn redacted(config: &GantryConfig) -> GantryConfig {
    let mut shown = config.clone();
    if shown.platform.token.is_some() {
        shown.platform.token = Some("***".to_string());
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_platform_token_is_masked() {
        let mut config = GantryConfig::default();
        config.platform.token = Some("apify_api_secret".to_string());
        let shown = redacted(&config);
        assert_eq!(shown.platform.token.as_deref(), Some("***"));
    }

    #[test]
    fn an_absent_token_stays_absent() {
        let config = GantryConfig::default();
        assert!(redacted(&config).platform.token.is_none());
    }

    #[test]
    fn the_copy_renders_as_toml() {
        let rendered = toml::to_string_pretty(&redacted(&GantryConfig::default())).unwrap();
        assert!(rendered.contains("[server]"));
        assert!(rendered.contains("transport = \"stdio\""));
        assert!(!rendered.contains("apify_api_secret"));
    }
}
