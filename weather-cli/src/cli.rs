use std::{io::IsTerminal, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, PasswordDisplayMode};
use weather_core::{
    Config, FilePreferenceStore, MemoryPreferenceStore, OpenWeatherClient, PreferenceStore,
    Preferences, ReqwestTransport, SearchSession, SearchStatus, Theme, UnitSystem,
};

use crate::{
    interactive,
    render::{self, Style},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather",
    version,
    about = "Current conditions and a 5-day forecast by city name"
)]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Hide the missing API key banner.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Keep preference changes for this run only.
    #[arg(long, global = true)]
    pub no_persist: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitsArg {
    Metric,
    Imperial,
}

impl From<UnitsArg> for UnitSystem {
    fn from(arg: UnitsArg) -> Self {
        match arg {
            UnitsArg::Metric => UnitSystem::Metric,
            UnitsArg::Imperial => UnitSystem::Imperial,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitsChoice {
    Metric,
    Imperial,
    Toggle,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeChoice {
    Light,
    Dark,
    Toggle,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show current conditions and the 5-day forecast for a city.
    Show {
        /// City name, e.g. "London" or "New York".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,

        /// Unit system for this search only; defaults to the saved preference.
        #[arg(long, value_enum)]
        units: Option<UnitsArg>,

        /// Print the raw results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show or change the saved unit system.
    Units {
        #[arg(value_enum)]
        value: Option<UnitsChoice>,
    },

    /// Show or change the saved color theme.
    Theme {
        #[arg(value_enum)]
        value: Option<ThemeChoice>,
    },

    /// Search repeatedly from a prompt.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let store = open_store(self.no_persist);
        let mut prefs = Preferences::load(store.as_ref());
        let color = !self.no_color && std::io::stdout().is_terminal();

        match self.command {
            Command::Configure => configure()?,

            Command::Units { value } => {
                match value {
                    Some(UnitsChoice::Metric) => prefs.set_units(UnitSystem::Metric),
                    Some(UnitsChoice::Imperial) => prefs.set_units(UnitSystem::Imperial),
                    Some(UnitsChoice::Toggle) => {
                        prefs.toggle_units();
                    }
                    None => {}
                }
                println!("Units: {}", prefs.units());
            }

            Command::Theme { value } => {
                match value {
                    Some(ThemeChoice::Light) => prefs.set_theme(Theme::Light),
                    Some(ThemeChoice::Dark) => prefs.set_theme(Theme::Dark),
                    Some(ThemeChoice::Toggle) => {
                        prefs.toggle_theme();
                    }
                    None => {}
                }
                println!("Theme: {}", prefs.theme());
            }

            Command::Show { city, units, json } => {
                let city = city.join(" ");
                if city.trim().is_empty() {
                    bail!("City name must not be empty.");
                }

                let style = Style::new(prefs.theme(), color && !json);
                let session = build_session(&style, self.quiet)?;
                let units = units.map(Into::into).unwrap_or_else(|| prefs.units());

                let outcome = match session.search(&city, units).await {
                    SearchStatus::Applied(outcome) => outcome,
                    SearchStatus::Stale { generation, latest } => {
                        bail!("search {generation} was superseded by search {latest}")
                    }
                };

                if json {
                    println!("{}", serde_json::to_string_pretty(&render::outcome_json(&outcome))?);
                } else {
                    print!("{}", render::render_outcome(&outcome, &style));
                }

                if outcome.all_failed() {
                    bail!("No weather data available for '{}'.", outcome.query.city);
                }
            }

            Command::Interactive => {
                let style = Style::new(prefs.theme(), color);
                let session = build_session(&style, self.quiet)?;
                interactive::run(&session, &mut prefs, color).await?;
            }
        }

        Ok(())
    }
}

fn open_store(no_persist: bool) -> Box<dyn PreferenceStore> {
    if no_persist {
        return Box::new(MemoryPreferenceStore::default());
    }

    match FilePreferenceStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "preferences unavailable, using session-only store");
            Box::new(MemoryPreferenceStore::default())
        }
    }
}

/// Loads config, resolves the API key and wires the client into a session.
///
/// A missing key is reported with a banner; searches still run and fail with
/// a configuration error.
fn build_session(style: &Style, quiet: bool) -> anyhow::Result<SearchSession> {
    let config = Config::load()?;

    let api_key = match config.api_key_from_env() {
        Some((key, source)) => {
            tracing::debug!(%source, "using API key");
            Some(key)
        }
        None => {
            if !quiet {
                eprint!("{}", render::missing_key_banner(style));
            }
            None
        }
    };

    let transport = ReqwestTransport::new(config.timeout())?;
    let client = OpenWeatherClient::new(api_key, config.base_url(), Arc::new(transport))?;

    Ok(SearchSession::new(client))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        bail!("API key must not be empty.");
    }

    config.set_api_key(key);
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_joins_multi_word_city() {
        let cli = Cli::try_parse_from(["weather", "show", "New", "York", "--units", "imperial"])
            .unwrap();

        match cli.command {
            Command::Show { city, units, json } => {
                assert_eq!(city.join(" "), "New York");
                assert!(matches!(units, Some(UnitsArg::Imperial)));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_requires_city() {
        assert!(Cli::try_parse_from(["weather", "show"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["weather", "units", "toggle", "--no-persist", "-q"]).unwrap();
        assert!(cli.no_persist);
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Command::Units { value: Some(UnitsChoice::Toggle) }
        ));
    }

    #[test]
    fn theme_rejects_unknown_value() {
        assert!(Cli::try_parse_from(["weather", "theme", "sepia"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
