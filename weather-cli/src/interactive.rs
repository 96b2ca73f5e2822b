//! Prompt loop: search cities, flip units or theme between searches.

use inquire::{InquireError, Text};
use weather_core::{Preferences, SearchQuery, SearchSession, SearchStatus};

use crate::render::{self, Style};

/// A parsed line of prompt input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Search(&'a str),
    ToggleUnits,
    ToggleTheme,
    Quit,
    Unknown(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Empty,
        ":units" | ":u" => Input::ToggleUnits,
        ":theme" | ":t" => Input::ToggleTheme,
        ":quit" | ":q" | ":exit" => Input::Quit,
        cmd if cmd.starts_with(':') => Input::Unknown(cmd),
        city => Input::Search(city),
    }
}

/// What the loop does after one line of input.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Prompt,
    Search(SearchQuery),
    Quit,
}

/// State carried between prompts.
#[derive(Debug, Default)]
struct PromptState {
    last_city: Option<String>,
}

impl PromptState {
    /// Applies one input to the preferences and returns the search it calls for.
    ///
    /// Toggling units re-issues the last city in the new units; with no earlier
    /// search there is nothing to re-run.
    fn apply(&mut self, input: Input<'_>, prefs: &mut Preferences<'_>) -> Step {
        match input {
            Input::Empty => Step::Prompt,
            Input::Quit => Step::Quit,
            Input::Unknown(cmd) => {
                eprintln!("Unknown command '{cmd}'. Try :units, :theme or :quit.");
                Step::Prompt
            }
            Input::ToggleTheme => {
                let theme = prefs.toggle_theme();
                println!("Theme: {theme}");
                Step::Prompt
            }
            Input::ToggleUnits => {
                let units = prefs.toggle_units();
                println!("Units: {units}");
                match &self.last_city {
                    Some(city) => Step::Search(SearchQuery { city: city.clone(), units }),
                    None => Step::Prompt,
                }
            }
            Input::Search(city) => {
                self.last_city = Some(city.to_string());
                Step::Search(SearchQuery { city: city.to_string(), units: prefs.units() })
            }
        }
    }
}

pub async fn run(
    session: &SearchSession,
    prefs: &mut Preferences<'_>,
    color: bool,
) -> anyhow::Result<()> {
    let mut state = PromptState::default();

    loop {
        let answer = Text::new("City:")
            .with_placeholder("e.g. London")
            .with_help_message(":units toggles °C/°F, :theme toggles light/dark, :quit exits")
            .prompt();

        let line = match answer {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match state.apply(parse_input(&line), prefs) {
            Step::Prompt => {}
            Step::Quit => break,
            Step::Search(query) => {
                // Built per search so a theme change shows up on the next render.
                let style = Style::new(prefs.theme(), color);
                if let Some(text) = search(session, &query, &style).await {
                    print!("{text}");
                }
            }
        }
    }

    Ok(())
}

/// Runs `query` and renders it, or `None` when a newer search superseded it.
async fn search(session: &SearchSession, query: &SearchQuery, style: &Style) -> Option<String> {
    match session.search(&query.city, query.units).await {
        SearchStatus::Applied(outcome) => Some(render::render_outcome(&outcome, style)),
        SearchStatus::Stale { generation, latest } => {
            tracing::debug!(generation, latest, "ignoring superseded search");
            None
        }
    }
}
