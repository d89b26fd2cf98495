use clap::Subcommand;
use pomobreath_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, addressed as "section.field"
    Get {
        /// e.g. "focus.work_minutes", "breathing.technique", "driver.tick_interval_ms"
        key: String,
    },
    /// Change one value; it is range-checked before the file is written
    Set {
        key: String,
        value: String,
    },
    /// Print the whole config, or a single section, as JSON
    List {
        /// focus, breathing, history, notifications or driver
        section: Option<String>,
    },
    /// Restore defaults for one section, or for everything
    Reset {
        section: Option<String>,
    },
    /// Print where config.toml lives
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            Config::load()?.set(&key, &value)?;
            println!("{key} = {value}");
        }
        ConfigAction::List { section } => {
            let all = serde_json::to_value(Config::load()?)?;
            let shown = match section {
                Some(name) => all
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| format!("unknown section: {name}"))?,
                None => all,
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        ConfigAction::Reset { section: None } => {
            Config::default().save()?;
            eprintln!("all sections reset to defaults");
        }
        ConfigAction::Reset {
            section: Some(name),
        } => {
            let mut config = Config::load()?;
            config.reset_section(&name)?;
            config.save()?;
            eprintln!("[{name}] reset to defaults");
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
    }
    Ok(())
}
