use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "exonym",
    version,
    about = "Translate the text layers of a design scene"
)]
struct Cli {
    /// Scene JSON file to translate
    #[arg(short = 's', long = "scene")]
    scene: Option<String>,

    /// Where to write the translated scene (default: overwrite --scene)
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Command to run: submit, quick-translate-<lang> or quick-translate-last
    #[arg(short = 'c', long = "command", default_value = "submit")]
    command: String,

    /// Target languages, comma separated (e.g. es,de,ar)
    #[arg(short = 'l', long = "lang", value_delimiter = ',')]
    languages: Vec<String>,

    /// duplicate or replace
    #[arg(short = 'a', long = "action", default_value = "duplicate")]
    action: String,

    /// Also translate locked text layers
    #[arg(long = "translate-locked")]
    translate_locked: bool,

    /// Translator API key (overrides settings and MST_API_KEY)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Show supported languages and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    exonym_translator::logging::init(cli.verbose)?;

    let config = exonym_translator::Config {
        scene: cli.scene,
        output: cli.output,
        command: cli.command,
        languages: cli.languages,
        action: cli.action,
        translate_locked: cli.translate_locked,
        key: cli.key,
        settings_path: cli.read_settings,
        show_languages: cli.show_languages,
    };
    let output = exonym_translator::run(config).await?;
    println!("{}", output);
    Ok(())
}
