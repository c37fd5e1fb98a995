use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slidehost")]
#[command(author, version, about)]
#[command(long_about = "Browse, manage, and present slide decks served by a slide-hosting backend.\n\n\
    Examples:\n  \
    slidehost list                      List decks on the server\n  \
    slidehost import talk.pdf           Import a PDF as a new deck\n  \
    slidehost view intro --page 3       Present a deck (fullscreen)\n  \
    slidehost share intro --scroll      Print share link and embed snippet")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL (overrides server.url from the config file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List slide decks
    List {
        /// Pre-built `{ "slides": [...] }` file used when the management API is unavailable
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Import a PDF as a new deck
    Import {
        /// PDF file to upload
        pdf: PathBuf,

        /// Deck name (derived from the file name by the server when omitted)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Creation date, e.g. 2024-05-01
        #[arg(long)]
        created_at: Option<String>,
    },

    /// Edit a deck's title, description, or creation date
    Edit {
        /// Deck name
        name: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        created_at: Option<String>,
    },

    /// Delete a deck
    Delete {
        /// Deck name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Keep the listing open and re-render when the server pushes a reload
    Watch {
        /// Pre-built `{ "slides": [...] }` file used when the management API is unavailable
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Present a deck
    View {
        /// Deck name or full viewer URL
        deck: String,

        /// Start on a specific slide (1-indexed)
        #[arg(long)]
        page: Option<usize>,

        /// Start in continuous-scroll mode
        #[arg(long)]
        scroll: bool,

        /// Launch in a window instead of fullscreen
        #[arg(long)]
        windowed: bool,

        /// Initial window width in points
        #[arg(long, default_value = "1280")]
        width: f32,

        /// Show the close-to-list control and return to the listing on close
        #[arg(long)]
        from_list: bool,
    },

    /// Print a deck's share link and embed snippet
    Share {
        /// Deck name or full viewer URL
        deck: String,

        #[arg(long)]
        page: Option<usize>,

        /// Share a link that opens in continuous-scroll mode
        #[arg(long)]
        scroll: bool,
    },

    /// Show or change the light/dark theme preference
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ThemeCommands {
    /// Show the active theme and where it comes from
    Show,

    /// Switch between light and dark
    Toggle,

    /// Set the theme explicitly
    Set {
        #[arg(value_enum)]
        theme: ThemeName,
    },

    /// Forget the saved preference and follow the system setting
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ThemeName {
    Light,
    Dark,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (server.url, index.embedded, viewer.narrow_width, viewer.mode)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let ctx = crate::commands::Context::new(self.server, self.quiet);
        match self.command {
            Some(Commands::List { data }) => crate::commands::index::list(&ctx, data),
            Some(Commands::Import {
                pdf,
                name,
                title,
                description,
                created_at,
            }) => {
                if !pdf.exists() {
                    anyhow::bail!("File not found: {}", pdf.display());
                }
                let form = crate::model::ImportForm {
                    pdf,
                    name,
                    title,
                    description,
                    created_at,
                };
                crate::commands::index::import(&ctx, &form)
            }
            Some(Commands::Edit {
                name,
                title,
                description,
                created_at,
            }) => crate::commands::index::edit(&ctx, &name, title, description, created_at),
            Some(Commands::Delete { name, yes }) => {
                crate::commands::index::delete(&ctx, &name, yes)
            }
            Some(Commands::Watch { data }) => crate::commands::index::watch(&ctx, data),
            Some(Commands::View {
                deck,
                page,
                scroll,
                windowed,
                width,
                from_list,
            }) => crate::commands::view::run(
                &ctx,
                crate::commands::view::ViewArgs {
                    deck,
                    page,
                    scroll,
                    windowed,
                    width,
                    from_list,
                },
            ),
            Some(Commands::Share { deck, page, scroll }) => {
                crate::commands::share::run(&ctx, &deck, page, scroll)
            }
            Some(Commands::Theme { command }) => crate::commands::theme::run(&ctx, command),
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("slidehost {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => {
                use clap::CommandFactory;
                let mut cmd = Self::command();
                cmd.print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
