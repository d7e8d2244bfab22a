use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::validation::parse_debounce;

/// Available hotswap subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the application in development mode
    ///
    /// Builds the frontend and the application, starts the application and
    /// watches the project. Source changes rebuild and restart the
    /// application; asset changes trigger a reload in the running webview.
    Dev(DevArgs),
}

/// Arguments for the dev command
#[derive(Args, Debug, Clone)]
pub struct DevArgs {
    /// Compiler used to build the application
    #[arg(long, default_value = "go", value_name = "PATH")]
    pub compiler: String,

    /// Build tags, comma or space separated (not both)
    ///
    /// The `dev` tag is always added.
    #[arg(long, default_value = "", value_name = "TAGS")]
    pub tags: String,

    /// Directory the application serves its assets from
    ///
    /// Passed to the application through the `assetdir` environment
    /// variable. When empty the application reports its own directory.
    #[arg(long, default_value = "", value_name = "DIR")]
    pub assetdir: String,

    /// Log level passed to the application
    #[arg(long, default_value = "Debug", value_name = "LEVEL")]
    pub loglevel: String,

    /// Milliseconds to wait after the last change before acting on it
    #[arg(long, default_value = "100", value_name = "MS", value_parser = parse_debounce)]
    pub debounce: u64,

    /// File extensions that trigger a rebuild (comma separated)
    #[arg(short = 'e', long, default_value = "go", value_name = "EXTS")]
    pub extensions: String,

    /// Additional directories that trigger a reload (comma separated)
    #[arg(long, default_value = "", value_name = "DIRS")]
    pub reloaddirs: String,

    /// Skip the frontend install and build
    #[arg(short = 's', long)]
    pub skip_frontend: bool,

    /// Don't run `<compiler> mod tidy` before building
    #[arg(long)]
    pub no_sync_deps: bool,

    /// Don't rebuild the application on source changes
    #[arg(long)]
    pub no_rebuild: bool,

    /// Don't reload the assets on frontend changes
    #[arg(long)]
    pub no_reload: bool,

    /// Open the dev server URL in the default browser
    #[arg(short, long)]
    pub browser: bool,

    /// Debugger command wrapping the application, e.g. `dlv --headless --listen=:2345`
    ///
    /// The application is launched as `<debugger> exec <binary> [-- <appargs>]`.
    #[arg(long, value_name = "CMD")]
    pub debugger: Option<String>,

    /// Arguments passed to the application, shell-style quoting allowed
    #[arg(long, default_value = "", value_name = "ARGS", allow_hyphen_values = true)]
    pub appargs: String,

    /// Address of the application's embedded dev server
    #[arg(long, default_value = "localhost:34115", value_name = "HOST:PORT")]
    pub devserver: String,

    /// URL of an external frontend dev server
    ///
    /// Overrides `frontend:dev:serverUrl` from hotswap.json. Use `auto` to
    /// read it from the frontend watcher output.
    #[arg(long, value_name = "URL")]
    pub frontend_devserver_url: Option<String>,

    /// Project directory (defaults to the nearest directory with a hotswap.json)
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}

impl Default for DevArgs {
    fn default() -> Self {
        Self {
            compiler: "go".to_string(),
            tags: String::new(),
            assetdir: String::new(),
            loglevel: "Debug".to_string(),
            debounce: 100,
            extensions: "go".to_string(),
            reloaddirs: String::new(),
            skip_frontend: false,
            no_sync_deps: false,
            no_rebuild: false,
            no_reload: false,
            browser: false,
            debugger: None,
            appargs: String::new(),
            devserver: "localhost:34115".to_string(),
            frontend_devserver_url: None,
            project_dir: None,
        }
    }
}
