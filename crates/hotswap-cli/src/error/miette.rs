//! Miette diagnostic conversion for CLI errors.

use crate::error::{BuildError, CliError};
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::Project(e) => miette::miette!(
            help = "hotswap.json lives in the project root; pass --project-dir to point elsewhere",
            "Project configuration error: {}",
            e
        ),
        CliError::Fatal(msg) => miette::miette!("Development mode stopped: {}", msg),
        _ => miette::miette!("{}", err),
    }
}

/// Convert BuildError to miette Report
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::CompilerNotFound(compiler) => miette::miette!(
            help = "Install it or point --compiler at the executable",
            "Compiler '{}' not found",
            compiler
        ),
        BuildError::CompilerFailed { command, output } => {
            miette::miette!("`{}` failed:\n{}", command, output.trim_end())
        }
        BuildError::FrontendFailed {
            command,
            dir,
            output,
        } => miette::miette!(
            help = "Run the command manually in the frontend directory to see the full output",
            "Frontend command `{}` failed in {}:\n{}",
            command,
            dir.display(),
            output.trim_end()
        ),
        _ => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn fatal_errors_name_the_session() {
        let report = cli_error_to_miette(CliError::fatal("unable to kill process 7"));
        assert!(report.to_string().contains("unable to kill process 7"));
    }

    #[test]
    fn frontend_failure_keeps_output() {
        let report = build_error_to_miette(BuildError::FrontendFailed {
            command: "npm run build".to_string(),
            dir: PathBuf::from("/project/frontend"),
            output: "ERR! missing script\n".to_string(),
        });
        let text = report.to_string();
        assert!(text.contains("npm run build"));
        assert!(text.contains("ERR! missing script"));
    }
}
