//! Producing the development binary.
//!
//! The event loop only sees the [`Builder`] trait. [`CommandBuilder`] is the
//! implementation used by `hotswap dev`: it runs the frontend install/build
//! commands from `hotswap.json` and then the compiler.

use crate::dev::config::BuildConfiguration;
use crate::error::BuildError;
use crate::ui;
use async_trait::async_trait;
use hotswap_config::ProjectConfig;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Tag added to every development build.
pub const DEV_TAG: &str = "dev";

/// Produces the application binary for a configuration.
#[async_trait]
pub trait Builder: Send + Sync {
    /// Build and return the path of the runnable binary.
    async fn build(&self, config: &BuildConfiguration) -> Result<PathBuf, BuildError>;
}

/// Builds by running the compiler (and the frontend commands) as
/// subprocesses in the project directory.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    project: ProjectConfig,
}

impl CommandBuilder {
    pub fn new(project: ProjectConfig) -> Self {
        Self { project }
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    /// `<build:dir>/bin/<name>-dev[.exe]`
    pub fn binary_path(&self) -> PathBuf {
        let mut name = format!("{}-dev", self.project.output_name());
        if cfg!(windows) {
            name.push_str(".exe");
        }
        self.project.bin_dir().join(name)
    }

    /// Compiler arguments for a debuggable development build.
    pub fn compile_args(&self, config: &BuildConfiguration) -> Vec<String> {
        let mut tags = vec![DEV_TAG.to_string()];
        tags.extend(
            config
                .user_tags
                .iter()
                .filter(|tag| tag.as_str() != DEV_TAG)
                .cloned(),
        );

        vec![
            "build".to_string(),
            "-buildvcs=false".to_string(),
            "-gcflags".to_string(),
            "all=-N -l".to_string(),
            "-tags".to_string(),
            tags.join(","),
            "-o".to_string(),
            self.binary_path().to_string_lossy().into_owned(),
        ]
    }

    /// Run `frontend:install` then `frontend:build`, skipping unset ones.
    pub async fn build_frontend(&self) -> Result<(), BuildError> {
        let dir = self.project.frontend_path();
        let commands = [
            self.project.frontend_install.as_deref(),
            self.project.frontend_build.as_deref(),
        ];

        for command in commands.into_iter().flatten() {
            let command = command.trim();
            if command.is_empty() {
                continue;
            }
            tracing::debug!("running `{}` in {}", command, dir.display());

            let output = shell_command(command, &dir)
                .output()
                .await
                .map_err(|e| BuildError::FrontendFailed {
                    command: command.to_string(),
                    dir: dir.clone(),
                    output: e.to_string(),
                })?;
            if !output.status.success() {
                return Err(BuildError::FrontendFailed {
                    command: command.to_string(),
                    dir,
                    output: combined_output(&output),
                });
            }
        }
        Ok(())
    }

    /// `<compiler> mod tidy` in the project directory.
    pub async fn sync_dependencies(&self, compiler: &str) -> Result<(), BuildError> {
        let command = format!("{} mod tidy", compiler);
        ui::info(&format!("Executing: {}", command));

        let output = Command::new(compiler)
            .args(["mod", "tidy"])
            .current_dir(&self.project.project_dir)
            .output()
            .await
            .map_err(|e| compiler_spawn_error(compiler, e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(BuildError::SyncFailed {
                command,
                output: combined_output(&output),
            })
        }
    }

    /// Run the compiler and return the binary it wrote.
    pub async fn compile(&self, config: &BuildConfiguration) -> Result<PathBuf, BuildError> {
        let bin_dir = self.project.bin_dir();
        tokio::fs::create_dir_all(&bin_dir)
            .await
            .map_err(|source| BuildError::OutputDir {
                dir: bin_dir.clone(),
                source,
            })?;

        let args = self.compile_args(config);
        tracing::debug!("{} {}", config.compiler, args.join(" "));

        let output = Command::new(&config.compiler)
            .args(&args)
            .current_dir(&self.project.project_dir)
            .output()
            .await
            .map_err(|e| compiler_spawn_error(&config.compiler, e))?;

        if !output.status.success() {
            return Err(BuildError::CompilerFailed {
                command: format!("{} {}", config.compiler, args.join(" ")),
                output: combined_output(&output),
            });
        }

        let binary = self.binary_path();
        if !binary.is_file() {
            return Err(BuildError::BinaryMissing(binary));
        }
        Ok(binary)
    }
}

#[async_trait]
impl Builder for CommandBuilder {
    async fn build(&self, config: &BuildConfiguration) -> Result<PathBuf, BuildError> {
        if !config.skip_frontend {
            self.build_frontend().await?;
        }
        self.compile(config).await
    }
}

fn shell_command(command: &str, dir: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };
    cmd.current_dir(dir);
    cmd
}

fn compiler_spawn_error(compiler: &str, e: std::io::Error) -> BuildError {
    if e.kind() == std::io::ErrorKind::NotFound {
        BuildError::CompilerNotFound(compiler.to_string())
    } else {
        BuildError::Custom(format!("Unable to run '{}': {}", compiler, e))
    }
}

/// Stderr, or stdout when the tool wrote its errors there.
fn combined_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).into_owned()
    } else {
        stderr.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(dir: &Path) -> ProjectConfig {
        ProjectConfig {
            name: "demo".to_string(),
            project_dir: dir.to_path_buf(),
            ..ProjectConfig::default()
        }
    }

    #[test]
    fn binary_lands_in_build_bin() {
        let builder = CommandBuilder::new(project(Path::new("/project")));
        let expected = if cfg!(windows) { "demo-dev.exe" } else { "demo-dev" };
        assert_eq!(
            builder.binary_path(),
            PathBuf::from("/project/build/bin").join(expected)
        );
    }

    #[test]
    fn compile_args_always_carry_the_dev_tag() {
        let builder = CommandBuilder::new(project(Path::new("/project")));
        let config = BuildConfiguration {
            user_tags: vec!["webkit2_41".to_string(), "dev".to_string()],
            ..BuildConfiguration::default()
        };

        let args = builder.compile_args(&config);
        assert_eq!(&args[..4], ["build", "-buildvcs=false", "-gcflags", "all=-N -l"]);
        let tags = args.iter().position(|a| a == "-tags").unwrap();
        assert_eq!(args[tags + 1], "dev,webkit2_41");
        assert_eq!(args[args.len() - 2], "-o");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn frontend_commands_run_in_order() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("frontend")).unwrap();
        let builder = CommandBuilder::new(ProjectConfig {
            frontend_install: Some("echo install >> log.txt".to_string()),
            frontend_build: Some("echo build >> log.txt".to_string()),
            ..project(dir.path())
        });

        builder.build_frontend().await.unwrap();
        let log = std::fs::read_to_string(dir.path().join("frontend/log.txt")).unwrap();
        assert_eq!(log, "install\nbuild\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_frontend_command_keeps_output() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("frontend")).unwrap();
        let builder = CommandBuilder::new(ProjectConfig {
            frontend_build: Some("echo 'missing script: build' >&2; exit 1".to_string()),
            ..project(dir.path())
        });

        let err = builder.build_frontend().await.unwrap_err();
        match err {
            BuildError::FrontendFailed { output, .. } => {
                assert!(output.contains("missing script: build"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dependency_sync_reports_failure() {
        let dir = TempDir::new().unwrap();
        let builder = CommandBuilder::new(project(dir.path()));

        builder.sync_dependencies("true").await.unwrap();
        assert!(matches!(
            builder.sync_dependencies("false").await.unwrap_err(),
            BuildError::SyncFailed { ref command, .. } if command == "false mod tidy"
        ));
        assert!(matches!(
            builder.sync_dependencies("hotswap-no-such-compiler").await.unwrap_err(),
            BuildError::CompilerNotFound(_)
        ));
    }

    #[tokio::test]
    async fn missing_compiler_is_reported() {
        let dir = TempDir::new().unwrap();
        let builder = CommandBuilder::new(project(dir.path()));
        let config = BuildConfiguration {
            compiler: "hotswap-no-such-compiler".to_string(),
            skip_frontend: true,
            ..BuildConfiguration::default()
        };

        let err = builder.build(&config).await.unwrap_err();
        assert!(matches!(err, BuildError::CompilerNotFound(ref c) if c == "hotswap-no-such-compiler"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn compiler_writing_the_binary_succeeds() {
        let dir = TempDir::new().unwrap();
        // `sh build ... -o <path>` reads this script from the project dir,
        // so nothing written here is exec'd directly.
        std::fs::write(
            dir.path().join("build"),
            "while [ \"$1\" != \"-o\" ]; do shift; done\ntouch \"$2\"\n",
        )
        .unwrap();

        let builder = CommandBuilder::new(ProjectConfig {
            build_dir: PathBuf::from("out"),
            ..project(dir.path())
        });
        let config = BuildConfiguration {
            compiler: "sh".to_string(),
            skip_frontend: true,
            ..BuildConfiguration::default()
        };

        let binary = builder.build(&config).await.unwrap();
        assert_eq!(binary, dir.path().join("out/bin").join("demo-dev"));
        assert!(binary.is_file());
    }
}
