mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use limpet_core::{
    parse_desired_file, DependencyPin, DesiredState, RegistryDescriptor, DEFAULT_INDENT,
    OPENUPM_REGISTRY_NAME, OPENUPM_REGISTRY_URL,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "limpet",
    version,
    about = "Idempotent scoped-registry and dependency reconciler for UPM manifests"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ensure registries, scopes, and a dependency pin exist in a manifest.
    Apply {
        /// Path to the UPM manifest file.
        #[arg(default_value = "Packages/manifest.json")]
        manifest: PathBuf,
        /// Desired-state TOML file (alternative to the individual flags).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Scoped registry name to ensure present.
        #[arg(long, default_value = OPENUPM_REGISTRY_NAME)]
        registry_name: String,
        /// Registry url, used only when the registry is missing.
        #[arg(long, default_value = OPENUPM_REGISTRY_URL)]
        registry_url: String,
        /// Package-id scope to ensure under the registry (repeatable).
        #[arg(long = "scope")]
        scopes: Vec<String>,
        /// Dependency package id to pin.
        #[arg(long)]
        package: Option<String>,
        /// Dependency version to pin (never downgrades an existing pin).
        #[arg(long)]
        pin: Option<String>,
        /// Indent width when the manifest is rewritten.
        #[arg(long, default_value_t = DEFAULT_INDENT)]
        indent: usize,
        /// Report what would change without writing.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Exit with code 3 if the manifest is not already satisfied; never write.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LIMPET_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Apply {
            manifest,
            config,
            registry_name,
            registry_url,
            scopes,
            package,
            pin,
            indent,
            dry_run,
            check,
        } => desired_state(
            config.as_deref(),
            registry_name,
            registry_url,
            scopes,
            package,
            pin,
        )
        .and_then(|desired| {
            commands::apply::run(&manifest, &desired, indent, check, dry_run, json_output)
        }),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:")
                || msg.starts_with("failed to read manifest")
                || msg.starts_with("invalid desired state:")
            {
                EXIT_MANIFEST_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn desired_state(
    config: Option<&std::path::Path>,
    registry_name: String,
    registry_url: String,
    scopes: Vec<String>,
    package: Option<String>,
    pin: Option<String>,
) -> Result<DesiredState, String> {
    if let Some(path) = config {
        if package.is_some() || pin.is_some() {
            return Err(
                "invalid desired state: use either --config or --package/--pin, not both"
                    .to_owned(),
            );
        }
        return parse_desired_file(path).map_err(|e| format!("invalid desired state: {e}"));
    }

    let (Some(package), Some(pin)) = (package, pin) else {
        return Err(
            "invalid desired state: --package and --pin are required without --config".to_owned(),
        );
    };
    let desired = DesiredState {
        registries: vec![RegistryDescriptor {
            name: registry_name,
            url: registry_url,
            scopes,
        }],
        dependency: DependencyPin {
            package,
            version: pin,
        },
    };
    desired
        .validate()
        .map_err(|e| format!("invalid desired state: {e}"))?;
    Ok(desired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desired_state_from_flags() {
        let desired = desired_state(
            None,
            OPENUPM_REGISTRY_NAME.to_owned(),
            OPENUPM_REGISTRY_URL.to_owned(),
            vec!["com.example".to_owned()],
            Some("com.example.pkg".to_owned()),
            Some("1.0.0".to_owned()),
        )
        .unwrap();
        assert_eq!(desired.registries[0].name, OPENUPM_REGISTRY_NAME);
        assert_eq!(desired.dependency.version, "1.0.0");
    }

    #[test]
    fn desired_state_requires_package_and_pin_without_config() {
        let err = desired_state(
            None,
            OPENUPM_REGISTRY_NAME.to_owned(),
            OPENUPM_REGISTRY_URL.to_owned(),
            Vec::new(),
            None,
            None,
        )
        .unwrap_err();
        assert!(err.starts_with("invalid desired state:"));
    }

    #[test]
    fn desired_state_rejects_config_combined_with_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limpet.toml");
        std::fs::write(
            &path,
            "[dependency]\npackage = \"com.example.pkg\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();

        let err = desired_state(
            Some(&path),
            OPENUPM_REGISTRY_NAME.to_owned(),
            OPENUPM_REGISTRY_URL.to_owned(),
            Vec::new(),
            Some("com.example.pkg".to_owned()),
            None,
        )
        .unwrap_err();
        assert!(err.contains("not both"));
    }

    #[test]
    fn desired_state_loads_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limpet.toml");
        std::fs::write(
            &path,
            r#"
[[registries]]
name = "package.openupm.com"
url = "https://package.openupm.com"
scopes = ["com.example"]

[dependency]
package = "com.example.pkg"
version = "1.2.3"
"#,
        )
        .unwrap();

        let desired = desired_state(
            Some(&path),
            OPENUPM_REGISTRY_NAME.to_owned(),
            OPENUPM_REGISTRY_URL.to_owned(),
            Vec::new(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(desired.dependency.version, "1.2.3");
    }

    #[test]
    fn cli_parses_apply_with_flags() {
        let cli = Cli::try_parse_from([
            "limpet",
            "apply",
            "Packages/manifest.json",
            "--package",
            "com.example.pkg",
            "--pin",
            "1.0.0",
            "--scope",
            "com.example",
            "--check",
        ])
        .unwrap();
        match cli.command {
            Commands::Apply { check, scopes, .. } => {
                assert!(check);
                assert_eq!(scopes, ["com.example"]);
            }
            Commands::Completions { .. } => panic!("parsed wrong command"),
        }
    }
}
