//! Layered configuration loading and collaborator assembly

use parking_lot::Mutex;
use std::path::Path;
use tempfile::TempDir;
use wayang_planner::config::{ConfigLoader, ProviderType};
use wayang_planner::{Collaborators, PlanError, PlanMapper};

// Tests in this file mutate process environment.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const WORKSPACE_CONFIG: &str = r#"
[input]
jdbc_uri = "jdbc:postgresql://db:5432/people"
jdbc_username = "reader"

[repair]
max_iterations = 3

[executor]
server_url = "http://localhost:8080/wayang/submit"
platforms = ["java", "spark"]

[providers.local]
provider_type = "ollama"
model = "llama3"
endpoint = "http://localhost:11434"

[providers.local.default_options]
temperature = 0.2

[agents.builder]
provider = "local"
system_prompt = "You build Wayang subplans."

[agents.debugger]
provider = "local"
system_prompt = "You repair Wayang plans."
"#;

fn write_workspace(root: &Path, files: &[(&str, &str)]) {
    let config_dir = root.join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    for (name, body) in files {
        std::fs::write(config_dir.join(name), body).unwrap();
    }
}

#[test]
fn workspace_file_drives_every_section() {
    let _guard = ENV_MUTEX.lock();
    let workspace = TempDir::new().unwrap();
    write_workspace(workspace.path(), &[("config.toml", WORKSPACE_CONFIG)]);

    let config = ConfigLoader::load(workspace.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.repair.max_iterations, 3);
    assert!(config.repair.enabled);
    assert_eq!(config.executor.timeout_secs, 300);
    assert_eq!(config.executor.platforms, vec!["java", "spark"]);
    assert_eq!(config.providers["local"].provider_type, ProviderType::Ollama);
    assert_eq!(
        config.providers["local"].default_options.temperature,
        Some(0.2)
    );
    assert_eq!(config.agents["builder"].provider, "local");

    let plan = PlanMapper::from_config(&config).to_wire(&Default::default());
    assert_eq!(plan.context.platforms, vec!["java", "spark"]);

    assert!(Collaborators::from_config(&config).is_ok());
}

#[test]
fn environment_beats_workspace_files() {
    let _guard = ENV_MUTEX.lock();
    let workspace = TempDir::new().unwrap();
    write_workspace(
        workspace.path(),
        &[
            ("config.toml", WORKSPACE_CONFIG),
            ("ci.toml", "[repair]\nmax_iterations = 8\n"),
        ],
    );

    std::env::set_var("WAYANG_PLANNER_ENV", "ci");
    let from_env_file = ConfigLoader::load(workspace.path());
    std::env::set_var("WAYANG_PLANNER__REPAIR__MAX_ITERATIONS", "11");
    let from_env_var = ConfigLoader::load(workspace.path());
    std::env::remove_var("WAYANG_PLANNER__REPAIR__MAX_ITERATIONS");
    std::env::remove_var("WAYANG_PLANNER_ENV");

    assert_eq!(from_env_file.unwrap().repair.max_iterations, 8);
    let config = from_env_var.unwrap();
    assert_eq!(config.repair.max_iterations, 11);
    assert_eq!(
        config.input.jdbc_uri.as_deref(),
        Some("jdbc:postgresql://db:5432/people")
    );
}

#[cfg(target_os = "linux")]
#[test]
fn global_file_sits_below_workspace_file() {
    let _guard = ENV_MUTEX.lock();
    let xdg = TempDir::new().unwrap();
    let global_dir = xdg.path().join("wayang-planner");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::write(
        global_dir.join("config.toml"),
        "[repair]\nmax_iterations = 9\n\n[executor]\ntimeout_secs = 42\n",
    )
    .unwrap();

    let workspace = TempDir::new().unwrap();
    write_workspace(workspace.path(), &[("config.toml", "[repair]\nmax_iterations = 4\n")]);

    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", xdg.path());
    let config = ConfigLoader::load(workspace.path());
    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    let config = config.unwrap();
    assert_eq!(config.repair.max_iterations, 4);
    assert_eq!(config.executor.timeout_secs, 42);
}

#[test]
fn debugger_is_required_only_with_repair() {
    let _guard = ENV_MUTEX.lock();
    let workspace = TempDir::new().unwrap();
    let without_debugger = WORKSPACE_CONFIG.replace(
        "[agents.debugger]\nprovider = \"local\"\nsystem_prompt = \"You repair Wayang plans.\"\n",
        "",
    );
    write_workspace(workspace.path(), &[("config.toml", &without_debugger)]);

    let mut config = ConfigLoader::load(workspace.path()).unwrap();
    assert!(!config.agents.contains_key("debugger"));
    assert!(matches!(
        Collaborators::from_config(&config),
        Err(PlanError::ConfigError(message)) if message.contains("debugger")
    ));

    config.repair.enabled = false;
    assert!(Collaborators::from_config(&config).is_ok());
}

#[test]
fn effective_config_prints_as_toml() {
    let _guard = ENV_MUTEX.lock();
    let workspace = TempDir::new().unwrap();
    write_workspace(workspace.path(), &[("config.toml", WORKSPACE_CONFIG)]);

    let text = ConfigLoader::load(workspace.path()).unwrap().to_toml().unwrap();
    assert!(text.contains("max_iterations = 3"));
    assert!(text.contains("[agents.builder]"));
}
