use std::{env, env::VarError};

/// Neither binary takes arguments, so any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "TPP_HOST",
        "TPP_PORT",
        "TPP_DATABASE_URL",
        "TPP_AUTO_MIGRATE",
        "TPP_QUEUE_TYPE",
        "TPP_RECONNECT_ATTEMPTS",
        "TPP_RECONNECT_STEP_SECS",
        "TPP_RECONNECT_CAP_SECS",
        "TPP_PUBLISH_RETRY_STEP_MS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
