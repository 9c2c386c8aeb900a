use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current configuration.
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
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "OOS_HOST",
        "OOS_PORT",
        "OOS_DATABASE_URL",
        "OOS_DEFAULT_CURRENCY",
        "OOS_RAZORPAY_KEY_ID",
        "OOS_RAZORPAY_API_URL",
        "OOS_GATEWAY_TIMEOUT_SECS",
        "OOS_GATEWAY_TEST_MODE_FALLBACK",
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
