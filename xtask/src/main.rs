//! Build automation tasks for the time-beacon project.
//!
//! Run with: `cargo xtask <command>`

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::process::{Command, ExitCode};

const BIN_NAME: &str = "time-beacon";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for time-beacon project", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: host tests, firmware for both boards, docs
    CheckAll,
    /// Build the firmware
    Build {
        #[arg(long, default_value = "pico1")]
        board: Board,
        /// Rest 10 s between bursts instead of deep sleeping
        #[arg(long)]
        bench: bool,
    },
    /// Build UF2 firmware file for flashing to Pico
    Uf2 {
        #[arg(long, default_value = "pico1")]
        board: Board,
        /// Rest 10 s between bursts instead of deep sleeping
        #[arg(long)]
        bench: bool,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Board {
    Pico1,
    Pico2,
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Board::Pico1 => write!(f, "pico1"),
            Board::Pico2 => write!(f, "pico2"),
        }
    }
}

impl Board {
    fn target(self) -> &'static str {
        match self {
            Board::Pico1 => "thumbv6m-none-eabi",
            Board::Pico2 => "thumbv8m.main-none-eabihf",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckAll => check_all(),
        Commands::Build { board, bench } => {
            if build_firmware(board, bench, false) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Uf2 { board, bench } => build_uf2(board, bench),
    }
}

fn check_all() -> ExitCode {
    let workspace_root = workspace_root();

    println!("{}", "==> Running host tests...".cyan());
    let host_target = host_target();
    match host_target.as_deref() {
        Some(target) => {
            println!(
                "  {}",
                format!("Using host target: {target}").bright_black()
            );
        }
        None => {
            println!(
                "{}",
                "  Unable to detect host target; relying on cargo default.".bright_black()
            );
        }
    }

    let mut test_cmd = Command::new("cargo");
    test_cmd
        .current_dir(&workspace_root)
        .args(["test", "--lib", "--tests"]);
    if let Some(target) = host_target {
        test_cmd.arg("--target").arg(target);
    }
    test_cmd.args(["--no-default-features", "--features", "host"]);
    if !run_command(&mut test_cmd) {
        return ExitCode::FAILURE;
    }

    for board in [Board::Pico1, Board::Pico2] {
        println!(
            "\n{}",
            format!("==> Building firmware ({board})...").cyan()
        );
        for bench in [false, true] {
            if !build_firmware(board, bench, false) {
                return ExitCode::FAILURE;
            }
        }
    }

    println!("\n{}", "==> Building documentation...".cyan());
    let board = Board::Pico2;
    if !run_command(Command::new("cargo").current_dir(&workspace_root).args([
        "doc",
        "--lib",
        "--target",
        board.target(),
        "--no-deps",
        "--features",
        &firmware_features(board, false),
        "--no-default-features",
    ])) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> All checks passed! 🎉".green().bold());
    ExitCode::SUCCESS
}

fn build_firmware(board: Board, bench: bool, release: bool) -> bool {
    let workspace_root = workspace_root();
    let target = board.target();
    let features = firmware_features(board, bench);
    println!(
        "  {}",
        format!("Building {BIN_NAME} with features: {features}").bright_black()
    );

    let mut cmd = Command::new("cargo");
    cmd.current_dir(&workspace_root).args([
        "build",
        "--bin",
        BIN_NAME,
        "--target",
        target,
        "--features",
        &features,
        "--no-default-features",
    ]);
    if release {
        cmd.arg("--release");
    }

    let ok = run_command(&mut cmd);
    if ok {
        println!("{}", "Build successful! ✨".green());
    }
    ok
}

fn build_uf2(board: Board, bench: bool) -> ExitCode {
    let workspace_root = workspace_root();
    let target = board.target();

    println!("{}", format!("Building UF2 ({board})").cyan());
    println!("  Target: {}", target.bright_black());

    // Build in release mode for UF2
    if !build_firmware(board, bench, true) {
        return ExitCode::FAILURE;
    }

    // Convert to UF2 using elf2uf2-rs
    let elf_path = format!("target/{target}/release/{BIN_NAME}");
    let uf2_path = format!("{BIN_NAME}-{board}.uf2");

    println!("\n{}", "Converting to UF2 format...".cyan());

    if run_command(
        Command::new("elf2uf2-rs")
            .current_dir(&workspace_root)
            .args([&elf_path, &uf2_path]),
    ) {
        println!("{}", format!("UF2 created: {uf2_path} 🚀").green().bold());
        println!("{}", "Ready to drag-and-drop to your Pico!".bright_black());
        ExitCode::SUCCESS
    } else {
        println!(
            "{}",
            "Note: Install elf2uf2-rs with: cargo install elf2uf2-rs".yellow()
        );
        ExitCode::FAILURE
    }
}

fn firmware_features(board: Board, bench: bool) -> String {
    let mut features = vec![
        board.to_string(),
        "arm".to_string(),
        "wifi".to_string(),
        "defmt".to_string(),
    ];
    if bench {
        features.push("bench".to_string());
    }
    features.join(",")
}

fn workspace_root() -> std::path::PathBuf {
    // cargo runs the xtask alias from the workspace root
    std::env::current_dir().expect("Failed to get current directory")
}

fn host_target() -> Option<String> {
    let output = Command::new("rustc").arg("-vV").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if let Some(host) = line.strip_prefix("host: ") {
            return Some(host.trim().to_string());
        }
    }
    None
}

fn run_command(cmd: &mut Command) -> bool {
    match cmd.status() {
        Ok(status) => status.success(),
        Err(e) => {
            eprintln!("{}", format!("Failed to execute command: {e}").red());
            false
        }
    }
}
