// src/shell.rs

//! Line-oriented command shell on the appliance console. Command failures
//! print and the loop continues; only `quit` ends the session (the caller
//! then restarts the device).

use log::{debug, info};
use std::io::{BufRead, Write};
use std::path::Path;

use crate::snake;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ls(String),
    Cat(String),
    Cp(String, String),
    Write { path: String, msg: String },
    Snake,
    Help,
    Quit,
    Unknown(String),
    Missing(&'static str),
}

/// Parses one input line. `write`'s message is everything after the path,
/// spaces included.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let mut parts = line.splitn(2, ' ');
    let cmd = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim_start);

    Some(match cmd {
        "q" | "quit" => Command::Quit,
        "help" => Command::Help,
        "snake" => Command::Snake,
        "ls" => Command::Ls(rest.unwrap_or(".").to_string()),
        "cat" => match rest {
            Some(path) if !path.is_empty() => Command::Cat(path.to_string()),
            _ => Command::Missing("cat"),
        },
        "cp" => match rest.map(|r| {
            let mut args = r.splitn(2, ' ');
            (args.next().unwrap_or_default().to_string(), args.next())
        }) {
            Some((src, Some(dst))) if !src.is_empty() && !dst.is_empty() => {
                Command::Cp(src, dst.to_string())
            }
            _ => Command::Missing("cp"),
        },
        "write" => match rest.map(|r| {
            let mut args = r.splitn(2, ' ');
            (args.next().unwrap_or_default().to_string(), args.next())
        }) {
            Some((path, Some(msg))) if !path.is_empty() && !msg.is_empty() => Command::Write {
                path,
                msg: msg.to_string(),
            },
            _ => Command::Missing("write"),
        },
        other => Command::Unknown(other.to_string()),
    })
}

/// Runs the shell until `quit`. Reads lines from stdin, which the console
/// redirection keeps bound to the active tty.
pub fn run() {
    println!("Welcome to the snakebox shell!");
    print_help();

    let stdin = std::io::stdin();
    loop {
        print!("$ ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                info!("Stdin closed, leaving shell");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                println!("shell: read failed: {e}");
                continue;
            }
        }

        let Some(command) = parse(&line) else {
            continue;
        };
        debug!("Shell command: {:?}", command);

        match command {
            Command::Quit => return,
            Command::Help => print_help(),
            Command::Ls(path) => ls(&path),
            Command::Cat(path) => cat(&path),
            Command::Cp(src, dst) => cp(&src, &dst),
            Command::Write { path, msg } => write_file(&path, &msg),
            Command::Snake => {
                if let Err(e) = snake::run() {
                    println!("snake: {e:#}");
                }
            }
            Command::Unknown(cmd) => println!("Unknown command: '{cmd}'"),
            Command::Missing(cmd) => println!("{cmd}: missing argument"),
        }
    }
}

fn print_help() {
    println!(
        "Available commands:\n\
         cat <PATH> - print content of the file\n\
         ls [PATH] - print contents of the directory\n\
         cp <SRC> <DST> - copy file\n\
         write <PATH> <MSG> - write message to the file\n\
         quit/q - exit the shell and reboot\n\
         snake - run the snake game\n\
         help - print this message"
    );
}

fn ls(path: &str) {
    let path = Path::new(path);
    if !path.exists() {
        println!("ls: '{}' does not exist", path.display());
        return;
    }
    if !path.is_dir() {
        println!("ls: '{}' is not a directory", path.display());
        return;
    }
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            println!("ls: failed to open '{}': {e}", path.display());
            return;
        }
    };
    for entry in entries {
        match entry {
            Ok(entry) => println!("{}", entry.file_name().to_string_lossy()),
            Err(e) => {
                println!("ls: failed to read '{}': {e}", path.display());
                return;
            }
        }
    }
}

fn cat(path: &str) {
    let path = Path::new(path);
    if !path.exists() {
        println!("cat: '{}' does not exist", path.display());
        return;
    }
    if path.is_dir() {
        println!("cat: '{}' is not a file", path.display());
        return;
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("cat: failed to read '{}': {e}", path.display());
            return;
        }
    };
    if bytes.contains(&0) {
        // Binary content: hex-escape every byte.
        let mut out = String::with_capacity(bytes.len() * 3);
        for b in &bytes {
            out.push_str(&format!("\\{b:02x}"));
        }
        println!("{out}");
    } else {
        print!("{}", String::from_utf8_lossy(&bytes));
    }
}

fn cp(src: &str, dst: &str) {
    if Path::new(dst).is_dir() {
        println!("cp: '{dst}' is not a file");
        return;
    }
    if let Err(e) = std::fs::copy(src, dst) {
        println!("cp: failed to copy '{src}' to '{dst}': {e}");
    }
}

fn write_file(path: &str, msg: &str) {
    let path = Path::new(path);
    if !path.exists() {
        println!("write: '{}' does not exist", path.display());
        return;
    }
    if path.is_dir() {
        println!("write: '{}' is not a file", path.display());
        return;
    }
    let result = std::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .and_then(|mut f| f.write_all(msg.as_bytes()));
    if let Err(e) = result {
        println!("write: failed to write '{}': {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_commands() {
        assert_eq!(parse("q\n"), Some(Command::Quit));
        assert_eq!(parse("quit"), Some(Command::Quit));
        assert_eq!(parse("help"), Some(Command::Help));
        assert_eq!(parse("snake"), Some(Command::Snake));
        assert_eq!(parse(""), None);
        assert_eq!(parse("   \n"), None);
    }

    #[test]
    fn parse_ls_defaults_to_current_dir() {
        assert_eq!(parse("ls"), Some(Command::Ls(".".into())));
        assert_eq!(parse("ls /tmp"), Some(Command::Ls("/tmp".into())));
    }

    #[test]
    fn parse_cat_requires_a_path() {
        assert_eq!(parse("cat /proc/version"), Some(Command::Cat("/proc/version".into())));
        assert_eq!(parse("cat"), Some(Command::Missing("cat")));
    }

    #[test]
    fn parse_cp_requires_two_paths() {
        assert_eq!(parse("cp a b"), Some(Command::Cp("a".into(), "b".into())));
        assert_eq!(parse("cp a"), Some(Command::Missing("cp")));
        assert_eq!(parse("cp"), Some(Command::Missing("cp")));
    }

    #[test]
    fn parse_write_message_keeps_spaces() {
        assert_eq!(
            parse("write /tmp/x hello there\n"),
            Some(Command::Write {
                path: "/tmp/x".into(),
                msg: "hello there".into()
            })
        );
        assert_eq!(parse("write /tmp/x"), Some(Command::Missing("write")));
    }

    #[test]
    fn parse_unknown_is_reported() {
        assert_eq!(parse("frobnicate"), Some(Command::Unknown("frobnicate".into())));
    }
}
