//! Regenerate `src/scripts.rs` from the `--help` output of every binary
//!
//! Run from the repository root after `cargo build`:
//!
//! ```plain
//! cargo run -p make-docs > src/scripts.rs
//! ```

use std::process::Command;

struct Script {
    name: &'static str,
    about: &'static str,
}

const SCRIPTS: &[Script] = &[
    Script {
        name: "check-rhv",
        about: "Needs https access to the RHV manager, and ssh access to the \
                hosts for `services_status`.",
    },
    Script {
        name: "restart-service",
        about: "Shinken event handler. Needs ansible on the monitoring server.",
    },
];

fn main() {
    let preamble = "Documentation about the scripts contained herein\n";

    let mut out: String = cp(preamble.split('\n'));
    out.push('\n');
    out.push_str(&cp(SCRIPTS
        .iter()
        .map(|s| format!("- [{0}](#{0})", s.name))));
    out.push('\n');
    for script in SCRIPTS {
        out.push_str(&format!(
            "\
//!
//! # {0}
//!
//! {1}
//!
//! ```plain
//! $ {0} --help
",
            script.name, script.about
        ));
        out.push_str(&cp(help(script.name).split('\n')));
        out.push_str("\n//! ```\n");
    }
    print!("{}", out);
}

fn help(name: &str) -> String {
    let output = Command::new(&format!("target/debug/{}", name))
        .arg("--help")
        .output()
        .unwrap_or_else(|e| panic!("Couldn't execute {}: {}", name, e));
    String::from_utf8(output.stdout)
        .unwrap_or_else(|e| panic!("{} --help is not utf8: {}", name, e))
}

/// Comment each line in the iterator
fn cp<S: AsRef<str>, I: Iterator<Item = S>>(s: I) -> String {
    s.map(|s| format!("//! {}", s.as_ref()))
        .map(|s| s.trim().into())
        .collect::<Vec<String>>()
        .join("\n")
}
