//! `deskpilot vocab` — print the provider action tables.

use std::fmt::Write as _;

use deskpilot_agent::vocabulary::{self, Mapping, Vocabulary};

pub fn run(name: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let selected: Vec<&'static Vocabulary> = match name {
        Some(name) => vec![vocabulary::by_name(name).ok_or_else(|| format!("Unknown vocabulary '{name}'"))?],
        None => vocabulary::builtin().to_vec(),
    };

    for vocab in selected {
        print!("{}", render(vocab));
        println!();
    }
    Ok(())
}

fn render(vocab: &Vocabulary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({} coordinates)", vocab.name, vocab.space);
    for entry in vocab.entries {
        let target = match entry.mapping {
            Mapping::Parse(_) => entry.kind.as_str(),
            Mapping::Unsupported => "unsupported (no-op)",
        };
        let _ = writeln!(out, "  {:<20} → {}", entry.name, target);
    }
    out
}
