//! Short tokens accepted in place of canonical command, keyword and option
//! names. Aliases only change the entry token, never the grammar behind it.

/// Top-level command aliases
pub const COMMANDS: &[(&str, &str)] = &[
    ("b", "bench"),
    ("c++", "compiler"),
    ("g", "go"),
    ("p", "position"),
    ("q", "quit"),
    ("s", "set"),
    ("so", "setoption"),
    ("?", "stop"),
];

/// `go` keyword aliases. `mt` is not here: it takes seconds, not
/// milliseconds, so the parser handles it separately.
pub const GO_KEYWORDS: &[(&str, &str)] = &[
    ("d", "depth"),
    ("i", "infinite"),
    ("m", "mate"),
    ("sm", "searchmoves"),
];

/// `position` keyword aliases
pub const POSITION_KEYWORDS: &[(&str, &str)] = &[("f", "fen")];

/// Option aliases understood by `set`
pub const OPTIONS: &[(&str, &str)] = &[
    ("h", "Hash"),
    ("mo", "Min Output"),
    ("mv", "MultiPV"),
    ("so", "Score Output"),
    ("t", "Threads"),
];

fn lookup<'a>(table: &[(&str, &'a str)], token: &'a str) -> &'a str {
    table
        .iter()
        .find(|(short, _)| *short == token)
        .map_or(token, |&(_, canonical)| canonical)
}

/// Canonical command for `token` (the token itself when it is no alias)
pub fn command(token: &str) -> &str {
    lookup(COMMANDS, token)
}

pub fn go_keyword(token: &str) -> &str {
    lookup(GO_KEYWORDS, token)
}

pub fn position_keyword(token: &str) -> &str {
    lookup(POSITION_KEYWORDS, token)
}

pub fn option_name(token: &str) -> &str {
    lookup(OPTIONS, token)
}

/// Listing printed by `set` without an option name
pub fn help_lines() -> Vec<String> {
    let mut lines = vec![
        String::new(),
        " Shortcut Commands:".to_string(),
        String::new(),
        "  setoption name 'option name' value 'value'".to_string(),
        "  is replaced by:".to_string(),
        "  set (or 's'), 'option name' or 'option shortcut' 'value'".to_string(),
        String::new(),
        " Note: set (or 's'), without an 'option' entered displays the shortcuts".to_string(),
        String::new(),
    ];

    let mut entries: Vec<(&str, String)> = Vec::new();
    for &(short, long) in COMMANDS.iter().chain(GO_KEYWORDS) {
        entries.push((short, long.to_string()));
    }
    for &(short, long) in OPTIONS {
        // `so` is both a command and an option alias
        match entries.iter_mut().find(|(s, _)| *s == short) {
            Some(entry) => entry.1 = format!("{}' / '{long}", entry.1),
            None => entries.push((short, long.to_string())),
        }
    }
    entries.push(("mt", "movetime (in seconds; movetime itself is in milliseconds)".to_string()));
    entries.push(("p f", "position fen".to_string()));
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (short, long) in entries {
        lines.push(format!("  '{short}' is the shortcut for '{long}'"));
    }
    lines.push(String::new());
    lines.push(
        " Note: 'sm' or 'searchmoves' MUST be the last option on the command line!".to_string(),
    );
    lines
}
