#![no_main]
use libfuzzer_sys::fuzz_target;

const COMMANDS: [&str; 4] = ["build", "get", "dump", "stats"];

// The first byte picks a subcommand so most inputs get past clap's
// top-level dispatch; the rest becomes its arguments.
fuzz_target!(|data: &[u8]| {
    let Some((&pick, rest)) = data.split_first() else {
        return;
    };
    let mut args = vec![COMMANDS[usize::from(pick) % COMMANDS.len()].to_string()];
    args.extend(
        String::from_utf8_lossy(rest)
            .split_ascii_whitespace()
            .take(24)
            .map(str::to_owned),
    );
    frontcode::cli::fuzz_try_parse_args(&args);
});
