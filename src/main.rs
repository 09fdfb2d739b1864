fn main() {
    #[cfg(feature = "cli")]
    frontcode::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("frontcode: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
