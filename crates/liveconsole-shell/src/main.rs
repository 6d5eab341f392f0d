fn main() {
    if let Err(e) = liveconsole_shell::run() {
        eprintln!("liveconsole: {e}");
        std::process::exit(1);
    }
}
